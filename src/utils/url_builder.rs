use crate::domain::StringMap;
use url::Url;

/// Pairs with an empty key or value are never added, on either path.
fn effective_pairs(params: &StringMap) -> Vec<(&str, &str)> {
    params
        .iter()
        .filter(|(key, value)| !key.is_empty() && !value.is_empty())
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect()
}

/// Sets each parameter on `base_url`, overwriting same-named parameters already present.
///
/// Bases that do not parse as absolute URLs (relative paths, unresolved `{{VAR}}`
/// placeholders) get a percent-encoded query string appended instead. When there is
/// nothing to add the base is returned exactly as given.
pub fn build_final_url(base_url: &str, params: &StringMap) -> String {
    let pairs = effective_pairs(params);
    if base_url.is_empty() || pairs.is_empty() {
        return base_url.to_string();
    }
    match Url::parse(base_url) {
        Ok(url) => set_query_pairs(url, &pairs),
        Err(_) => append_query_string(base_url, &pairs),
    }
}

fn set_query_pairs(mut url: Url, pairs: &[(&str, &str)]) -> String {
    let mut existing: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    for (key, value) in pairs {
        match existing.iter().position(|(name, _)| name == key) {
            Some(first) => {
                existing[first].1 = value.to_string();
                let mut index = 0;
                existing.retain(|(name, _)| {
                    let keep = index <= first || name != key;
                    index += 1;
                    keep
                });
            }
            None => existing.push((key.to_string(), value.to_string())),
        }
    }
    url.query_pairs_mut().clear().extend_pairs(existing.iter());
    url.to_string()
}

fn append_query_string(base_url: &str, pairs: &[(&str, &str)]) -> String {
    let query = pairs
        .iter()
        .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", base_url, separator, query)
}
