use crate::domain::StringMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

// ASCII-only on purpose: `\w` in the regex crate is Unicode-aware.
static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}").expect("placeholder regex"));

/// Replaces every `{{NAME}}` token with its binding. Unbound tokens stay verbatim.
pub fn resolve_template(text: &str, variables: &StringMap) -> String {
    if text.is_empty() || !text.contains("{{") {
        return text.to_string();
    }
    PLACEHOLDER_RE
        .replace_all(text, |caps: &Captures| match variables.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Same as [`resolve_template`] for an absent field: yields an empty string.
pub fn resolve_optional_template(text: Option<&str>, variables: &StringMap) -> String {
    text.map(|value| resolve_template(value, variables))
        .unwrap_or_default()
}

/// Templates values only; keys are copied as-is and keep their order.
pub fn resolve_template_object(map: &StringMap, variables: &StringMap) -> StringMap {
    map.iter()
        .map(|(key, value)| (key.clone(), resolve_template(value, variables)))
        .collect()
}

/// Distinct placeholder names in order of first appearance.
pub fn template_variables(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in PLACEHOLDER_RE.captures_iter(text) {
        let name = &caps[1];
        if !names.iter().any(|existing| existing == name) {
            names.push(name.to_string());
        }
    }
    names
}

pub fn unresolved_variables(text: &str, variables: &StringMap) -> Vec<String> {
    template_variables(text)
        .into_iter()
        .filter(|name| !variables.contains_key(name))
        .collect()
}
