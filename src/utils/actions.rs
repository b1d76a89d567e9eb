use crate::errors::AppError;
use serde_json::Value;

fn normalize_token(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];
    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        prev.clone_from_slice(&curr);
    }
    prev[b_chars.len()]
}

/// Known actions close to `input`, best match first.
pub fn suggest_actions(input: &str, known: &[&str], limit: usize) -> Vec<String> {
    let needle = normalize_token(input);
    if needle.is_empty() {
        return Vec::new();
    }
    let max_distance = (needle.len() / 3).max(1);
    let mut scored: Vec<(usize, &str)> = known
        .iter()
        .filter_map(|candidate| {
            let hay = normalize_token(candidate);
            let score = if hay.contains(&needle) || needle.contains(&hay) {
                0
            } else {
                levenshtein(&needle, &hay)
            };
            (score <= max_distance).then_some((score, *candidate))
        })
        .collect();
    scored.sort_by_key(|(score, _)| *score);
    scored
        .into_iter()
        .take(limit)
        .map(|(_, name)| name.to_string())
        .collect()
}

pub fn unknown_action_error(scope: &str, action: Option<&Value>, known_actions: &[&str]) -> AppError {
    let action_value = action
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let suggestions = suggest_actions(&action_value, known_actions, 3);
    let mut hint = format!("Use one of: {}.", known_actions.join(", "));
    if !suggestions.is_empty() {
        hint = format!("Did you mean: {}? {}", suggestions.join(", "), hint);
    }
    AppError::invalid_params(format!("Unknown {} action: {}", scope, action_value))
        .with_hint(hint)
        .with_details(serde_json::json!({
            "known_actions": known_actions,
            "did_you_mean": suggestions,
        }))
}
