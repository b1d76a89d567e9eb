use crate::domain::StringMap;
use once_cell::sync::Lazy;
use std::collections::HashSet;

const REDACTED: &str = "[REDACTED]";

static SENSITIVE_HEADER_KEYS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "authorization",
        "proxy-authorization",
        "cookie",
        "set-cookie",
        "x-api-key",
        "x-auth-token",
        "x-access-token",
    ]
    .into_iter()
    .collect()
});

const SENSITIVE_FRAGMENTS: &[&str] = &["token", "secret", "password", "api-key", "apikey"];

pub fn is_sensitive_header(name: &str) -> bool {
    let lowered = name.trim().to_lowercase();
    SENSITIVE_HEADER_KEYS.contains(lowered.as_str())
        || SENSITIVE_FRAGMENTS
            .iter()
            .any(|fragment| lowered.contains(fragment))
}

/// Copy of `headers` safe to put in log lines.
pub fn redact_headers(headers: &StringMap) -> StringMap {
    headers
        .iter()
        .map(|(key, value)| {
            if is_sensitive_header(key) {
                (key.clone(), REDACTED.to_string())
            } else {
                (key.clone(), value.clone())
            }
        })
        .collect()
}
