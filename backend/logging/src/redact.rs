//! Log Redaction Layer
//!
//! Scrubs bearer tokens from strings and credential members from JSON
//! documents before they are logged.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static BEARER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)bearer\s+[a-zA-Z0-9\-\._~+/]+=*").unwrap());

const REDACTED: &str = "[REDACTED]";

/// Redacts bearer credentials in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    BEARER_RE.replace_all(input, "Bearer [REDACTED_TOKEN]").to_string()
}

fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.ends_with("token") || key.ends_with("secret") || key.ends_with("password")
}

/// Copy of `value` with every member whose key names a credential replaced.
/// Empty strings stay empty so "not provided" remains visible.
pub fn redact_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let v = match v {
                        Value::String(s) if is_secret_key(k) && !s.is_empty() => {
                            Value::String(REDACTED.to_string())
                        }
                        other => redact_json(other),
                    };
                    (k.clone(), v)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_json).collect()),
        Value::String(s) => Value::String(redact_sensitive_data(s)),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_redaction() {
        let raw = "POST with Bearer eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9 failed";
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9"));
        assert!(clean.starts_with("POST with Bearer [REDACTED_TOKEN]"));
    }

    #[test]
    fn redacts_context_tokens() {
        let body = json!({
            "path": "/install",
            "context": {
                "bot_access_token": "abc",
                "acting_user_access_token": "",
                "acting_user": {"id": "u1"}
            }
        });
        let clean = redact_json(&body);
        assert_eq!(clean["context"]["bot_access_token"], REDACTED);
        assert_eq!(clean["context"]["acting_user_access_token"], "");
        assert_eq!(clean["context"]["acting_user"]["id"], "u1");
        assert_eq!(clean["path"], "/install");
    }
}
