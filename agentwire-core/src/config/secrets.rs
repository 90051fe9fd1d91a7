//! Secrets handling and redaction for configuration
//!
//! Provider credentials travel through the options map as plain JSON. They are
//! lifted into [`SecretString`] where they are used, and [`redact_options`]
//! produces a copy of an options map that is safe to log.

use crate::protocol::Options;
use serde_json::Value;
use std::fmt;

const REDACTED: &str = "[REDACTED]";

const SENSITIVE_PATTERNS: [&str; 7] = [
    "api_key",
    "secret",
    "token",
    "password",
    "credential",
    "authorization",
    "passphrase",
];

/// A wrapper type for sensitive strings like API keys
#[derive(Clone)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    /// Create a new secret string
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Get the actual value (use with caution)
    pub fn expose_secret(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", REDACTED)
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", REDACTED)
    }
}

/// Whether an option key names a credential
pub fn is_sensitive_key(key: &str) -> bool {
    let key = key.to_lowercase();
    SENSITIVE_PATTERNS.iter().any(|pattern| key.contains(pattern))
}

/// Copy of `options` with every sensitive value (at any depth) masked
pub fn redact_options(options: &Options) -> Options {
    options
        .iter()
        .map(|(key, value)| {
            let value = if is_sensitive_key(key) {
                Value::String(REDACTED.to_string())
            } else {
                redact_value(value)
            };
            (key.clone(), value)
        })
        .collect()
}

fn redact_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(redact_options(map)),
        Value::Array(items) => Value::Array(items.iter().map(redact_value).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_secret_string_redaction() {
        let secret = SecretString::new("sk-1234567890abcdef");
        assert_eq!(format!("{}", secret), "[REDACTED]");
        assert_eq!(format!("{:?}", secret), "[REDACTED]");
    }

    #[test]
    fn test_secret_string_expose() {
        let secret = SecretString::new("my-secret-value");
        assert_eq!(secret.expose_secret(), "my-secret-value");
    }

    #[test]
    fn test_sensitive_keys() {
        assert!(is_sensitive_key("token"));
        assert!(is_sensitive_key("API_KEY"));
        assert!(is_sensitive_key("client_secret"));
        assert!(!is_sensitive_key("auth_type"));
        assert!(!is_sensitive_key("deployment"));
    }

    #[test]
    fn test_redact_options_nested() {
        let options = json!({
            "auth_type": "bearer",
            "token": "abc",
            "extra": {"password": "p", "keep": 1},
            "list": [{"api_key": "k"}]
        })
        .as_object()
        .cloned()
        .unwrap();

        let redacted = redact_options(&options);
        assert_eq!(redacted["auth_type"], "bearer");
        assert_eq!(redacted["token"], "[REDACTED]");
        assert_eq!(redacted["extra"]["password"], "[REDACTED]");
        assert_eq!(redacted["extra"]["keep"], 1);
        assert_eq!(redacted["list"][0]["api_key"], "[REDACTED]");
        assert_eq!(options["token"], "abc");
    }
}
