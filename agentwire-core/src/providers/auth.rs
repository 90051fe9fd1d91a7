//! Auth header injection from provider options

use super::error::{ProviderError, ProviderResult};
use crate::config::SecretString;
use crate::protocol::Options;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use std::str::FromStr;

pub const AUTH_TYPE_KEY: &str = "auth_type";
pub const TOKEN_KEY: &str = "token";
pub const AUTH_HEADER_KEY: &str = "auth_header";

/// How the token is presented upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthType {
    /// `Authorization: Bearer <token>`
    Bearer,
    /// Token in a provider-specific key header
    ApiKey,
}

impl FromStr for AuthType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bearer" => Ok(Self::Bearer),
            "api_key" => Ok(Self::ApiKey),
            other => Err(format!("expected 'bearer' or 'api_key', got '{}'", other)),
        }
    }
}

/// Credentials resolved from provider options
#[derive(Debug, Clone)]
pub struct Auth {
    auth_type: AuthType,
    token: SecretString,
    header: HeaderName,
}

impl Auth {
    /// Create credentials; `api_key_header` is used for [`AuthType::ApiKey`]
    pub fn new(auth_type: AuthType, token: SecretString, api_key_header: HeaderName) -> Self {
        Self {
            auth_type,
            token,
            header: api_key_header,
        }
    }

    /// Credentials that must be present (`auth_type` and `token` both required)
    pub fn required(provider: &str, options: &Options, api_key_header: &str) -> ProviderResult<Self> {
        let auth_type = string_option(provider, options, AUTH_TYPE_KEY)?
            .ok_or_else(|| missing(provider, AUTH_TYPE_KEY))?;
        let token = string_option(provider, options, TOKEN_KEY)?
            .ok_or_else(|| missing(provider, TOKEN_KEY))?;

        Self::build(provider, auth_type, token, api_key_header)
    }

    /// Credentials that may be absent
    ///
    /// A token without `auth_type` is sent as a bearer token. `auth_header`
    /// overrides the key header name.
    pub fn optional(
        provider: &str,
        options: &Options,
        default_api_key_header: &str,
    ) -> ProviderResult<Option<Self>> {
        let auth_type = string_option(provider, options, AUTH_TYPE_KEY)?;
        let token = string_option(provider, options, TOKEN_KEY)?;
        let header = string_option(provider, options, AUTH_HEADER_KEY)?
            .unwrap_or(default_api_key_header);

        match (auth_type, token) {
            (None, None) => Ok(None),
            (Some(_), None) => Err(missing(provider, TOKEN_KEY)),
            (auth_type, Some(token)) => {
                Self::build(provider, auth_type.unwrap_or("bearer"), token, header).map(Some)
            }
        }
    }

    fn build(provider: &str, auth_type: &str, token: &str, header: &str) -> ProviderResult<Self> {
        let auth_type = auth_type
            .parse()
            .map_err(|message| invalid(provider, AUTH_TYPE_KEY, message))?;
        if token.is_empty() {
            return Err(invalid(provider, TOKEN_KEY, "token is empty"));
        }
        let header = HeaderName::from_str(header)
            .map_err(|e| invalid(provider, AUTH_HEADER_KEY, e.to_string()))?;

        Ok(Self::new(auth_type, SecretString::new(token), header))
    }

    /// The configured auth type
    pub fn auth_type(&self) -> AuthType {
        self.auth_type
    }

    /// Insert the auth header into `headers`
    pub fn apply(&self, provider: &str, headers: &mut HeaderMap) -> ProviderResult<()> {
        let (name, raw) = match self.auth_type {
            AuthType::Bearer => (
                AUTHORIZATION,
                format!("Bearer {}", self.token.expose_secret()),
            ),
            AuthType::ApiKey => (self.header.clone(), self.token.expose_secret().to_string()),
        };

        let mut value = HeaderValue::from_str(&raw)
            .map_err(|_| invalid(provider, TOKEN_KEY, "token is not a valid header value"))?;
        value.set_sensitive(true);
        headers.insert(name, value);
        Ok(())
    }
}

/// Read a string option; a non-string value is an error
pub(crate) fn string_option<'a>(
    provider: &str,
    options: &'a Options,
    key: &str,
) -> ProviderResult<Option<&'a str>> {
    match options.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(invalid(provider, key, "expected a string")),
    }
}

/// Read a string option that must be present and non-empty
pub(crate) fn required_string<'a>(
    provider: &str,
    options: &'a Options,
    key: &str,
) -> ProviderResult<&'a str> {
    match string_option(provider, options, key)? {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(missing(provider, key)),
    }
}

fn missing(provider: &str, key: &str) -> ProviderError {
    ProviderError::MissingOption {
        provider: provider.to_string(),
        key: key.to_string(),
    }
}

fn invalid(provider: &str, key: &str, message: impl Into<String>) -> ProviderError {
    ProviderError::InvalidOption {
        provider: provider.to_string(),
        key: key.to_string(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(value: Value) -> Options {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_bearer_header() {
        let auth = Auth::required(
            "azure",
            &options(json!({"auth_type": "bearer", "token": "t0k"})),
            "api-key",
        )
        .unwrap();

        let mut headers = HeaderMap::new();
        auth.apply("azure", &mut headers).unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer t0k");
        assert!(headers[AUTHORIZATION].is_sensitive());
        assert!(!format!("{:?}", auth).contains("t0k"));
    }

    #[test]
    fn test_api_key_header_override() {
        let auth = Auth::optional(
            "local",
            &options(json!({"auth_type": "api_key", "token": "k", "auth_header": "X-Custom-Key"})),
            "X-API-Key",
        )
        .unwrap()
        .unwrap();

        let mut headers = HeaderMap::new();
        auth.apply("local", &mut headers).unwrap();
        assert_eq!(headers["x-custom-key"], "k");
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_optional_auth() {
        assert!(Auth::optional("local", &Options::new(), "X-API-Key")
            .unwrap()
            .is_none());

        let bare_token = Auth::optional("local", &options(json!({"token": "t"})), "X-API-Key")
            .unwrap()
            .unwrap();
        assert_eq!(bare_token.auth_type(), AuthType::Bearer);

        assert!(matches!(
            Auth::optional("local", &options(json!({"auth_type": "bearer"})), "X-API-Key"),
            Err(ProviderError::MissingOption { .. })
        ));
    }

    #[test]
    fn test_invalid_auth_type() {
        let err = Auth::required(
            "azure",
            &options(json!({"auth_type": "basic", "token": "t"})),
            "api-key",
        )
        .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidOption { key, .. } if key == "auth_type"));
    }
}
