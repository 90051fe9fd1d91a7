//! Provider error types and handling

use crate::capabilities::CapabilityError;
use crate::model::ModelError;
use crate::protocol::Protocol;
use serde_json::Value;
use thiserror::Error;

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors raised while routing, authenticating or decoding provider traffic
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No provider registered under this name
    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    /// The provider cannot route this protocol
    #[error("provider '{provider}': protocol '{protocol}' not supported")]
    UnsupportedProtocol { provider: String, protocol: Protocol },

    /// A provider-specific option is absent
    #[error("provider '{provider}': missing required option '{key}'")]
    MissingOption { provider: String, key: String },

    /// A provider-specific option is malformed
    #[error("provider '{provider}': invalid option '{key}': {message}")]
    InvalidOption {
        provider: String,
        key: String,
        message: String,
    },

    /// Upstream answered with a non-200 status
    #[error("provider '{provider}': status {status}: {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    /// Reading the response body failed
    #[error("provider '{provider}': network error: {source}")]
    Network {
        provider: String,
        #[source]
        source: reqwest::Error,
    },

    /// Reading the event stream failed mid-way
    #[error("provider '{provider}': stream error: {message}")]
    Stream { provider: String, message: String },

    /// Request body could not be serialized
    #[error("provider '{provider}': failed to encode request: {source}")]
    Encode {
        provider: String,
        #[source]
        source: serde_json::Error,
    },

    /// The capability rejected the response
    #[error("provider '{provider}': {source}")]
    Capability {
        provider: String,
        #[source]
        source: CapabilityError,
    },

    /// The configured model could not be built
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl ProviderError {
    /// HTTP status for upstream status failures
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable message extracted from an upstream error body
    ///
    /// Understands `{"error": {"message": ..}}`, `{"message": ..}` and
    /// `{"error": ".."}`; falls back to the raw body.
    pub fn upstream_message(&self) -> Option<String> {
        let Self::Status { body, .. } = self else {
            return None;
        };

        let extracted = serde_json::from_str::<Value>(body).ok().and_then(|json| {
            json.get("error")
                .and_then(|e| e.get("message"))
                .or_else(|| json.get("message"))
                .or_else(|| json.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        });
        Some(extracted.unwrap_or_else(|| body.clone()))
    }
}
