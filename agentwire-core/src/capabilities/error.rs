//! Capability error types

use thiserror::Error;

/// Result type for capability operations
pub type CapabilityResult<T> = Result<T, CapabilityError>;

/// Errors raised while validating options or shaping requests and responses
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// Option key not declared by the capability
    #[error("capability '{capability}': unknown option '{key}'")]
    UnknownOption { capability: String, key: String },

    /// Required option absent from the options map
    #[error("capability '{capability}': missing required option '{key}'")]
    MissingOption { capability: String, key: String },

    /// Option present but malformed
    #[error("capability '{capability}': invalid option '{key}': {message}")]
    InvalidOption {
        capability: String,
        key: String,
        message: String,
    },

    /// Conversation unusable for this capability
    #[error("capability '{capability}': invalid messages: {message}")]
    InvalidMessages { capability: String, message: String },

    /// No capability registered under this format name
    #[error("unknown capability format '{0}'")]
    UnknownFormat(String),

    /// Response or chunk body is not the expected JSON
    #[error("capability '{capability}': failed to decode response: {source}")]
    Decode {
        capability: String,
        #[source]
        source: serde_json::Error,
    },
}

impl CapabilityError {
    /// Whether the error stems from caller input rather than the server
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnknownOption { .. }
                | Self::MissingOption { .. }
                | Self::InvalidOption { .. }
                | Self::InvalidMessages { .. }
        )
    }

    pub(crate) fn invalid_option(
        capability: &str,
        key: &str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidOption {
            capability: capability.to_string(),
            key: key.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid_messages(capability: &str, message: impl Into<String>) -> Self {
        Self::InvalidMessages {
            capability: capability.to_string(),
            message: message.into(),
        }
    }
}
