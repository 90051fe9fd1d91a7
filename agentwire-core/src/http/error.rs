//! Transport client errors and retry classification

use crate::capabilities::CapabilityError;
use crate::model::ModelError;
use crate::protocol::Protocol;
use crate::providers::ProviderError;
use thiserror::Error;
use uuid::Uuid;

/// Result type for transport client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Statuses worth another attempt
pub const RETRYABLE_STATUSES: [u16; 4] = [429, 502, 503, 504];

/// Errors surfaced by the transport client and the agent
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Capability(#[from] CapabilityError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Sending the request failed (DNS, connect, TLS, ...)
    #[error("HTTP error: {source} [request_id: {request_id}]")]
    Http {
        request_id: Uuid,
        #[source]
        source: reqwest::Error,
    },

    /// Request exceeded the configured timeout
    #[error("request timed out [request_id: {request_id}]")]
    Timeout { request_id: Uuid },

    /// Caller cancelled the request
    #[error("request cancelled")]
    Cancelled,

    /// Protocol (or its bound format) cannot stream
    #[error("protocol '{protocol}' does not support streaming (format '{format}')")]
    StreamingUnsupported { protocol: Protocol, format: String },

    /// Response shape does not match the protocol
    #[error("unexpected response for protocol '{0}'")]
    UnexpectedResponse(Protocol),

    /// The pooled HTTP client could not be built
    #[error("failed to create HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

impl ClientError {
    /// Transport errors and statuses 429/502/503/504 are retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { .. } | Self::Timeout { .. } => true,
            Self::Provider(ProviderError::Network { .. }) => true,
            Self::Provider(ProviderError::Status { status, .. }) => {
                RETRYABLE_STATUSES.contains(status)
            }
            _ => false,
        }
    }

    /// Whether the error was caused by cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Upstream HTTP status, when the error carries one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Provider(err) => err.status(),
            _ => None,
        }
    }

    pub(crate) fn from_send(source: reqwest::Error, request_id: Uuid) -> Self {
        if source.is_timeout() {
            Self::Timeout { request_id }
        } else {
            Self::Http { request_id, source }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn status(code: u16) -> ClientError {
        ClientError::Provider(ProviderError::Status {
            provider: "local".to_string(),
            status: code,
            body: String::new(),
        })
    }

    #[test_case(429, true)]
    #[test_case(502, true)]
    #[test_case(503, true)]
    #[test_case(504, true)]
    #[test_case(400, false)]
    #[test_case(401, false)]
    #[test_case(500, false)]
    fn test_status_retryability(code: u16, retryable: bool) {
        assert_eq!(status(code).is_retryable(), retryable);
        assert_eq!(status(code).status(), Some(code));
    }

    #[test]
    fn test_terminal_kinds() {
        assert!(!ClientError::Cancelled.is_retryable());
        assert!(ClientError::Cancelled.is_cancelled());
        assert!(ClientError::Timeout {
            request_id: Uuid::new_v4()
        }
        .is_retryable());
        assert!(!ClientError::Capability(CapabilityError::UnknownFormat("x".to_string()))
            .is_retryable());
    }
}
