//! HTTP transport: request execution against a provider
//!
//! This module implements the request lifecycle:
//! - capability selection and option merging
//! - connection pooling and request correlation (`X-Request-ID`)
//! - retries with exponential backoff for buffered requests
//! - cancellable SSE streaming
//! - advisory health tracking

pub mod client;
pub mod error;
pub mod health;
pub mod retry;

pub use client::{ChunkStream, TransportClient};
pub use error::{ClientError, ClientResult, RETRYABLE_STATUSES};
pub use health::Health;
pub use retry::{RetryExecutor, RetryPolicy};

use crate::protocol::{Message, Options, Protocol};

/// One call handed from the agent to the transport client
#[derive(Debug, Clone, PartialEq)]
pub struct ClientRequest {
    /// Protocol to invoke
    pub protocol: Protocol,
    /// Conversation, system prompt included
    pub messages: Vec<Message>,
    /// Per-call options, merged over the model's stored options
    pub options: Options,
}

impl ClientRequest {
    /// Request with no per-call options
    pub fn new(protocol: Protocol, messages: Vec<Message>) -> Self {
        Self {
            protocol,
            messages,
            options: Options::new(),
        }
    }

    /// Set per-call options
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }
}
