//! Agentwire Core Library
//!
//! A provider-agnostic client for language-model services exposing an
//! OpenAI-compatible HTTP surface.
//!
//! A [`Model`](model::Model) binds protocols (chat, vision, tools, embeddings)
//! to registered capability formats with default options. A
//! [`Provider`](providers::Provider) routes those protocols to a concrete
//! service and authenticates. The [`TransportClient`](http::TransportClient)
//! runs one request end to end with retries, health tracking and cancellable
//! streaming, and the [`Agent`](agent::Agent) wraps it with a system prompt.

pub mod agent;
pub mod capabilities;
pub mod config;
pub mod http;
pub mod model;
pub mod protocol;
pub mod providers;

pub use agent::Agent;
pub use capabilities::{CapabilityHandle, CapabilityRegistry};
pub use config::AgentConfig;
pub use http::{ChunkStream, ClientError, ClientRequest, ClientResult, TransportClient};
pub use model::{Model, ModelError};
pub use protocol::{Message, Options, Protocol};
pub use providers::{Provider, ProviderRegistry};
pub use tokio_util::sync::CancellationToken;

/// Returns the version of the library
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
