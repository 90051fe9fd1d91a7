//! Capability formats: per-protocol request shapers
//!
//! A capability owns the options a protocol accepts (as [`OptionDescriptor`]s)
//! and knows how to turn a conversation plus options into a request body, and a
//! response body back into typed data. Capabilities are registered by format
//! name in a [`CapabilityRegistry`] and bound to protocols by a
//! [`Model`](crate::model::Model).
//!
//! Buffered-only and streaming-capable formats are distinguished by
//! [`CapabilityHandle`], so callers never have to probe a capability at runtime
//! for streaming support.

use crate::protocol::{Message, Options, Protocol, ProtocolRequest, ProtocolResponse, StreamingChunk};
use std::fmt;
use std::sync::Arc;

pub mod chat;
pub mod embeddings;
pub mod error;
pub mod options;
pub mod registry;
pub mod streaming;
pub mod tools;
pub mod vision;

pub use chat::ChatCapability;
pub use embeddings::EmbeddingsCapability;
pub use error::{CapabilityError, CapabilityResult};
pub use options::{OptionDescriptor, TokenLimit};
pub use registry::{CapabilityFactory, CapabilityRegistry};
pub use tools::ToolsCapability;
pub use vision::VisionCapability;

/// A registered recipe for one protocol/format combination
pub trait Capability: Send + Sync + fmt::Debug {
    /// Format name the capability is registered under
    fn name(&self) -> &str;

    /// Protocol this capability serves
    fn protocol(&self) -> Protocol;

    /// Options accepted by this capability, in declaration order
    fn descriptors(&self) -> &[OptionDescriptor];

    /// Reject unknown keys and missing required keys
    fn validate_options(&self, options: &Options) -> CapabilityResult<()> {
        options::validate(self.name(), self.descriptors(), options)
    }

    /// Validate, then fill in defaults for absent keys
    fn process_options(&self, options: &Options) -> CapabilityResult<Options> {
        self.validate_options(options)?;
        Ok(options::apply_defaults(self.descriptors(), options))
    }

    /// Build the buffered request body
    fn create_request(
        &self,
        messages: &[Message],
        options: &Options,
        model: &str,
    ) -> CapabilityResult<ProtocolRequest>;

    /// Decode a buffered response body
    fn parse_response(&self, body: &[u8]) -> CapabilityResult<ProtocolResponse>;
}

/// Capability whose protocol can be streamed over SSE
pub trait StreamingCapability: Capability {
    /// Build the streaming request body (`stream: true` at the root)
    fn create_streaming_request(
        &self,
        messages: &[Message],
        options: &Options,
        model: &str,
    ) -> CapabilityResult<ProtocolRequest>;

    /// Decode one SSE payload into a chunk
    fn parse_chunk(&self, payload: &str) -> CapabilityResult<StreamingChunk> {
        streaming::decode_chunk(self.name(), payload)
    }

    /// Whether a payload terminates the stream
    fn is_stream_complete(&self, payload: &str) -> bool {
        streaming::is_done(payload)
    }
}

/// Shared reference to a capability, tagged by whether it can stream
#[derive(Clone, Debug)]
pub enum CapabilityHandle {
    /// Buffered-only capability (embeddings)
    Buffered(Arc<dyn Capability>),
    /// Capability that also supports streaming
    Streaming(Arc<dyn StreamingCapability>),
}

impl CapabilityHandle {
    /// Wrap a buffered-only capability
    pub fn buffered(capability: impl Capability + 'static) -> Self {
        Self::Buffered(Arc::new(capability))
    }

    /// Wrap a streaming capability
    pub fn streaming(capability: impl StreamingCapability + 'static) -> Self {
        Self::Streaming(Arc::new(capability))
    }

    /// The capability's buffered operations
    pub fn capability(&self) -> &dyn Capability {
        match self {
            Self::Buffered(capability) => capability.as_ref(),
            Self::Streaming(capability) => capability.as_ref(),
        }
    }

    /// The streaming operations, when the format supports them
    pub fn as_streaming(&self) -> Option<Arc<dyn StreamingCapability>> {
        match self {
            Self::Buffered(_) => None,
            Self::Streaming(capability) => Some(Arc::clone(capability)),
        }
    }

    /// Whether the format supports streaming
    pub fn supports_streaming(&self) -> bool {
        matches!(self, Self::Streaming(_))
    }

    /// Format name
    pub fn name(&self) -> &str {
        self.capability().name()
    }

    /// Protocol served
    pub fn protocol(&self) -> Protocol {
        self.capability().protocol()
    }
}

/// Reject an empty conversation
pub(crate) fn require_messages(capability: &str, messages: &[Message]) -> CapabilityResult<()> {
    if messages.is_empty() {
        return Err(CapabilityError::invalid_messages(
            capability,
            "at least one message is required",
        ));
    }
    Ok(())
}

/// Decode a response body into `T`, naming the capability on failure
pub(crate) fn decode<T: serde::de::DeserializeOwned>(
    capability: &str,
    body: &[u8],
) -> CapabilityResult<T> {
    serde_json::from_slice(body).map_err(|source| CapabilityError::Decode {
        capability: capability.to_string(),
        source,
    })
}
