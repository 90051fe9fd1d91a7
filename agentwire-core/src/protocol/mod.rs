//! Protocol module for LLM request/response structures
//!
//! This module defines the data model shared by capabilities, providers and the
//! transport client. These structures are designed to be:
//! - Provider-agnostic (OpenAI-compatible wire shapes)
//! - Lenient on input (every optional field defaults)
//! - Extensible through a flattened options map

pub mod response;
pub mod types;

pub use response::{
    ChatChoice, ChatResponse, Delta, Embedding, EmbeddingsResponse, FunctionCall,
    FunctionCallDelta, ProtocolResponse, ResponseMessage, StreamingChoice, StreamingChunk,
    ToolCall, ToolCallDelta, ToolsChoice, ToolsMessage, ToolsResponse, Usage,
};
pub use types::{
    ChatRequest, ContentPart, EmbeddingInput, EmbeddingsRequest, FunctionDefinition, ImageUrl,
    Message, MessageContent, MessageRole, Options, Protocol, ProtocolRequest, ToolDefinition,
    UnknownProtocol,
};
