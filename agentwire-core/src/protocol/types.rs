//! Core protocol types for LLM interactions
//!
//! This module contains the request-side data structures shared by every
//! capability and provider. The design prioritizes:
//! - Type safety for the fields every protocol understands (`model`, `messages`,
//!   `stream`, `tools`, `input`)
//! - A flattened options map for everything else, so caller-supplied options
//!   land at the root of the JSON body unchanged

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Open options map passed through every layer of the pipeline.
///
/// Keys are option names (`temperature`, `max_tokens`, `images`, ...). Values are
/// arbitrary JSON and are emitted at the root of the request body.
pub type Options = serde_json::Map<String, Value>;

/// Category of model interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Plain conversational completion
    Chat,
    /// Conversational completion with image inputs
    Vision,
    /// Conversational completion with function calling
    Tools,
    /// Vector embeddings
    Embeddings,
}

impl Protocol {
    /// Every protocol, in declaration order
    pub const ALL: [Protocol; 4] = [
        Protocol::Chat,
        Protocol::Vision,
        Protocol::Tools,
        Protocol::Embeddings,
    ];

    /// Wire / configuration name of the protocol
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Chat => "chat",
            Protocol::Vision => "vision",
            Protocol::Tools => "tools",
            Protocol::Embeddings => "embeddings",
        }
    }

    /// Whether requests of this protocol may be streamed
    pub fn supports_streaming(&self) -> bool {
        !matches!(self, Protocol::Embeddings)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a protocol name is not one of the known protocols
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown protocol '{0}'")]
pub struct UnknownProtocol(pub String);

impl FromStr for Protocol {
    type Err = UnknownProtocol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chat" => Ok(Protocol::Chat),
            "vision" => Ok(Protocol::Vision),
            "tools" => Ok(Protocol::Tools),
            "embeddings" => Ok(Protocol::Embeddings),
            other => Err(UnknownProtocol(other.to_string())),
        }
    }
}

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instructions that guide the model's behavior
    System,
    /// User input message
    User,
    /// Assistant (model) response
    Assistant,
}

/// Content of a message - plain text or structured parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text content
    Text(String),
    /// Structured content parts (multimodal turns)
    Parts(Vec<ContentPart>),
}

/// Individual content part for multimodal messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text content part
    Text { text: String },
    /// Image referenced by URL or data URI
    ImageUrl { image_url: ImageUrl },
}

/// Image reference inside an `image_url` content part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    /// HTTP(S) URL or `data:` URI
    pub url: String,

    /// Resolution hint (`auto`, `low`, `high`)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub detail: Option<String>,
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: MessageRole,

    /// Content of the message
    pub content: MessageContent,
}

impl Message {
    /// Create a message with text content
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

impl MessageContent {
    /// Check if content is empty
    pub fn is_empty(&self) -> bool {
        match self {
            MessageContent::Text(s) => s.is_empty(),
            MessageContent::Parts(parts) => parts.is_empty(),
        }
    }

    /// Get the content as plain text, if it is plain text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(s) => Some(s.as_str()),
            MessageContent::Parts(_) => None,
        }
    }

    /// First piece of text in the content, whichever form it takes
    pub fn first_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(s) => Some(s.as_str()),
            MessageContent::Parts(parts) => parts.iter().find_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                ContentPart::ImageUrl { .. } => None,
            }),
        }
    }

    /// All text of the content joined with newlines
    pub fn text(&self) -> String {
        match self {
            MessageContent::Text(s) => s.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl From<String> for MessageContent {
    fn from(value: String) -> Self {
        MessageContent::Text(value)
    }
}

impl From<&str> for MessageContent {
    fn from(value: &str) -> Self {
        MessageContent::Text(value.to_string())
    }
}

/// Function definition supplied through the `tools` option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Function name
    pub name: String,

    /// Human readable description shown to the model
    #[serde(default)]
    pub description: String,

    /// Parameters schema (JSON Schema)
    #[serde(default = "empty_parameters")]
    pub parameters: Value,
}

fn empty_parameters() -> Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

impl FunctionDefinition {
    /// Create a function definition
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Tool definition as it appears on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Type of tool (always "function")
    #[serde(rename = "type")]
    pub tool_type: String,

    /// Function definition
    pub function: FunctionDefinition,
}

impl From<FunctionDefinition> for ToolDefinition {
    fn from(function: FunctionDefinition) -> Self {
        Self {
            tool_type: "function".to_string(),
            function,
        }
    }
}

/// Chat-shaped request body (chat, vision and tools protocols)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model identifier injected by the client
    pub model: String,

    /// Messages in the conversation
    pub messages: Vec<Message>,

    /// Set to `true` by streaming builders, absent otherwise
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub stream: Option<bool>,

    /// Tool definitions for function calling
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tools: Option<Vec<ToolDefinition>>,

    /// Remaining options, emitted at the root of the body
    #[serde(flatten)]
    pub options: Options,
}

impl ChatRequest {
    /// Create a new chat request with model and messages
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: None,
            tools: None,
            options: Options::new(),
        }
    }

    /// Attach options
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Enable streaming
    pub fn with_streaming(mut self) -> Self {
        self.stream = Some(true);
        self
    }
}

/// Input of an embeddings request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmbeddingInput {
    /// A single text
    Single(String),
    /// Several texts embedded in one call
    Batch(Vec<String>),
}

impl EmbeddingInput {
    /// Number of texts in the input
    pub fn len(&self) -> usize {
        match self {
            EmbeddingInput::Single(_) => 1,
            EmbeddingInput::Batch(items) => items.len(),
        }
    }

    /// Whether the input holds no text at all
    pub fn is_empty(&self) -> bool {
        match self {
            EmbeddingInput::Single(s) => s.is_empty(),
            EmbeddingInput::Batch(items) => items.iter().all(|s| s.is_empty()),
        }
    }
}

/// Embeddings request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingsRequest {
    /// Model identifier injected by the client
    pub model: String,

    /// Text(s) to embed
    pub input: EmbeddingInput,

    /// Remaining options, emitted at the root of the body
    #[serde(flatten)]
    pub options: Options,
}

/// Body produced by a capability, ready to be handed to a provider
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProtocolRequest {
    /// Chat, vision and tools bodies
    Chat(ChatRequest),
    /// Embeddings bodies
    Embeddings(EmbeddingsRequest),
}

impl ProtocolRequest {
    /// Model name carried by the body
    pub fn model(&self) -> &str {
        match self {
            ProtocolRequest::Chat(req) => &req.model,
            ProtocolRequest::Embeddings(req) => &req.model,
        }
    }

    /// Whether the body asks for a streamed response
    pub fn is_streaming(&self) -> bool {
        match self {
            ProtocolRequest::Chat(req) => req.stream == Some(true),
            ProtocolRequest::Embeddings(_) => false,
        }
    }

    /// Serialize the body to JSON bytes
    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Serialize the body to a JSON value (handy for inspection and tests)
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}
