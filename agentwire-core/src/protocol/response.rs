//! Response and streaming chunk types
//!
//! Every field a compatible server may omit carries a serde default, so that
//! minimal payloads such as `{"choices":[{"delta":{"content":"Hi"}}]}` still
//! decode.

use super::types::{MessageContent, MessageRole};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Token usage information
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens in the prompt
    #[serde(default)]
    pub prompt_tokens: u32,

    /// Tokens in the completion (absent for embeddings)
    #[serde(default)]
    pub completion_tokens: u32,

    /// Total tokens used
    #[serde(default)]
    pub total_tokens: u32,
}

/// Message returned inside a chat choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMessage {
    /// Role of the sender (normally assistant)
    pub role: MessageRole,

    /// Generated content, `null` when the model only called tools
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<MessageContent>,
}

/// Chat completion choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatChoice {
    /// Choice index
    #[serde(default)]
    pub index: usize,

    /// Generated message
    pub message: ResponseMessage,

    /// Finish reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Chat completion response (chat and vision protocols)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Unique response ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Object type (usually "chat.completion")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,

    /// Creation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,

    /// Model used for generation
    #[serde(default)]
    pub model: String,

    /// Response choices
    #[serde(default)]
    pub choices: Vec<ChatChoice>,

    /// Token usage information
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl ChatResponse {
    /// Text of the first choice
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_ref())
            .and_then(MessageContent::first_text)
    }
}

/// Function invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Name of the function to call
    pub name: String,

    /// Arguments to the function as a JSON-encoded string
    #[serde(default)]
    pub arguments: String,
}

impl FunctionCall {
    /// Decode the JSON-encoded arguments into a typed value
    pub fn parse_arguments<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.arguments)
    }
}

/// Tool call information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this tool call
    #[serde(default)]
    pub id: String,

    /// Type of tool (usually "function")
    #[serde(rename = "type", default = "function_type")]
    pub tool_type: String,

    /// Function information
    pub function: FunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

/// Message returned inside a tools choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolsMessage {
    /// Role of the sender (normally assistant)
    pub role: MessageRole,

    /// Optional text accompanying the calls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Requested tool calls
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

/// Tools completion choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolsChoice {
    /// Choice index
    #[serde(default)]
    pub index: usize,

    /// Generated message
    pub message: ToolsMessage,

    /// Finish reason (usually "tool_calls")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Function-calling response (tools protocol)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolsResponse {
    /// Unique response ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Object type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,

    /// Creation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,

    /// Model used for generation
    #[serde(default)]
    pub model: String,

    /// Response choices
    #[serde(default)]
    pub choices: Vec<ToolsChoice>,

    /// Token usage information
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl ToolsResponse {
    /// Tool calls of the first choice
    pub fn tool_calls(&self) -> &[ToolCall] {
        self.choices
            .first()
            .map(|choice| choice.message.tool_calls.as_slice())
            .unwrap_or(&[])
    }

    /// Text of the first choice, if the model answered in prose
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
    }
}

/// One embedding vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    /// The vector
    pub embedding: Vec<f32>,

    /// Position of the input this vector belongs to
    #[serde(default)]
    pub index: usize,

    /// Object type (usually "embedding")
    #[serde(default)]
    pub object: String,
}

/// Embeddings response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingsResponse {
    /// Object type (usually "list")
    #[serde(default)]
    pub object: String,

    /// One entry per input text
    #[serde(default)]
    pub data: Vec<Embedding>,

    /// Model used
    #[serde(default)]
    pub model: String,

    /// Token usage information
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl EmbeddingsResponse {
    /// Vectors ordered by input index
    pub fn vectors(&self) -> Vec<&[f32]> {
        let mut data: Vec<&Embedding> = self.data.iter().collect();
        data.sort_by_key(|e| e.index);
        data.into_iter().map(|e| e.embedding.as_slice()).collect()
    }
}

/// Parsed buffered response, one variant per response shape
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolResponse {
    /// Chat and vision responses
    Chat(ChatResponse),
    /// Tools responses
    Tools(ToolsResponse),
    /// Embeddings responses
    Embeddings(EmbeddingsResponse),
}

impl ProtocolResponse {
    /// Take the chat response, if that is what this is
    pub fn into_chat(self) -> Option<ChatResponse> {
        match self {
            ProtocolResponse::Chat(resp) => Some(resp),
            _ => None,
        }
    }

    /// Take the tools response, if that is what this is
    pub fn into_tools(self) -> Option<ToolsResponse> {
        match self {
            ProtocolResponse::Tools(resp) => Some(resp),
            _ => None,
        }
    }

    /// Take the embeddings response, if that is what this is
    pub fn into_embeddings(self) -> Option<EmbeddingsResponse> {
        match self {
            ProtocolResponse::Embeddings(resp) => Some(resp),
            _ => None,
        }
    }

    /// Model name reported by the server
    pub fn model(&self) -> &str {
        match self {
            ProtocolResponse::Chat(resp) => &resp.model,
            ProtocolResponse::Tools(resp) => &resp.model,
            ProtocolResponse::Embeddings(resp) => &resp.model,
        }
    }
}

/// Function call delta for streaming
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallDelta {
    /// Function name (only in first chunk)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Arguments delta
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

/// Tool call delta for streaming
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallDelta {
    /// Index in the tool calls array
    #[serde(default)]
    pub index: usize,

    /// Tool call ID (only in first chunk)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Tool type (only in first chunk)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub tool_type: Option<String>,

    /// Function delta
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<FunctionCallDelta>,
}

/// Delta message for streaming
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    /// Role (only in first chunk)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<MessageRole>,

    /// Content delta
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Tool calls delta
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

/// Streaming choice with delta
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamingChoice {
    /// Choice index
    #[serde(default)]
    pub index: usize,

    /// Delta message content
    #[serde(default)]
    pub delta: Delta,

    /// Finish reason (only in final chunk)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// One decoded SSE frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamingChunk {
    /// Unique response ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Object type (usually "chat.completion.chunk")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,

    /// Creation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,

    /// Model used
    #[serde(default)]
    pub model: String,

    /// Delta choices
    #[serde(default)]
    pub choices: Vec<StreamingChoice>,

    /// Usage (only in final chunk if requested)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl StreamingChunk {
    /// Content delta of the first choice
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
    }

    /// Finish reason of the first choice
    pub fn finish_reason(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.finish_reason.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_chat_response() {
        let resp: ChatResponse = serde_json::from_value(json!({
            "model": "m",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "ok"}}]
        }))
        .unwrap();

        assert_eq!(resp.content(), Some("ok"));
        assert!(resp.id.is_none());
        assert!(resp.usage.is_none());
    }

    #[test]
    fn test_minimal_stream_chunk() {
        let chunk: StreamingChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{"content":"Hel"}}]}"#).unwrap();

        assert_eq!(chunk.content(), Some("Hel"));
        assert_eq!(chunk.model, "");
        assert_eq!(chunk.choices[0].index, 0);
    }

    #[test]
    fn test_tool_call_arguments() {
        let resp: ToolsResponse = serde_json::from_value(json!({
            "model": "m",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "wx", "arguments": "{\"city\":\"Oslo\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        }))
        .unwrap();

        let calls = resp.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].function.name, "wx");
        let args: serde_json::Value = calls[0].function.parse_arguments().unwrap();
        assert_eq!(args["city"], "Oslo");
        assert_eq!(resp.content(), None);
    }

    #[test]
    fn test_embeddings_vectors_ordered() {
        let resp: EmbeddingsResponse = serde_json::from_value(json!({
            "object": "list",
            "data": [
                {"embedding": [0.5], "index": 1, "object": "embedding"},
                {"embedding": [0.25], "index": 0, "object": "embedding"}
            ],
            "model": "e",
            "usage": {"prompt_tokens": 3, "total_tokens": 3}
        }))
        .unwrap();

        assert_eq!(resp.vectors(), vec![&[0.25f32][..], &[0.5f32][..]]);
        assert_eq!(resp.usage.unwrap().completion_tokens, 0);
    }
}
