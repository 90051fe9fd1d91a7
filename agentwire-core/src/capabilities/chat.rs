//! Chat completion format

use super::error::CapabilityResult;
use super::options::{chat_descriptors, OptionDescriptor, TokenLimit};
use super::{decode, require_messages, Capability, StreamingCapability};
use crate::protocol::{ChatRequest, Message, Options, Protocol, ProtocolRequest, ProtocolResponse};

/// Plain conversational completion
#[derive(Debug, Clone)]
pub struct ChatCapability {
    name: String,
    descriptors: Vec<OptionDescriptor>,
}

impl ChatCapability {
    /// The `chat` format
    pub fn new() -> Self {
        Self::with_descriptors("chat", chat_descriptors(TokenLimit::MaxTokens))
    }

    /// The `reasoning-chat` format
    pub fn reasoning() -> Self {
        Self::with_descriptors(
            "reasoning-chat",
            chat_descriptors(TokenLimit::MaxCompletionTokens),
        )
    }

    /// A chat-shaped format with its own name and option set
    pub fn with_descriptors(name: impl Into<String>, descriptors: Vec<OptionDescriptor>) -> Self {
        Self {
            name: name.into(),
            descriptors,
        }
    }
}

impl Default for ChatCapability {
    fn default() -> Self {
        Self::new()
    }
}

impl Capability for ChatCapability {
    fn name(&self) -> &str {
        &self.name
    }

    fn protocol(&self) -> Protocol {
        Protocol::Chat
    }

    fn descriptors(&self) -> &[OptionDescriptor] {
        &self.descriptors
    }

    fn create_request(
        &self,
        messages: &[Message],
        options: &Options,
        model: &str,
    ) -> CapabilityResult<ProtocolRequest> {
        require_messages(&self.name, messages)?;
        let processed = self.process_options(options)?;
        Ok(ProtocolRequest::Chat(
            ChatRequest::new(model, messages.to_vec()).with_options(processed),
        ))
    }

    fn parse_response(&self, body: &[u8]) -> CapabilityResult<ProtocolResponse> {
        decode(&self.name, body).map(ProtocolResponse::Chat)
    }
}

impl StreamingCapability for ChatCapability {
    fn create_streaming_request(
        &self,
        messages: &[Message],
        options: &Options,
        model: &str,
    ) -> CapabilityResult<ProtocolRequest> {
        match self.create_request(messages, options, model)? {
            ProtocolRequest::Chat(request) => Ok(ProtocolRequest::Chat(request.with_streaming())),
            other => Ok(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_buffered_body_shape() {
        let capability = ChatCapability::new();
        let options = json!({"temperature": 0.9, "max_tokens": 4096})
            .as_object()
            .cloned()
            .unwrap();

        let body = capability
            .create_request(&[Message::user("hi")], &options, "m")
            .unwrap()
            .to_value()
            .unwrap();

        assert_eq!(
            body,
            json!({
                "model": "m",
                "messages": [{"role": "user", "content": "hi"}],
                "temperature": 0.9,
                "max_tokens": 4096
            })
        );
    }

    #[test]
    fn test_streaming_body_sets_stream() {
        let capability = ChatCapability::new();
        let request = capability
            .create_streaming_request(&[Message::user("hi")], &Options::new(), "m")
            .unwrap();

        assert!(request.is_streaming());
        assert_eq!(request.to_value().unwrap()["stream"], true);
    }

    #[test]
    fn test_reasoning_rejects_max_tokens() {
        let capability = ChatCapability::reasoning();
        let options = json!({"max_tokens": 10}).as_object().cloned().unwrap();
        assert!(capability.validate_options(&options).is_err());

        let options = json!({"max_completion_tokens": 10, "reasoning_effort": "low"})
            .as_object()
            .cloned()
            .unwrap();
        assert!(capability.validate_options(&options).is_ok());
    }

    #[test]
    fn test_empty_conversation_rejected() {
        let capability = ChatCapability::new();
        assert!(capability.create_request(&[], &Options::new(), "m").is_err());
    }
}
