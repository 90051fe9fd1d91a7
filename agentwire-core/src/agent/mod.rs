//! Agent: the user-facing façade over a transport client
//!
//! An agent prepends its system prompt to every conversation and exposes one
//! method per protocol, buffered and streaming. Tool calls in responses are
//! returned to the caller, never executed.

use crate::config::AgentConfig;
use crate::http::{ChunkStream, ClientError, ClientRequest, ClientResult, TransportClient};
use crate::protocol::{
    ChatResponse, EmbeddingsResponse, FunctionDefinition, Message, MessageRole, Options, Protocol,
    ProtocolResponse, ToolsResponse,
};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Named agent with an optional system prompt
#[derive(Debug)]
pub struct Agent {
    name: String,
    system_prompt: Option<String>,
    client: TransportClient,
}

impl Agent {
    /// Create an agent without a system prompt
    pub fn new(name: impl Into<String>, client: TransportClient) -> Self {
        Self {
            name: name.into(),
            system_prompt: None,
            client,
        }
    }

    /// Set the system prompt (builder style)
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Build the agent, its transport client and provider from configuration
    pub fn from_config(config: &AgentConfig) -> ClientResult<Self> {
        let client = TransportClient::from_config(&config.transport)?;
        info!(
            "Agent '{}' using provider {} with model '{}'",
            config.name,
            client.provider().name(),
            client.model().name()
        );

        Ok(Self {
            name: config.name.clone(),
            system_prompt: config.system_prompt.clone(),
            client,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    /// The underlying transport client
    pub fn client(&self) -> &TransportClient {
        &self.client
    }

    /// Buffered chat completion
    pub async fn chat(
        &self,
        cancel: &CancellationToken,
        messages: Vec<Message>,
        options: Options,
    ) -> ClientResult<ChatResponse> {
        let response = self.execute(cancel, Protocol::Chat, messages, options).await?;
        response
            .into_chat()
            .ok_or(ClientError::UnexpectedResponse(Protocol::Chat))
    }

    /// Streaming chat completion
    pub async fn chat_stream(
        &self,
        cancel: &CancellationToken,
        messages: Vec<Message>,
        options: Options,
    ) -> ClientResult<ChunkStream> {
        self.stream(cancel, Protocol::Chat, messages, options).await
    }

    /// Buffered chat about `images` (URLs or data URIs)
    pub async fn vision(
        &self,
        cancel: &CancellationToken,
        messages: Vec<Message>,
        images: Vec<String>,
        options: Options,
    ) -> ClientResult<ChatResponse> {
        let options = with_images(options, images);
        let response = self.execute(cancel, Protocol::Vision, messages, options).await?;
        response
            .into_chat()
            .ok_or(ClientError::UnexpectedResponse(Protocol::Vision))
    }

    /// Streaming chat about `images`
    pub async fn vision_stream(
        &self,
        cancel: &CancellationToken,
        messages: Vec<Message>,
        images: Vec<String>,
        options: Options,
    ) -> ClientResult<ChunkStream> {
        let options = with_images(options, images);
        self.stream(cancel, Protocol::Vision, messages, options).await
    }

    /// Buffered chat offering `tools`; tool calls come back unexecuted
    pub async fn tools(
        &self,
        cancel: &CancellationToken,
        messages: Vec<Message>,
        tools: Vec<FunctionDefinition>,
        options: Options,
    ) -> ClientResult<ToolsResponse> {
        let options = with_tools(options, tools);
        let response = self.execute(cancel, Protocol::Tools, messages, options).await?;
        response
            .into_tools()
            .ok_or(ClientError::UnexpectedResponse(Protocol::Tools))
    }

    /// Streaming chat offering `tools`
    pub async fn tools_stream(
        &self,
        cancel: &CancellationToken,
        messages: Vec<Message>,
        tools: Vec<FunctionDefinition>,
        options: Options,
    ) -> ClientResult<ChunkStream> {
        let options = with_tools(options, tools);
        self.stream(cancel, Protocol::Tools, messages, options).await
    }

    /// Embed `input`; the system prompt does not apply
    pub async fn embed(
        &self,
        cancel: &CancellationToken,
        input: Vec<String>,
        mut options: Options,
    ) -> ClientResult<EmbeddingsResponse> {
        let input = match <[String; 1]>::try_from(input) {
            Ok([single]) => Value::String(single),
            Err(many) => Value::from(many),
        };
        options.insert("input".to_string(), input);

        let request = ClientRequest::new(Protocol::Embeddings, Vec::new()).with_options(options);
        self.client
            .execute(cancel, &request)
            .await?
            .into_embeddings()
            .ok_or(ClientError::UnexpectedResponse(Protocol::Embeddings))
    }

    async fn execute(
        &self,
        cancel: &CancellationToken,
        protocol: Protocol,
        messages: Vec<Message>,
        options: Options,
    ) -> ClientResult<ProtocolResponse> {
        let request = ClientRequest::new(protocol, self.conversation(messages)).with_options(options);
        self.client.execute(cancel, &request).await
    }

    async fn stream(
        &self,
        cancel: &CancellationToken,
        protocol: Protocol,
        messages: Vec<Message>,
        options: Options,
    ) -> ClientResult<ChunkStream> {
        let request = ClientRequest::new(protocol, self.conversation(messages)).with_options(options);
        self.client.execute_stream(cancel, &request).await
    }

    /// System prompt first, unless the caller already supplied one
    fn conversation(&self, messages: Vec<Message>) -> Vec<Message> {
        let prompt = match self.system_prompt.as_deref() {
            Some(prompt) if !prompt.is_empty() => prompt,
            _ => return messages,
        };
        if messages
            .first()
            .is_some_and(|first| first.role == MessageRole::System)
        {
            return messages;
        }

        let mut conversation = Vec::with_capacity(messages.len() + 1);
        conversation.push(Message::system(prompt));
        conversation.extend(messages);
        conversation
    }
}

fn with_images(mut options: Options, images: Vec<String>) -> Options {
    options.insert("images".to_string(), Value::from(images));
    options
}

fn with_tools(mut options: Options, tools: Vec<FunctionDefinition>) -> Options {
    let tools: Vec<Value> = tools
        .into_iter()
        .map(|tool| {
            json!({
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.parameters,
            })
        })
        .collect();
    options.insert("tools".to_string(), Value::Array(tools));
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ModelConfig, ProviderConfig, TransportConfig};

    fn agent(prompt: Option<&str>) -> Agent {
        let model = ModelConfig::new("m").with_capability(Protocol::Chat, "chat", Options::new());
        let transport =
            TransportConfig::new(ProviderConfig::new("local", "http://localhost:11434", model));
        let agent = Agent::new("a", TransportClient::from_config(&transport).unwrap());
        match prompt {
            Some(prompt) => agent.with_system_prompt(prompt),
            None => agent,
        }
    }

    #[test]
    fn test_system_prompt_prepended() {
        let conversation = agent(Some("be brief")).conversation(vec![Message::user("hi")]);
        assert_eq!(
            conversation,
            vec![Message::system("be brief"), Message::user("hi")]
        );
    }

    #[test]
    fn test_existing_system_message_kept() {
        let messages = vec![Message::system("custom"), Message::user("hi")];
        assert_eq!(agent(Some("be brief")).conversation(messages.clone()), messages);
        assert_eq!(agent(Some("")).conversation(vec![Message::user("hi")]).len(), 1);
        assert_eq!(agent(None).conversation(vec![Message::user("hi")]).len(), 1);
    }

    #[test]
    fn test_tools_option_shape() {
        let options = with_tools(
            Options::new(),
            vec![FunctionDefinition::new("wx", "weather", json!({"type": "object"}))],
        );
        assert_eq!(
            options["tools"],
            json!([{"name": "wx", "description": "weather", "parameters": {"type": "object"}}])
        );
    }
}
