//! Tools format: chat with function definitions

use super::error::{CapabilityError, CapabilityResult};
use super::options::{chat_descriptors, OptionDescriptor, TokenLimit};
use super::{decode, require_messages, Capability, StreamingCapability};
use crate::protocol::{
    ChatRequest, FunctionDefinition, Message, Options, Protocol, ProtocolRequest,
    ProtocolResponse, ToolDefinition,
};
use serde_json::{json, Value};

const TOOLS_KEY: &str = "tools";

/// Chat completion that may answer with tool calls
#[derive(Debug, Clone)]
pub struct ToolsCapability {
    name: String,
    descriptors: Vec<OptionDescriptor>,
}

impl ToolsCapability {
    /// The `tools` format
    pub fn new() -> Self {
        Self::build("tools", TokenLimit::MaxTokens)
    }

    /// The `reasoning-tools` format
    pub fn reasoning() -> Self {
        Self::build("reasoning-tools", TokenLimit::MaxCompletionTokens)
    }

    fn build(name: &str, limit: TokenLimit) -> Self {
        let mut descriptors = chat_descriptors(limit);
        descriptors.push(OptionDescriptor::optional(TOOLS_KEY));
        descriptors.push(OptionDescriptor::with_default("tool_choice", json!("auto")));
        descriptors.push(OptionDescriptor::optional("parallel_tool_calls"));
        Self {
            name: name.to_string(),
            descriptors,
        }
    }

    /// Pull `tools` out of the options and wrap each entry as a function tool
    fn take_tools(&self, options: &mut Options) -> CapabilityResult<Vec<ToolDefinition>> {
        let value = options.remove(TOOLS_KEY).ok_or_else(|| {
            CapabilityError::invalid_option(&self.name, TOOLS_KEY, "at least one tool is required")
        })?;

        let Value::Array(items) = value else {
            return Err(CapabilityError::invalid_option(
                &self.name,
                TOOLS_KEY,
                "expected an array of function definitions",
            ));
        };
        if items.is_empty() {
            return Err(CapabilityError::invalid_option(
                &self.name,
                TOOLS_KEY,
                "at least one tool is required",
            ));
        }

        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| self.parse_tool(i, item))
            .collect()
    }

    fn parse_tool(&self, index: usize, item: Value) -> CapabilityResult<ToolDefinition> {
        // Already wrapped entries ({type, function}) are accepted as-is
        let function = match item {
            Value::Object(mut map) if map.contains_key("function") => map
                .remove("function")
                .unwrap_or(Value::Null),
            other => other,
        };

        let function: FunctionDefinition = serde_json::from_value(function).map_err(|e| {
            CapabilityError::invalid_option(
                &self.name,
                TOOLS_KEY,
                format!("tool {index} is not a function definition: {e}"),
            )
        })?;
        if function.name.is_empty() {
            return Err(CapabilityError::invalid_option(
                &self.name,
                TOOLS_KEY,
                format!("tool {index} has an empty name"),
            ));
        }

        Ok(ToolDefinition::from(function))
    }
}

impl Default for ToolsCapability {
    fn default() -> Self {
        Self::new()
    }
}

impl Capability for ToolsCapability {
    fn name(&self) -> &str {
        &self.name
    }

    fn protocol(&self) -> Protocol {
        Protocol::Tools
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
        let mut processed = self.process_options(options)?;
        let tools = self.take_tools(&mut processed)?;

        let mut request = ChatRequest::new(model, messages.to_vec()).with_options(processed);
        request.tools = Some(tools);
        Ok(ProtocolRequest::Chat(request))
    }

    fn parse_response(&self, body: &[u8]) -> CapabilityResult<ProtocolResponse> {
        decode(&self.name, body).map(ProtocolResponse::Tools)
    }
}

impl StreamingCapability for ToolsCapability {
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
