//! Embeddings format

use super::error::{CapabilityError, CapabilityResult};
use super::options::OptionDescriptor;
use super::{decode, Capability};
use crate::protocol::{
    EmbeddingInput, EmbeddingsRequest, Message, Options, Protocol, ProtocolRequest,
    ProtocolResponse,
};
use serde_json::Value;

const INPUT_KEY: &str = "input";

/// Vector embeddings; buffered only
#[derive(Debug, Clone)]
pub struct EmbeddingsCapability {
    name: String,
    descriptors: Vec<OptionDescriptor>,
}

impl EmbeddingsCapability {
    /// The `embeddings` format
    pub fn new() -> Self {
        Self {
            name: "embeddings".to_string(),
            descriptors: vec![
                OptionDescriptor::optional(INPUT_KEY),
                OptionDescriptor::optional("encoding_format"),
                OptionDescriptor::optional("dimensions"),
                OptionDescriptor::optional("user"),
            ],
        }
    }

    /// Input from the `input` option, or else from the message texts
    fn resolve_input(
        &self,
        messages: &[Message],
        options: &mut Options,
    ) -> CapabilityResult<EmbeddingInput> {
        let input = match options.remove(INPUT_KEY) {
            Some(Value::String(text)) => EmbeddingInput::Single(text),
            Some(Value::Array(items)) => EmbeddingInput::Batch(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(text) => Ok(text),
                        _ => Err(CapabilityError::invalid_option(
                            &self.name,
                            INPUT_KEY,
                            "expected an array of strings",
                        )),
                    })
                    .collect::<CapabilityResult<Vec<_>>>()?,
            ),
            Some(Value::Null) | None => {
                let mut texts: Vec<String> =
                    messages.iter().map(|m| m.content.text()).collect();
                match texts.len() {
                    0 => {
                        return Err(CapabilityError::invalid_messages(
                            &self.name,
                            "no input text to embed",
                        ))
                    }
                    1 => EmbeddingInput::Single(texts.remove(0)),
                    _ => EmbeddingInput::Batch(texts),
                }
            }
            Some(_) => {
                return Err(CapabilityError::invalid_option(
                    &self.name,
                    INPUT_KEY,
                    "expected a string or an array of strings",
                ))
            }
        };

        if input.is_empty() {
            return Err(CapabilityError::invalid_option(
                &self.name,
                INPUT_KEY,
                "input text is empty",
            ));
        }
        Ok(input)
    }
}

impl Default for EmbeddingsCapability {
    fn default() -> Self {
        Self::new()
    }
}

impl Capability for EmbeddingsCapability {
    fn name(&self) -> &str {
        &self.name
    }

    fn protocol(&self) -> Protocol {
        Protocol::Embeddings
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
        let mut processed = self.process_options(options)?;
        let input = self.resolve_input(messages, &mut processed)?;

        Ok(ProtocolRequest::Embeddings(EmbeddingsRequest {
            model: model.to_string(),
            input,
            options: processed,
        }))
    }

    fn parse_response(&self, body: &[u8]) -> CapabilityResult<ProtocolResponse> {
        decode(&self.name, body).map(ProtocolResponse::Embeddings)
    }
}
