//! Vision format: chat with images attached to the last user turn

use super::error::{CapabilityError, CapabilityResult};
use super::options::{chat_descriptors, OptionDescriptor, TokenLimit};
use super::{decode, require_messages, Capability, StreamingCapability};
use crate::protocol::{
    ChatRequest, ContentPart, ImageUrl, Message, MessageContent, MessageRole, Options, Protocol,
    ProtocolRequest, ProtocolResponse,
};
use serde_json::{json, Value};

const IMAGES_KEY: &str = "images";
const DETAIL_KEY: &str = "detail";
const DEFAULT_DETAIL: &str = "auto";

/// Chat completion whose last user message carries images
#[derive(Debug, Clone)]
pub struct VisionCapability {
    name: String,
    descriptors: Vec<OptionDescriptor>,
}

impl VisionCapability {
    /// The `vision` format
    pub fn new() -> Self {
        Self::build("vision", TokenLimit::MaxTokens)
    }

    /// The `reasoning-vision` format
    pub fn reasoning() -> Self {
        Self::build("reasoning-vision", TokenLimit::MaxCompletionTokens)
    }

    fn build(name: &str, limit: TokenLimit) -> Self {
        let mut descriptors = chat_descriptors(limit);
        descriptors.push(OptionDescriptor::optional(IMAGES_KEY));
        descriptors.push(OptionDescriptor::with_default(DETAIL_KEY, json!(DEFAULT_DETAIL)));
        Self {
            name: name.to_string(),
            descriptors,
        }
    }

    /// Pull `images` out of the options; must be a non-empty array of strings
    fn take_images(&self, options: &mut Options) -> CapabilityResult<Vec<String>> {
        let value = options.remove(IMAGES_KEY).ok_or_else(|| {
            CapabilityError::invalid_option(&self.name, IMAGES_KEY, "at least one image is required")
        })?;

        let Value::Array(items) = value else {
            return Err(CapabilityError::invalid_option(
                &self.name,
                IMAGES_KEY,
                "expected an array of image URLs",
            ));
        };
        if items.is_empty() {
            return Err(CapabilityError::invalid_option(
                &self.name,
                IMAGES_KEY,
                "at least one image is required",
            ));
        }

        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::String(url) if !url.is_empty() => Ok(url),
                _ => Err(CapabilityError::invalid_option(
                    &self.name,
                    IMAGES_KEY,
                    format!("image {i} must be a non-empty URL or data URI string"),
                )),
            })
            .collect()
    }

    fn take_detail(&self, options: &mut Options) -> CapabilityResult<String> {
        match options.remove(DETAIL_KEY) {
            None | Some(Value::Null) => Ok(DEFAULT_DETAIL.to_string()),
            Some(Value::String(detail)) => Ok(detail),
            Some(_) => Err(CapabilityError::invalid_option(
                &self.name,
                DETAIL_KEY,
                "expected a string",
            )),
        }
    }

    /// Rewrite the last message into text + image parts
    fn attach_images(
        &self,
        messages: &[Message],
        images: Vec<String>,
        detail: &str,
    ) -> CapabilityResult<Vec<Message>> {
        let mut messages = messages.to_vec();
        let last = messages
            .last_mut()
            .ok_or_else(|| CapabilityError::invalid_messages(&self.name, "no message to attach images to"))?;

        if last.role != MessageRole::User {
            return Err(CapabilityError::invalid_messages(
                &self.name,
                "the last message must have role 'user' to carry images",
            ));
        }

        let mut parts = match std::mem::replace(&mut last.content, MessageContent::Parts(Vec::new())) {
            MessageContent::Text(text) => vec![ContentPart::Text { text }],
            MessageContent::Parts(parts) => parts,
        };
        parts.extend(images.into_iter().map(|url| ContentPart::ImageUrl {
            image_url: ImageUrl {
                url,
                detail: Some(detail.to_string()),
            },
        }));
        last.content = MessageContent::Parts(parts);

        Ok(messages)
    }
}

impl Default for VisionCapability {
    fn default() -> Self {
        Self::new()
    }
}

impl Capability for VisionCapability {
    fn name(&self) -> &str {
        &self.name
    }

    fn protocol(&self) -> Protocol {
        Protocol::Vision
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
        let images = self.take_images(&mut processed)?;
        let detail = self.take_detail(&mut processed)?;
        let messages = self.attach_images(messages, images, &detail)?;

        Ok(ProtocolRequest::Chat(
            ChatRequest::new(model, messages).with_options(processed),
        ))
    }

    fn parse_response(&self, body: &[u8]) -> CapabilityResult<ProtocolResponse> {
        decode(&self.name, body).map(ProtocolResponse::Chat)
    }
}

impl StreamingCapability for VisionCapability {
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
