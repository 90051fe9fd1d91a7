//! Option descriptors and the shared validate → default pipeline

use super::error::{CapabilityError, CapabilityResult};
use crate::protocol::Options;
use serde_json::Value;

/// Declaration of one option a capability accepts
#[derive(Debug, Clone, PartialEq)]
pub struct OptionDescriptor {
    /// Option key as it appears in the options map
    pub key: String,

    /// Whether the key must be present
    pub required: bool,

    /// Value inserted when the caller omits the key
    pub default: Option<Value>,
}

impl OptionDescriptor {
    /// Optional key without default
    pub fn optional(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            required: false,
            default: None,
        }
    }

    /// Key that must always be supplied
    pub fn required(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            required: true,
            default: None,
        }
    }

    /// Optional key with a default value
    pub fn with_default(key: impl Into<String>, default: Value) -> Self {
        Self {
            key: key.into(),
            required: false,
            default: Some(default),
        }
    }
}

/// Reject unknown keys and missing required keys
pub fn validate(
    capability: &str,
    descriptors: &[OptionDescriptor],
    options: &Options,
) -> CapabilityResult<()> {
    if let Some(key) = options
        .keys()
        .find(|key| !descriptors.iter().any(|d| &d.key == *key))
    {
        return Err(CapabilityError::UnknownOption {
            capability: capability.to_string(),
            key: key.clone(),
        });
    }

    if let Some(descriptor) = descriptors
        .iter()
        .find(|d| d.required && !options.contains_key(&d.key))
    {
        return Err(CapabilityError::MissingOption {
            capability: capability.to_string(),
            key: descriptor.key.clone(),
        });
    }

    Ok(())
}

/// Copy of `options` with defaults filled in for absent keys.
///
/// A key present with a `null` value is kept as is.
pub fn apply_defaults(descriptors: &[OptionDescriptor], options: &Options) -> Options {
    let mut processed = options.clone();
    for descriptor in descriptors {
        if let Some(default) = &descriptor.default {
            if !processed.contains_key(&descriptor.key) {
                processed.insert(descriptor.key.clone(), default.clone());
            }
        }
    }
    processed
}

/// Overlay `overlay` onto a copy of `base`; present keys overwrite
pub fn merge(base: &Options, overlay: &Options) -> Options {
    let mut merged = base.clone();
    for (key, value) in overlay {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Which token-limit key a chat-shaped format uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenLimit {
    /// Classic `max_tokens`
    MaxTokens,
    /// Reasoning models: `max_completion_tokens` plus `reasoning_effort`
    MaxCompletionTokens,
}

/// Sampling options shared by chat, vision and tools formats
pub fn chat_descriptors(limit: TokenLimit) -> Vec<OptionDescriptor> {
    let mut descriptors = Vec::new();
    match limit {
        TokenLimit::MaxTokens => descriptors.push(OptionDescriptor::optional("max_tokens")),
        TokenLimit::MaxCompletionTokens => {
            descriptors.push(OptionDescriptor::optional("max_completion_tokens"));
            descriptors.push(OptionDescriptor::optional("reasoning_effort"));
        }
    }
    descriptors.extend(
        [
            "temperature",
            "top_p",
            "frequency_penalty",
            "presence_penalty",
            "stop",
            "seed",
            "n",
            "user",
            "response_format",
            "logprobs",
            "top_logprobs",
            "stream_options",
        ]
        .into_iter()
        .map(OptionDescriptor::optional),
    );
    descriptors
}
