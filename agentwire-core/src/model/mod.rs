//! Model: a named binding from protocols to capability handlers
//!
//! Each handler pairs a capability with the model's default options for that
//! protocol. Request options are merged over those defaults per call; the
//! stored defaults are never touched by a request.

use crate::capabilities::options::merge;
use crate::capabilities::{CapabilityError, CapabilityHandle, CapabilityRegistry};
use crate::config::ModelConfig;
use crate::protocol::{Options, Protocol, UnknownProtocol};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Errors raised while building or querying a model
#[derive(Debug, Error)]
pub enum ModelError {
    /// Configuration names a protocol that does not exist
    #[error("model '{model}': {source}")]
    UnknownProtocol {
        model: String,
        #[source]
        source: UnknownProtocol,
    },

    /// Model has no handler for the protocol
    #[error("model '{model}': protocol '{protocol}' not supported")]
    UnsupportedProtocol { model: String, protocol: Protocol },

    /// Format bound to a protocol serves a different protocol
    #[error("model '{model}': format '{format}' serves '{actual}', not '{expected}'")]
    ProtocolMismatch {
        model: String,
        format: String,
        expected: Protocol,
        actual: Protocol,
    },

    /// Capability lookup or option validation failed
    #[error("model '{model}': {source}")]
    Capability {
        model: String,
        #[source]
        source: CapabilityError,
    },
}

/// A capability plus the model's stored options for one protocol
#[derive(Debug, Clone)]
pub struct ProtocolHandler {
    capability: CapabilityHandle,
    options: Options,
}

impl ProtocolHandler {
    /// Create a handler holding its own copy of `options`
    pub fn new(capability: CapabilityHandle, options: &Options) -> Self {
        Self {
            capability,
            options: options.clone(),
        }
    }

    /// The bound capability
    pub fn capability(&self) -> &CapabilityHandle {
        &self.capability
    }

    /// The stored options
    pub fn options(&self) -> &Options {
        &self.options
    }
}

/// A model name plus its protocol handlers
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    handlers: BTreeMap<Protocol, ProtocolHandler>,
}

impl Model {
    /// Create a model without any protocol support
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handlers: BTreeMap::new(),
        }
    }

    /// Bind a capability to a protocol (builder style)
    pub fn with_handler(
        mut self,
        protocol: Protocol,
        capability: CapabilityHandle,
        options: &Options,
    ) -> Self {
        self.handlers
            .insert(protocol, ProtocolHandler::new(capability, options));
        self
    }

    /// Build a model from configuration using the global capability registry
    pub fn from_config(config: &ModelConfig) -> Result<Self, ModelError> {
        Self::from_config_with(config, CapabilityRegistry::global())
    }

    /// Build a model from configuration using an explicit registry
    pub fn from_config_with(
        config: &ModelConfig,
        registry: &CapabilityRegistry,
    ) -> Result<Self, ModelError> {
        let mut model = Self::new(&config.name);

        for (protocol_name, binding) in &config.capabilities {
            let protocol: Protocol =
                protocol_name
                    .parse()
                    .map_err(|source| ModelError::UnknownProtocol {
                        model: config.name.clone(),
                        source,
                    })?;

            let capability =
                registry
                    .get(&binding.format)
                    .map_err(|source| ModelError::Capability {
                        model: config.name.clone(),
                        source,
                    })?;

            if capability.protocol() != protocol {
                return Err(ModelError::ProtocolMismatch {
                    model: config.name.clone(),
                    format: binding.format.clone(),
                    expected: protocol,
                    actual: capability.protocol(),
                });
            }

            // required keys may still arrive per call, so only unknown keys are checked
            let declared = capability.capability().descriptors();
            if let Some(key) = binding
                .options
                .keys()
                .find(|key| !declared.iter().any(|d| &d.key == *key))
            {
                return Err(ModelError::Capability {
                    model: config.name.clone(),
                    source: CapabilityError::UnknownOption {
                        capability: binding.format.clone(),
                        key: key.clone(),
                    },
                });
            }

            debug!(
                "Model '{}' binds {} to format '{}'",
                config.name, protocol, binding.format
            );
            model
                .handlers
                .insert(protocol, ProtocolHandler::new(capability, &binding.options));
        }

        Ok(model)
    }

    /// Model name sent upstream
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Protocols this model has handlers for
    pub fn protocols(&self) -> Vec<Protocol> {
        self.handlers.keys().copied().collect()
    }

    /// Whether the model has a handler for `protocol`
    pub fn supports(&self, protocol: Protocol) -> bool {
        self.handlers.contains_key(&protocol)
    }

    /// Capability bound to `protocol`
    pub fn capability(&self, protocol: Protocol) -> Result<&CapabilityHandle, ModelError> {
        self.handler(protocol).map(ProtocolHandler::capability)
    }

    /// Stored options for `protocol` (borrowed, for inspection)
    pub fn options(&self, protocol: Protocol) -> Option<&Options> {
        self.handlers.get(&protocol).map(ProtocolHandler::options)
    }

    /// Validate `options` and overlay them onto the stored options
    pub fn update_options(&mut self, protocol: Protocol, options: &Options) -> Result<(), ModelError> {
        let model = self.name.clone();
        let handler = self
            .handlers
            .get_mut(&protocol)
            .ok_or_else(|| ModelError::UnsupportedProtocol {
                model: model.clone(),
                protocol,
            })?;

        handler
            .capability
            .capability()
            .validate_options(options)
            .map_err(|source| ModelError::Capability { model, source })?;

        for (key, value) in options {
            handler.options.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    /// Fresh map: stored options first, then `options` on top.
    ///
    /// Neither input is modified. For a protocol without handler the result is
    /// a copy of `options`.
    pub fn merge_request_options(&self, protocol: Protocol, options: &Options) -> Options {
        match self.handlers.get(&protocol) {
            Some(handler) => merge(&handler.options, options),
            None => options.clone(),
        }
    }

    fn handler(&self, protocol: Protocol) -> Result<&ProtocolHandler, ModelError> {
        self.handlers
            .get(&protocol)
            .ok_or_else(|| ModelError::UnsupportedProtocol {
                model: self.name.clone(),
                protocol,
            })
    }
}
