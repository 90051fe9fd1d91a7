//! Configuration schema structures with serde support

use super::duration;
use super::error::ValidationError;
use super::secrets::redact_options;
use crate::protocol::{Options, Protocol};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Root configuration: one agent over one transport
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Agent name, used in logs
    pub name: String,

    /// Prepended to every conversation as a system message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Transport settings, including the provider
    pub transport: TransportConfig,
}

/// Transport client settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TransportConfig {
    /// Upstream provider
    pub provider: ProviderConfig,

    /// Whole-request timeout
    #[serde(default = "default_timeout", with = "duration")]
    pub timeout: Duration,

    /// Total number of attempts for buffered requests
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry; doubles on each further retry
    #[serde(default = "default_retry_backoff_base", with = "duration")]
    pub retry_backoff_base: Duration,

    /// Idle connections kept per host
    #[serde(default = "default_connection_pool_size")]
    pub connection_pool_size: usize,

    /// How long an idle pooled connection is kept
    #[serde(default = "default_connection_timeout", with = "duration")]
    pub connection_timeout: Duration,
}

/// Upstream provider binding
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Registered provider name (`local`, `ollama`, `azure`)
    pub name: String,

    /// Service base URL
    pub base_url: String,

    /// Model served through this provider
    pub model: ModelConfig,

    /// Provider-specific options (auth, deployment, ...)
    #[serde(default, skip_serializing_if = "Options::is_empty")]
    pub options: Options,
}

/// Model name plus protocol bindings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Model name sent upstream
    pub name: String,

    /// Protocol name → capability binding
    #[serde(default)]
    pub capabilities: BTreeMap<String, CapabilityConfig>,
}

/// Capability format plus default options for one protocol
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CapabilityConfig {
    /// Registered capability format name
    pub format: String,

    /// Default request options
    #[serde(default, skip_serializing_if = "Options::is_empty")]
    pub options: Options,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("options", &redact_options(&self.options))
            .finish()
    }
}

// Default value functions for serde
fn default_timeout() -> Duration { Duration::from_secs(120) }
fn default_max_retries() -> u32 { 3 }
fn default_retry_backoff_base() -> Duration { Duration::from_secs(1) }
fn default_connection_pool_size() -> usize { 10 }
fn default_connection_timeout() -> Duration { Duration::from_secs(90) }

impl TransportConfig {
    /// Transport settings with default timeouts, retries and pool size
    pub fn new(provider: ProviderConfig) -> Self {
        Self {
            provider,
            timeout: default_timeout(),
            max_retries: default_max_retries(),
            retry_backoff_base: default_retry_backoff_base(),
            connection_pool_size: default_connection_pool_size(),
            connection_timeout: default_connection_timeout(),
        }
    }

    /// Validate transport settings
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.timeout.is_zero() {
            return Err(ValidationError::out_of_range(
                format!("{}.timeout", path),
                "Timeout must be greater than zero",
            ));
        }

        if self.max_retries == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.max_retries", path),
                "At least one attempt is required",
            ));
        }

        self.provider.validate(&format!("{}.provider", path))
    }
}

impl AgentConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::missing("name"));
        }

        self.transport.validate("transport")
    }
}

impl ProviderConfig {
    /// Provider binding with no options
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, model: ModelConfig) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            model,
            options: Options::new(),
        }
    }

    /// Validate provider configuration
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::missing(format!("{}.name", path)));
        }

        if self.base_url.is_empty() {
            return Err(ValidationError::missing(format!("{}.base_url", path)));
        }

        match url::Url::parse(&self.base_url) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    return Err(ValidationError::invalid(
                        format!("{}.base_url", path),
                        format!("scheme must be http or https, got {}", url.scheme()),
                    ));
                }
            }
            Err(e) => {
                return Err(ValidationError::invalid(
                    format!("{}.base_url", path),
                    format!("not a URL: {}", e),
                ));
            }
        }

        self.model.validate(&format!("{}.model", path))
    }
}

impl ModelConfig {
    /// Model with no protocol bindings
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capabilities: BTreeMap::new(),
        }
    }

    /// Bind a protocol to a capability format (builder style)
    pub fn with_capability(
        mut self,
        protocol: Protocol,
        format: impl Into<String>,
        options: Options,
    ) -> Self {
        self.capabilities.insert(
            protocol.to_string(),
            CapabilityConfig {
                format: format.into(),
                options,
            },
        );
        self
    }

    /// Validate model configuration
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::missing(format!("{}.name", path)));
        }

        if self.capabilities.is_empty() {
            return Err(ValidationError::missing(format!("{}.capabilities", path)));
        }

        for (protocol, binding) in &self.capabilities {
            let binding_path = format!("{}.capabilities.{}", path, protocol);

            if protocol.parse::<Protocol>().is_err() {
                return Err(ValidationError::invalid(
                    binding_path,
                    format!("unknown protocol {}, expected chat, vision, tools or embeddings", protocol),
                ));
            }

            if binding.format.is_empty() {
                return Err(ValidationError::missing(format!("{}.format", binding_path)));
            }
        }

        Ok(())
    }
}
