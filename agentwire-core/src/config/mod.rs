//! Configuration loading for agentwire
//!
//! An [`AgentConfig`] describes one agent, its transport settings, the provider
//! it talks to and the model that provider serves. Files may reference
//! environment variables as `${VAR}`; they are substituted before parsing.

pub mod duration;
mod env;
mod error;
mod schema;
mod secrets;

pub use env::interpolate_env_vars;
pub use error::{ConfigError, ConfigResult, ValidationError, ValidationErrorKind};
pub use schema::{AgentConfig, CapabilityConfig, ModelConfig, ProviderConfig, TransportConfig};
pub use secrets::{is_sensitive_key, redact_options, SecretString};

use std::fs;
use std::path::Path;
use tracing::debug;

/// Load a configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> ConfigResult<AgentConfig> {
    let path = path.as_ref();
    let content = read(path)?;
    parse_yaml(&content, &path.to_string_lossy())
}

/// Load a configuration from a JSON file
pub fn load_from_json<P: AsRef<Path>>(path: P) -> ConfigResult<AgentConfig> {
    let path = path.as_ref();
    let content = read(path)?;
    parse_json(&content, &path.to_string_lossy())
}

/// Parse a JSON configuration held in memory
pub fn from_json_str(content: &str) -> ConfigResult<AgentConfig> {
    parse_json(content, "<string>")
}

/// Parse a YAML configuration held in memory
pub fn from_yaml_str(content: &str) -> ConfigResult<AgentConfig> {
    parse_yaml(content, "<string>")
}

fn read(path: &Path) -> ConfigResult<String> {
    debug!("Loading configuration from {}", path.display());
    fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_string_lossy().to_string(),
        source: e,
    })
}

fn parse_json(content: &str, origin: &str) -> ConfigResult<AgentConfig> {
    let interpolated = interpolate_env_vars(content)?;

    let config: AgentConfig =
        serde_json::from_str(&interpolated).map_err(|e| ConfigError::ParseError {
            path: origin.to_string(),
            line: Some(e.line()),
            column: Some(e.column()),
            message: e.to_string(),
        })?;

    config.validate()?;
    Ok(config)
}

fn parse_yaml(content: &str, origin: &str) -> ConfigResult<AgentConfig> {
    let interpolated = interpolate_env_vars(content)?;

    let config: AgentConfig =
        serde_yaml::from_str(&interpolated).map_err(|e| ConfigError::ParseError {
            path: origin.to_string(),
            line: e.location().map(|l| l.line()),
            column: e.location().map(|l| l.column()),
            message: e.to_string(),
        })?;

    config.validate()?;
    Ok(config)
}
