//! Local / generic OpenAI-compatible provider (Ollama, vLLM, llama.cpp, ...)

use super::auth::Auth;
use super::error::ProviderResult;
use super::{endpoint_path, Provider, SseFraming};
use crate::config::ProviderConfig;
use crate::model::Model;
use crate::protocol::Protocol;
use reqwest::header::HeaderMap;
use tracing::debug;

const DEFAULT_API_KEY_HEADER: &str = "X-API-Key";

/// Provider for self-hosted servers; auth is optional
#[derive(Debug)]
pub struct LocalProvider {
    name: String,
    base_url: String,
    model: Model,
    auth: Option<Auth>,
}

impl LocalProvider {
    /// Build from configuration; the base URL is normalized to end in `/v1`
    pub fn new(config: &ProviderConfig, model: Model) -> ProviderResult<Self> {
        let auth = Auth::optional(&config.name, &config.options, DEFAULT_API_KEY_HEADER)?;
        let base_url = normalize_base_url(&config.base_url);
        debug!(
            "Created local provider '{}' at {} (auth: {})",
            config.name,
            base_url,
            auth.is_some()
        );

        Ok(Self {
            name: config.name.clone(),
            base_url,
            model,
            auth,
        })
    }
}

/// Strip trailing slashes and append `/v1` when missing
pub fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with("/v1") {
        trimmed.to_string()
    } else {
        format!("{}/v1", trimmed)
    }
}

impl Provider for LocalProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &Model {
        &self.model
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, protocol: Protocol) -> ProviderResult<String> {
        Ok(format!("{}{}", self.base_url, endpoint_path(protocol)))
    }

    fn set_headers(&self, headers: &mut HeaderMap) -> ProviderResult<()> {
        match &self.auth {
            Some(auth) => auth.apply(&self.name, headers),
            None => Ok(()),
        }
    }

    fn framing(&self) -> SseFraming {
        SseFraming::Lenient
    }
}
