//! Azure-hosted OpenAI deployments

use super::auth::{required_string, Auth};
use super::error::ProviderResult;
use super::{endpoint_path, Provider, SseFraming};
use crate::config::ProviderConfig;
use crate::model::Model;
use crate::protocol::Protocol;
use reqwest::header::HeaderMap;
use tracing::debug;

const API_KEY_HEADER: &str = "api-key";
const DEPLOYMENT_KEY: &str = "deployment";
const API_VERSION_KEY: &str = "api_version";

/// Provider addressing one deployment with a pinned API version
#[derive(Debug)]
pub struct AzureProvider {
    name: String,
    base_url: String,
    deployment: String,
    api_version: String,
    model: Model,
    auth: Auth,
}

impl AzureProvider {
    /// Build from configuration; requires `deployment`, `auth_type`, `token`
    /// and `api_version`
    pub fn new(config: &ProviderConfig, model: Model) -> ProviderResult<Self> {
        let deployment = required_string(&config.name, &config.options, DEPLOYMENT_KEY)?;
        let api_version = required_string(&config.name, &config.options, API_VERSION_KEY)?;
        let auth = Auth::required(&config.name, &config.options, API_KEY_HEADER)?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        debug!(
            "Created azure provider '{}' for deployment '{}' (api-version {})",
            config.name, deployment, api_version
        );

        Ok(Self {
            name: config.name.clone(),
            base_url,
            deployment: deployment.to_string(),
            api_version: api_version.to_string(),
            model,
            auth,
        })
    }

    /// Deployment addressed by every request
    pub fn deployment(&self) -> &str {
        &self.deployment
    }
}

impl Provider for AzureProvider {
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
        Ok(format!(
            "{}/deployments/{}{}?api-version={}",
            self.base_url,
            self.deployment,
            endpoint_path(protocol),
            self.api_version
        ))
    }

    fn set_headers(&self, headers: &mut HeaderMap) -> ProviderResult<()> {
        self.auth.apply(&self.name, headers)
    }

    fn framing(&self) -> SseFraming {
        SseFraming::Strict
    }
}
