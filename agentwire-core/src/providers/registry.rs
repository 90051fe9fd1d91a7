//! Provider name → factory registry

use super::error::{ProviderError, ProviderResult};
use super::{AzureProvider, LocalProvider, Provider};
use crate::capabilities::CapabilityRegistry;
use crate::config::ProviderConfig;
use crate::model::Model;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

/// Builds a provider from its configuration and an already resolved model
pub type ProviderFactory =
    Arc<dyn Fn(&ProviderConfig, Model) -> ProviderResult<Arc<dyn Provider>> + Send + Sync>;

/// Registry of provider kinds, safe for concurrent lookup and registration
#[derive(Default)]
pub struct ProviderRegistry {
    factories: RwLock<HashMap<String, ProviderFactory>>,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding `local` (alias `ollama`) and `azure`
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        for name in ["local", "ollama"] {
            registry.register(name, |config, model| {
                Ok(Arc::new(LocalProvider::new(config, model)?) as Arc<dyn Provider>)
            });
        }
        registry.register("azure", |config, model| {
            Ok(Arc::new(AzureProvider::new(config, model)?) as Arc<dyn Provider>)
        });
        registry
    }

    /// Process-wide registry, populated with the built-in providers on first use
    pub fn global() -> &'static ProviderRegistry {
        static GLOBAL: OnceLock<ProviderRegistry> = OnceLock::new();
        GLOBAL.get_or_init(ProviderRegistry::with_defaults)
    }

    /// Register (or replace) a provider kind
    pub fn register<F>(&self, name: impl Into<String>, factory: F)
    where
        F: Fn(&ProviderConfig, Model) -> ProviderResult<Arc<dyn Provider>> + Send + Sync + 'static,
    {
        let name = name.into();
        debug!("Registering provider '{}'", name);
        self.factories.write().insert(name, Arc::new(factory));
    }

    /// Build the provider named by `config`, resolving its model against the
    /// global capability registry
    pub fn create(&self, config: &ProviderConfig) -> ProviderResult<Arc<dyn Provider>> {
        self.create_with(config, CapabilityRegistry::global())
    }

    /// Build the provider named by `config`, resolving its model against
    /// `capabilities`
    pub fn create_with(
        &self,
        config: &ProviderConfig,
        capabilities: &CapabilityRegistry,
    ) -> ProviderResult<Arc<dyn Provider>> {
        let model = Model::from_config_with(&config.model, capabilities)?;
        self.create_with_model(config, model)
    }

    /// Build the provider named by `config` around an existing model
    pub fn create_with_model(
        &self,
        config: &ProviderConfig,
        model: Model,
    ) -> ProviderResult<Arc<dyn Provider>> {
        let factory = self
            .factories
            .read()
            .get(&config.name)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownProvider(config.name.clone()))?;

        let provider = factory(config, model)?;
        info!(
            "Provider '{}' ready at {} serving model '{}'",
            provider.name(),
            provider.base_url(),
            provider.model().name()
        );
        Ok(provider)
    }

    /// Whether a provider kind is registered
    pub fn contains(&self, name: &str) -> bool {
        self.factories.read().contains_key(name)
    }

    /// Registered provider names, sorted
    pub fn providers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.providers())
            .finish()
    }
}
