//! Format name → capability factory registry

use super::error::{CapabilityError, CapabilityResult};
use super::{
    CapabilityHandle, ChatCapability, EmbeddingsCapability, ToolsCapability, VisionCapability,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Produces a fresh capability on every lookup
pub type CapabilityFactory = Arc<dyn Fn() -> CapabilityHandle + Send + Sync>;

/// Registry of capability formats, safe for concurrent lookup and registration
#[derive(Default)]
pub struct CapabilityRegistry {
    factories: RwLock<HashMap<String, CapabilityFactory>>,
}

impl CapabilityRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in formats
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register("chat", || CapabilityHandle::streaming(ChatCapability::new()));
        registry.register("vision", || CapabilityHandle::streaming(VisionCapability::new()));
        registry.register("tools", || CapabilityHandle::streaming(ToolsCapability::new()));
        registry.register("embeddings", || {
            CapabilityHandle::buffered(EmbeddingsCapability::new())
        });
        registry.register("reasoning-chat", || {
            CapabilityHandle::streaming(ChatCapability::reasoning())
        });
        registry.register("reasoning-vision", || {
            CapabilityHandle::streaming(VisionCapability::reasoning())
        });
        registry.register("reasoning-tools", || {
            CapabilityHandle::streaming(ToolsCapability::reasoning())
        });
        registry
    }

    /// Process-wide registry, populated with the built-in formats on first use
    pub fn global() -> &'static CapabilityRegistry {
        static GLOBAL: OnceLock<CapabilityRegistry> = OnceLock::new();
        GLOBAL.get_or_init(CapabilityRegistry::with_defaults)
    }

    /// Register (or replace) a format
    pub fn register<F>(&self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> CapabilityHandle + Send + Sync + 'static,
    {
        let name = name.into();
        debug!("Registering capability format '{}'", name);
        self.factories.write().insert(name, Arc::new(factory));
    }

    /// Instantiate the capability registered under `name`
    pub fn get(&self, name: &str) -> CapabilityResult<CapabilityHandle> {
        let factory = self
            .factories
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| CapabilityError::UnknownFormat(name.to_string()))?;
        Ok(factory())
    }

    /// Whether a format is registered
    pub fn contains(&self, name: &str) -> bool {
        self.factories.read().contains_key(name)
    }

    /// Registered format names, sorted
    pub fn formats(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("formats", &self.formats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Protocol;

    #[test]
    fn test_builtin_formats() {
        let registry = CapabilityRegistry::with_defaults();
        assert_eq!(
            registry.formats(),
            vec![
                "chat",
                "embeddings",
                "reasoning-chat",
                "reasoning-tools",
                "reasoning-vision",
                "tools",
                "vision"
            ]
        );

        let embeddings = registry.get("embeddings").unwrap();
        assert_eq!(embeddings.protocol(), Protocol::Embeddings);
        assert!(!embeddings.supports_streaming());
        assert!(registry.get("chat").unwrap().supports_streaming());
    }

    #[test]
    fn test_unknown_format() {
        let registry = CapabilityRegistry::new();
        assert!(matches!(
            registry.get("chat"),
            Err(CapabilityError::UnknownFormat(name)) if name == "chat"
        ));
    }

    #[test]
    fn test_factories_produce_fresh_instances() {
        let registry = CapabilityRegistry::with_defaults();
        let a = registry.get("chat").unwrap();
        let b = registry.get("chat").unwrap();
        match (a, b) {
            (CapabilityHandle::Streaming(a), CapabilityHandle::Streaming(b)) => {
                assert!(!Arc::ptr_eq(&a, &b))
            }
            _ => panic!("chat should be a streaming capability"),
        }
    }
}
