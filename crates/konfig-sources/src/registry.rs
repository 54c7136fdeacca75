//! Registry mapping source kinds to sources.

use crate::consul::{ConsulSource, LayeredConsulSource};
use crate::simple::{LiteralSource, ReferenceSource};
use crate::vault::VaultSource;
use konfig_config::Settings;
use konfig_core::{Error, Result, Source, SourceKind};
use std::collections::HashMap;
use std::sync::Arc;

/// Sources available to the resolution pipeline, at most one per kind.
#[derive(Default)]
pub struct SourceRegistry {
    sources: HashMap<SourceKind, Arc<dyn Source>>,
}

impl SourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry with every source kind, configured from `settings`.
    ///
    /// Remote clients are not connected until a definition of their kind is fetched.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut registry = Self::new();

        for kind in SourceKind::ALL {
            let source: Arc<dyn Source> = match kind {
                SourceKind::Literal => Arc::new(LiteralSource),
                SourceKind::Reference => Arc::new(ReferenceSource),
                SourceKind::Vault => Arc::new(VaultSource::new(settings.vault.clone())),
                SourceKind::Consul => Arc::new(ConsulSource::new(settings.consul.clone())),
                SourceKind::LayeredConsul => {
                    Arc::new(LayeredConsulSource::new(settings.consul.clone()))
                }
            };
            registry.register(source)?;
        }

        Ok(registry)
    }

    /// Register a source under its kind. Fails if the kind is already taken.
    pub fn register(&mut self, source: Arc<dyn Source>) -> Result<()> {
        let kind = source.kind();
        if self.sources.contains_key(&kind) {
            return Err(Error::Conflict(format!("source already registered: {}", kind)));
        }

        self.sources.insert(kind, source);
        Ok(())
    }

    /// Get the source for a kind.
    pub fn get(&self, kind: SourceKind) -> Option<Arc<dyn Source>> {
        self.sources.get(&kind).cloned()
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<SourceKind> {
        let mut kinds: Vec<SourceKind> = self.sources.keys().copied().collect();
        kinds.sort();
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_settings_registers_every_kind() {
        let registry = SourceRegistry::from_settings(&Settings::default()).unwrap();
        assert_eq!(registry.kinds(), SourceKind::ALL.to_vec());

        for kind in SourceKind::ALL {
            assert_eq!(registry.get(kind).unwrap().kind(), kind);
        }
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = SourceRegistry::new();
        registry.register(Arc::new(LiteralSource)).unwrap();

        let err = registry.register(Arc::new(LiteralSource)).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn test_get_miss() {
        let registry = SourceRegistry::new();
        assert!(registry.get(SourceKind::Vault).is_none());
    }
}
