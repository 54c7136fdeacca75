//! In-memory remote stores.
//!
//! Stand-ins for Consul and Vault when no cluster services are reachable.

use async_trait::async_trait;
use konfig_core::{KvStore, Result, SecretEngine};
use std::collections::HashMap;

/// Key-value store backed by a map.
#[derive(Debug, Default, Clone)]
pub struct MemoryKv {
    values: HashMap<String, Vec<u8>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.values.insert(path.into(), value.into());
        self
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.values.get(path).cloned())
    }
}

/// Secret engine backed by a map of secrets.
#[derive(Debug, Default, Clone)]
pub struct MemorySecrets {
    secrets: HashMap<String, HashMap<String, serde_json::Value>>,
}

impl MemorySecrets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(
        mut self,
        path: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.secrets
            .entry(path.into())
            .or_default()
            .insert(field.into(), value.into());
        self
    }
}

#[async_trait]
impl SecretEngine for MemorySecrets {
    async fn read(&self, path: &str) -> Result<Option<HashMap<String, serde_json::Value>>> {
        Ok(self.secrets.get(path).cloned())
    }
}
