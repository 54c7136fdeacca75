//! Source and remote store abstractions.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::variable::{SourceKind, Variable, VariableDefinition};
use crate::{Error, Result};

/// Trait for variable sources.
#[async_trait]
pub trait Source: Send + Sync {
    /// Kind of definitions this source resolves.
    fn kind(&self) -> SourceKind;

    /// Resolve a definition into a variable.
    async fn fetch(&self, definition: &VariableDefinition) -> Result<Variable>;
}

/// Reject definitions that were routed to the wrong source.
pub fn ensure_kind(definition: &VariableDefinition, expected: SourceKind) -> Result<()> {
    if definition.kind != expected {
        return Err(Error::KindMismatch {
            name: definition.name.clone(),
            expected,
            actual: definition.kind,
        });
    }
    Ok(())
}

/// Trait for key-value stores (Consul).
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Get the raw value stored under `path`, `None` when the key does not exist.
    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>>;
}

/// Trait for secret engines (Vault).
#[async_trait]
pub trait SecretEngine: Send + Sync {
    /// Read all fields of the secret at `path`, `None` when there is no secret.
    async fn read(&self, path: &str) -> Result<Option<HashMap<String, serde_json::Value>>>;
}
