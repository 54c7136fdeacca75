//! Vault backed source.

use async_trait::async_trait;
use konfig_config::VaultSettings;
use konfig_core::source::ensure_kind;
use konfig_core::{Error, Result, SecretEngine, Source, SourceKind, Variable, VariableDefinition};
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// HTTP client for reading Vault secrets.
pub struct VaultClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SecretResponse {
    #[serde(default)]
    data: Option<HashMap<String, serde_json::Value>>,
}

impl VaultClient {
    pub fn new(settings: &VaultSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(settings.tls_skip_verify)
            .build()
            .map_err(remote_error)?;

        Ok(Self {
            client,
            base_url: crate::base_url(&settings.address, "https"),
            token: resolve_token(settings),
        })
    }
}

/// The explicit token if set, else the content of the token file.
///
/// An unreadable token file is not an error: the request goes out unauthenticated.
pub fn resolve_token(settings: &VaultSettings) -> Option<String> {
    if let Some(token) = settings.token.as_deref().filter(|t| !t.is_empty()) {
        return Some(token.to_string());
    }

    let path = settings.token_path.as_ref()?;
    match std::fs::read_to_string(path) {
        Ok(content) => Some(content.trim().to_string()).filter(|t| !t.is_empty()),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not read Vault token file");
            None
        }
    }
}

/// Unwrap the nested `data` of a KV version 2 secret.
fn secret_fields(
    mut data: HashMap<String, serde_json::Value>,
) -> HashMap<String, serde_json::Value> {
    if data.contains_key("metadata") {
        if let Some(serde_json::Value::Object(inner)) = data.remove("data") {
            return inner.into_iter().collect();
        }
    }
    data
}

#[async_trait]
impl SecretEngine for VaultClient {
    async fn read(&self, path: &str) -> Result<Option<HashMap<String, serde_json::Value>>> {
        let url = format!("{}/v1/{}", self.base_url, crate::encode_path(path));

        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.header("X-Vault-Token", token);
        }

        let response = request.send().await.map_err(remote_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Remote {
                kind: SourceKind::Vault,
                message: format!("reading {} returned {}: {}", path, status, text),
            });
        }

        let secret: SecretResponse = response.json().await.map_err(remote_error)?;
        Ok(secret.data.map(secret_fields))
    }
}

fn remote_error(e: reqwest::Error) -> Error {
    Error::Remote {
        kind: SourceKind::Vault,
        message: e.to_string(),
    }
}

/// Reads one field of a Vault secret, given as `<path>:<field>`.
pub struct VaultSource {
    settings: VaultSettings,
    engine: OnceCell<Arc<dyn SecretEngine>>,
}

impl VaultSource {
    pub fn new(settings: VaultSettings) -> Self {
        Self {
            settings,
            engine: OnceCell::new(),
        }
    }

    pub fn with_engine(engine: Arc<dyn SecretEngine>) -> Self {
        Self {
            settings: VaultSettings::default(),
            engine: OnceCell::new_with(Some(engine)),
        }
    }

    async fn engine(&self) -> Result<&Arc<dyn SecretEngine>> {
        self.engine
            .get_or_try_init(|| async {
                debug!(address = %self.settings.address, "Connecting to Vault");
                let client = VaultClient::new(&self.settings)?;
                Ok::<Arc<dyn SecretEngine>, Error>(Arc::new(client))
            })
            .await
    }
}

/// Split `<path>:<field>` on the first colon.
fn split_secret_ref(value: &str) -> Option<(&str, &str)> {
    value
        .split_once(':')
        .filter(|(path, field)| !path.is_empty() && !field.is_empty())
}

#[async_trait]
impl Source for VaultSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Vault
    }

    async fn fetch(&self, definition: &VariableDefinition) -> Result<Variable> {
        ensure_kind(definition, SourceKind::Vault)?;

        let (path, field) =
            split_secret_ref(&definition.raw_value).ok_or_else(|| Error::InvalidValue {
                name: definition.name.clone(),
                kind: SourceKind::Vault,
                message: format!(
                    "expected '<path>:<field>', got '{}'",
                    definition.raw_value
                ),
            })?;

        let not_found = || Error::NotFound {
            name: definition.name.clone(),
            kind: SourceKind::Vault,
            path: definition.raw_value.clone(),
        };

        let fields = self.engine().await?.read(path).await?.ok_or_else(not_found)?;
        let value = match fields.get(field).ok_or_else(not_found)? {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        debug!(variable = %definition.name, path = %path, field = %field, "Read variable from Vault");
        Ok(Variable::literal(definition, value))
    }
}
