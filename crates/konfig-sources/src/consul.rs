//! Consul backed sources.

use async_trait::async_trait;
use konfig_config::ConsulSettings;
use konfig_core::source::ensure_kind;
use konfig_core::{Error, KvStore, Result, Source, SourceKind, Variable, VariableDefinition};
use reqwest::StatusCode;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

/// HTTP client for the Consul KV API.
pub struct ConsulClient {
    client: reqwest::Client,
    base_url: String,
    datacenter: Option<String>,
    token: Option<String>,
}

impl ConsulClient {
    pub fn new(settings: &ConsulSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(settings.tls_skip_verify)
            .build()
            .map_err(|e| remote_error(SourceKind::Consul, e))?;

        Ok(Self {
            client,
            base_url: crate::base_url(&settings.address, "http"),
            datacenter: settings.datacenter.clone().filter(|dc| !dc.is_empty()),
            token: settings.token.clone().filter(|t| !t.is_empty()),
        })
    }
}

#[async_trait]
impl KvStore for ConsulClient {
    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let url = format!("{}/v1/kv/{}", self.base_url, crate::encode_path(path));

        let mut request = self.client.get(&url).query(&[("raw", "true")]);
        if let Some(dc) = &self.datacenter {
            request = request.query(&[("dc", dc)]);
        }
        if let Some(token) = &self.token {
            request = request.header("X-Consul-Token", token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| remote_error(SourceKind::Consul, e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Remote {
                kind: SourceKind::Consul,
                message: format!("reading {} returned {}: {}", path, status, text),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| remote_error(SourceKind::Consul, e))?;

        Ok(Some(body.to_vec()))
    }
}

fn remote_error(kind: SourceKind, e: reqwest::Error) -> Error {
    Error::Remote {
        kind,
        message: e.to_string(),
    }
}

/// Consul store that is only connected on first use.
struct LazyKv {
    settings: ConsulSettings,
    store: OnceCell<Arc<dyn KvStore>>,
}

impl LazyKv {
    fn new(settings: ConsulSettings) -> Self {
        Self {
            settings,
            store: OnceCell::new(),
        }
    }

    fn ready(store: Arc<dyn KvStore>) -> Self {
        Self {
            settings: ConsulSettings::default(),
            store: OnceCell::new_with(Some(store)),
        }
    }

    async fn get(&self) -> Result<&Arc<dyn KvStore>> {
        self.store
            .get_or_try_init(|| async {
                debug!(address = %self.settings.address, "Connecting to Consul");
                let client = ConsulClient::new(&self.settings)?;
                Ok::<Arc<dyn KvStore>, Error>(Arc::new(client))
            })
            .await
    }
}

/// Reads a single Consul key.
pub struct ConsulSource {
    kv: LazyKv,
}

impl ConsulSource {
    pub fn new(settings: ConsulSettings) -> Self {
        Self {
            kv: LazyKv::new(settings),
        }
    }

    pub fn with_store(store: Arc<dyn KvStore>) -> Self {
        Self {
            kv: LazyKv::ready(store),
        }
    }
}

#[async_trait]
impl Source for ConsulSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Consul
    }

    async fn fetch(&self, definition: &VariableDefinition) -> Result<Variable> {
        ensure_kind(definition, SourceKind::Consul)?;

        let path = definition.raw_value.as_str();
        let value = self
            .kv
            .get()
            .await?
            .get(path)
            .await?
            .ok_or_else(|| Error::NotFound {
                name: definition.name.clone(),
                kind: SourceKind::Consul,
                path: path.to_string(),
            })?;

        let value = String::from_utf8_lossy(&value).into_owned();
        debug!(variable = %definition.name, path = %path, value = %value, "Read variable from Consul");

        Ok(Variable::literal(definition, value))
    }
}

/// Candidate keys of a layered lookup, most specific first.
pub fn layered_paths(key: &str, appname: &str, environment: &str) -> [String; 3] {
    [
        format!("config/{}/{}/{}", appname, environment, key),
        format!("config/{}/base/{}", appname, key),
        format!("config/base/{}/{}", environment, key),
    ]
}

/// Looks a key up for the app and environment, then the app, then the environment.
pub struct LayeredConsulSource {
    kv: LazyKv,
}

impl LayeredConsulSource {
    pub fn new(settings: ConsulSettings) -> Self {
        Self {
            kv: LazyKv::new(settings),
        }
    }

    pub fn with_store(store: Arc<dyn KvStore>) -> Self {
        Self {
            kv: LazyKv::ready(store),
        }
    }
}

#[async_trait]
impl Source for LayeredConsulSource {
    fn kind(&self) -> SourceKind {
        SourceKind::LayeredConsul
    }

    async fn fetch(&self, definition: &VariableDefinition) -> Result<Variable> {
        ensure_kind(definition, SourceKind::LayeredConsul)?;

        let (appname, environment) =
            definition
                .layered_context()
                .ok_or_else(|| Error::InvalidValue {
                    name: definition.name.clone(),
                    kind: SourceKind::LayeredConsul,
                    message: format!(
                        "'{}' needs an '#appname@environment' suffix",
                        definition.raw_value
                    ),
                })?;

        let paths = layered_paths(&definition.raw_value, appname, environment);
        let store = self.kv.get().await?;

        for path in &paths {
            match store.get(path).await? {
                Some(value) => {
                    let value = String::from_utf8_lossy(&value).into_owned();
                    debug!(variable = %definition.name, path = %path, value = %value, "Read layered variable from Consul");
                    return Ok(Variable::literal(definition, value));
                }
                None => {
                    debug!(variable = %definition.name, path = %path, "Layered value not found");
                }
            }
        }

        Err(Error::NotFound {
            name: definition.name.clone(),
            kind: SourceKind::LayeredConsul,
            path: paths.join(", "),
        })
    }
}
