//! Tool configuration parsing.

use crate::{ConfigError, ConfigResult};
use kdl::{KdlDocument, KdlNode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "konfig.kdl";
/// File name looked up in the home directory.
pub const HOME_CONFIG_FILE: &str = ".konfig.kdl";

const DEFAULT_CONSUL_ADDRESS: &str = "consul.service.consul";
/// Log level used when none is configured.
pub const DEFAULT_LOG_LEVEL: &str = "info";
const VAULT_TOKEN_FILE: &str = ".vault-token";

/// Tool-wide configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub log_level: String,
    pub vault: VaultSettings,
    pub consul: ConsulSettings,
    pub application: ApplicationSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VaultSettings {
    pub address: String,
    /// Explicit token, takes precedence over `token_path`.
    pub token: Option<String>,
    pub token_path: Option<PathBuf>,
    pub tls_skip_verify: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsulSettings {
    pub address: String,
    pub datacenter: Option<String>,
    pub token: Option<String>,
    pub tls_skip_verify: bool,
}

/// The application whose variables are managed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationSettings {
    pub name: String,
    pub namespace: String,
    /// Variable name and definition string pairs, in file order.
    pub definitions: Vec<(String, String)>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            vault: VaultSettings {
                token_path: home_dir().map(|home| home.join(VAULT_TOKEN_FILE)),
                ..VaultSettings::default()
            },
            consul: ConsulSettings::default(),
            application: ApplicationSettings::default(),
        }
    }
}

impl Default for ConsulSettings {
    fn default() -> Self {
        Self {
            address: DEFAULT_CONSUL_ADDRESS.to_string(),
            datacenter: None,
            token: None,
            tls_skip_verify: false,
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from the default locations when no path is given.
    ///
    /// Without an explicit path, `./konfig.kdl` and `$HOME/.konfig.kdl` are tried in
    /// that order and defaults are used when neither exists.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let path = match path {
            Some(path) if path.is_file() => path.to_path_buf(),
            Some(path) => return Err(ConfigError::NotFound(path.display().to_string())),
            None => match default_config_path() {
                Some(path) => path,
                None => {
                    debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        debug!(path = %path.display(), "Loading config file");
        let content = std::fs::read_to_string(&path)?;
        parse_settings(&content)
    }
}

fn default_config_path() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    home_dir()
        .map(|home| home.join(HOME_CONFIG_FILE))
        .filter(|path| path.is_file())
}

fn home_dir() -> Option<PathBuf> {
    dirs::home_dir()
}

/// Parse settings from KDL text. Missing nodes keep their defaults.
pub fn parse_settings(kdl: &str) -> ConfigResult<Settings> {
    let doc: KdlDocument = kdl.parse()?;
    let mut settings = Settings::default();

    for node in doc.nodes() {
        match node.name().value() {
            "log-level" => {
                settings.log_level = get_first_string_arg(node)
                    .ok_or_else(|| ConfigError::MissingField("log-level value".to_string()))?;
            }
            "vault" => parse_vault(node, &mut settings.vault),
            "consul" => parse_consul(node, &mut settings.consul),
            "application" => settings.application = parse_application(node)?,
            _ => {} // Ignore unknown nodes
        }
    }

    Ok(settings)
}

fn parse_vault(node: &KdlNode, vault: &mut VaultSettings) {
    if let Some(address) = get_string_prop(node, "address") {
        vault.address = address;
    }
    if let Some(token) = get_string_prop(node, "token") {
        vault.token = Some(token);
    }
    if let Some(path) = get_string_prop(node, "token-path") {
        vault.token_path = Some(PathBuf::from(path));
    }
    if let Some(skip) = get_bool_prop(node, "tls-skip-verify") {
        vault.tls_skip_verify = skip;
    }
}

fn parse_consul(node: &KdlNode, consul: &mut ConsulSettings) {
    if let Some(address) = get_string_prop(node, "address") {
        consul.address = address;
    }
    consul.datacenter = get_string_prop(node, "datacenter").or(consul.datacenter.take());
    consul.token = get_string_prop(node, "token").or(consul.token.take());
    if let Some(skip) = get_bool_prop(node, "tls-skip-verify") {
        consul.tls_skip_verify = skip;
    }
}

fn parse_application(node: &KdlNode) -> ConfigResult<ApplicationSettings> {
    let mut application = ApplicationSettings {
        name: get_string_prop(node, "name").unwrap_or_default(),
        namespace: get_string_prop(node, "namespace").unwrap_or_default(),
        definitions: Vec::new(),
    };

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "name" => application.name = get_first_string_arg(child).unwrap_or_default(),
                "namespace" => {
                    application.namespace = get_first_string_arg(child).unwrap_or_default()
                }
                "definitions" => {
                    if let Some(grandchildren) = child.children() {
                        for gc in grandchildren.nodes() {
                            let key = gc.name().value().to_string();
                            let definition = get_first_string_arg(gc).ok_or_else(|| {
                                ConfigError::InvalidValue {
                                    field: format!("definitions.{}", key),
                                    message: "expected a definition string".to_string(),
                                }
                            })?;
                            application.definitions.push((key, definition));
                        }
                    }
                }
                _ => {}
            }
        }
    }

    Ok(application)
}

// Helper functions for extracting values from KDL nodes

fn get_first_string_arg(node: &KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

fn get_string_prop(node: &KdlNode, name: &str) -> Option<String> {
    node.get(name)
        .and_then(|v| v.as_string())
        .map(|s| s.to_string())
}

fn get_bool_prop(node: &KdlNode, name: &str) -> Option<bool> {
    node.get(name).and_then(|v| v.as_bool())
}
