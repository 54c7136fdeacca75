//! CLI command implementations.

pub mod get;
pub mod merge;
pub mod set;

pub use get::GetArgs;
pub use merge::MergeArgs;
pub use set::SetArgs;

use crate::confirm::ask_confirm;
use anyhow::{Context, Result};
use clap::Args;
use k8s_openapi::api::apps::v1::Deployment;
use konfig_config::{Settings, parse_definitions, render_definition};
use konfig_core::VariableDefinition;
use konfig_deployer::{Manifest, Reconciliation, render_text_diff, to_yaml};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Connection flags overriding the configuration file.
#[derive(Args, Debug, Default)]
pub struct RemoteArgs {
    /// Vault server address
    #[arg(long, global = true, env = "KONFIG_VAULT_ADDRESS")]
    pub vault_address: Option<String>,

    /// Vault token
    #[arg(long, global = true, env = "KONFIG_VAULT_TOKEN", hide_env_values = true)]
    pub vault_token: Option<String>,

    /// File holding the Vault token
    #[arg(long, global = true, env = "KONFIG_VAULT_TOKEN_PATH")]
    pub vault_token_path: Option<PathBuf>,

    /// Skip TLS certificate verification for Vault
    #[arg(long, global = true, env = "KONFIG_VAULT_TLS_SKIP_VERIFY")]
    pub vault_tls_skip_verify: bool,

    /// Consul server address
    #[arg(long, global = true, env = "KONFIG_CONSUL_ADDRESS")]
    pub consul_address: Option<String>,

    /// Consul ACL token
    #[arg(long, global = true, env = "KONFIG_CONSUL_TOKEN", hide_env_values = true)]
    pub consul_token: Option<String>,

    /// Consul datacenter
    #[arg(long, global = true, env = "KONFIG_CONSUL_DATACENTER")]
    pub consul_datacenter: Option<String>,

    /// Skip TLS certificate verification for Consul
    #[arg(long, global = true, env = "KONFIG_CONSUL_TLS_SKIP_VERIFY")]
    pub consul_tls_skip_verify: bool,
}

impl RemoteArgs {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(address) = &self.vault_address {
            settings.vault.address = address.clone();
        }
        if let Some(token) = &self.vault_token {
            settings.vault.token = Some(token.clone());
        }
        if let Some(path) = &self.vault_token_path {
            settings.vault.token_path = Some(path.clone());
        }
        if self.vault_tls_skip_verify {
            settings.vault.tls_skip_verify = true;
        }

        if let Some(address) = &self.consul_address {
            settings.consul.address = address.clone();
        }
        if let Some(token) = &self.consul_token {
            settings.consul.token = Some(token.clone());
        }
        if let Some(datacenter) = &self.consul_datacenter {
            settings.consul.datacenter = Some(datacenter.clone());
        }
        if self.consul_tls_skip_verify {
            settings.consul.tls_skip_verify = true;
        }
    }
}

/// Parse the definitions of the configured application.
pub fn load_definitions(settings: &Settings) -> Result<Vec<VariableDefinition>> {
    parse_definitions(
        settings
            .application
            .definitions
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str())),
    )
    .context("Failed to parse variable definitions")
}

/// Print the configured definitions in their canonical form.
pub fn validate(settings: &Settings) -> Result<()> {
    let definitions = load_definitions(settings)?;

    for definition in &definitions {
        println!("{} = {}", definition.name, render_definition(definition));
    }
    println!("Configuration is valid ({} definitions)", definitions.len());

    Ok(())
}

/// Show what a reconciliation changes, ask for confirmation and write the result.
///
/// Returns whether the destination was written.
pub fn apply_changes<W: Write, R: BufRead>(
    out: &mut W,
    input: &mut R,
    manifest: &Manifest<Deployment>,
    reconciliation: Reconciliation,
    yes: bool,
    destination: &Path,
) -> Result<bool> {
    let diff = &reconciliation.diff;
    writeln!(out, "Added: {}", diff.added.join(", "))?;
    writeln!(out, "Changed: {}", diff.changed.join(", "))?;
    writeln!(out, "Removed: {}", diff.removed.join(", "))?;

    if !yes {
        let before = to_yaml(&manifest.resource)?;
        let after = to_yaml(&reconciliation.deployment)?;
        write!(out, "{}", render_text_diff(&before, &after))?;

        if !ask_confirm(out, input, "Apply changes?")? {
            info!("Changes discarded");
            return Ok(false);
        }
    }

    manifest
        .with_resource(reconciliation.deployment)
        .write(destination)
        .with_context(|| format!("Failed to write deployment: {}", destination.display()))?;
    info!(destination = %destination.display(), "Deployment written");

    Ok(true)
}
