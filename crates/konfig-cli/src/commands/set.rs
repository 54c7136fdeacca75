//! Point a deployment at existing ConfigMap and Secret objects without fetching values.

use super::{apply_changes, load_definitions};
use anyhow::{Context, Result};
use clap::{ArgAction, Args};
use k8s_openapi::Resource;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use konfig_config::Settings;
use konfig_core::{Variable, VariableDefinition};
use konfig_deployer::{Manifest, ObjectNames, reconcile_deployment};
use konfig_sources::dedup;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Deployment file to update
    #[arg(short = 'f', long)]
    pub deployment: PathBuf,

    /// Name of the container to modify
    #[arg(short = 't', long)]
    pub container: String,

    /// File holding the ConfigMap
    #[arg(short = 'm', long)]
    pub config_map: PathBuf,

    /// File holding the Secret
    #[arg(short, long)]
    pub secrets: PathBuf,

    /// Replace the container environment instead of merging into it
    #[arg(short = 'w', long, default_value_t = true, action = ArgAction::Set)]
    pub overwrite: bool,

    /// Skip the confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Where to write the updated deployment
    #[arg(short, long)]
    pub destination: PathBuf,
}

pub fn run(settings: &Settings, args: SetArgs) -> Result<()> {
    let definitions = load_definitions(settings)?;
    set(
        &definitions,
        &args,
        &mut io::stdout().lock(),
        &mut io::stdin().lock(),
    )?;
    Ok(())
}

fn object_name(metadata: &ObjectMeta, kind: &str, path: &Path) -> Result<String> {
    metadata
        .name
        .clone()
        .with_context(|| format!("{} in {} has no name", kind, path.display()))
}

fn set<W: Write, R: BufRead>(
    definitions: &[VariableDefinition],
    args: &SetArgs,
    out: &mut W,
    input: &mut R,
) -> Result<bool> {
    let config_map = Manifest::<ConfigMap>::read(&args.config_map).with_context(|| {
        format!("Failed to read ConfigMap: {}", args.config_map.display())
    })?;
    let secret = Manifest::<Secret>::read(&args.secrets)
        .with_context(|| format!("Failed to read Secret: {}", args.secrets.display()))?;
    let manifest = Manifest::<Deployment>::read(&args.deployment).with_context(|| {
        format!("Failed to read deployment: {}", args.deployment.display())
    })?;

    let names = ObjectNames::new(
        object_name(&config_map.resource.metadata, ConfigMap::KIND, &args.config_map)?,
        object_name(&secret.resource.metadata, Secret::KIND, &args.secrets)?,
    );

    let variables = dedup(definitions.iter().map(Variable::unresolved));

    let reconciliation = reconcile_deployment(
        &manifest.resource,
        &args.container,
        &variables,
        &names,
        args.overwrite,
    )
    .context("Error updating deployment")?;

    apply_changes(out, input, &manifest, reconciliation, args.yes, &args.destination)
}
