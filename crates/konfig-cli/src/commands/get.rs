//! Resolve variables and print them.

use super::load_definitions;
use anyhow::{Context, Result, bail};
use clap::Args;
use konfig_config::Settings;
use konfig_deployer::{OutputFormat, render};
use konfig_sources::{SourceRegistry, resolve};

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Output format
    #[arg(short, long, default_value = "k8s-yaml")]
    pub output: OutputFormat,

    /// Application name, overrides the configured one
    #[arg(long)]
    pub name: Option<String>,

    /// Kubernetes namespace, overrides the configured one
    #[arg(short, long)]
    pub namespace: Option<String>,
}

pub async fn run(settings: &Settings, args: GetArgs) -> Result<()> {
    let registry = SourceRegistry::from_settings(settings).context("Failed to set up sources")?;
    let output = get(&registry, settings, args).await?;
    print!("{}", output);
    Ok(())
}

async fn get(registry: &SourceRegistry, settings: &Settings, args: GetArgs) -> Result<String> {
    let name = args.name.unwrap_or_else(|| settings.application.name.clone());
    if name.is_empty() {
        bail!("Missing application name");
    }

    let namespace = args
        .namespace
        .unwrap_or_else(|| settings.application.namespace.clone());
    if namespace.is_empty() {
        bail!("Missing namespace");
    }

    let definitions = load_definitions(settings)?;
    let variables = resolve(registry, &definitions)
        .await
        .context("Error processing variables")?;

    render(args.output, &name, &namespace, &variables).context("Error saving variables")
}
