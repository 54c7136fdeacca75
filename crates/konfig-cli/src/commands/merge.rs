//! Resolve variables and merge them into a deployment.

use super::{apply_changes, load_definitions};
use anyhow::{Context, Result};
use clap::Args;
use k8s_openapi::api::apps::v1::Deployment;
use konfig_config::Settings;
use konfig_core::VariableDefinition;
use konfig_deployer::{Manifest, ObjectNames, reconcile_deployment};
use konfig_sources::{SourceRegistry, resolve};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Deployment file to update
    #[arg(short = 'f', long)]
    pub deployment: PathBuf,

    /// Name of the container to modify
    #[arg(short = 't', long)]
    pub container: String,

    /// ConfigMap referenced by the environment (defaults to the container name)
    #[arg(long)]
    pub config_map_name: Option<String>,

    /// Secret referenced by the environment (defaults to the container name)
    #[arg(short, long)]
    pub secret_name: Option<String>,

    /// Replace the container environment instead of merging into it
    #[arg(short = 'w', long)]
    pub overwrite: bool,

    /// Skip the confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Where to write the updated deployment
    #[arg(short, long)]
    pub destination: PathBuf,
}

pub async fn run(settings: &Settings, args: MergeArgs) -> Result<()> {
    let definitions = load_definitions(settings)?;
    let registry = SourceRegistry::from_settings(settings).context("Failed to set up sources")?;

    merge(
        &registry,
        &definitions,
        &args,
        &mut io::stdout().lock(),
        &mut io::stdin().lock(),
    )
    .await?;
    Ok(())
}

async fn merge<W: Write, R: BufRead>(
    registry: &SourceRegistry,
    definitions: &[VariableDefinition],
    args: &MergeArgs,
    out: &mut W,
    input: &mut R,
) -> Result<bool> {
    let manifest = Manifest::<Deployment>::read(&args.deployment).with_context(|| {
        format!("Failed to read deployment: {}", args.deployment.display())
    })?;

    let variables = resolve(registry, definitions)
        .await
        .context("Error processing variables")?;

    let names = ObjectNames::new(
        args.config_map_name
            .clone()
            .unwrap_or_else(|| args.container.clone()),
        args.secret_name
            .clone()
            .unwrap_or_else(|| args.container.clone()),
    );

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

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::EnvVar;
    use konfig_config::parse_definitions;
    use konfig_sources::memory::{MemoryKv, MemorySecrets};
    use konfig_sources::{ConsulSource, VaultSource};
    use std::path::Path;
    use std::sync::Arc;

    const DEPLOYMENT: &str = r#"apiVersion: v1
kind: Service
metadata:
  name: web
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
spec:
  selector:
    matchLabels:
      app: web
  template:
    spec:
      containers:
        - name: web
          image: nginx
          env:
            - name: KEEP
              value: "1"
"#;

    fn registry() -> SourceRegistry {
        let kv = MemoryKv::new().with("svc/db/host", "10.0.0.5");
        let secrets = MemorySecrets::new().with_field("secret/db", "password", "s3cr3t");

        let mut registry = SourceRegistry::new();
        registry
            .register(Arc::new(ConsulSource::with_store(Arc::new(kv))))
            .unwrap();
        registry
            .register(Arc::new(VaultSource::with_engine(Arc::new(secrets))))
            .unwrap();
        registry
    }

    fn definitions() -> Vec<VariableDefinition> {
        parse_definitions([
            ("db_host", "consul(svc/db/host)"),
            ("db_pass", "vault(secret/db:password)"),
        ])
        .unwrap()
    }

    fn args(dir: &Path, yes: bool) -> MergeArgs {
        let deployment = dir.join("deployment.yaml");
        std::fs::write(&deployment, DEPLOYMENT).unwrap();

        MergeArgs {
            deployment,
            container: "web".to_string(),
            config_map_name: Some("web-config".to_string()),
            secret_name: None,
            overwrite: false,
            yes,
            destination: dir.join("out.yaml"),
        }
    }

    fn written_env(path: &Path) -> Vec<EnvVar> {
        let manifest = Manifest::<Deployment>::read(path).unwrap();
        manifest.resource.spec.unwrap().template.spec.unwrap().containers[0]
            .env
            .clone()
            .unwrap()
    }

    #[tokio::test]
    async fn test_merge_writes_references() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(dir.path(), true);
        let mut out = Vec::new();

        let written = merge(&registry(), &definitions(), &args, &mut out, &mut io::empty())
            .await
            .unwrap();
        assert!(written);

        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("Added: DB_HOST, DB_PASS"));

        let env = written_env(&args.destination);
        assert_eq!(env.len(), 3);
        assert_eq!(env[0].name, "KEEP");

        let host = env[1].value_from.as_ref().unwrap().config_map_key_ref.as_ref().unwrap();
        assert_eq!(env[1].name, "DB_HOST");
        assert_eq!(host.key, "db_host");
        assert_eq!(host.name, "web-config");

        let pass = env[2].value_from.as_ref().unwrap().secret_key_ref.as_ref().unwrap();
        assert_eq!(env[2].name, "DB_PASS");
        assert_eq!(pass.key, "db_pass");
        assert_eq!(pass.name, "web");

        let contents = std::fs::read_to_string(&args.destination).unwrap();
        assert!(contents.starts_with("apiVersion: v1\nkind: Service"));
        assert!(!contents.contains("s3cr3t"));
    }

    #[tokio::test]
    async fn test_merge_declined() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(dir.path(), false);
        let mut out = Vec::new();

        let written = merge(&registry(), &definitions(), &args, &mut out, &mut "n\n".as_bytes())
            .await
            .unwrap();
        assert!(!written);
        assert!(!args.destination.exists());

        let output = String::from_utf8(out).unwrap();
        assert!(
            output
                .lines()
                .any(|line| line.starts_with('+') && line.contains("name: DB_HOST"))
        );
        assert!(output.ends_with("Apply changes? [Y/n]"));
    }

    #[tokio::test]
    async fn test_merge_unknown_container() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(dir.path(), true);
        args.container = "nope".to_string();

        let result = merge(&registry(), &definitions(), &args, &mut Vec::new(), &mut io::empty()).await;
        assert!(result.is_err());
        assert!(!args.destination.exists());
    }
}
