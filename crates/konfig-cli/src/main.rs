//! konfig CLI tool.

use anyhow::Context;
use clap::{Parser, Subcommand};
use konfig_config::{DEFAULT_LOG_LEVEL, Settings};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

mod commands;
mod confirm;

use commands::{GetArgs, MergeArgs, RemoteArgs, SetArgs};

#[derive(Parser)]
#[command(name = "konfig")]
#[command(
    about = "Resolves application variables and wires them into Kubernetes deployments",
    long_about = None
)]
struct Cli {
    /// Configuration file (defaults to ./konfig.kdl, then ~/.konfig.kdl)
    #[arg(long, global = true, env = "KONFIG_CONFIG")]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, env = "KONFIG_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(flatten)]
    remote: RemoteArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the configured variables and print them
    #[command(alias = "download")]
    Get(GetArgs),
    /// Resolve the variables and merge them into a deployment
    Merge(MergeArgs),
    /// Point a deployment at existing ConfigMap and Secret objects
    Set(SetArgs),
    /// Parse the configured definitions and print them
    Validate,
}

/// `RUST_LOG` when set, else the given level.
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Load the settings, logging the lookup at `level` since the configured level is not
/// known yet.
fn load_settings<W>(path: Option<&Path>, level: &str, writer: W) -> anyhow::Result<Settings>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_writer(writer)
        .finish();

    tracing::subscriber::with_default(bootstrap, || Settings::load(path))
        .context("Failed to load configuration")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = load_settings(
        cli.config.as_deref(),
        cli.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL),
        std::io::stderr,
    )?;

    cli.remote.apply(&mut settings);
    if let Some(level) = cli.log_level {
        settings.log_level = level;
    }

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(&settings.log_level))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Get(args) => commands::get::run(&settings, args).await?,
        Commands::Merge(args) => commands::merge::run(&settings, args).await?,
        Commands::Set(args) => commands::set::run(&settings, args)?,
        Commands::Validate => commands::validate(&settings)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_config_loading_is_logged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("konfig.kdl");
        std::fs::write(&path, "log-level \"warn\"\n").unwrap();

        let captured = Captured::default();
        let writer = captured.clone();
        let settings = load_settings(Some(&path), "debug", move || writer.clone()).unwrap();

        assert_eq!(settings.log_level, "warn");
        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("Loading config file"));
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.kdl");

        assert!(load_settings(Some(&path), "info", io::sink).is_err());
    }
}
