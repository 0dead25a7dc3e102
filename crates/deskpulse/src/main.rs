//! DeskPulse - helpdesk sync, urgent ticket alerts and weekly support metrics
//!
//! # Usage
//!
//! ```bash
//! # Scheduled sync, weekly snapshots and the urgent monitor
//! deskpulse serve --config deskpulse.toml
//!
//! # One-off sync (incremental, or the full year with --full)
//! deskpulse sync --full
//!
//! # Metrics over stored tickets
//! deskpulse metrics --week 2024-05-06
//! deskpulse metrics --range 2024-01-01,2024-03-31
//! ```

mod cmd;
mod pipeline;
mod runtime;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use deskpulse_config::{Config, LogConfig, LogFormat, LogOutput};
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "deskpulse")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run scheduled sync, weekly snapshots and the urgent monitor
    Serve(cmd::serve::ServeArgs),

    /// Sync tickets from the helpdesk into the store
    Sync(cmd::sync::SyncArgs),

    /// Write, import or show snapshots
    Snapshot(cmd::snapshot::SnapshotArgs),

    /// Compute support metrics over stored tickets
    Metrics(cmd::metrics::MetricsArgs),

    /// Derive engineer productivity from logged hours
    Engineer(cmd::engineer::EngineerArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Command::Serve(args) => {
            init_logging(cli.log_level.as_deref(), config)?;
            cmd::serve::run(args, config).await
        }
        Command::Sync(args) => {
            init_logging(cli.log_level.as_deref(), config)?;
            cmd::sync::run(args, config).await
        }
        Command::Snapshot(args) => {
            init_logging(cli.log_level.as_deref(), config)?;
            cmd::snapshot::run(args, config).await
        }
        Command::Metrics(args) => {
            // Metrics doesn't need logging - just outputs to stdout
            cmd::metrics::run(args, config).await
        }
        Command::Engineer(args) => {
            // Engineer doesn't need logging - just outputs to stdout
            cmd::engineer::run(args, config).await
        }
    }
}

/// Logging settings from the config file, defaults when unreadable
fn log_config(config_path: Option<&Path>) -> LogConfig {
    config_path
        .filter(|path| path.exists())
        .and_then(|path| Config::from_file(path).ok())
        .map(|config| config.log)
        .unwrap_or_default()
}

/// Initialize the tracing subscriber for logging
fn init_logging(cli_level: Option<&str>, config_path: Option<&Path>) -> Result<()> {
    let log = log_config(config_path);
    // CLI flag > config file > "info"
    let directives = log.filter(cli_level);

    let filter = EnvFilter::try_new(&directives)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log filter: {}", e))?;

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match (log.format, log.output) {
        (LogFormat::Console, LogOutput::Stdout) => fmt::layer().with_target(true).boxed(),
        (LogFormat::Console, LogOutput::Stderr) => fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        (LogFormat::Json, LogOutput::Stdout) => fmt::layer().json().boxed(),
        (LogFormat::Json, LogOutput::Stderr) => {
            fmt::layer().json().with_writer(std::io::stderr).boxed()
        }
    };

    tracing_subscriber::registry().with(layer).with(filter).init();

    Ok(())
}
