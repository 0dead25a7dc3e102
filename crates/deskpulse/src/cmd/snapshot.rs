//! Snapshot command - write, import or show snapshots
//!
//! # Usage
//!
//! ```bash
//! deskpulse snapshot weekly [--force]
//! deskpulse snapshot import --category telemetry --file telemetry.json [--force]
//! deskpulse snapshot show weekly_20240506
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Args, Subcommand};
use deskpulse_control::{SnapshotStore, SnapshotWriter};
use deskpulse_protocol::{SnapshotCategory, SnapshotPayload};

use crate::pipeline::WeeklySnapshot;
use crate::runtime::{Stores, helpdesks, load_config};

#[derive(Args, Debug)]
pub struct SnapshotArgs {
    #[command(subcommand)]
    pub command: SnapshotCommand,
}

#[derive(Subcommand, Debug)]
pub enum SnapshotCommand {
    /// Snapshot last week's metrics from stored tickets
    Weekly {
        /// Replace today's snapshot if it already exists
        #[arg(long)]
        force: bool,
    },

    /// Store a payload produced elsewhere as today's snapshot
    Import {
        /// telemetry, performance or weekly
        #[arg(long)]
        category: SnapshotCategory,

        /// JSON object: `totals` plus named breakdowns
        #[arg(long)]
        file: PathBuf,

        #[arg(long)]
        force: bool,
    },

    /// Print a stored snapshot
    Show {
        /// e.g. weekly_20240506
        id: String,
    },
}

pub async fn run(args: SnapshotArgs, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let stores = Stores::open(&config.store).await?;
    let now = Utc::now();

    match args.command {
        SnapshotCommand::Weekly { force } => {
            let mut weekly = WeeklySnapshot::new(stores.tickets.clone(), stores.snapshots.clone());
            if let Some(helpdesk) = helpdesks(&config, &stores)?.into_iter().next() {
                weekly = weekly.with_labels(helpdesk.labels);
            }
            let outcome = weekly
                .run_at(now, force)
                .await
                .context("failed to write weekly snapshot")?;
            println!("{}", serde_json::to_string_pretty(&outcome.write.snapshot)?);
        }
        SnapshotCommand::Import {
            category,
            file,
            force,
        } => {
            let payload = read_payload(&file).await?;
            let outcome = SnapshotWriter::new(stores.snapshots.clone())
                .write(category, payload, force, now)
                .await
                .context("failed to write snapshot")?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        SnapshotCommand::Show { id } => match stores.snapshots.get(&id).await? {
            Some(snapshot) => println!("{}", serde_json::to_string_pretty(&snapshot)?),
            None => bail!("snapshot '{}' not found", id),
        },
    }

    Ok(())
}

async fn read_payload(path: &Path) -> Result<SnapshotPayload> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("{} is not JSON", path.display()))?;
    SnapshotPayload::from_json(value).with_context(|| format!("invalid payload in {}", path.display()))
}
