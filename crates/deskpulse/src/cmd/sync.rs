//! Sync command - fetch tickets from the helpdesk into the store

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use crate::runtime::{Stores, load_config, select_helpdesk};

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Reload every ticket updated this year, replacing the stored set
    #[arg(long)]
    pub full: bool,

    /// Connector name when several are configured
    #[arg(long)]
    pub connector: Option<String>,
}

pub async fn run(args: SyncArgs, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let stores = Stores::open(&config.store).await?;
    let helpdesk = select_helpdesk(&config, &stores, args.connector.as_deref())?;

    info!(connector = %helpdesk.name, full = args.full, "running sync");
    let report = if args.full {
        helpdesk.runner.run_bulk().await
    } else {
        helpdesk.runner.run_incremental().await
    }
    .with_context(|| format!("sync failed for '{}'", helpdesk.name))?;

    info!(
        connector = %helpdesk.name,
        requests = helpdesk.client.metrics().requests(),
        retries = helpdesk.client.metrics().retries(),
        rate_limit_waits = helpdesk.client.metrics().rate_limit_waits(),
        timeouts = helpdesk.client.metrics().timeouts(),
        "client stats"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
