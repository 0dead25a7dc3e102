//! Engineer command - productivity from hand-entered hours
//!
//! # Usage
//!
//! ```bash
//! # Resolved count given directly
//! deskpulse engineer --input hours.json --resolved 12
//!
//! # Resolved count taken from stored tickets for a responder
//! deskpulse engineer --input hours.json --responder 4021 --week 2024-05-06
//! ```
//!
//! `hours.json`:
//!
//! ```json
//! {"engineerName": "Sam", "totalHoursWorked": 38.5, "weekSnapshotId": "weekly_20240506"}
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{ArgGroup, Args};
use deskpulse_analytics::{
    DateRange, compute_engineer_metrics, count_resolved_by_responder, parse_engineer_hours,
};
use deskpulse_control::TicketStore;

use crate::runtime::{Stores, load_config};

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("resolved_source").required(true).args(["resolved", "responder"])))]
pub struct EngineerArgs {
    /// JSON file with engineerName, totalHoursWorked, weekSnapshotId
    #[arg(long)]
    pub input: PathBuf,

    /// Tickets resolved in the week
    #[arg(long)]
    pub resolved: Option<u64>,

    /// Count resolved tickets for this responder id from the store
    #[arg(long)]
    pub responder: Option<u64>,

    /// Week to count in (any date inside it); defaults to last week
    #[arg(long, requires = "responder")]
    pub week: Option<NaiveDate>,
}

pub async fn run(args: EngineerArgs, config_path: Option<&Path>) -> Result<()> {
    let raw = tokio::fs::read_to_string(&args.input)
        .await
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not JSON", args.input.display()))?;
    let input = parse_engineer_hours(&value).context("invalid engineer hours")?;

    let now = Utc::now();
    let resolved = match (args.resolved, args.responder) {
        (Some(resolved), _) => resolved,
        (None, Some(responder)) => {
            let config = load_config(config_path)?;
            let stores = Stores::open(&config.store).await?;
            let tickets = stores
                .tickets
                .list_all()
                .await
                .context("failed to load stored tickets")?;
            let week = args
                .week
                .map(DateRange::week_containing)
                .unwrap_or_else(|| DateRange::previous_week(now));
            count_resolved_by_responder(&tickets, responder, &week)
        }
        (None, None) => anyhow::bail!("either --resolved or --responder is required"),
    };

    let metrics = compute_engineer_metrics(&input, resolved, now);
    println!("{}", serde_json::to_string_pretty(&metrics)?);
    Ok(())
}
