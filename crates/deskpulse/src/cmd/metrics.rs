//! Metrics command - support metrics over stored tickets
//!
//! # Usage
//!
//! ```bash
//! # Monday-to-Sunday week containing the date
//! deskpulse metrics --week 2024-05-08
//!
//! # Inclusive custom range
//! deskpulse metrics --range 2024-01-01,2024-03-31
//! ```

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{ArgGroup, Args};
use deskpulse_analytics::{
    DateRange, Labels, compute_date_range_metrics, compute_weekly_metrics,
};
use deskpulse_control::TicketStore;

use crate::runtime::{Stores, helpdesks, load_config};

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("window").required(true).args(["range", "week"])))]
pub struct MetricsArgs {
    /// Inclusive range `YYYY-MM-DD,YYYY-MM-DD`
    #[arg(long, value_parser = DateRange::parse)]
    pub range: Option<DateRange>,

    /// Any date inside the wanted week
    #[arg(long)]
    pub week: Option<NaiveDate>,

    /// Use synthesized group/company labels instead of asking the helpdesk
    #[arg(long)]
    pub offline: bool,

    /// Print on one line
    #[arg(long)]
    pub compact: bool,
}

pub async fn run(args: MetricsArgs, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let stores = Stores::open(&config.store).await?;
    let tickets = stores
        .tickets
        .list_all()
        .await
        .context("failed to load stored tickets")?;

    let labels = if args.offline {
        Labels::default()
    } else {
        match helpdesks(&config, &stores)?.into_iter().next() {
            Some(helpdesk) => helpdesk.labels.labels(Instant::now()).await,
            None => Labels::default(),
        }
    };

    let now = Utc::now();
    let value = match (args.range, args.week) {
        (Some(range), _) => serde_json::to_value(compute_date_range_metrics(
            &tickets, &labels, range, now,
        ))?,
        (None, Some(week)) => {
            serde_json::to_value(compute_weekly_metrics(&tickets, &labels, week, now))?
        }
        (None, None) => anyhow::bail!("either --range or --week is required"),
    };

    if args.compact {
        println!("{}", serde_json::to_string(&value)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}
