//! Serve command - run background jobs until Ctrl-C
//!
//! - incremental sync per connector on its cron schedule
//! - the weekly snapshot on `[snapshots] weekly_schedule`
//! - the urgent ticket monitor per connector with `monitor.enabled`

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use deskpulse_connectors::{
    JobScheduler, MonitorHandle, ScheduledJob, SyncJob, SyncMode, UrgentMonitor,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::pipeline::WeeklySnapshot;
use crate::runtime::{Stores, helpdesks, load_config, notification_channel};

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Run a bulk reload before starting the jobs
    #[arg(long)]
    pub initial_reload: bool,

    /// Seconds between scheduler checks
    #[arg(long, default_value = "30")]
    pub check_interval: u64,
}

pub async fn run(args: ServeArgs, config_path: Option<&Path>) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path.map(|p| p.display().to_string()).unwrap_or_else(|| "(default)".into()),
        "DeskPulse starting"
    );

    let config = load_config(config_path)?;
    let stores = Stores::open(&config.store).await?;
    let helpdesks = helpdesks(&config, &stores)?;
    if helpdesks.is_empty() {
        warn!("no enabled connectors, only the weekly snapshot will run");
    }

    let cancel = CancellationToken::new();
    let mut scheduler =
        JobScheduler::new().with_check_interval(Duration::from_secs(args.check_interval.max(1)));
    let mut monitors: Vec<MonitorHandle> = Vec::new();
    let channel = notification_channel(&config.notify)?;

    for helpdesk in &helpdesks {
        if args.initial_reload {
            match helpdesk.runner.run_bulk().await {
                Ok(report) => info!(connector = %helpdesk.name, tickets = report.tickets, "initial reload complete"),
                Err(e) => error!(connector = %helpdesk.name, error = %e, "initial reload failed"),
            }
        }

        let job = SyncJob::new(helpdesk.runner.clone(), SyncMode::Incremental);
        scheduler.add(
            ScheduledJob::new(
                format!("{}-sync", helpdesk.name),
                Arc::new(job),
                Some(helpdesk.schedule.as_str()),
            )
            .with_context(|| format!("invalid schedule for '{}'", helpdesk.name))?,
        );

        if helpdesk.config.monitor.enabled {
            let monitor = UrgentMonitor::new(
                helpdesk.client.clone(),
                channel.clone(),
                helpdesk.config.monitor.clone(),
            )
            .with_labels(helpdesk.labels.clone());
            monitors.push(Arc::new(monitor).start());
        }
    }

    if config.snapshots.enabled {
        let mut weekly = WeeklySnapshot::new(stores.tickets.clone(), stores.snapshots.clone());
        // Labels come from the first connector; without one, ids are synthesized
        if let Some(helpdesk) = helpdesks.first() {
            weekly = weekly.with_labels(helpdesk.labels.clone());
        }
        scheduler.add(
            ScheduledJob::new(
                "weekly-snapshot",
                Arc::new(weekly),
                Some(config.snapshots.weekly_schedule.as_str()),
            )
            .context("invalid weekly snapshot schedule")?,
        );
    }

    info!(
        jobs = scheduler.len(),
        monitors = monitors.len(),
        "background work started"
    );
    let scheduler_task = tokio::spawn(scheduler.run(cancel.clone()));

    signal::ctrl_c().await.context("failed to listen for Ctrl-C")?;
    info!("shutdown requested");

    cancel.cancel();
    for monitor in monitors {
        monitor.stop().await;
    }
    if let Err(e) = scheduler_task.await {
        error!(error = %e, "scheduler task ended abnormally");
    }

    info!("DeskPulse shutdown complete");
    Ok(())
}
