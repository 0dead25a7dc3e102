//! Job scheduler with cron support
//!
//! Runs background jobs (incremental sync, weekly snapshots) on 6-field
//! cron expressions. Each due job runs in its own tokio task; a job still
//! running when it comes due again is skipped for that slot.

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cron::Schedule;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{ConnectorError, Result};

/// Default overall timeout for one job run
const DEFAULT_OVERALL_TIMEOUT_SECS: u64 = 1800;

/// A unit of scheduled work
#[async_trait]
pub trait Job: Send + Sync {
    async fn run(&self) -> Result<()>;
}

/// A job bound to its cron schedule
pub struct ScheduledJob {
    pub name: String,
    job: Arc<dyn Job>,
    /// None = manual only
    schedule: Option<Schedule>,
    next_run: Option<DateTime<Utc>>,
    running: Arc<AtomicBool>,
    overall_timeout: Duration,
}

impl ScheduledJob {
    pub fn new(name: impl Into<String>, job: Arc<dyn Job>, cron_expr: Option<&str>) -> Result<Self> {
        let schedule = cron_expr.map(parse_schedule).transpose()?;
        let next_run = schedule.as_ref().and_then(|s| s.upcoming(Utc).next());

        Ok(Self {
            name: name.into(),
            job,
            schedule,
            next_run,
            running: Arc::new(AtomicBool::new(false)),
            overall_timeout: Duration::from_secs(DEFAULT_OVERALL_TIMEOUT_SECS),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.overall_timeout = timeout;
        self
    }

    pub fn next_run(&self) -> Option<DateTime<Utc>> {
        self.next_run
    }

    fn advance_schedule(&mut self, now: DateTime<Utc>) {
        self.next_run = self.schedule.as_ref().and_then(|s| s.after(&now).next());
    }

    fn should_run(&self, now: DateTime<Utc>) -> bool {
        self.next_run.is_some_and(|next| now >= next)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn try_start(&self) -> bool {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Parse a 6-field cron expression (`sec min hour day month weekday`)
pub fn parse_schedule(expr: &str) -> Result<Schedule> {
    Schedule::from_str(expr).map_err(|e| ConnectorError::InvalidSchedule(format!("{}: {}", expr, e)))
}

/// Scheduler that manages multiple jobs
pub struct JobScheduler {
    jobs: Vec<ScheduledJob>,
    check_interval: Duration,
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl JobScheduler {
    pub fn new() -> Self {
        Self {
            jobs: Vec::new(),
            check_interval: Duration::from_secs(30),
        }
    }

    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    pub fn add(&mut self, job: ScheduledJob) {
        info!(job = %job.name, next_run = ?job.next_run, "registered job");
        self.jobs.push(job);
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Spawn every job due at `now`; returns how many were started
    pub fn dispatch_due(&mut self, now: DateTime<Utc>) -> usize {
        let mut started = 0;

        for job in &mut self.jobs {
            if !job.should_run(now) {
                continue;
            }
            if !job.try_start() {
                warn!(job = %job.name, "skipping scheduled run - previous execution still in progress");
                job.advance_schedule(now);
                continue;
            }

            info!(job = %job.name, "spawning scheduled job");
            let name = job.name.clone();
            let work = Arc::clone(&job.job);
            let running = Arc::clone(&job.running);
            let overall_timeout = job.overall_timeout;

            tokio::spawn(async move {
                match tokio::time::timeout(overall_timeout, work.run()).await {
                    Ok(Ok(())) => debug!(job = %name, "job complete"),
                    Ok(Err(e)) => warn!(job = %name, error = %e, "job failed"),
                    Err(_) => error!(
                        job = %name,
                        timeout_secs = overall_timeout.as_secs(),
                        "job timed out"
                    ),
                }
                running.store(false, Ordering::Release);
            });

            job.advance_schedule(now);
            debug!(job = %job.name, next_run = ?job.next_run, "next scheduled run");
            started += 1;
        }

        started
    }

    /// Run the scheduler loop until `shutdown` is cancelled
    ///
    /// Jobs already spawned keep running to completion.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(
            jobs = self.jobs.len(),
            check_interval = ?self.check_interval,
            "starting job scheduler"
        );

        loop {
            self.dispatch_due(Utc::now());

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.check_interval) => {}
            }
        }

        info!("job scheduler stopped");
    }

    /// Run every job once, in order, on the current task
    pub async fn run_once(&self) -> Vec<(&str, Result<()>)> {
        let mut results = Vec::with_capacity(self.jobs.len());
        for job in &self.jobs {
            results.push((job.name.as_str(), job.job.run().await));
        }
        results
    }
}
