//! Urgent ticket monitor
//!
//! Polls the helpdesk search for urgent tickets created within a trailing
//! window and sends one notification per ticket.
//!
//! ```text
//! Idle -> Polling -> Notifying -> Idle
//!   \
//!    -> Stopped
//! ```
//!
//! The window is only a safety margin; the search index may lag, so dedup
//! is done by [`NotifiedTicketSet`]. A failed notification leaves the ticket
//! unmarked and it is retried on the next poll.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use deskpulse_analytics::{Labels, UNASSIGNED_GROUP};
use deskpulse_protocol::TicketRecord;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::LabelDirectory;
use crate::client::TicketingClient;
use crate::config::MonitorConfig;
use crate::credentials::Credentials;
use crate::dedup::NotifiedTicketSet;
use crate::notify::{Notification, NotificationChannel, URGENT_COLOR};
use crate::pagination::search_urgent_tickets;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Polling,
    Notifying,
    Stopped,
}

/// Counts for one poll
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PollReport {
    /// Tickets returned by the search
    pub found: usize,
    pub notified: usize,
    /// Already notified, or already resolved/closed
    pub skipped: usize,
    /// Notification attempts that failed
    pub failed: usize,
    /// Ids evicted from the dedup set
    pub evicted: usize,
}

pub struct UrgentMonitor {
    client: Arc<TicketingClient>,
    channel: Arc<dyn NotificationChannel>,
    labels: Option<Arc<LabelDirectory>>,
    settings: MonitorConfig,
    notified: Mutex<NotifiedTicketSet>,
    state: Mutex<MonitorState>,
}

impl UrgentMonitor {
    pub fn new(
        client: Arc<TicketingClient>,
        channel: Arc<dyn NotificationChannel>,
        settings: MonitorConfig,
    ) -> Self {
        Self {
            client,
            channel,
            labels: None,
            settings,
            notified: Mutex::new(NotifiedTicketSet::new()),
            state: Mutex::new(MonitorState::Idle),
        }
    }

    /// Resolve group and company names in notifications
    pub fn with_labels(mut self, labels: Arc<LabelDirectory>) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn state(&self) -> MonitorState {
        *self.state.lock()
    }

    pub fn notified_count(&self) -> usize {
        self.notified.lock().len()
    }

    fn set_state(&self, state: MonitorState) {
        *self.state.lock() = state;
    }

    /// Run one poll at `now`
    pub async fn poll_once(&self, now: DateTime<Utc>) -> PollReport {
        let mut report = PollReport::default();
        self.set_state(MonitorState::Polling);

        let created_on = (now - self.settings.window()).date_naive();
        let tickets = match search_urgent_tickets(&self.client, created_on).await {
            Ok(tickets) => tickets,
            Err(e) => {
                warn!(error = %e, "urgent ticket search failed, retrying next poll");
                self.set_state(MonitorState::Idle);
                return report;
            }
        };
        report.found = tickets.len();

        let labels = match &self.labels {
            Some(directory) => directory.labels(std::time::Instant::now()).await,
            None => Labels::default(),
        };
        let credentials = self.client.credentials().await.ok();

        for ticket in &tickets {
            let already = self.notified.lock().contains(ticket.id);
            if already || ticket.status.is_terminal() {
                report.skipped += 1;
                continue;
            }

            self.set_state(MonitorState::Notifying);
            let notification = urgent_notification(ticket, &labels, credentials.as_ref());

            match self.channel.send(&notification).await {
                Ok(()) => {
                    self.notified.lock().add(ticket.id);
                    report.notified += 1;
                    info!(ticket_id = ticket.id, "urgent ticket notified");
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(ticket_id = ticket.id, error = %e, "urgent notification failed");
                }
            }
        }

        report.evicted = self
            .notified
            .lock()
            .evict_to_bound(self.settings.max_notified);
        self.set_state(MonitorState::Idle);

        debug!(
            found = report.found,
            notified = report.notified,
            skipped = report.skipped,
            failed = report.failed,
            evicted = report.evicted,
            "urgent poll complete"
        );
        report
    }

    /// Poll now and then on every interval until the handle is stopped
    pub fn start(self: Arc<Self>) -> MonitorHandle {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let monitor = Arc::clone(&self);
        self.set_state(MonitorState::Idle);

        info!(
            interval_secs = self.settings.interval_secs,
            window_hours = self.settings.window_hours,
            "starting urgent ticket monitor"
        );

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(monitor.settings.interval());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    // The first tick completes immediately
                    _ = ticker.tick() => {
                        monitor.poll_once(Utc::now()).await;
                    }
                }
            }
        });

        MonitorHandle {
            token,
            task,
            monitor: self,
        }
    }
}

/// Running monitor; dropping it does not stop the task
pub struct MonitorHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
    monitor: Arc<UrgentMonitor>,
}

impl MonitorHandle {
    /// Cancel the interval, let an in-flight poll finish, enter `Stopped`
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "urgent monitor task ended abnormally");
        }
        self.monitor.set_state(MonitorState::Stopped);
        info!("urgent ticket monitor stopped");
    }

    pub fn monitor(&self) -> &Arc<UrgentMonitor> {
        &self.monitor
    }
}

/// Build the notification for one urgent ticket
pub fn urgent_notification(
    ticket: &TicketRecord,
    labels: &Labels,
    credentials: Option<&Credentials>,
) -> Notification {
    let group = ticket
        .group_id
        .map(|id| labels.group_name(id))
        .unwrap_or_else(|| UNASSIGNED_GROUP.to_string());
    let company = ticket
        .company_id
        .map(|id| labels.company_name(id))
        .unwrap_or_else(|| "None".to_string());
    let subject = if ticket.subject.trim().is_empty() {
        "(no subject)".to_string()
    } else {
        ticket.subject.clone()
    };

    let mut notification = Notification::new(
        format!("Urgent ticket #{}", ticket.id),
        URGENT_COLOR,
        ticket.created_at,
    )
    .field("Subject", subject, false)
    .field("Group", group, true)
    .field("Company", company, true)
    .field(
        "Created",
        ticket.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        true,
    );

    if let Some(credentials) = credentials {
        notification = notification.field("Link", credentials.ticket_link(ticket.id), false);
    }
    notification
}
