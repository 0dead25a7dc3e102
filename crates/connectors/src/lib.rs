//! DeskPulse - Connectors
//!
//! Pull-based access to the Freshdesk helpdesk API and the background work
//! built on it.
//!
//! # Layers
//!
//! - **Client**: one call at a time through [`TicketingClient`], paced,
//!   retried with linear backoff, honoring `Retry-After` on 429
//! - **Pagination**: page walks for groups, companies and tickets, sliding
//!   the `updated_since` window when the page limit is reached
//! - **Sync**: [`BulkReload`] and [`IncrementalSync`] behind a single-flight
//!   [`SyncRunner`] that persists tickets and advances the watermark
//! - **Monitor**: [`UrgentMonitor`] polls for new urgent tickets and sends
//!   one notification per ticket
//! - **Scheduler**: cron-driven [`JobScheduler`] for periodic jobs
//!
//! # Example
//!
//! ```ignore
//! use deskpulse_connectors::{FreshdeskConnectorConfig, TicketingClient, fetch_groups};
//!
//! let config = FreshdeskConnectorConfig::from_toml(&value)?;
//! let client = TicketingClient::with_reqwest(
//!     config.credentials_provider(),
//!     config.resilience_config(),
//! )?;
//! let groups = fetch_groups(&client).await?;
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod credentials;
pub mod dedup;
mod error;
pub mod monitor;
pub mod notify;
pub mod pagination;
pub mod resilience;
mod scheduler;
pub mod sync;

#[cfg(test)]
mod testing;

#[cfg(test)]
mod sync_test;

// Re-exports
pub use cache::{DEFAULT_LABEL_TTL, LabelDirectory, TtlCache};
pub use client::{HttpResponse, HttpTransport, ReqwestTransport, TicketingClient};
pub use config::{FreshdeskConnectorConfig, MonitorConfig};
pub use credentials::{
    Credentials, CredentialsProvider, FallbackCredentials, FileCredentials, StaticCredentials,
};
pub use dedup::{DEFAULT_NOTIFIED_BOUND, NotifiedTicketSet};
pub use error::{ConnectorError, Result};
pub use monitor::{MonitorHandle, MonitorState, PollReport, UrgentMonitor, urgent_notification};
pub use notify::{LogChannel, Notification, NotificationChannel, URGENT_COLOR, WebhookChannel};
pub use pagination::{
    fetch_all_pages, fetch_companies, fetch_groups, fetch_tickets_updated_since,
    search_urgent_tickets,
};
pub use resilience::{ResilienceConfig, ResilienceMetrics};
pub use scheduler::{Job, JobScheduler, ScheduledJob, parse_schedule};
pub use sync::{
    BulkReload, IncrementalSync, SyncJob, SyncMode, SyncReport, SyncRunner, tickets_watermark,
};

/// Connector types this build understands
pub fn available_connectors() -> &'static [&'static str] {
    &["freshdesk"]
}
