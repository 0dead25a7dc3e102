//! Deskpulse Analytics Engine
//!
//! Derives business metrics from synced ticket data.
//!
//! # Overview
//!
//! - **Date ranges**: inclusive windows, ISO weeks, custom `from,to` ranges
//! - **Summary metrics**: status/priority/group breakdowns, top company,
//!   average resolution time, tag frequency
//! - **Engineer metrics**: hours per resolved ticket
//! - **Validation**: boundary checks for hand-entered engineer hours
//!
//! Everything is synchronous and side-effect free.
//!
//! # Usage
//!
//! ```ignore
//! use deskpulse_analytics::{DateRange, Labels, compute_date_range_metrics};
//!
//! let range = DateRange::parse("2024-01-01,2024-01-31")?;
//! let metrics = compute_date_range_metrics(&tickets, &labels, range, Utc::now());
//! println!("{}", serde_json::to_string_pretty(&metrics)?);
//! ```

pub mod error;
pub mod labels;
pub mod metrics;
pub mod timerange;
pub mod validation;


pub use error::{AnalyticsError, Result};
pub use labels::{Labels, label_map};
pub use metrics::{
    DateRangeMetrics, DerivedEngineerMetrics, EngineerHoursInput, GroupBreakdown,
    PriorityBreakdown, TagCount, TagsAnalysis, TicketSummary, TopCompany, WeeklyMetrics,
    compute_date_range_metrics, compute_engineer_metrics, compute_weekly_metrics,
    TOP_TAGS, UNASSIGNED_GROUP, count_resolved_by_responder, summarize,
};
pub use timerange::{DateRange, start_of_year};
pub use validation::{parse_engineer_hours, validate_engineer_hours};
