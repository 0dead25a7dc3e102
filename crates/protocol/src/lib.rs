//! Deskpulse Protocol - Shared data model
//!
//! Types that flow between the ingestion connectors, the durable store and
//! the metrics engine:
//! - `TicketRecord` - one support ticket with status, priority, tags
//! - `GroupRecord` / `CompanyRecord` - id to display-name lookups
//! - `Snapshot` - immutable dated aggregate keyed by category and day

mod error;
mod lookup;
mod snapshot;
mod ticket;

pub use error::ProtocolError;
pub use lookup::{CompanyRecord, GroupRecord, Labelled};
pub use snapshot::{Snapshot, SnapshotCategory, SnapshotPayload, snapshot_id};
pub use ticket::{TicketPriority, TicketRecord, TicketStatus};

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
