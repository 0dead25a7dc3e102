//! Turso repositories
//!
//! Database access layer behind [`crate::ControlPlane`].

mod snapshots;
mod sync_state;
mod tickets;

pub use snapshots::SnapshotRepo;
pub use sync_state::SyncStateRepo;
pub use tickets::TicketRepo;
