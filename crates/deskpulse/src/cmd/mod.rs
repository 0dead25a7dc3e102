//! Command implementations for the DeskPulse CLI

pub mod engineer;
pub mod metrics;
pub mod serve;
pub mod snapshot;
pub mod sync;
