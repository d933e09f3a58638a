//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expiry Sweep: Deletes entries not accessed within the retention window

mod sweep;

pub use sweep::{governing_timestamp, is_expired, spawn_sweep_task, sweep_expired, SweepReport};
