//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expired-entry sweep: opt-in reaping of expired entries across all caches

mod sweep;

pub use sweep::spawn_sweep_task;
