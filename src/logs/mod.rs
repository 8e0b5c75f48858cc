// src/logs/mod.rs

//! Durable per-unit logs.
//!
//! - [`manager`] allocates collision-free log files (flat or per-run layout).
//! - [`cleanup`] is the explicit `--clean-logs` operation; nothing else ever
//!   deletes a log.

pub mod cleanup;
pub mod manager;

pub use cleanup::{CleanupStats, clean_logs};
pub use manager::{LogManager, LogSink};
