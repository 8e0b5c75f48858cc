// src/engine/mod.rs

//! Orchestration engine for launchcheck.
//!
//! This module ties together:
//! - the per-unit pipeline (env check, setup, launch, cleanup, validation)
//! - the port token serializing main invocations on the shared port
//! - the bounded worker pool and `fail_fast` cancellation
//! - result aggregation and report rendering
//!
//! The scheduler is the only place that knows about concurrency; the
//! pipeline runs one unit and never fails.

pub mod pipeline;
pub mod port;
pub mod report;
pub mod scheduler;
pub mod summary;

pub use pipeline::{UnitOutcome, UnitPipeline};
pub use port::{PortLock, PortToken};
pub use report::{ReportFormat, render_markdown, write_report};
pub use scheduler::{PlannedUnit, Scheduler};
pub use summary::{ExecutionResult, RunSummary, SkippedCleanup};
