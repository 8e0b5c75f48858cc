// src/engine/scheduler.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, info, warn};

use crate::engine::pipeline::{UnitOutcome, UnitPipeline};
use crate::engine::summary::{ExecutionResult, RunSummary, SkippedCleanup};
use crate::types::FailureKind;
use crate::unit::{UnitDescriptor, UnitLocation};

/// A discovered unit, ready to run or already known to be broken.
#[derive(Debug, Clone)]
pub enum PlannedUnit {
    Ready(UnitDescriptor),
    Malformed { location: UnitLocation, reason: String },
}

impl PlannedUnit {
    pub fn id(&self) -> &str {
        match self {
            PlannedUnit::Ready(unit) => unit.id(),
            PlannedUnit::Malformed { location, .. } => &location.id,
        }
    }
}

/// Bounded worker pool over [`UnitPipeline`].
///
/// Results are collected in completion order and sorted by id in the
/// summary. With `fail_fast`, the first non-passing result stops units that
/// have not started their main invocation yet; in-flight units finish and
/// clean up normally.
#[derive(Debug)]
pub struct Scheduler {
    pipeline: Arc<UnitPipeline>,
    workers: usize,
    fail_fast: bool,
}

impl Scheduler {
    pub fn new(pipeline: UnitPipeline, workers: usize, fail_fast: bool) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            workers: workers.max(1),
            fail_fast,
        }
    }

    pub async fn run(&self, plan: Vec<PlannedUnit>) -> RunSummary {
        let started = Instant::now();
        let cancel = Arc::new(AtomicBool::new(false));
        let mut results = Vec::with_capacity(plan.len());
        let mut skipped = 0usize;
        let mut skipped_cleanup = Vec::new();

        let mut ready = Vec::new();
        for planned in plan {
            match planned {
                PlannedUnit::Ready(unit) => ready.push(unit),
                PlannedUnit::Malformed { location, reason } => {
                    warn!(unit = %location.id, path = %location.config_path.display(), reason = %reason, "malformed unit config");
                    results.push(ExecutionResult::failed(
                        &location.id,
                        FailureKind::MalformedConfig { reason },
                        None,
                        std::time::Duration::ZERO,
                        None,
                    ));
                }
            }
        }
        if self.fail_fast && !results.is_empty() {
            info!("fail-fast: malformed units present; not starting any unit");
            cancel.store(true, Ordering::SeqCst);
        }

        let expected = results.len() + ready.len();
        info!(units = ready.len(), workers = self.workers, "scheduling units");

        let permits = Arc::new(Semaphore::new(self.workers));
        let (tx, mut rx) = mpsc::channel::<(String, UnitOutcome)>(ready.len().max(1));

        for unit in ready {
            let pipeline = Arc::clone(&self.pipeline);
            let permits = Arc::clone(&permits);
            let cancel = Arc::clone(&cancel);
            let tx = tx.clone();
            let fail_fast = self.fail_fast;
            tokio::spawn(async move {
                // The pool is never closed while units are queued.
                let _permit = permits.acquire_owned().await.ok();
                let outcome = pipeline.run_unit(&unit, &cancel).await;
                // Raised before the permit is released, so the next queued
                // unit already sees it.
                if fail_fast
                    && matches!(&outcome, UnitOutcome::Finished(r) if !r.is_pass())
                    && !cancel.swap(true, Ordering::SeqCst)
                {
                    info!(unit = %unit.id(), "fail-fast: cancelling units that have not started");
                }
                let _ = tx.send((unit.id().to_string(), outcome)).await;
            });
        }
        drop(tx);

        while let Some((id, outcome)) = rx.recv().await {
            match outcome {
                UnitOutcome::Finished(result) => {
                    debug!(unit = %id, verdict = %result.verdict, "result received");
                    results.push(result);
                }
                UnitOutcome::Skipped { cleanup_warnings } => {
                    skipped += 1;
                    skipped_cleanup.extend(cleanup_warnings.into_iter().map(|warning| SkippedCleanup {
                        unit_id: id.clone(),
                        warning,
                    }));
                }
            }
        }

        // A worker that panicked never reports; count it as skipped rather
        // than losing it silently.
        skipped += expected.saturating_sub(results.len() + skipped);

        RunSummary::from_results(
            results,
            skipped,
            started.elapsed(),
            Some(self.pipeline.logs().run_dir().to_path_buf()),
        )
        .with_skipped_cleanup(skipped_cleanup)
    }
}
