// src/engine/summary.rs

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::types::{FailureKind, Verdict};

/// Outcome of one unit execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub unit_id: String,
    /// `None` when the process never exited on its own (or never started).
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
    pub verdict: Verdict,
    pub failure: Option<FailureKind>,
    /// Human-readable rendering of `failure`.
    pub failure_detail: Option<String>,
    /// Absent when the main invocation was never attempted.
    pub log_path: Option<PathBuf>,
    pub cleanup_warnings: Vec<String>,
}

impl ExecutionResult {
    pub fn passed(unit_id: &str, exit_code: Option<i32>, duration: Duration, log_path: PathBuf) -> Self {
        Self {
            unit_id: unit_id.to_string(),
            exit_code,
            duration_ms: duration.as_millis() as u64,
            verdict: Verdict::Pass,
            failure: None,
            failure_detail: None,
            log_path: Some(log_path),
            cleanup_warnings: Vec::new(),
        }
    }

    pub fn failed(
        unit_id: &str,
        failure: FailureKind,
        exit_code: Option<i32>,
        duration: Duration,
        log_path: Option<PathBuf>,
    ) -> Self {
        Self {
            unit_id: unit_id.to_string(),
            exit_code,
            duration_ms: duration.as_millis() as u64,
            verdict: failure.verdict(),
            failure_detail: Some(failure.to_string()),
            failure: Some(failure),
            log_path,
            cleanup_warnings: Vec::new(),
        }
    }

    pub fn with_cleanup_warnings(mut self, warnings: Vec<String>) -> Self {
        self.cleanup_warnings = warnings;
        self
    }

    pub fn is_pass(&self) -> bool {
        self.verdict.is_pass()
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Cleanup warning of a unit that has no result of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedCleanup {
    pub unit_id: String,
    pub warning: String,
}

/// Aggregate of one orchestrator invocation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Units never started because of `fail_fast`.
    pub skipped: usize,
    /// Non-passing units, sorted by id.
    pub failures: Vec<ExecutionResult>,
    /// Every reported result, sorted by id.
    pub results: Vec<ExecutionResult>,
    /// Cleanup warnings of skipped units whose setup had run.
    pub skipped_cleanup: Vec<SkippedCleanup>,
    pub duration_ms: u64,
    pub log_root: Option<PathBuf>,
}

impl RunSummary {
    pub fn from_results(
        mut results: Vec<ExecutionResult>,
        skipped: usize,
        duration: Duration,
        log_root: Option<PathBuf>,
    ) -> Self {
        // Stable sort keeps repeated runs of one id in completion order.
        results.sort_by(|a, b| a.unit_id.cmp(&b.unit_id));
        let passed = results.iter().filter(|r| r.is_pass()).count();
        let failures: Vec<_> = results.iter().filter(|r| !r.is_pass()).cloned().collect();
        Self {
            total: results.len() + skipped,
            passed,
            failed: failures.len(),
            skipped,
            failures,
            results,
            skipped_cleanup: Vec::new(),
            duration_ms: duration.as_millis() as u64,
            log_root,
        }
    }

    pub fn with_skipped_cleanup(mut self, mut warnings: Vec<SkippedCleanup>) -> Self {
        warnings.sort_by(|a, b| a.unit_id.cmp(&b.unit_id));
        self.skipped_cleanup = warnings;
        self
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "==== launchcheck summary ====")?;
        for r in self.results.iter() {
            let mark = if r.is_pass() { "PASS" } else { "FAIL" };
            writeln!(
                f,
                "  [{mark}] {:<40} {:>8.1}s  {}",
                r.unit_id,
                r.duration().as_secs_f64(),
                r.verdict
            )?;
        }
        writeln!(
            f,
            "total: {}  passed: {}  failed: {}  skipped: {}  ({:.1}s)",
            self.total,
            self.passed,
            self.failed,
            self.skipped,
            self.duration().as_secs_f64()
        )?;

        if !self.failures.is_empty() {
            writeln!(f)?;
            writeln!(f, "failures:")?;
            for r in self.failures.iter() {
                writeln!(f, "  - {} [{}]", r.unit_id, r.verdict)?;
                if let Some(detail) = &r.failure_detail {
                    writeln!(f, "      {detail}")?;
                }
                if let Some(path) = &r.log_path {
                    writeln!(f, "      log: {}", path.display())?;
                }
            }
        }

        let warnings: Vec<_> = self
            .results
            .iter()
            .flat_map(|r| r.cleanup_warnings.iter().map(move |w| (&r.unit_id, w)))
            .chain(self.skipped_cleanup.iter().map(|s| (&s.unit_id, &s.warning)))
            .collect();
        if !warnings.is_empty() {
            writeln!(f)?;
            writeln!(f, "cleanup warnings:")?;
            for (id, w) in warnings {
                writeln!(f, "  - {id}: {w}")?;
            }
        }

        if let Some(root) = &self.log_root {
            writeln!(f)?;
            writeln!(f, "logs: {}", root.display())?;
        }
        Ok(())
    }
}
