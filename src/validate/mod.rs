// src/validate/mod.rs

//! Output validation.
//!
//! A unit passes only when two independent signals agree: the process exited
//! with code 0, and its output satisfied the unit's [`OutputCheck`].
//! [`ValidationReport`] carries both signals separately.
//!
//! - [`pattern`]: every `successRegex` must match somewhere in the output.
//! - [`external`]: an injected [`ExternalChecker`] judges the output against
//!   the unit's natural-language prompt.

pub mod external;
pub mod pattern;

use std::sync::Arc;

use tracing::{debug, info};

use crate::exec::BoxFuture;
use crate::types::FailureKind;
use crate::unit::{UnitDescriptor, Validation};

pub use external::{CheckRequest, CheckerVerdict, CommandChecker, ExternalChecker, ExternalValidator};
pub use pattern::PatternValidator;

/// What a single [`OutputCheck`] concluded about the captured text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Evaluation {
    pub passed: bool,
    /// Patterns that were not found (pattern mode).
    pub missing: Vec<String>,
    /// Patterns that were found (pattern mode).
    pub matched: Vec<String>,
    /// Checker explanation (external mode).
    pub rationale: Option<String>,
    /// The checker could not be consulted at all.
    pub error: Option<String>,
}

/// Strategy interface: judge captured output.
pub trait OutputCheck: Send + Sync {
    fn evaluate<'a>(&'a self, output: &'a str) -> BoxFuture<'a, Evaluation>;
}

/// The two signals behind a verdict, kept separate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub exit_code: Option<i32>,
    pub exit_ok: bool,
    pub patterns_ok: bool,
    pub evaluation: Evaluation,
}

impl ValidationReport {
    pub fn combine(exit_code: Option<i32>, evaluation: Evaluation) -> Self {
        Self {
            exit_code,
            exit_ok: exit_code == Some(0),
            patterns_ok: evaluation.passed && evaluation.error.is_none(),
            evaluation,
        }
    }

    pub fn passed(&self) -> bool {
        self.exit_ok && self.patterns_ok
    }

    /// `None` when passed.
    pub fn failure(&self) -> Option<FailureKind> {
        if self.passed() {
            return None;
        }
        if !self.exit_ok {
            return Some(FailureKind::ExecutionFailed {
                exit_code: self.exit_code,
                missing: self.evaluation.missing.clone(),
            });
        }
        if let Some(err) = &self.evaluation.error {
            return Some(FailureKind::CheckerError {
                reason: err.clone(),
            });
        }
        Some(FailureKind::ValidationFailed {
            missing: self.evaluation.missing.clone(),
            rationale: self.evaluation.rationale.clone(),
        })
    }
}

/// Picks the right [`OutputCheck`] for a unit and combines its result with
/// the exit code.
#[derive(Clone, Default)]
pub struct OutputValidator {
    checker: Option<Arc<dyn ExternalChecker>>,
}

impl std::fmt::Debug for OutputValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputValidator")
            .field("has_checker", &self.checker.is_some())
            .finish()
    }
}

impl OutputValidator {
    pub fn new(checker: Option<Arc<dyn ExternalChecker>>) -> Self {
        Self { checker }
    }

    pub fn check_for(&self, unit: &UnitDescriptor) -> Box<dyn OutputCheck> {
        match &unit.validation {
            Validation::Pattern => Box::new(PatternValidator::new(&unit.success_patterns)),
            Validation::External { prompt } => Box::new(ExternalValidator::new(
                unit.id().to_string(),
                prompt.clone(),
                self.checker.clone(),
            )),
        }
    }

    pub async fn validate(
        &self,
        unit: &UnitDescriptor,
        exit_code: Option<i32>,
        output: &str,
    ) -> ValidationReport {
        let evaluation = self.check_for(unit).evaluate(output).await;
        let report = ValidationReport::combine(exit_code, evaluation);
        debug!(
            unit = %unit.id(),
            exit_ok = report.exit_ok,
            patterns_ok = report.patterns_ok,
            missing = ?report.evaluation.missing,
            "validation finished"
        );
        report
    }
}

/// Log FOUND / MISSING for each pattern (stream mode).
pub fn log_pattern_breakdown(unit: &UnitDescriptor, evaluation: &Evaluation) {
    for (i, pattern) in unit.success_patterns.iter().enumerate() {
        let found = evaluation.matched.iter().any(|m| m == pattern);
        info!(
            unit = %unit.id(),
            "pattern {}: {:?} -> {}",
            i + 1,
            pattern,
            if found { "FOUND" } else { "MISSING" }
        );
    }
}
