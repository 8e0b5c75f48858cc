// src/types.rs

//! Shared vocabulary: validation modes, verdicts, failure kinds and log layout.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a unit's captured output is judged.
///
/// - `Pattern`: every `successRegex` entry must match (default).
/// - `External`: the verdict is delegated to an injected checker, fed with
///   the unit's `aiValidationPrompt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum ValidationMode {
    #[default]
    #[serde(rename = "regex", alias = "pattern")]
    Pattern,
    #[serde(rename = "ai", alias = "external")]
    External,
}

impl FromStr for ValidationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "regex" | "pattern" => Ok(ValidationMode::Pattern),
            "ai" | "external" => Ok(ValidationMode::External),
            other => Err(format!(
                "invalid validationMode: {other} (expected \"regex\" or \"ai\")"
            )),
        }
    }
}

/// Final classification of one unit execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Verdict {
    Pass,
    Fail,
    Timeout,
    SetupFailed,
    MissingEnv,
}

impl Verdict {
    pub fn is_pass(self) -> bool {
        self == Verdict::Pass
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Pass => "pass",
            Verdict::Fail => "fail",
            Verdict::Timeout => "timeout",
            Verdict::SetupFailed => "setupFailed",
            Verdict::MissingEnv => "missingEnv",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a unit did not pass.
///
/// Every per-unit problem ends up here; none of them abort the run (except
/// through `fail_fast`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FailureKind {
    /// The unit's configuration artifact could not be loaded.
    MalformedConfig { reason: String },
    /// One or more `requiredEnv` names were unset or empty.
    MissingEnv { names: Vec<String> },
    /// A setup command exited non-zero, timed out or could not be spawned.
    SetupFailed { command: String, reason: String },
    /// The main invocation exceeded its wall-clock bound and was killed.
    ///
    /// `matched` lists the patterns already present in the partial output.
    Timeout { after_secs: u64, matched: Vec<String> },
    /// The main invocation exited unsuccessfully (`exit_code = None` means it
    /// was terminated by a signal).
    ExecutionFailed {
        exit_code: Option<i32>,
        missing: Vec<String>,
    },
    /// The launcher program could not be started at all.
    SpawnFailed { reason: String },
    /// Unsuccessful exit whose output shows the contended port was taken.
    PortConflict { port: u16, exit_code: Option<i32> },
    /// Exit was clean but the output did not satisfy the success criteria.
    ValidationFailed {
        missing: Vec<String>,
        rationale: Option<String>,
    },
    /// The external checker could not produce a verdict.
    CheckerError { reason: String },
}

impl FailureKind {
    pub fn verdict(&self) -> Verdict {
        match self {
            FailureKind::MissingEnv { .. } => Verdict::MissingEnv,
            FailureKind::SetupFailed { .. } => Verdict::SetupFailed,
            FailureKind::Timeout { .. } => Verdict::Timeout,
            FailureKind::MalformedConfig { .. }
            | FailureKind::ExecutionFailed { .. }
            | FailureKind::SpawnFailed { .. }
            | FailureKind::PortConflict { .. }
            | FailureKind::ValidationFailed { .. }
            | FailureKind::CheckerError { .. } => Verdict::Fail,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::MalformedConfig { reason } => write!(f, "malformed config: {reason}"),
            FailureKind::MissingEnv { names } => {
                write!(f, "missing required environment: {}", names.join(", "))
            }
            FailureKind::SetupFailed { command, reason } => {
                write!(f, "setup command `{command}` failed: {reason}")
            }
            FailureKind::Timeout { after_secs, matched } => {
                write!(f, "timeout after {after_secs}s")?;
                if !matched.is_empty() {
                    write!(f, " (process never exited; matched before kill: {matched:?})")?;
                }
                Ok(())
            }
            FailureKind::ExecutionFailed { exit_code, missing } => {
                match exit_code {
                    Some(code) => write!(f, "exit code {code}")?,
                    None => write!(f, "terminated by signal")?,
                }
                if !missing.is_empty() {
                    write!(f, "; missing patterns: {missing:?}")?;
                }
                Ok(())
            }
            FailureKind::SpawnFailed { reason } => write!(f, "could not start launcher: {reason}"),
            FailureKind::PortConflict { port, exit_code } => {
                write!(f, "port {port} already in use")?;
                if let Some(code) = exit_code {
                    write!(f, " (exit code {code})")?;
                }
                Ok(())
            }
            FailureKind::ValidationFailed { missing, rationale } => {
                if !missing.is_empty() {
                    write!(f, "missing patterns: {missing:?}")?;
                }
                if let Some(r) = rationale {
                    if !missing.is_empty() {
                        f.write_str("; ")?;
                    }
                    write!(f, "checker rejected output: {r}")?;
                }
                Ok(())
            }
            FailureKind::CheckerError { reason } => write!(f, "external checker error: {reason}"),
        }
    }
}

/// On-disk layout of unit logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLayout {
    /// `<root>/<unit>_<timestamp>.log`
    #[default]
    Flat,
    /// `<root>/run-<timestamp>/<unit>.log`
    Structured,
}
