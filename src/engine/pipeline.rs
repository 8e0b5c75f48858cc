// src/engine/pipeline.rs

//! One unit, start to finish.
//!
//! `missing env -> setup -> [port token] launch [release] -> cleanup -> validate`
//!
//! The port token covers only the main invocation; setup, cleanup and
//! validation of other units keep running while one unit owns the port.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::engine::port::PortLock;
use crate::engine::summary::ExecutionResult;
use crate::exec::{Environment, LaunchStatus, ProcessEnv, UnitExecutor, missing_vars};
use crate::logs::LogManager;
use crate::types::FailureKind;
use crate::unit::{UnitDescriptor, Validation};
use crate::validate::{OutputValidator, PatternValidator, log_pattern_breakdown};

/// What happened to a unit handed to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    Finished(ExecutionResult),
    /// Cancelled by `fail_fast` before its main invocation started. Carries
    /// the warnings of a cleanup that ran after setup had already happened.
    Skipped { cleanup_warnings: Vec<String> },
}

impl UnitOutcome {
    fn skipped() -> Self {
        Self::Skipped {
            cleanup_warnings: Vec::new(),
        }
    }
}

pub struct UnitPipeline {
    executor: Arc<dyn UnitExecutor>,
    env: Arc<dyn Environment>,
    logs: Arc<LogManager>,
    port: PortLock,
    validator: OutputValidator,
    stream: bool,
    verbose: bool,
}

impl std::fmt::Debug for UnitPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitPipeline")
            .field("logs", &self.logs)
            .field("port", &self.port)
            .field("validator", &self.validator)
            .finish_non_exhaustive()
    }
}

impl UnitPipeline {
    pub fn new(executor: Arc<dyn UnitExecutor>, logs: Arc<LogManager>, port: PortLock) -> Self {
        Self {
            executor,
            env: Arc::new(ProcessEnv),
            logs,
            port,
            validator: OutputValidator::default(),
            stream: false,
            verbose: false,
        }
    }

    pub fn with_env(mut self, env: Arc<dyn Environment>) -> Self {
        self.env = env;
        self
    }

    pub fn with_validator(mut self, validator: OutputValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn logs(&self) -> &LogManager {
        &self.logs
    }

    /// Drive `unit` through every phase. Never fails: problems become the
    /// result's verdict.
    pub async fn run_unit(&self, unit: &UnitDescriptor, cancel: &AtomicBool) -> UnitOutcome {
        if cancel.load(Ordering::SeqCst) {
            debug!(unit = %unit.id(), "skipping unit; run was cancelled");
            return UnitOutcome::skipped();
        }

        let started = Instant::now();
        let id = unit.id();

        let missing = missing_vars(unit, self.env.as_ref());
        if !missing.is_empty() {
            warn!(unit = %id, missing = ?missing, "required environment not set; not running unit");
            return UnitOutcome::Finished(ExecutionResult::failed(
                id,
                FailureKind::MissingEnv { names: missing },
                None,
                started.elapsed(),
                None,
            ));
        }

        if let Err(failure) = self.executor.setup(unit).await {
            warn!(unit = %id, command = %failure.command, reason = %failure.reason, "setup failed");
            let warnings = self.executor.cleanup(unit).await;
            return UnitOutcome::Finished(
                ExecutionResult::failed(
                    id,
                    FailureKind::SetupFailed {
                        command: failure.command,
                        reason: failure.reason,
                    },
                    None,
                    started.elapsed(),
                    None,
                )
                .with_cleanup_warnings(warnings),
            );
        }

        let token = self.port.acquire(id).await;
        if cancel.load(Ordering::SeqCst) {
            drop(token);
            debug!(unit = %id, "run cancelled while waiting for the port; cleaning up");
            let cleanup_warnings = self.executor.cleanup(unit).await;
            return UnitOutcome::Skipped { cleanup_warnings };
        }

        let sink = match self.logs.allocate(id).await {
            Ok(sink) => sink,
            Err(e) => {
                drop(token);
                let warnings = self.executor.cleanup(unit).await;
                return UnitOutcome::Finished(
                    ExecutionResult::failed(
                        id,
                        FailureKind::SpawnFailed {
                            reason: format!("could not allocate log file: {e}"),
                        },
                        None,
                        started.elapsed(),
                        None,
                    )
                    .with_cleanup_warnings(warnings),
                );
            }
        };
        let log_path = sink.path().to_path_buf();

        let launched = self.executor.launch(unit, sink).await;
        drop(token);

        let warnings = self.executor.cleanup(unit).await;

        let outcome = match launched {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(unit = %id, error = %e, "could not start unit");
                return UnitOutcome::Finished(
                    ExecutionResult::failed(
                        id,
                        FailureKind::SpawnFailed {
                            reason: format!("{e:#}"),
                        },
                        None,
                        started.elapsed(),
                        Some(log_path),
                    )
                    .with_cleanup_warnings(warnings),
                );
            }
        };

        let output = self.read_output(id, &log_path).await;
        let result = self
            .judge(unit, outcome.status, outcome.bind_failure, &output, started, log_path)
            .await;

        if result.is_pass() {
            info!(unit = %id, duration_ms = result.duration_ms, "unit passed");
        } else {
            warn!(
                unit = %id,
                verdict = %result.verdict,
                detail = result.failure_detail.as_deref().unwrap_or(""),
                "unit did not pass"
            );
        }

        UnitOutcome::Finished(result.with_cleanup_warnings(warnings))
    }

    async fn judge(
        &self,
        unit: &UnitDescriptor,
        status: LaunchStatus,
        bind_failure: bool,
        output: &str,
        started: Instant,
        log_path: PathBuf,
    ) -> ExecutionResult {
        let id = unit.id();
        let exit_code = status.exit_code();

        if status == LaunchStatus::TimedOut {
            let matched = match unit.validation {
                Validation::Pattern => {
                    PatternValidator::new(&unit.success_patterns)
                        .evaluate_sync(output)
                        .matched
                }
                Validation::External { .. } => Vec::new(),
            };
            return ExecutionResult::failed(
                id,
                FailureKind::Timeout {
                    after_secs: unit.timeout_secs,
                    matched,
                },
                None,
                started.elapsed(),
                Some(log_path),
            );
        }

        let report = self.validator.validate(unit, exit_code, output).await;
        if self.stream && unit.validation == Validation::Pattern {
            log_pattern_breakdown(unit, &report.evaluation);
        }

        match report.failure() {
            None => ExecutionResult::passed(id, exit_code, started.elapsed(), log_path),
            Some(_) if bind_failure && !report.exit_ok => ExecutionResult::failed(
                id,
                FailureKind::PortConflict {
                    port: unit.server_port.filter(|p| *p != 0).unwrap_or(self.port.port()),
                    exit_code,
                },
                exit_code,
                started.elapsed(),
                Some(log_path),
            ),
            Some(failure) => {
                ExecutionResult::failed(id, failure, exit_code, started.elapsed(), Some(log_path))
            }
        }
    }

    async fn read_output(&self, unit_id: &str, path: &std::path::Path) -> String {
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                let text = String::from_utf8_lossy(&bytes).into_owned();
                if self.verbose {
                    for line in text.lines() {
                        debug!(unit = %unit_id, "| {}", line);
                    }
                }
                text
            }
            Err(e) => {
                warn!(unit = %unit_id, log = %path.display(), error = %e, "could not read captured output");
                String::new()
            }
        }
    }
}
