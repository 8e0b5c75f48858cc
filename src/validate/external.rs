// src/validate/external.rs

//! Delegated validation for `validationMode = "ai"`.
//!
//! The orchestrator never talks to a model itself. It hands the captured
//! output and the unit's prompt to an [`ExternalChecker`]; the shipped
//! implementation, [`CommandChecker`], runs a user-supplied shell command:
//!
//! - the captured output is written to the command's stdin;
//! - `LAUNCHCHECK_PROMPT` and `LAUNCHCHECK_UNIT` are set in its environment;
//! - it must print `{"pass": bool, "rationale": "..."}` on stdout and exit 0.
//!
//! Anything else is a checker error, which fails the unit without aborting
//! the run.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::exec::BoxFuture;
use crate::exec::process::{isolate_group, reap_group, terminate_tree};
use crate::exec::shell::{collect, shell_command};
use crate::validate::{Evaluation, OutputCheck};

/// SIGTERM to SIGKILL delay for a checker that overran its timeout.
const CHECKER_KILL_GRACE: Duration = Duration::from_millis(500);

/// What the checker is asked to judge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRequest {
    pub unit_id: String,
    pub prompt: String,
    pub output: String,
}

/// The checker's answer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckerVerdict {
    pub pass: bool,
    #[serde(default)]
    pub rationale: String,
}

/// Injected judge for external-mode units.
pub trait ExternalChecker: Send + Sync {
    /// `Err` carries a reason when no verdict could be obtained.
    fn check(&self, request: CheckRequest) -> BoxFuture<'_, Result<CheckerVerdict, String>>;
}

/// Runs a shell command as the checker.
#[derive(Debug, Clone)]
pub struct CommandChecker {
    command: String,
    timeout: Duration,
}

impl CommandChecker {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }

    async fn run(&self, request: CheckRequest) -> Result<CheckerVerdict, String> {
        let mut cmd = shell_command(&self.command);
        cmd.env("LAUNCHCHECK_PROMPT", &request.prompt)
            .env("LAUNCHCHECK_UNIT", &request.unit_id)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        isolate_group(&mut cmd);

        let mut child = cmd
            .spawn()
            .map_err(|e| format!("could not spawn checker `{}`: {e}", self.command))?;

        if let Some(mut stdin) = child.stdin.take() {
            let output = request.output.into_bytes();
            // Checkers may exit without reading stdin.
            tokio::spawn(async move {
                let _ = stdin.write_all(&output).await;
                let _ = stdin.shutdown().await;
            });
        }

        let pgid = child.id();
        let stdout = child.stdout.take().map(collect);
        let stderr = child.stderr.take().map(collect);

        let status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(waited) => {
                reap_group(pgid).await;
                waited.map_err(|e| format!("waiting for checker failed: {e}"))?
            }
            Err(_) => {
                terminate_tree(&mut child, pgid, CHECKER_KILL_GRACE).await;
                return Err(format!("checker timed out after {}s", self.timeout.as_secs()));
            }
        };

        let stdout = drain(stdout).await;
        if !status.success() {
            let stderr = drain(stderr).await;
            return Err(format!(
                "checker exited with {}: {}",
                status
                    .code()
                    .map_or_else(|| "signal".to_string(), |c| c.to_string()),
                String::from_utf8_lossy(&stderr).trim()
            ));
        }

        parse_verdict(&stdout)
    }
}

impl ExternalChecker for CommandChecker {
    fn check(&self, request: CheckRequest) -> BoxFuture<'_, Result<CheckerVerdict, String>> {
        Box::pin(self.run(request))
    }
}

async fn drain(handle: Option<tokio::task::JoinHandle<Vec<u8>>>) -> Vec<u8> {
    match handle {
        Some(handle) => match tokio::time::timeout(CHECKER_KILL_GRACE, handle).await {
            Ok(Ok(bytes)) => bytes,
            _ => Vec::new(),
        },
        None => Vec::new(),
    }
}

/// Parse checker stdout. The last non-empty line must be the JSON verdict.
pub fn parse_verdict(stdout: &[u8]) -> Result<CheckerVerdict, String> {
    let text = String::from_utf8_lossy(stdout);
    let line = text
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| "checker produced no output".to_string())?;
    serde_json::from_str(line.trim()).map_err(|e| format!("unreadable checker verdict {line:?}: {e}"))
}

/// [`OutputCheck`] that consults the configured checker.
pub struct ExternalValidator {
    unit_id: String,
    prompt: String,
    checker: Option<Arc<dyn ExternalChecker>>,
}

impl ExternalValidator {
    pub fn new(unit_id: String, prompt: String, checker: Option<Arc<dyn ExternalChecker>>) -> Self {
        Self {
            unit_id,
            prompt,
            checker,
        }
    }
}

impl OutputCheck for ExternalValidator {
    fn evaluate<'a>(&'a self, output: &'a str) -> BoxFuture<'a, Evaluation> {
        Box::pin(async move {
            let Some(checker) = self.checker.as_ref() else {
                return Evaluation {
                    error: Some("no external checker configured".to_string()),
                    ..Evaluation::default()
                };
            };

            let request = CheckRequest {
                unit_id: self.unit_id.clone(),
                prompt: self.prompt.clone(),
                output: output.to_string(),
            };
            match checker.check(request).await {
                Ok(verdict) => {
                    debug!(unit = %self.unit_id, pass = verdict.pass, "external checker answered");
                    Evaluation {
                        passed: verdict.pass,
                        rationale: (!verdict.rationale.is_empty()).then_some(verdict.rationale),
                        ..Evaluation::default()
                    }
                }
                Err(reason) => {
                    warn!(unit = %self.unit_id, reason = %reason, "external checker failed");
                    Evaluation {
                        error: Some(reason),
                        ..Evaluation::default()
                    }
                }
            }
        })
    }
}
