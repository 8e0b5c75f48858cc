// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The scheduler drives each unit through setup, launch and cleanup via a
//! [`UnitExecutor`] and owns everything in between: the env precondition,
//! the port token and validation.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use anyhow::Context;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::errors::{LaunchcheckError, Result};
use crate::exec::capture::spawn_capture;
use crate::exec::process::{isolate_group, reap_group, terminate_tree};
use crate::exec::shell::run_shell;
use crate::exec::{BoxFuture, LaunchOutcome, LaunchStatus, SetupFailure};
use crate::logs::LogSink;
use crate::unit::UnitDescriptor;

/// How long capture may keep draining pipes after the process group is gone.
const CAPTURE_DRAIN: Duration = Duration::from_secs(5);

/// Trait abstracting how a unit's commands are executed.
///
/// Production code uses [`ProcessExecutor`]; tests can provide their own
/// implementation that doesn't spawn real processes.
pub trait UnitExecutor: Send + Sync {
    /// Run `setupCommands` in order, stopping at the first failure.
    fn setup<'a>(&'a self, unit: &'a UnitDescriptor) -> BoxFuture<'a, std::result::Result<(), SetupFailure>>;

    /// Run the main invocation, streaming combined output into `sink`.
    ///
    /// Returns once the process (and its group) is gone. `Err` means the
    /// launcher could not be started.
    fn launch<'a>(&'a self, unit: &'a UnitDescriptor, sink: LogSink) -> BoxFuture<'a, Result<LaunchOutcome>>;

    /// Run every `cleanupCommands` entry; returns one warning per failure.
    fn cleanup<'a>(&'a self, unit: &'a UnitDescriptor) -> BoxFuture<'a, Vec<String>>;
}

/// Program + leading args used to start a launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl LauncherCommand {
    /// Fail unless `program` is an existing path or resolves on `PATH`.
    pub fn ensure_available(&self) -> Result<()> {
        if resolve_program(&self.program).is_some() {
            Ok(())
        } else {
            Err(LaunchcheckError::LauncherUnavailable(self.program.clone()))
        }
    }
}

/// Locate `program` the way the OS would when spawning it.
pub fn resolve_program(program: &str) -> Option<PathBuf> {
    let direct = Path::new(program);
    if direct.components().count() > 1 {
        return direct.is_file().then(|| direct.to_path_buf());
    }

    let suffixes: &[&str] = if cfg!(windows) {
        &["", ".exe", ".cmd", ".bat"]
    } else {
        &[""]
    };
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var).find_map(|dir| {
        suffixes
            .iter()
            .map(|suffix| dir.join(format!("{program}{suffix}")))
            .find(|candidate| candidate.is_file())
    })
}

/// Knobs for [`ProcessExecutor`].
#[derive(Debug, Clone)]
pub struct ProcessExecutorOptions {
    pub launcher: LauncherCommand,
    pub setup_timeout: Duration,
    pub kill_grace: Duration,
    /// Echo output lines live to stdout.
    pub stream: bool,
}

impl ProcessExecutorOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            launcher: LauncherCommand {
                program: settings.launcher.program.clone(),
                args: settings.launcher.args.clone(),
            },
            setup_timeout: settings.run.setup_timeout(),
            kill_grace: settings.run.kill_grace(),
            stream: settings.run.stream,
        }
    }
}

/// Real executor used in production: OS processes via `tokio::process`.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    options: ProcessExecutorOptions,
}

impl ProcessExecutor {
    pub fn new(options: ProcessExecutorOptions) -> Self {
        Self { options }
    }

    async fn run_setup(&self, unit: &UnitDescriptor) -> std::result::Result<(), SetupFailure> {
        for command in unit.setup_commands.iter() {
            info!(unit = %unit.id(), command = %command, "running setup command");
            run_shell(
                command,
                &unit.location.module_dir,
                self.options.setup_timeout,
                self.options.kill_grace,
            )
            .await
            .map_err(|reason| SetupFailure {
                command: command.clone(),
                reason,
            })?;
        }
        Ok(())
    }

    async fn run_cleanup(&self, unit: &UnitDescriptor) -> Vec<String> {
        let mut warnings = Vec::new();
        for command in unit.cleanup_commands.iter() {
            debug!(unit = %unit.id(), command = %command, "running cleanup command");
            if let Err(reason) = run_shell(
                command,
                &unit.location.module_dir,
                self.options.setup_timeout,
                self.options.kill_grace,
            )
            .await
            {
                warn!(unit = %unit.id(), command = %command, reason = %reason, "cleanup command failed");
                warnings.push(format!("cleanup `{command}` failed: {reason}"));
            }
        }
        warnings
    }

    async fn run_launch(&self, unit: &UnitDescriptor, sink: LogSink) -> Result<LaunchOutcome> {
        let launcher = &self.options.launcher;
        let (log_path, file) = sink.into_parts();

        info!(
            unit = %unit.id(),
            launcher = %unit.location.launcher.display(),
            timeout_secs = unit.timeout_secs,
            log = %log_path.display(),
            "starting unit process"
        );

        let mut cmd = Command::new(&launcher.program);
        cmd.args(&launcher.args)
            .arg(&unit.location.launcher)
            .current_dir(&unit.location.module_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        isolate_group(&mut cmd);

        let started = Instant::now();
        let mut child = cmd.spawn().with_context(|| {
            format!(
                "spawning `{} {}` for unit '{}'",
                launcher.program,
                unit.location.launcher.display(),
                unit.id()
            )
        })?;
        let pgid = child.id();

        let echo = self.options.stream.then(|| unit.id().to_string());
        let capture = spawn_capture(child.stdout.take(), child.stderr.take(), file, echo);

        let status = match tokio::time::timeout(unit.timeout(), child.wait()).await {
            Ok(waited) => {
                let status = waited
                    .with_context(|| format!("waiting for process of unit '{}'", unit.id()))?;
                reap_group(pgid).await;
                match status.code() {
                    Some(code) => LaunchStatus::Exited(code),
                    None => LaunchStatus::Signalled,
                }
            }
            Err(_) => {
                warn!(
                    unit = %unit.id(),
                    timeout_secs = unit.timeout_secs,
                    "unit exceeded its timeout; killing process tree"
                );
                terminate_tree(&mut child, pgid, self.options.kill_grace).await;
                LaunchStatus::TimedOut
            }
        };
        let elapsed = started.elapsed();

        let stats = capture.finish(CAPTURE_DRAIN).await;

        info!(
            unit = %unit.id(),
            status = ?status,
            elapsed_ms = elapsed.as_millis() as u64,
            bytes = stats.bytes,
            "unit process finished"
        );

        Ok(LaunchOutcome {
            status,
            elapsed,
            bind_failure: stats.bind_failure,
        })
    }
}

impl UnitExecutor for ProcessExecutor {
    fn setup<'a>(&'a self, unit: &'a UnitDescriptor) -> BoxFuture<'a, std::result::Result<(), SetupFailure>> {
        Box::pin(self.run_setup(unit))
    }

    fn launch<'a>(&'a self, unit: &'a UnitDescriptor, sink: LogSink) -> BoxFuture<'a, Result<LaunchOutcome>> {
        Box::pin(self.run_launch(unit, sink))
    }

    fn cleanup<'a>(&'a self, unit: &'a UnitDescriptor) -> BoxFuture<'a, Vec<String>> {
        Box::pin(self.run_cleanup(unit))
    }
}
