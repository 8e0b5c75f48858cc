// src/exec/mod.rs

//! Process execution layer.
//!
//! This module runs a unit's setup commands, its launcher and its cleanup
//! commands using `tokio::process::Command`.
//!
//! - [`backend`] provides the [`UnitExecutor`] trait the scheduler talks to
//!   and the production [`ProcessExecutor`]. Tests swap in a fake.
//! - [`process`] spawns children in their own process group and tears the
//!   whole group down on timeout.
//! - [`capture`] streams merged stdout/stderr into the unit's log file as it
//!   arrives.
//! - [`shell`] runs one-off setup/cleanup commands under a bounded timeout.
//! - [`env`] checks `requiredEnv` preconditions.
//! - [`bind`] recognises "port already in use" output.

pub mod backend;
pub mod bind;
pub mod capture;
pub mod env;
pub mod process;
pub mod shell;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

pub use backend::{LauncherCommand, ProcessExecutor, ProcessExecutorOptions, UnitExecutor};
pub use env::{Environment, ProcessEnv, StaticEnv, missing_vars};

/// Boxed future returned by [`UnitExecutor`] methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A setup command that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupFailure {
    pub command: String,
    pub reason: String,
}

/// How the main invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchStatus {
    /// Exited on its own with this code.
    Exited(i32),
    /// Killed by a signal it did not get from us.
    Signalled,
    /// Exceeded `timeoutSecs`; the process group was killed.
    TimedOut,
}

impl LaunchStatus {
    pub fn exit_code(self) -> Option<i32> {
        match self {
            LaunchStatus::Exited(code) => Some(code),
            LaunchStatus::Signalled | LaunchStatus::TimedOut => None,
        }
    }
}

/// Result of one main invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchOutcome {
    pub status: LaunchStatus,
    pub elapsed: Duration,
    /// Output contained a bind-failure line for the contended port.
    pub bind_failure: bool,
}
