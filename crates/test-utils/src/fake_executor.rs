use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::AsyncWriteExt;

use launchcheck::errors::Result;
use launchcheck::exec::{BoxFuture, LaunchOutcome, LaunchStatus, SetupFailure, UnitExecutor};
use launchcheck::logs::LogSink;
use launchcheck::unit::UnitDescriptor;

/// What the fake does for one unit.
#[derive(Debug, Clone)]
pub struct FakeScript {
    pub setup_failure: Option<String>,
    pub output: String,
    pub status: LaunchStatus,
    /// How long the "process" holds the port.
    pub run_for: Duration,
    pub bind_failure: bool,
    pub spawn_error: Option<String>,
    pub cleanup_warnings: Vec<String>,
}

impl Default for FakeScript {
    fn default() -> Self {
        Self {
            setup_failure: None,
            output: "OK\n".to_string(),
            status: LaunchStatus::Exited(0),
            run_for: Duration::from_millis(20),
            bind_failure: false,
            spawn_error: None,
            cleanup_warnings: Vec::new(),
        }
    }
}

impl FakeScript {
    pub fn passing(output: &str) -> Self {
        Self {
            output: output.to_string(),
            ..Self::default()
        }
    }

    pub fn exiting(code: i32, output: &str) -> Self {
        Self {
            output: output.to_string(),
            status: LaunchStatus::Exited(code),
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
struct Calls {
    setups: Vec<String>,
    launches: Vec<String>,
    cleanups: Vec<String>,
}

/// A fake executor that:
/// - writes each unit's scripted output into its log sink
/// - records which units went through setup / launch / cleanup
/// - tracks how many launches overlapped.
#[derive(Clone, Default)]
pub struct FakeExecutor {
    scripts: Arc<Mutex<HashMap<String, FakeScript>>>,
    calls: Arc<Mutex<Calls>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, unit_id: &str, script: FakeScript) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(unit_id.to_string(), script);
        self
    }

    pub fn launches(&self) -> Vec<String> {
        self.calls.lock().unwrap().launches.clone()
    }

    pub fn setups(&self) -> Vec<String> {
        self.calls.lock().unwrap().setups.clone()
    }

    pub fn cleanups(&self) -> Vec<String> {
        self.calls.lock().unwrap().cleanups.clone()
    }

    /// Highest number of launches that were running at the same time.
    pub fn max_concurrent_launches(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn script_for(&self, unit_id: &str) -> FakeScript {
        self.scripts
            .lock()
            .unwrap()
            .get(unit_id)
            .cloned()
            .unwrap_or_default()
    }
}

impl UnitExecutor for FakeExecutor {
    fn setup<'a>(
        &'a self,
        unit: &'a UnitDescriptor,
    ) -> BoxFuture<'a, std::result::Result<(), SetupFailure>> {
        Box::pin(async move {
            self.calls.lock().unwrap().setups.push(unit.id().to_string());
            match self.script_for(unit.id()).setup_failure {
                Some(reason) => Err(SetupFailure {
                    command: unit
                        .setup_commands
                        .first()
                        .cloned()
                        .unwrap_or_else(|| "setup".to_string()),
                    reason,
                }),
                None => Ok(()),
            }
        })
    }

    fn launch<'a>(
        &'a self,
        unit: &'a UnitDescriptor,
        sink: LogSink,
    ) -> BoxFuture<'a, Result<LaunchOutcome>> {
        Box::pin(async move {
            let script = self.script_for(unit.id());
            if let Some(reason) = script.spawn_error {
                return Err(anyhow::anyhow!(reason).into());
            }

            self.calls
                .lock()
                .unwrap()
                .launches
                .push(unit.id().to_string());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let (_path, mut file) = sink.into_parts();
            file.write_all(script.output.as_bytes())
                .await
                .map_err(anyhow::Error::from)?;
            file.flush().await.map_err(anyhow::Error::from)?;
            tokio::time::sleep(script.run_for).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(LaunchOutcome {
                status: script.status,
                elapsed: script.run_for,
                bind_failure: script.bind_failure,
            })
        })
    }

    fn cleanup<'a>(&'a self, unit: &'a UnitDescriptor) -> BoxFuture<'a, Vec<String>> {
        Box::pin(async move {
            self.calls
                .lock()
                .unwrap()
                .cleanups
                .push(unit.id().to_string());
            self.script_for(unit.id()).cleanup_warnings
        })
    }
}
