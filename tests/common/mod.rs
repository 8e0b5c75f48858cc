#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use launchcheck::engine::{PortLock, UnitPipeline};
use launchcheck::exec::{LauncherCommand, ProcessExecutor, ProcessExecutorOptions, UnitExecutor};
use launchcheck::logs::LogManager;
use launchcheck::types::LogLayout;
use launchcheck::unit::{UnitDescriptor, UnitLocation, Validation};

pub use launchcheck_test_utils::init_tracing;

/// Lay out `<root>/<module>/integration-tests/<launcher>` with `script` as
/// its body and `info` as the adjacent `ExampleInfo.json`.
pub fn write_unit(root: &Path, module: &str, launcher: &str, script: &str, info: &str) -> PathBuf {
    let module_dir = root.join(module);
    let tests_dir = module_dir.join("integration-tests");
    std::fs::create_dir_all(&tests_dir).expect("create unit dirs");
    std::fs::write(tests_dir.join(launcher), script).expect("write launcher");
    std::fs::write(tests_dir.join("ExampleInfo.json"), info).expect("write ExampleInfo.json");
    module_dir
}

/// Descriptor for a `sh` launcher living in `module_dir`.
pub fn sh_unit(id: &str, module_dir: &Path, timeout_secs: u64, patterns: &[&str]) -> UnitDescriptor {
    UnitDescriptor {
        location: UnitLocation {
            id: id.to_string(),
            module_dir: module_dir.to_path_buf(),
            launcher: PathBuf::from("integration-tests/RunUnit.java"),
            config_path: module_dir.join("integration-tests/ExampleInfo.json"),
        },
        timeout_secs,
        success_patterns: patterns.iter().map(|p| p.to_string()).collect(),
        required_env: Vec::new(),
        setup_commands: Vec::new(),
        cleanup_commands: Vec::new(),
        validation: Validation::Pattern,
        server_port: None,
    }
}

/// Write only the launcher script used by [`sh_unit`].
pub fn write_script(module_dir: &Path, script: &str) {
    let dir = module_dir.join("integration-tests");
    std::fs::create_dir_all(&dir).expect("create launcher dir");
    std::fs::write(dir.join("RunUnit.java"), script).expect("write launcher");
}

/// Executor that runs launchers with `sh`.
pub fn sh_executor() -> ProcessExecutor {
    ProcessExecutor::new(ProcessExecutorOptions {
        launcher: LauncherCommand {
            program: "sh".to_string(),
            args: Vec::new(),
        },
        setup_timeout: Duration::from_secs(10),
        kill_grace: Duration::from_millis(300),
        stream: false,
    })
}

pub fn flat_logs(dir: &Path) -> Arc<LogManager> {
    Arc::new(LogManager::create(dir, LogLayout::Flat, Local::now()).expect("create log manager"))
}

pub fn pipeline(executor: Arc<dyn UnitExecutor>, log_dir: &Path) -> UnitPipeline {
    UnitPipeline::new(executor, flat_logs(log_dir), PortLock::exclusive(8080))
}

/// True while `pid` exists and is not a zombie.
#[cfg(unix)]
pub fn process_alive(pid: i32) -> bool {
    let stat = PathBuf::from(format!("/proc/{pid}/stat"));
    if Path::new("/proc/self/stat").exists() {
        return match std::fs::read_to_string(&stat) {
            // Field 3, after the parenthesised command name.
            Ok(contents) => contents
                .rsplit_once(')')
                .and_then(|(_, rest)| rest.split_whitespace().next())
                .is_some_and(|state| state != "Z" && state != "X"),
            Err(_) => false,
        };
    }
    nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid), None).is_ok()
}

/// Poll until `pid` is gone or `within` elapses.
#[cfg(unix)]
pub async fn wait_gone(pid: i32, within: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + within;
    while tokio::time::Instant::now() < deadline {
        if !process_alive(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    !process_alive(pid)
}
