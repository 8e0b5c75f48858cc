// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::LogLayout;

/// Settings as read from a TOML file, before validation.
///
/// ```toml
/// [launcher]
/// program = "jbang"
/// dir = "integration-tests"
/// file = "Run*.java"
///
/// [run]
/// workers = 1
/// fail_fast = false
///
/// [logs]
/// root = "logs"
/// structured = true
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawSettings {
    #[serde(default)]
    pub launcher: LauncherSection,
    #[serde(default)]
    pub discovery: DiscoverySection,
    #[serde(default)]
    pub run: RunSection,
    #[serde(default)]
    pub logs: LogsSection,
    #[serde(default)]
    pub checker: CheckerSection,
}

/// Validated settings. Only obtainable through `Settings::try_from(RawSettings)`.
#[derive(Debug, Clone)]
pub struct Settings {
    pub launcher: LauncherSection,
    pub discovery: DiscoverySection,
    pub run: RunSection,
    pub logs: LogsSection,
    pub checker: CheckerSection,
}

impl Settings {
    pub(crate) fn new_unchecked(raw: RawSettings) -> Self {
        Self {
            launcher: raw.launcher,
            discovery: raw.discovery,
            run: raw.run,
            logs: raw.logs,
            checker: raw.checker,
        }
    }
}

/// `[launcher]` section: how launchers are found and invoked.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LauncherSection {
    /// Program that builds and runs a launcher (e.g. `jbang`).
    pub program: String,
    /// Extra arguments placed before the launcher path.
    pub args: Vec<String>,
    /// Name of the directory holding launchers inside a unit.
    pub dir: String,
    /// Glob for launcher files inside `dir`.
    pub file: String,
    /// Name of the unit configuration artifact next to the launcher.
    pub config: String,
}

impl Default for LauncherSection {
    fn default() -> Self {
        Self {
            program: "jbang".to_string(),
            args: Vec::new(),
            dir: "integration-tests".to_string(),
            file: "Run*.java".to_string(),
            config: "ExampleInfo.json".to_string(),
        }
    }
}

/// `[discovery]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoverySection {
    /// Directory globs (relative to the root) that are never descended.
    pub exclude: Vec<String>,
}

impl Default for DiscoverySection {
    fn default() -> Self {
        Self {
            exclude: vec![
                "**/target/**".to_string(),
                "**/.git/**".to_string(),
                "**/node_modules/**".to_string(),
            ],
        }
    }
}

/// `[run]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunSection {
    pub workers: usize,
    pub fail_fast: bool,
    /// Exit non-zero when any unit is not `pass`.
    pub fail_on_error: bool,
    /// Ceiling for each setup and cleanup command.
    pub setup_timeout_secs: u64,
    /// Time between SIGTERM and SIGKILL when tearing down a process group.
    pub kill_grace_ms: u64,
    /// The port every unit's server binds.
    pub port: u16,
    /// Lift the port mutex. Units must genuinely not share a port.
    pub port_isolated: bool,
    pub stream: bool,
    pub verbose: bool,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            workers: 1,
            fail_fast: false,
            fail_on_error: true,
            setup_timeout_secs: 60,
            kill_grace_ms: 2000,
            port: 8080,
            port_isolated: false,
            stream: false,
            verbose: false,
        }
    }
}

impl RunSection {
    pub fn setup_timeout(&self) -> Duration {
        Duration::from_secs(self.setup_timeout_secs)
    }

    pub fn kill_grace(&self) -> Duration {
        Duration::from_millis(self.kill_grace_ms)
    }
}

/// `[logs]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogsSection {
    pub root: PathBuf,
    pub structured: bool,
}

impl Default for LogsSection {
    fn default() -> Self {
        Self {
            root: PathBuf::from("logs"),
            structured: false,
        }
    }
}

impl LogsSection {
    pub fn layout(&self) -> LogLayout {
        if self.structured {
            LogLayout::Structured
        } else {
            LogLayout::Flat
        }
    }
}

/// `[checker]` section: external validation for `validationMode = "ai"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckerSection {
    pub command: Option<String>,
    pub timeout_secs: u64,
}

impl Default for CheckerSection {
    fn default() -> Self {
        Self {
            command: None,
            timeout_secs: 120,
        }
    }
}
