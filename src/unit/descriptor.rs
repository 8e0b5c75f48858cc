// src/unit/descriptor.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::ValidationMode;

/// Timeout applied when `timeoutSec` is absent.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Where a unit lives on disk, as found by discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitLocation {
    /// Stable id: module directory relative to the discovery root.
    pub id: String,
    /// Working directory for the main invocation.
    pub module_dir: PathBuf,
    /// Launcher path relative to `module_dir`.
    pub launcher: PathBuf,
    /// The configuration artifact adjacent to the launcher.
    pub config_path: PathBuf,
}

/// `ExampleInfo.json` as written by unit authors.
///
/// ```json
/// {
///   "timeoutSec": 120,
///   "successRegex": ["Started .* in", "READY"],
///   "requiredEnv": ["OPENAI_API_KEY"],
///   "setupCommands": ["docker compose up -d"],
///   "cleanupCommands": ["docker compose down"],
///   "validationMode": "regex"
/// }
/// ```
///
/// Unknown fields (titles, categories, ...) are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawUnitConfig {
    #[serde(default)]
    pub timeout_sec: Option<i64>,
    #[serde(default)]
    pub success_regex: Vec<String>,
    #[serde(default)]
    pub required_env: Vec<String>,
    #[serde(default)]
    pub setup_commands: Vec<String>,
    #[serde(default)]
    pub cleanup_commands: Vec<String>,
    #[serde(default)]
    pub validation_mode: ValidationMode,
    #[serde(default)]
    pub ai_validation_prompt: Option<String>,
    /// Informational only; `0` means default/random.
    #[serde(default)]
    pub server_port: Option<i64>,
}

/// How the unit's output is judged, carrying what each mode needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Pattern,
    External { prompt: String },
}

impl Validation {
    pub fn mode(&self) -> ValidationMode {
        match self {
            Validation::Pattern => ValidationMode::Pattern,
            Validation::External { .. } => ValidationMode::External,
        }
    }
}

/// A validated, immutable unit description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitDescriptor {
    pub location: UnitLocation,
    pub timeout_secs: u64,
    pub success_patterns: Vec<String>,
    /// Deduplicated, in declaration order.
    pub required_env: Vec<String>,
    pub setup_commands: Vec<String>,
    pub cleanup_commands: Vec<String>,
    pub validation: Validation,
    pub server_port: Option<u16>,
}

impl UnitDescriptor {
    pub fn id(&self) -> &str {
        &self.location.id
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `/` in ids is flattened so each unit maps to one file name.
    pub fn log_stem(&self) -> String {
        log_stem_for(&self.location.id)
    }
}

pub fn log_stem_for(id: &str) -> String {
    id.chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect()
}
