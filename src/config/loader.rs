// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cli::CliArgs;
use crate::config::model::{RawSettings, Settings};
use crate::errors::{LaunchcheckError, Result};

/// File looked up when `--config` is not given.
pub const DEFAULT_SETTINGS_FILE: &str = "Launchcheck.toml";

/// Load a settings file from a given path and return the raw `RawSettings`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] for the
/// semantic checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawSettings> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let settings: RawSettings = toml::from_str(&contents)?;

    Ok(settings)
}

/// Load a settings file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Settings> {
    let raw = load_from_path(&path)?;
    Settings::try_from(raw)
}

/// Build the effective settings for one invocation.
///
/// - `--config PATH` must exist.
/// - Without `--config`, `Launchcheck.toml` is used when present, built-in
///   defaults otherwise.
/// - CLI flags are folded in before validation, so overrides are checked
///   exactly like file values.
pub fn resolve_settings(args: &CliArgs) -> Result<Settings> {
    let mut raw = match args.config.as_deref() {
        Some(explicit) => {
            let path = PathBuf::from(explicit);
            if !path.is_file() {
                return Err(LaunchcheckError::ConfigError(format!(
                    "settings file not found: {}",
                    path.display()
                )));
            }
            load_from_path(&path)?
        }
        None => {
            let path = PathBuf::from(DEFAULT_SETTINGS_FILE);
            if path.is_file() {
                load_from_path(&path)?
            } else {
                debug!("no {DEFAULT_SETTINGS_FILE} found; using built-in defaults");
                RawSettings::default()
            }
        }
    };

    apply_cli_overrides(&mut raw, args);
    Settings::try_from(raw)
}

fn apply_cli_overrides(raw: &mut RawSettings, args: &CliArgs) {
    if let Some(workers) = args.workers {
        raw.run.workers = workers;
    }
    if args.fail_fast {
        raw.run.fail_fast = true;
    }
    if args.allow_failures {
        raw.run.fail_on_error = false;
    }
    if args.port_isolated {
        raw.run.port_isolated = true;
    }
    if args.stream {
        raw.run.stream = true;
    }
    if args.verbose {
        raw.run.verbose = true;
    }
    if args.structured_logs {
        raw.logs.structured = true;
    }
    if let Some(dir) = args.log_dir.as_deref() {
        raw.logs.root = PathBuf::from(dir);
    }
    if let Some(cmd) = args.checker_cmd.as_deref() {
        raw.checker.command = Some(cmd.to_string());
    }
}
