// src/config/validate.rs

use globset::Glob;

use crate::config::model::{RawSettings, Settings};
use crate::errors::{LaunchcheckError, Result};

impl TryFrom<RawSettings> for Settings {
    type Error = LaunchcheckError;

    fn try_from(raw: RawSettings) -> std::result::Result<Self, Self::Error> {
        validate_settings(&raw)?;
        Ok(Settings::new_unchecked(raw))
    }
}

fn validate_settings(raw: &RawSettings) -> Result<()> {
    validate_launcher(raw)?;
    validate_run(raw)?;
    validate_globs(raw)?;
    if raw.checker.timeout_secs == 0 {
        return Err(config_error("[checker].timeout_secs must be >= 1 (got 0)"));
    }
    Ok(())
}

fn validate_launcher(raw: &RawSettings) -> Result<()> {
    let launcher = &raw.launcher;
    if launcher.program.trim().is_empty() {
        return Err(config_error("[launcher].program must not be empty"));
    }
    if launcher.dir.trim().is_empty() || launcher.dir.contains('/') {
        return Err(config_error(format!(
            "[launcher].dir must be a single directory name (got {:?})",
            launcher.dir
        )));
    }
    if launcher.config.trim().is_empty() {
        return Err(config_error("[launcher].config must not be empty"));
    }
    Ok(())
}

fn validate_run(raw: &RawSettings) -> Result<()> {
    if raw.run.workers == 0 {
        return Err(config_error("[run].workers must be >= 1 (got 0)"));
    }
    if raw.run.setup_timeout_secs == 0 {
        return Err(config_error("[run].setup_timeout_secs must be >= 1 (got 0)"));
    }
    Ok(())
}

fn validate_globs(raw: &RawSettings) -> Result<()> {
    let file_glob = &raw.launcher.file;
    Glob::new(file_glob).map_err(|e| {
        config_error(format!("[launcher].file is not a valid glob ({file_glob}): {e}"))
    })?;
    for pattern in raw.discovery.exclude.iter() {
        Glob::new(pattern).map_err(|e| {
            config_error(format!(
                "[discovery].exclude contains an invalid glob ({pattern}): {e}"
            ))
        })?;
    }
    Ok(())
}

fn config_error(msg: impl Into<String>) -> LaunchcheckError {
    LaunchcheckError::ConfigError(msg.into())
}
