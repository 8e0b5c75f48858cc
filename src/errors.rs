// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LaunchcheckError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Malformed unit config {path}: {reason}")]
    MalformedConfig { path: PathBuf, reason: String },

    #[error("Discovery failed under {root}: {reason}")]
    Discovery { root: PathBuf, reason: String },

    #[error("Launcher program not available: {0}")]
    LauncherUnavailable(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LaunchcheckError {
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        LaunchcheckError::MalformedConfig {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, LaunchcheckError>;
