// src/config/mod.rs

//! Orchestrator settings for launchcheck.
//!
//! Responsibilities:
//! - Define the TOML-backed settings model (`model.rs`).
//! - Load a settings file from disk and fold CLI overrides in (`loader.rs`).
//! - Validate basic invariants like worker counts and globs (`validate.rs`).
//!
//! Per-unit `ExampleInfo.json` descriptors live in [`crate::unit`].

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, resolve_settings};
pub use model::{
    CheckerSection, DiscoverySection, LauncherSection, LogsSection, RawSettings, RunSection,
    Settings,
};
