// src/discover/mod.rs

//! Launcher discovery.
//!
//! - [`rules`] compiles the launcher naming convention and exclude globs.
//! - [`walker`] traverses the root through the [`crate::fs::FileSystem`]
//!   seam and pairs each launcher with its configuration artifact.
//! - [`filter`] narrows the discovered set by name.

pub mod filter;
pub mod rules;
pub mod walker;

pub use filter::{NameFilter, apply_filter};
pub use rules::DiscoveryRules;
pub use walker::discover_units;
