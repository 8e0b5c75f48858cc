// src/unit/mod.rs

//! Unit descriptors: one per discovered launcher.
//!
//! - [`descriptor`] holds the JSON-backed raw model and the validated
//!   [`UnitDescriptor`].
//! - [`validate`] turns a raw config into a descriptor or a
//!   `MalformedConfig` error.
//! - [`loader`] reads the artifact next to a launcher.

pub mod descriptor;
pub mod loader;
pub mod validate;

pub use descriptor::{RawUnitConfig, UnitDescriptor, UnitLocation, Validation};
pub use loader::{load_descriptor, parse_descriptor};
