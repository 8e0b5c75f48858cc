// src/unit/loader.rs

use crate::errors::{LaunchcheckError, Result};
use crate::fs::FileSystem;
use crate::unit::descriptor::{RawUnitConfig, UnitDescriptor, UnitLocation};
use crate::unit::validate::build_descriptor;

/// Read the configuration artifact for `location` and validate it.
///
/// The artifact is the only thing read; a missing file is reported as
/// `MalformedConfig` like any other unusable descriptor.
pub fn load_descriptor(fs: &dyn FileSystem, location: &UnitLocation) -> Result<UnitDescriptor> {
    let path = &location.config_path;
    if !fs.is_file(path) {
        return Err(LaunchcheckError::malformed(
            path,
            "configuration artifact is missing",
        ));
    }
    let bytes = fs
        .read(path)
        .map_err(|e| LaunchcheckError::malformed(path, format!("unreadable: {e:#}")))?;
    parse_descriptor(location.clone(), &bytes)
}

/// Parse raw artifact bytes into a descriptor. Deterministic: the same bytes
/// always give the same descriptor or the same error.
pub fn parse_descriptor(location: UnitLocation, bytes: &[u8]) -> Result<UnitDescriptor> {
    let raw: RawUnitConfig = serde_json::from_slice(bytes).map_err(|e| {
        LaunchcheckError::malformed(&location.config_path, format!("invalid JSON: {e}"))
    })?;
    let path = location.config_path.clone();
    build_descriptor(location, raw).map_err(|reason| LaunchcheckError::malformed(path, reason))
}
