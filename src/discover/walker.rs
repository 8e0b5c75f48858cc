// src/discover/walker.rs

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};

use crate::discover::rules::DiscoveryRules;
use crate::errors::{LaunchcheckError, Result};
use crate::fs::FileSystem;
use crate::unit::UnitLocation;

/// Recursively find every launcher under `root` and pair it with its
/// configuration artifact.
///
/// An unreadable root is fatal. Unreadable subdirectories are skipped with a
/// warning so one bad directory does not hide every other unit. Symlinked
/// directories are not descended into; symlinked launcher files still count.
///
/// The result is sorted by unit id.
pub fn discover_units(
    fs: &dyn FileSystem,
    root: &Path,
    rules: &DiscoveryRules,
) -> Result<Vec<UnitLocation>> {
    if !fs.is_dir(root) {
        return Err(LaunchcheckError::Discovery {
            root: root.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }

    let mut launchers = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let entries = match fs.read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if dir == root => {
                return Err(LaunchcheckError::Discovery {
                    root: root.to_path_buf(),
                    reason: format!("{e:#}"),
                });
            }
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "skipping unreadable directory");
                continue;
            }
        };

        for path in entries {
            let Some(rel) = relative_str(root, &path) else {
                continue;
            };
            if fs.is_dir(&path) {
                if fs.is_symlink(&path) {
                    debug!(dir = %rel, "not following symlinked directory");
                } else if rules.is_excluded_dir(&rel) {
                    debug!(dir = %rel, "excluded from discovery");
                } else {
                    stack.push(path);
                }
            } else if fs.is_file(&path) && rules.is_launcher(&rel) {
                launchers.push(path);
            }
        }
    }

    let mut units: Vec<UnitLocation> = launchers
        .iter()
        .map(|launcher| locate_unit(root, launcher, rules))
        .collect();

    disambiguate_ids(&mut units);
    units.sort_by(|a, b| a.id.cmp(&b.id));

    debug!(count = units.len(), root = %root.display(), "discovery finished");
    Ok(units)
}

fn locate_unit(root: &Path, launcher: &Path, rules: &DiscoveryRules) -> UnitLocation {
    // `launcher` matched `**/<dir>/<file>`, so it always has a parent.
    let launcher_parent = launcher.parent().unwrap_or(root);
    let module_dir = launcher_parent.parent().unwrap_or(root).to_path_buf();

    let launcher_rel = launcher
        .strip_prefix(&module_dir)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| launcher.to_path_buf());

    UnitLocation {
        id: unit_id(root, &module_dir),
        module_dir,
        launcher: launcher_rel,
        config_path: launcher_parent.join(rules.config_name()),
    }
}

fn unit_id(root: &Path, module_dir: &Path) -> String {
    match relative_str(root, module_dir) {
        Some(rel) if !rel.is_empty() => rel,
        _ => root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| ".".to_string()),
    }
}

/// Several launchers in one directory share a module id; suffix each with
/// its launcher file stem.
fn disambiguate_ids(units: &mut [UnitLocation]) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for unit in units.iter() {
        *counts.entry(unit.id.clone()).or_default() += 1;
    }
    for unit in units.iter_mut() {
        if counts.get(&unit.id).copied().unwrap_or(0) > 1 {
            let stem = unit
                .launcher
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            unit.id = format!("{}/{}", unit.id, stem);
        }
    }
}

/// Path relative to `root` with forward slashes.
fn relative_str(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root)
        .ok()
        .map(|rel| rel.to_string_lossy().replace('\\', "/"))
}

