// src/logs/cleanup.rs

use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing::{info, warn};

use crate::errors::Result;

/// What [`clean_logs`] removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupStats {
    pub files: usize,
    pub dirs: usize,
    pub failed: usize,
}

/// Remove every `*.log` file under `root` and every `run-*` directory
/// directly inside it.
///
/// Individual removal errors are logged and counted, not returned. A missing
/// root is not an error.
pub fn clean_logs(root: &Path) -> Result<CleanupStats> {
    let mut stats = CleanupStats::default();
    if !root.is_dir() {
        info!(root = %root.display(), "no log directory found to clean");
        return Ok(stats);
    }

    let mut stack = vec![root.to_path_buf()];
    let mut run_dirs = Vec::new();
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).with_context(|| format!("reading dir {}", dir.display()))? {
            let path = entry
                .with_context(|| format!("reading entry in {}", dir.display()))?
                .path();
            if path.is_dir() {
                let is_run_dir = dir == root
                    && path
                        .file_name()
                        .is_some_and(|n| n.to_string_lossy().starts_with("run-"));
                if is_run_dir {
                    run_dirs.push(path.clone());
                }
                stack.push(path);
            } else if path.extension().is_some_and(|ext| ext == "log") {
                match fs::remove_file(&path) {
                    Ok(()) => stats.files += 1,
                    Err(e) => {
                        warn!(file = %path.display(), error = %e, "failed to remove log file");
                        stats.failed += 1;
                    }
                }
            }
        }
    }

    for dir in run_dirs {
        match fs::remove_dir_all(&dir) {
            Ok(()) => stats.dirs += 1,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "failed to remove run directory");
                stats.failed += 1;
            }
        }
    }

    info!(
        files = stats.files,
        dirs = stats.dirs,
        failed = stats.failed,
        "log cleanup completed"
    );
    Ok(stats)
}
