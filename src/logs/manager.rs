// src/logs/manager.rs

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Local};
use tokio::fs::{File, OpenOptions};
use tracing::{debug, info};

use crate::errors::Result;
use crate::types::LogLayout;
use crate::unit::descriptor::log_stem_for;

const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Hands out one fresh log file per unit execution.
///
/// Paths are absolute. Files are created with `create_new`, and a taken name
/// is retried with a `-2`, `-3`, ... suffix, so concurrent allocations and
/// repeated runs within the same second never share a file.
#[derive(Debug)]
pub struct LogManager {
    root: PathBuf,
    layout: LogLayout,
    run_dir: PathBuf,
}

/// An open, empty log file plus its durable path.
#[derive(Debug)]
pub struct LogSink {
    path: PathBuf,
    file: File,
}

impl LogSink {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_parts(self) -> (PathBuf, File) {
        (self.path, self.file)
    }
}

impl LogManager {
    /// Prepare the log root (and, for structured logs, this run's directory).
    pub fn create(root: &Path, layout: LogLayout, started: DateTime<Local>) -> Result<Self> {
        std::fs::create_dir_all(root)
            .with_context(|| format!("creating log root {}", root.display()))?;
        let root = std::fs::canonicalize(root)
            .with_context(|| format!("resolving log root {}", root.display()))?;

        let run_dir = match layout {
            LogLayout::Flat => root.clone(),
            LogLayout::Structured => {
                let dir = create_unique_dir(&root, &format!("run-{}", started.format(STAMP_FORMAT)))?;
                info!(dir = %dir.display(), "using structured log directory");
                dir
            }
        };

        Ok(Self {
            root,
            layout,
            run_dir,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory unit logs of this invocation land in.
    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn layout(&self) -> LogLayout {
        self.layout
    }

    /// Allocate a new log file for `unit_id`.
    pub async fn allocate(&self, unit_id: &str) -> Result<LogSink> {
        let stem = log_stem_for(unit_id);
        let base = match self.layout {
            LogLayout::Flat => format!("{stem}_{}", Local::now().format(STAMP_FORMAT)),
            LogLayout::Structured => stem,
        };

        let mut attempt: u32 = 1;
        loop {
            let name = if attempt == 1 {
                format!("{base}.log")
            } else {
                format!("{base}-{attempt}.log")
            };
            let path = self.run_dir.join(name);

            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => {
                    debug!(unit = %unit_id, log = %path.display(), "allocated log file");
                    return Ok(LogSink { path, file });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => {
                    return Err(anyhow::Error::new(e)
                        .context(format!("creating log file {}", path.display()))
                        .into());
                }
            }
        }
    }
}

fn create_unique_dir(parent: &Path, base: &str) -> Result<PathBuf> {
    let mut attempt: u32 = 1;
    loop {
        let name = if attempt == 1 {
            base.to_string()
        } else {
            format!("{base}-{attempt}")
        };
        let dir = parent.join(name);
        match std::fs::create_dir(&dir) {
            Ok(()) => return Ok(dir),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("creating run directory {}", dir.display()))
                    .into());
            }
        }
    }
}
