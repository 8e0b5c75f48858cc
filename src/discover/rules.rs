// src/discover/rules.rs

use std::fmt;

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::config::Settings;

/// Compiled naming convention for launchers.
///
/// A launcher is any file whose path relative to the root matches
/// `**/<dir>/<file>`; the configuration artifact named `config` sits next to
/// it. Directories matching `exclude` are skipped entirely.
#[derive(Clone)]
pub struct DiscoveryRules {
    launcher_dir: String,
    config_name: String,
    launcher_set: GlobSet,
    exclude_set: Option<GlobSet>,
}

impl fmt::Debug for DiscoveryRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscoveryRules")
            .field("launcher_dir", &self.launcher_dir)
            .field("config_name", &self.config_name)
            .finish_non_exhaustive()
    }
}

impl DiscoveryRules {
    pub fn new(
        launcher_dir: &str,
        launcher_file: &str,
        config_name: &str,
        exclude: &[String],
    ) -> Result<Self> {
        let launcher_patterns = vec![format!("**/{launcher_dir}/{launcher_file}")];
        let launcher_set = build_globset(&launcher_patterns)
            .with_context(|| format!("building launcher globset for {launcher_file}"))?;

        let exclude_set = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(exclude).context("building discovery exclude globset")?)
        };

        Ok(Self {
            launcher_dir: launcher_dir.to_string(),
            config_name: config_name.to_string(),
            launcher_set,
            exclude_set,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            &settings.launcher.dir,
            &settings.launcher.file,
            &settings.launcher.config,
            &settings.discovery.exclude,
        )
    }

    pub fn config_name(&self) -> &str {
        &self.config_name
    }

    /// `rel_path` uses `/` separators and is relative to the discovery root.
    pub fn is_launcher(&self, rel_path: &str) -> bool {
        self.launcher_set.is_match(rel_path)
    }

    /// Whether a directory (relative, `/`-separated) should not be descended.
    ///
    /// Exclude globs are written against contents (`**/target/**`), so the
    /// directory is probed with a trailing child component.
    pub fn is_excluded_dir(&self, rel_dir: &str) -> bool {
        match &self.exclude_set {
            Some(set) => set.is_match(rel_dir) || set.is_match(format!("{rel_dir}/_")),
            None => false,
        }
    }
}

/// `*` never crosses a `/`; only `**` spans directories.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
