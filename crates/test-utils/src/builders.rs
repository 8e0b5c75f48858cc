use std::path::{Path, PathBuf};

use launchcheck::unit::descriptor::DEFAULT_TIMEOUT_SECS;
use launchcheck::unit::{UnitDescriptor, UnitLocation, Validation};

/// Builder for [`UnitDescriptor`] that skips JSON and validation.
///
/// Defaults: module dir `.`, launcher `integration-tests/Run.java`, one
/// pattern `OK`, the default timeout.
pub struct UnitDescriptorBuilder {
    id: String,
    module_dir: PathBuf,
    launcher: PathBuf,
    timeout_secs: u64,
    patterns: Vec<String>,
    required_env: Vec<String>,
    setup: Vec<String>,
    cleanup: Vec<String>,
    validation: Validation,
    server_port: Option<u16>,
}

impl UnitDescriptorBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            module_dir: PathBuf::from("."),
            launcher: PathBuf::from("integration-tests/Run.java"),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            patterns: vec!["OK".to_string()],
            required_env: Vec::new(),
            setup: Vec::new(),
            cleanup: Vec::new(),
            validation: Validation::Pattern,
            server_port: None,
        }
    }

    pub fn module_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.module_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn launcher(mut self, rel: impl AsRef<Path>) -> Self {
        self.launcher = rel.as_ref().to_path_buf();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Replace the pattern list.
    pub fn patterns(mut self, patterns: &[&str]) -> Self {
        self.patterns = patterns.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn require_env(mut self, name: &str) -> Self {
        self.required_env.push(name.to_string());
        self
    }

    pub fn setup(mut self, cmd: &str) -> Self {
        self.setup.push(cmd.to_string());
        self
    }

    pub fn cleanup(mut self, cmd: &str) -> Self {
        self.cleanup.push(cmd.to_string());
        self
    }

    pub fn external(mut self, prompt: &str) -> Self {
        self.validation = Validation::External {
            prompt: prompt.to_string(),
        };
        self
    }

    pub fn server_port(mut self, port: u16) -> Self {
        self.server_port = Some(port);
        self
    }

    pub fn build(self) -> UnitDescriptor {
        let config_path = self
            .module_dir
            .join(self.launcher.parent().unwrap_or(Path::new("")))
            .join("ExampleInfo.json");
        UnitDescriptor {
            location: UnitLocation {
                id: self.id,
                module_dir: self.module_dir,
                launcher: self.launcher,
                config_path,
            },
            timeout_secs: self.timeout_secs,
            success_patterns: self.patterns,
            required_env: self.required_env,
            setup_commands: self.setup,
            cleanup_commands: self.cleanup,
            validation: self.validation,
            server_port: self.server_port,
        }
    }
}
