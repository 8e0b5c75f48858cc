// src/exec/env.rs

use std::collections::HashMap;

use crate::unit::UnitDescriptor;

/// Source of environment variables for precondition checks.
pub trait Environment: Send + Sync {
    fn var(&self, name: &str) -> Option<String>;
}

/// The orchestrator's own process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Fixed set of variables, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct StaticEnv {
    vars: HashMap<String, String>,
}

impl StaticEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.vars.insert(name.to_string(), value.to_string());
        self
    }
}

impl Environment for StaticEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// Names from `requiredEnv` that are unset or empty, in declaration order.
pub fn missing_vars(unit: &UnitDescriptor, env: &dyn Environment) -> Vec<String> {
    unit.required_env
        .iter()
        .filter(|name| env.var(name).is_none_or(|v| v.trim().is_empty()))
        .cloned()
        .collect()
}
