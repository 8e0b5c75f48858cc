// src/unit/validate.rs

use regex::RegexBuilder;

use crate::types::ValidationMode;
use crate::unit::descriptor::{
    DEFAULT_TIMEOUT_SECS, RawUnitConfig, UnitDescriptor, UnitLocation, Validation,
};

/// Check a raw config and build the descriptor.
///
/// Returns the human-readable reason on failure; the loader attaches the
/// artifact path.
pub fn build_descriptor(
    location: UnitLocation,
    raw: RawUnitConfig,
) -> Result<UnitDescriptor, String> {
    let timeout_secs = validate_timeout(raw.timeout_sec)?;
    let validation = validate_mode(&raw)?;
    if validation == Validation::Pattern {
        validate_patterns(&raw.success_regex)?;
    }
    let required_env = validate_env_names(raw.required_env)?;
    validate_commands("setupCommands", &raw.setup_commands)?;
    validate_commands("cleanupCommands", &raw.cleanup_commands)?;
    let server_port = validate_port(raw.server_port)?;

    Ok(UnitDescriptor {
        location,
        timeout_secs,
        success_patterns: raw.success_regex,
        required_env,
        setup_commands: raw.setup_commands,
        cleanup_commands: raw.cleanup_commands,
        validation,
        server_port,
    })
}

fn validate_timeout(timeout: Option<i64>) -> Result<u64, String> {
    match timeout {
        None => Ok(DEFAULT_TIMEOUT_SECS),
        Some(secs) if secs > 0 => Ok(secs as u64),
        Some(secs) => Err(format!("timeoutSec must be > 0 (got {secs})")),
    }
}

fn validate_mode(raw: &RawUnitConfig) -> Result<Validation, String> {
    match raw.validation_mode {
        ValidationMode::Pattern => Ok(Validation::Pattern),
        ValidationMode::External => {
            let prompt = raw
                .ai_validation_prompt
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .ok_or_else(|| {
                    "aiValidationPrompt is required when validationMode is \"ai\"".to_string()
                })?;
            Ok(Validation::External {
                prompt: prompt.to_string(),
            })
        }
    }
}

fn validate_patterns(patterns: &[String]) -> Result<(), String> {
    if patterns.is_empty() {
        return Err(
            "successRegex must contain at least one pattern when validationMode is \"regex\""
                .to_string(),
        );
    }
    for pattern in patterns {
        RegexBuilder::new(pattern)
            .multi_line(true)
            .dot_matches_new_line(true)
            .build()
            .map_err(|e| format!("successRegex entry {pattern:?} is not a valid regex: {e}"))?;
    }
    Ok(())
}

fn validate_env_names(names: Vec<String>) -> Result<Vec<String>, String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let trimmed = name.trim();
        if trimmed.is_empty() || trimmed.contains('=') {
            return Err(format!("requiredEnv entry {name:?} is not a valid variable name"));
        }
        if !out.iter().any(|n| n == trimmed) {
            out.push(trimmed.to_string());
        }
    }
    Ok(out)
}

fn validate_commands(field: &str, commands: &[String]) -> Result<(), String> {
    if let Some(idx) = commands.iter().position(|c| c.trim().is_empty()) {
        return Err(format!("{field}[{idx}] must not be blank"));
    }
    Ok(())
}

fn validate_port(port: Option<i64>) -> Result<Option<u16>, String> {
    match port {
        None => Ok(None),
        Some(p) => u16::try_from(p)
            .map(Some)
            .map_err(|_| format!("serverPort must be within 0..=65535 (got {p})")),
    }
}
