// tests/unit_descriptor.rs

use std::error::Error;
use std::path::PathBuf;

use launchcheck::errors::LaunchcheckError;
use launchcheck::fs::mock::MockFileSystem;
use launchcheck::types::ValidationMode;
use launchcheck::unit::descriptor::DEFAULT_TIMEOUT_SECS;
use launchcheck::unit::{UnitLocation, Validation, load_descriptor, parse_descriptor};

type TestResult = Result<(), Box<dyn Error>>;

fn location() -> UnitLocation {
    UnitLocation {
        id: "spring/chat".to_string(),
        module_dir: PathBuf::from("/repo/spring/chat"),
        launcher: PathBuf::from("integration-tests/RunChat.java"),
        config_path: PathBuf::from("/repo/spring/chat/integration-tests/ExampleInfo.json"),
    }
}

fn malformed_reason(json: &str) -> String {
    match parse_descriptor(location(), json.as_bytes()) {
        Err(LaunchcheckError::MalformedConfig { reason, .. }) => reason,
        Err(other) => panic!("expected MalformedConfig, got {other:?}"),
        Ok(unit) => panic!("expected MalformedConfig, got descriptor {unit:?}"),
    }
}

#[test]
fn full_descriptor_is_loaded() -> TestResult {
    let json = r#"{
        "title": "Chat client",
        "timeoutSec": 120,
        "successRegex": ["Started .* in", "READY"],
        "requiredEnv": ["OPENAI_API_KEY", "OPENAI_API_KEY"],
        "setupCommands": ["docker compose up -d"],
        "cleanupCommands": ["docker compose down"],
        "validationMode": "regex",
        "serverPort": 0
    }"#;

    let unit = parse_descriptor(location(), json.as_bytes())?;
    assert_eq!(unit.id(), "spring/chat");
    assert_eq!(unit.timeout_secs, 120);
    assert_eq!(unit.success_patterns, vec!["Started .* in", "READY"]);
    assert_eq!(unit.required_env, vec!["OPENAI_API_KEY"]);
    assert_eq!(unit.setup_commands, vec!["docker compose up -d"]);
    assert_eq!(unit.cleanup_commands, vec!["docker compose down"]);
    assert_eq!(unit.validation, Validation::Pattern);
    assert_eq!(unit.server_port, Some(0));
    assert_eq!(unit.log_stem(), "spring_chat");
    Ok(())
}

#[test]
fn absent_timeout_uses_default() -> TestResult {
    let unit = parse_descriptor(location(), br#"{"successRegex": ["OK"]}"#)?;
    assert_eq!(unit.timeout_secs, DEFAULT_TIMEOUT_SECS);
    assert!(unit.setup_commands.is_empty());
    assert!(unit.required_env.is_empty());
    Ok(())
}

#[test]
fn empty_patterns_in_pattern_mode_are_malformed() {
    let reason = malformed_reason(r#"{"timeoutSec": 30, "successRegex": []}"#);
    assert!(reason.contains("successRegex"), "reason: {reason}");

    let reason = malformed_reason(r#"{"timeoutSec": 30}"#);
    assert!(reason.contains("successRegex"), "reason: {reason}");
}

#[test]
fn non_positive_timeout_is_malformed() {
    assert!(malformed_reason(r#"{"timeoutSec": 0, "successRegex": ["OK"]}"#).contains("timeoutSec"));
    assert!(malformed_reason(r#"{"timeoutSec": -5, "successRegex": ["OK"]}"#).contains("timeoutSec"));
}

#[test]
fn external_mode_requires_prompt() -> TestResult {
    let reason = malformed_reason(r#"{"validationMode": "ai"}"#);
    assert!(reason.contains("aiValidationPrompt"), "reason: {reason}");

    let reason = malformed_reason(r#"{"validationMode": "ai", "aiValidationPrompt": "   "}"#);
    assert!(reason.contains("aiValidationPrompt"), "reason: {reason}");

    // External mode does not need patterns.
    let unit = parse_descriptor(
        location(),
        br#"{"validationMode": "ai", "aiValidationPrompt": "The output lists three prime numbers"}"#,
    )?;
    assert_eq!(unit.validation.mode(), ValidationMode::External);
    assert_eq!(
        unit.validation,
        Validation::External {
            prompt: "The output lists three prime numbers".to_string()
        }
    );
    Ok(())
}

#[test]
fn unknown_validation_mode_is_malformed() {
    let reason = malformed_reason(r#"{"successRegex": ["OK"], "validationMode": "vibes"}"#);
    assert!(reason.contains("invalid JSON"), "reason: {reason}");
}

#[test]
fn invalid_regex_is_malformed() {
    let reason = malformed_reason(r#"{"successRegex": ["Started (unclosed"]}"#);
    assert!(reason.contains("not a valid regex"), "reason: {reason}");
}

#[test]
fn bad_env_names_and_blank_commands_are_malformed() {
    assert!(malformed_reason(r#"{"successRegex": ["OK"], "requiredEnv": ["A=B"]}"#).contains("requiredEnv"));
    assert!(malformed_reason(r#"{"successRegex": ["OK"], "setupCommands": [" "]}"#).contains("setupCommands[0]"));
    assert!(malformed_reason(r#"{"successRegex": ["OK"], "serverPort": 70000}"#).contains("serverPort"));
}

#[test]
fn invalid_json_is_malformed() {
    let reason = malformed_reason("{ not json");
    assert!(reason.contains("invalid JSON"), "reason: {reason}");
}

#[test]
fn parsing_is_deterministic() -> TestResult {
    let json = br#"{"timeoutSec": 10, "successRegex": ["A", "B"]}"#;
    let a = parse_descriptor(location(), json)?;
    let b = parse_descriptor(location(), json)?;
    assert_eq!(a, b);
    Ok(())
}

#[test]
fn missing_artifact_is_malformed() {
    let fs = MockFileSystem::new();
    fs.add_file("/repo/spring/chat/integration-tests/RunChat.java", "class RunChat {}");

    match load_descriptor(&fs, &location()) {
        Err(LaunchcheckError::MalformedConfig { path, reason }) => {
            assert_eq!(path, location().config_path);
            assert!(reason.contains("missing"), "reason: {reason}");
        }
        other => panic!("expected MalformedConfig, got {other:?}"),
    }
}

#[test]
fn artifact_is_read_through_filesystem() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file(
        "/repo/spring/chat/integration-tests/ExampleInfo.json",
        r#"{"timeoutSec": 45, "successRegex": ["Hello"]}"#,
    );

    let unit = load_descriptor(&fs, &location())?;
    assert_eq!(unit.timeout_secs, 45);
    assert_eq!(unit.success_patterns, vec!["Hello"]);
    Ok(())
}
