// tests/settings.rs

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;

use launchcheck::cli::{CliArgs, LogLevel};
use launchcheck::config::model::RawSettings;
use launchcheck::config::{Settings, load_and_validate, resolve_settings};
use launchcheck::errors::LaunchcheckError;
use launchcheck::logging::resolve_level;
use launchcheck::types::LogLayout;

type TestResult = Result<(), Box<dyn Error>>;

fn write_settings(contents: &str) -> Result<(tempfile::TempDir, PathBuf), Box<dyn Error>> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("Launchcheck.toml");
    std::fs::write(&path, contents)?;
    Ok((tmp, path))
}

#[test]
fn defaults_match_documented_values() -> TestResult {
    let settings = Settings::try_from(RawSettings::default())?;
    assert_eq!(settings.launcher.program, "jbang");
    assert_eq!(settings.launcher.dir, "integration-tests");
    assert_eq!(settings.launcher.file, "Run*.java");
    assert_eq!(settings.launcher.config, "ExampleInfo.json");
    assert_eq!(settings.run.workers, 1);
    assert!(!settings.run.fail_fast);
    assert!(settings.run.fail_on_error);
    assert_eq!(settings.run.port, 8080);
    assert!(!settings.run.port_isolated);
    assert_eq!(settings.logs.root, PathBuf::from("logs"));
    assert_eq!(settings.logs.layout(), LogLayout::Flat);
    assert_eq!(settings.checker.command, None);
    Ok(())
}

#[test]
fn settings_file_is_parsed_and_validated() -> TestResult {
    let (_tmp, path) = write_settings(
        r#"
        [launcher]
        program = "java"
        args = ["-jar", "runner.jar"]

        [run]
        workers = 3
        fail_fast = true
        kill_grace_ms = 500

        [logs]
        root = "target/it-logs"
        structured = true

        [checker]
        command = "./judge.sh"
        timeout_secs = 30
        "#,
    )?;

    let settings = load_and_validate(&path)?;
    assert_eq!(settings.launcher.program, "java");
    assert_eq!(settings.launcher.args, vec!["-jar", "runner.jar"]);
    assert_eq!(settings.run.workers, 3);
    assert!(settings.run.fail_fast);
    assert_eq!(settings.run.kill_grace().as_millis(), 500);
    assert_eq!(settings.logs.layout(), LogLayout::Structured);
    assert_eq!(settings.checker.command.as_deref(), Some("./judge.sh"));
    Ok(())
}

#[test]
fn invalid_settings_are_config_errors() -> TestResult {
    for contents in [
        "[run]\nworkers = 0\n",
        "[launcher]\nprogram = \"  \"\n",
        "[launcher]\ndir = \"a/b\"\n",
        "[run]\nsetup_timeout_secs = 0\n",
        "[checker]\ntimeout_secs = 0\n",
        "[discovery]\nexclude = [\"[unclosed\"]\n",
    ] {
        let (_tmp, path) = write_settings(contents)?;
        let err = load_and_validate(&path).unwrap_err();
        assert!(
            matches!(err, LaunchcheckError::ConfigError(_)),
            "{contents:?} gave {err:?}"
        );
    }
    Ok(())
}

#[test]
fn unknown_keys_are_rejected() -> TestResult {
    let (_tmp, path) = write_settings("[run]\nworkerz = 2\n")?;
    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, LaunchcheckError::TomlError(_)), "got {err:?}");
    Ok(())
}

#[test]
fn cli_flags_override_the_file() -> TestResult {
    let (_tmp, path) = write_settings("[run]\nworkers = 2\n\n[logs]\nroot = \"from-file\"\n")?;
    let args = CliArgs::try_parse_from([
        "launchcheck",
        "--config",
        path.to_str().ok_or("non-utf8 path")?,
        "-w",
        "6",
        "--fail-fast",
        "--structured-logs",
        "--log-dir",
        "from-cli",
        "--port-isolated",
        "--allow-failures",
        "--checker-cmd",
        "judge --strict",
        "-s",
    ])?;

    let settings = resolve_settings(&args)?;
    assert_eq!(settings.run.workers, 6);
    assert!(settings.run.fail_fast);
    assert!(settings.run.port_isolated);
    assert!(!settings.run.fail_on_error);
    assert!(settings.run.stream);
    assert_eq!(settings.logs.root, PathBuf::from("from-cli"));
    assert_eq!(settings.logs.layout(), LogLayout::Structured);
    assert_eq!(settings.checker.command.as_deref(), Some("judge --strict"));
    Ok(())
}

#[test]
fn cli_overrides_are_validated_too() -> TestResult {
    let (_tmp, path) = write_settings("")?;
    let args = CliArgs::try_parse_from([
        "launchcheck",
        "--config",
        path.to_str().ok_or("non-utf8 path")?,
        "--workers",
        "0",
    ])?;
    assert!(matches!(resolve_settings(&args), Err(LaunchcheckError::ConfigError(_))));
    Ok(())
}

#[test]
fn explicit_missing_settings_file_is_an_error() -> TestResult {
    let args = CliArgs::try_parse_from(["launchcheck", "--config", "/definitely/not/here.toml"])?;
    assert!(matches!(resolve_settings(&args), Err(LaunchcheckError::ConfigError(_))));
    Ok(())
}

#[test]
fn log_level_priority() {
    use tracing::Level;

    assert_eq!(resolve_level(Some(LogLevel::Warn), true, Some("trace".into())), Level::WARN);
    assert_eq!(resolve_level(None, true, Some("error".into())), Level::DEBUG);
    assert_eq!(resolve_level(None, false, Some("error".into())), Level::ERROR);
    assert_eq!(resolve_level(None, false, Some("nonsense".into())), Level::INFO);
    assert_eq!(resolve_level(None, false, None), Level::INFO);
}
