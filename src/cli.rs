// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Every flag here overrides the matching key of the settings file; see
//! [`crate::config::loader::resolve_settings`].

use clap::{Parser, ValueEnum};

/// Command-line arguments for `launchcheck`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "launchcheck",
    version,
    about = "Discover example launchers, run them, and verify their output.",
    long_about = None
)]
pub struct CliArgs {
    /// Directory to search for unit launchers.
    #[arg(long, value_name = "PATH", default_value = ".")]
    pub root: String,

    /// Path to the orchestrator settings file (TOML).
    ///
    /// A missing `Launchcheck.toml` falls back to built-in defaults; any other
    /// missing path is an error.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Enable verbose output (debug logging and captured output dumps).
    #[arg(short, long)]
    pub verbose: bool,

    /// Only run units whose id contains this text (case-insensitive).
    #[arg(short, long, value_name = "TEXT")]
    pub filter: Option<String>,

    /// Number of parallel workers.
    ///
    /// Main invocations still run one at a time unless `--port-isolated`.
    #[arg(short, long, value_name = "N")]
    pub workers: Option<usize>,

    /// Echo unit output live to stdout while it is captured.
    #[arg(short, long)]
    pub stream: bool,

    /// Write a report to this path (`.json` for JSON, anything else Markdown).
    #[arg(short, long, value_name = "PATH")]
    pub report: Option<String>,

    /// Stop scheduling further units after the first failure.
    #[arg(long)]
    pub fail_fast: bool,

    /// Remove old log files and run directories, then exit.
    #[arg(long)]
    pub clean_logs: bool,

    /// Group logs in a per-run `run-<timestamp>/` directory.
    #[arg(long)]
    pub structured_logs: bool,

    /// Override the log root directory.
    #[arg(long, value_name = "PATH")]
    pub log_dir: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `--verbose`, `LAUNCHCHECK_LOG` or a default level is used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Discover and load units, print the plan, but run nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Allow main invocations to overlap. Only safe when units do not share
    /// a port.
    #[arg(long)]
    pub port_isolated: bool,

    /// Shell command used as the external checker for `validationMode = "ai"`.
    #[arg(long, value_name = "CMD")]
    pub checker_cmd: Option<String>,

    /// Exit 0 even when units fail.
    #[arg(long)]
    pub allow_failures: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
