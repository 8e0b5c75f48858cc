// src/lib.rs

pub mod cli;
pub mod config;
pub mod discover;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod logs;
pub mod types;
pub mod unit;
pub mod validate;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{Settings, resolve_settings};
use crate::discover::{DiscoveryRules, NameFilter, apply_filter, discover_units};
use crate::engine::{PlannedUnit, PortLock, RunSummary, Scheduler, UnitPipeline, write_report};
use crate::errors::LaunchcheckError;
use crate::exec::{ProcessExecutor, ProcessExecutorOptions};
use crate::fs::{FileSystem, RealFileSystem};
use crate::logs::{LogManager, clean_logs};
use crate::unit::{UnitLocation, Validation, load_descriptor};
use crate::validate::{CommandChecker, ExternalChecker, OutputValidator};

/// High-level entry point used by `main.rs`. Returns the process exit code.
///
/// This wires together:
/// - settings resolution (file + CLI overrides)
/// - discovery, filtering and descriptor loading
/// - the process executor, port lock and scheduler
/// - summary output, report and exit policy
pub async fn run(args: CliArgs) -> Result<i32> {
    let settings = resolve_settings(&args)?;

    if args.clean_logs {
        let stats = clean_logs(&settings.logs.root)?;
        println!(
            "removed {} log file(s) and {} run dir(s) under {}",
            stats.files,
            stats.dirs,
            settings.logs.root.display()
        );
        return Ok(if stats.failed == 0 { 0 } else { 1 });
    }

    let root = PathBuf::from(&args.root);
    let fs = RealFileSystem;
    let plan = build_plan(&fs, &root, &settings, args.filter.as_deref())?;

    if plan.is_empty() {
        warn!(root = %root.display(), "no units found");
        return Ok(0);
    }

    if args.dry_run {
        print_dry_run(&plan, &settings);
        return Ok(0);
    }

    let options = ProcessExecutorOptions::from_settings(&settings);
    options.launcher.ensure_available()?;

    let started = Local::now();
    let logs = Arc::new(LogManager::create(
        &settings.logs.root,
        settings.logs.layout(),
        started,
    )?);

    let port = if settings.run.port_isolated {
        warn!(
            port = settings.run.port,
            "port isolation enabled; main invocations may overlap"
        );
        PortLock::isolated(settings.run.port)
    } else {
        PortLock::exclusive(settings.run.port)
    };

    let checker = settings.checker.command.as_ref().map(|cmd| {
        Arc::new(CommandChecker::new(
            cmd.clone(),
            Duration::from_secs(settings.checker.timeout_secs),
        )) as Arc<dyn ExternalChecker>
    });
    if checker.is_none() && plan.iter().any(needs_checker) {
        warn!("units with validationMode \"ai\" found but no checker command is configured");
    }

    let pipeline = UnitPipeline::new(Arc::new(ProcessExecutor::new(options)), logs, port)
        .with_validator(OutputValidator::new(checker))
        .with_stream(settings.run.stream)
        .with_verbose(settings.run.verbose);
    let scheduler = Scheduler::new(pipeline, settings.run.workers, settings.run.fail_fast);

    let summary = scheduler.run(plan).await;
    print!("{summary}");

    if let Some(report) = args.report.as_deref() {
        write_report(&summary, Path::new(report), Local::now())?;
    }

    Ok(exit_code(&summary, &settings))
}

/// Discover, filter and load every unit under `root`.
///
/// Descriptor errors are kept in the plan as malformed units; only a
/// discovery failure aborts.
pub fn build_plan(
    fs: &dyn FileSystem,
    root: &Path,
    settings: &Settings,
    filter: Option<&str>,
) -> errors::Result<Vec<PlannedUnit>> {
    let rules = DiscoveryRules::from_settings(settings)?;
    let found = discover_units(fs, root, &rules)?;
    let discovered = found.len();

    let filter = filter.map(NameFilter::new);
    let locations = apply_filter(found, filter.as_ref());
    info!(discovered, selected = locations.len(), "discovery finished");

    Ok(locations
        .into_iter()
        .map(|location| plan_unit(fs, location))
        .collect())
}

fn plan_unit(fs: &dyn FileSystem, location: UnitLocation) -> PlannedUnit {
    match load_descriptor(fs, &location) {
        Ok(unit) => {
            debug!(unit = %unit.id(), timeout_secs = unit.timeout_secs, "loaded unit");
            PlannedUnit::Ready(unit)
        }
        Err(LaunchcheckError::MalformedConfig { reason, .. }) => {
            PlannedUnit::Malformed { location, reason }
        }
        Err(other) => PlannedUnit::Malformed {
            location,
            reason: other.to_string(),
        },
    }
}

fn needs_checker(planned: &PlannedUnit) -> bool {
    matches!(
        planned,
        PlannedUnit::Ready(unit) if matches!(unit.validation, Validation::External { .. })
    )
}

/// 0 iff every reported unit passed, unless failures are allowed.
pub fn exit_code(summary: &RunSummary, settings: &Settings) -> i32 {
    if summary.all_passed() || !settings.run.fail_on_error {
        0
    } else {
        1
    }
}

/// Print the plan: units, launchers, timeouts and validation.
fn print_dry_run(plan: &[PlannedUnit], settings: &Settings) {
    println!("launchcheck dry-run");
    println!(
        "  launcher: {} {}",
        settings.launcher.program,
        settings.launcher.args.join(" ")
    );
    println!(
        "  workers: {}  port: {}  port_isolated: {}",
        settings.run.workers, settings.run.port, settings.run.port_isolated
    );
    println!();

    println!("units ({}):", plan.len());
    for planned in plan {
        match planned {
            PlannedUnit::Ready(unit) => {
                println!("  - {}", unit.id());
                println!("      dir: {}", unit.location.module_dir.display());
                println!("      launcher: {}", unit.location.launcher.display());
                println!("      timeout: {}s", unit.timeout_secs);
                match &unit.validation {
                    Validation::Pattern => {
                        println!("      patterns: {:?}", unit.success_patterns)
                    }
                    Validation::External { prompt } => println!("      checker prompt: {prompt}"),
                }
                if !unit.required_env.is_empty() {
                    println!("      requires env: {:?}", unit.required_env);
                }
                if !unit.setup_commands.is_empty() {
                    println!("      setup: {:?}", unit.setup_commands);
                }
                if !unit.cleanup_commands.is_empty() {
                    println!("      cleanup: {:?}", unit.cleanup_commands);
                }
            }
            PlannedUnit::Malformed { location, reason } => {
                println!("  - {} (malformed: {reason})", location.id);
            }
        }
    }

    debug!("dry-run complete (no execution)");
}
