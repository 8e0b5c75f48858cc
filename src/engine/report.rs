// src/engine/report.rs

use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Local};
use tracing::info;

use crate::engine::summary::RunSummary;
use crate::errors::Result;

/// On-disk report format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Markdown,
    Json,
}

impl ReportFormat {
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ReportFormat::Json,
            _ => ReportFormat::Markdown,
        }
    }
}

/// Write `summary` to `path` (parent directories are created).
pub fn write_report(summary: &RunSummary, path: &Path, generated: DateTime<Local>) -> Result<()> {
    let body = match ReportFormat::for_path(path) {
        ReportFormat::Json => {
            serde_json::to_string_pretty(summary).context("serializing JSON report")?
        }
        ReportFormat::Markdown => render_markdown(summary, generated),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating report directory {}", parent.display()))?;
    }
    std::fs::write(path, body).with_context(|| format!("writing report {}", path.display()))?;
    info!(report = %path.display(), "report written");
    Ok(())
}

pub fn render_markdown(summary: &RunSummary, generated: DateTime<Local>) -> String {
    let mut out = String::new();
    let pct = |n: usize| {
        if summary.total == 0 {
            0.0
        } else {
            n as f64 * 100.0 / summary.total as f64
        }
    };

    let _ = writeln!(out, "# Integration Test Report");
    let _ = writeln!(out);
    let _ = writeln!(out, "- Generated: {}", generated.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "- Total duration: {:.1}s", summary.duration().as_secs_f64());

    if !summary.results.is_empty() {
        let total_ms: u64 = summary.results.iter().map(|r| r.duration_ms).sum();
        let avg = total_ms as f64 / summary.results.len() as f64 / 1000.0;
        let _ = writeln!(out, "- Average unit time: {avg:.1}s");
        if let Some(longest) = summary.results.iter().max_by_key(|r| r.duration_ms) {
            let _ = writeln!(
                out,
                "- Longest unit: {} ({:.1}s)",
                longest.unit_id,
                longest.duration().as_secs_f64()
            );
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Summary");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Status | Count | % |");
    let _ = writeln!(out, "|--------|------:|--:|");
    let _ = writeln!(out, "| Passed | {} | {:.1} |", summary.passed, pct(summary.passed));
    let _ = writeln!(out, "| Failed | {} | {:.1} |", summary.failed, pct(summary.failed));
    let _ = writeln!(out, "| Skipped | {} | {:.1} |", summary.skipped, pct(summary.skipped));
    let _ = writeln!(out, "| **Total** | **{}** | |", summary.total);

    let _ = writeln!(out);
    let _ = writeln!(out, "## Units");
    let _ = writeln!(out);
    for r in summary.results.iter() {
        let mark = if r.is_pass() { "✅" } else { "❌" };
        let _ = writeln!(
            out,
            "- {mark} `{}` {} ({:.1}s)",
            r.unit_id,
            r.verdict,
            r.duration().as_secs_f64()
        );
    }

    if !summary.failures.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "## Failure Details");
        for r in summary.failures.iter() {
            let _ = writeln!(out);
            let _ = writeln!(out, "### {}", r.unit_id);
            let _ = writeln!(out);
            let _ = writeln!(out, "- Verdict: `{}`", r.verdict);
            if let Some(code) = r.exit_code {
                let _ = writeln!(out, "- Exit code: {code}");
            }
            if let Some(detail) = &r.failure_detail {
                let _ = writeln!(out, "- Detail: {detail}");
            }
            if let Some(path) = &r.log_path {
                let _ = writeln!(out, "- Log: `{}`", path.display());
            }
            for w in r.cleanup_warnings.iter() {
                let _ = writeln!(out, "- Cleanup warning: {w}");
            }
        }
    }

    out
}
