// src/exec/shell.rs

//! One-off shell commands (setup / cleanup).

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::exec::process::{isolate_group, reap_group, terminate_tree};

/// Lines of output quoted in a failure reason.
const TAIL_LINES: usize = 5;

/// Build a shell command appropriate for the platform.
pub fn shell_command(command: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command);
        c
    }
}

/// Run `command` in `cwd`, bounded by `timeout`.
///
/// Returns a human-readable reason on spawn failure, timeout or non-zero
/// exit; the reason quotes the last few lines of combined output.
pub async fn run_shell(
    command: &str,
    cwd: &Path,
    timeout: Duration,
    grace: Duration,
) -> Result<(), String> {
    let mut cmd = shell_command(command);
    cmd.current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    isolate_group(&mut cmd);

    let mut child = cmd.spawn().map_err(|e| format!("could not spawn: {e}"))?;
    let pgid = child.id();
    let stdout = child.stdout.take().map(collect);
    let stderr = child.stderr.take().map(collect);

    let waited = tokio::time::timeout(timeout, child.wait()).await;
    let verdict = match waited {
        Ok(Ok(status)) => {
            reap_group(pgid).await;
            if status.success() {
                Ok(())
            } else {
                Err(match status.code() {
                    Some(code) => format!("exit code {code}"),
                    None => "terminated by signal".to_string(),
                })
            }
        }
        Ok(Err(e)) => Err(format!("waiting for process failed: {e}")),
        Err(_) => {
            terminate_tree(&mut child, pgid, grace).await;
            Err(format!("timed out after {}s", timeout.as_secs()))
        }
    };

    let mut output = String::new();
    for handle in [stdout, stderr].into_iter().flatten() {
        if let Ok(Ok(bytes)) = tokio::time::timeout(grace, handle).await {
            output.push_str(&String::from_utf8_lossy(&bytes));
        }
    }
    for line in output.lines() {
        debug!(command, "{}", line);
    }

    verdict.map_err(|reason| with_tail(reason, &output))
}

/// Read a pipe to the end on a separate task.
pub(crate) fn collect<R>(mut reader: R) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf).await;
        buf
    })
}

fn with_tail(reason: String, output: &str) -> String {
    let lines: Vec<&str> = output.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return reason;
    }
    let start = lines.len().saturating_sub(TAIL_LINES);
    format!("{reason}; output tail: {}", lines[start..].join(" / "))
}
