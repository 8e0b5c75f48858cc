// src/exec/capture.rs

//! Streams a child's stdout and stderr into its log file.
//!
//! Each pipe gets its own reader task that forwards raw chunks to a single
//! writer task over an mpsc channel; the writer appends and flushes every
//! chunk, so a hung or crashed unit still leaves its output on disk. Readers
//! also split their stream into lines for live echo and bind-failure
//! detection.

use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{ChildStderr, ChildStdout};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::exec::bind::is_bind_failure;

const CHUNK_SIZE: usize = 8192;

/// Longest run of bytes held while waiting for a newline.
pub const MAX_LINE: usize = 64 * 1024;

/// Totals for one capture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub bytes: u64,
    pub bind_failure: bool,
}

/// Running capture; call [`CaptureHandle::finish`] after the process is gone.
pub struct CaptureHandle {
    readers: Vec<JoinHandle<bool>>,
    writer: JoinHandle<u64>,
}

/// Start capturing. `echo` is the prefix for live lines on stdout, if any.
pub fn spawn_capture(
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    file: File,
    echo: Option<String>,
) -> CaptureHandle {
    let (tx, rx) = mpsc::channel::<Vec<u8>>(64);

    let mut readers = Vec::with_capacity(2);
    if let Some(out) = stdout {
        readers.push(spawn_reader(out, tx.clone(), echo.clone()));
    }
    if let Some(err) = stderr {
        readers.push(spawn_reader(err, tx.clone(), echo));
    }
    drop(tx);

    let writer = tokio::spawn(write_chunks(rx, file));
    CaptureHandle { readers, writer }
}

impl CaptureHandle {
    /// Wait for the pipes to close and the log to be flushed.
    ///
    /// A process that escaped the group can keep a pipe open forever; after
    /// `drain` the readers are aborted and whatever was written so far stands.
    pub async fn finish(self, drain: Duration) -> CaptureStats {
        let CaptureHandle { readers, writer } = self;
        let abort_handles: Vec<_> = readers.iter().map(|r| r.abort_handle()).collect();

        let joined = tokio::time::timeout(drain, async move {
            let mut seen = false;
            for reader in readers {
                if let Ok(found) = reader.await {
                    seen |= found;
                }
            }
            seen
        })
        .await;

        let bind_failure = match joined {
            Ok(seen) => seen,
            Err(_) => {
                warn!("output pipes still open after process exit; abandoning capture");
                for handle in abort_handles {
                    handle.abort();
                }
                false
            }
        };

        let bytes = writer.await.unwrap_or_else(|e| {
            warn!(error = %e, "log writer task failed");
            0
        });

        CaptureStats {
            bytes,
            bind_failure,
        }
    }
}

/// Splits a byte stream into lines.
///
/// A line longer than [`MAX_LINE`] is handed out in pieces, so output that
/// never prints a newline still gets inspected and memory stays bounded.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` and return every line that is now complete.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        self.pending.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            lines.push(self.pending.drain(..=pos).collect());
        }
        if self.pending.len() > MAX_LINE {
            lines.push(std::mem::take(&mut self.pending));
        }
        lines
    }

    /// Bytes held back waiting for a newline.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// The trailing partial line, if any.
    pub fn finish(self) -> Option<Vec<u8>> {
        (!self.pending.is_empty()).then_some(self.pending)
    }
}

fn spawn_reader<R>(mut reader: R, tx: mpsc::Sender<Vec<u8>>, echo: Option<String>) -> JoinHandle<bool>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut lines = LineBuffer::new();
        let mut bind_failure = false;

        loop {
            let n = match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    debug!(error = %e, "output pipe read failed");
                    break;
                }
            };
            let chunk = &buf[..n];
            for line in lines.push(chunk) {
                bind_failure |= inspect_line(&line, echo.as_deref());
            }
            if tx.send(chunk.to_vec()).await.is_err() {
                break;
            }
        }

        if let Some(rest) = lines.finish() {
            bind_failure |= inspect_line(&rest, echo.as_deref());
        }
        bind_failure
    })
}

fn inspect_line(raw: &[u8], echo: Option<&str>) -> bool {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim_end_matches(['\r', '\n']);
    if let Some(prefix) = echo {
        if !line.trim().is_empty() {
            println!("{prefix} | {line}");
        }
    }
    is_bind_failure(line)
}

async fn write_chunks(mut rx: mpsc::Receiver<Vec<u8>>, mut file: File) -> u64 {
    let mut written: u64 = 0;
    let mut healthy = true;
    while let Some(chunk) = rx.recv().await {
        if !healthy {
            continue;
        }
        let res = async {
            file.write_all(&chunk).await?;
            file.flush().await
        }
        .await;
        match res {
            Ok(()) => written += chunk.len() as u64,
            Err(e) => {
                warn!(error = %e, "writing unit output to log failed");
                healthy = false;
            }
        }
    }
    if let Err(e) = file.sync_all().await {
        debug!(error = %e, "sync of unit log failed");
    }
    written
}
