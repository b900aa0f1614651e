//! Running the stamping tool as a child process.
//!
//! The tool signals trouble by printing; a clean run prints nothing. Both
//! output streams are captured, and the child is bounded two ways:
//!
//! * a timeout — on expiry the child is killed and [`StampError::Timeout`]
//!   returned;
//! * a caller-supplied cancellation future — when it resolves first the
//!   child is killed and [`StampError::Cancelled`] returned.
//!
//! Killing relies on `kill_on_drop`: losing the `select!` race drops the
//! future that owns the child.

use crate::error::StampError;
use crate::pipeline::command::Invocation;
use std::future::Future;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Message used when the tool printed nothing but whitespace.
pub const BLANK_OUTPUT_MESSAGE: &str = "Stamping tool printed only blank lines";

/// Everything the tool produced.
#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    /// The tool's diagnostics as one line, or `None` if it printed nothing.
    ///
    /// Any byte on either stream counts, blank lines included. The message
    /// is the stdout lines followed by the stderr lines, each right-trimmed,
    /// blank ones dropped, joined with single spaces. The streams are
    /// captured separately, so how they interleaved in time is not kept.
    /// Output made only of whitespace yields [`BLANK_OUTPUT_MESSAGE`].
    pub fn diagnostic(&self) -> Option<String> {
        if self.stdout.is_empty() && self.stderr.is_empty() {
            return None;
        }

        let stdout = String::from_utf8_lossy(&self.stdout);
        let stderr = String::from_utf8_lossy(&self.stderr);
        let lines: Vec<&str> = stdout
            .lines()
            .chain(stderr.lines())
            .map(str::trim_end)
            .filter(|l| !l.is_empty())
            .collect();

        if lines.is_empty() {
            Some(BLANK_OUTPUT_MESSAGE.to_string())
        } else {
            Some(lines.join(" "))
        }
    }

    /// Interpret the run: any diagnostic text is a failure, as is a silent
    /// non-zero exit.
    pub fn into_result(self) -> Result<(), StampError> {
        if let Some(message) = self.diagnostic() {
            return Err(StampError::ToolReported(message));
        }
        if !self.status.success() {
            return Err(StampError::ToolFailed {
                code: self.status.code(),
            });
        }
        Ok(())
    }
}

/// Launch `invocation` and wait for it, bounded by `timeout_secs` and `cancel`.
pub async fn run<F>(invocation: &Invocation, timeout_secs: u64, cancel: F) -> Result<ToolOutput, StampError>
where
    F: Future<Output = ()>,
{
    let mut cmd = tokio::process::Command::new(&invocation.program);
    cmd.args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(ref dir) = invocation.current_dir {
        cmd.current_dir(dir);
    }

    debug!("Launching: {}", invocation);
    let start = Instant::now();
    let child = cmd.spawn().map_err(|e| StampError::SpawnFailed {
        program: invocation.program.clone(),
        source: e,
    })?;

    let limit = Duration::from_secs(timeout_secs);
    tokio::select! {
        waited = tokio::time::timeout(limit, child.wait_with_output()) => match waited {
            Ok(Ok(output)) => {
                let elapsed_ms = start.elapsed().as_millis() as u64;
                debug!("Tool exited with {} after {}ms", output.status, elapsed_ms);
                Ok(ToolOutput {
                    status: output.status,
                    stdout: output.stdout,
                    stderr: output.stderr,
                })
            }
            Ok(Err(e)) => Err(StampError::Internal(format!(
                "failed waiting for '{}': {}",
                invocation.program.display(),
                e
            ))),
            Err(_) => {
                warn!("Tool exceeded {}s; killing it", timeout_secs);
                Err(StampError::Timeout { secs: timeout_secs })
            }
        },
        _ = cancel => {
            warn!("Stamp cancelled after {}ms; killing tool", start.elapsed().as_millis());
            Err(StampError::Cancelled)
        }
    }
}
