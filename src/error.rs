//! Error types for the pdfstamp library.
//!
//! Every way a stamp job can fail is a variant of [`StampError`]. The
//! variants fall into five groups that mirror the order in which a job runs:
//!
//! * **Input validation** — unreadable inputs, unwritable output directory,
//!   wrong content type.
//! * **Output conflict** — the stamped file already exists.
//! * **Staging** — copying inputs into a staging directory failed.
//! * **Process** — the tool could not be found, launched, or finished in time.
//! * **Tool-reported** — the tool ran and wrote diagnostics.
//!
//! [`crate::stamp()`] returns these as `Err`. [`crate::render()`] folds them into
//! a [`crate::output::StampOutcome`] for callers that prefer a flat result.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdfstamp library.
#[derive(Debug, Error)]
pub enum StampError {
    // ── Input validation ──────────────────────────────────────────────────
    /// The source document is missing or cannot be opened.
    #[error("PDF is not found nor readable: '{}'", .path.display())]
    SourceUnreadable { path: PathBuf },

    /// The overlay image is missing or cannot be opened.
    #[error("Image is not found nor readable: '{}'", .path.display())]
    OverlayUnreadable { path: PathBuf },

    /// The output directory is missing or a file cannot be created in it.
    #[error("Output folder is not found nor writeable: '{}'", .path.display())]
    OutputDirNotWritable { path: PathBuf },

    /// The source document is not a PDF according to its content.
    #[error("Supported file format is only PDF: '{}' looks like {detected}", .path.display())]
    UnsupportedSource { path: PathBuf, detected: String },

    /// The overlay image's content type is outside the supported set.
    #[error("Image file format is not supported: '{}' looks like {detected}", .path.display())]
    UnsupportedOverlay { path: PathBuf, detected: String },

    // ── Output conflict ───────────────────────────────────────────────────
    /// The computed output file exists and overwrite was not requested.
    #[error("Stamped file already exists: '{}'\nPass --overwrite to replace it.", .path.display())]
    OutputExists { path: PathBuf },

    /// Overwrite was requested but the existing output could not be removed.
    #[error("Failed to remove existing output '{}': {source}", .path.display())]
    RemoveExistingFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Staging ───────────────────────────────────────────────────────────
    /// Copying an input into the staging directory failed.
    #[error("Failed to stage '{}' into the working directory: {reason}", .path.display())]
    StagingFailed { path: PathBuf, reason: String },

    // ── Process ───────────────────────────────────────────────────────────
    /// No stamping engine was configured and none could be located.
    #[error("Stamping tool not available: {0}")]
    ToolNotFound(#[from] pdfstamp_locate::LocateError),

    /// The operating system refused to launch the tool.
    #[error("Failed to launch '{}': {source}", .program.display())]
    SpawnFailed {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The tool wrote diagnostics; the message is its output joined by spaces.
    #[error("{0}")]
    ToolReported(String),

    /// The tool exited unsuccessfully without writing anything.
    #[error("Stamping tool exited with {}", describe_exit(.code))]
    ToolFailed { code: Option<i32> },

    /// The tool did not finish within the configured bound.
    #[error("Stamping tool timed out after {secs}s and was killed")]
    Timeout { secs: u64 },

    /// The caller's cancellation signal fired before the tool finished.
    #[error("Stamping was cancelled")]
    Cancelled,

    // ── Config ────────────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "a signal".to_string(),
    }
}

impl StampError {
    /// True for failures detected before anything external was launched.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            StampError::SourceUnreadable { .. }
                | StampError::OverlayUnreadable { .. }
                | StampError::OutputDirNotWritable { .. }
                | StampError::UnsupportedSource { .. }
                | StampError::UnsupportedOverlay { .. }
                | StampError::InvalidConfig(_)
        )
    }
}
