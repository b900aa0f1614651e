//! Progress-callback trait for stamp-job lifecycle events.
//!
//! Inject an [`Arc<dyn StampProgressCallback>`] via
//! [`crate::config::StampConfigBuilder::progress_callback`] to hear about each
//! phase of a run. The CLI uses it to drive a spinner while the external tool
//! works; a service might forward the events to its own job log.
//!
//! # Example
//!
//! ```rust
//! use pdfstamp::{StampConfig, StampProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct Launches(AtomicUsize);
//!
//! impl StampProgressCallback for Launches {
//!     fn on_tool_start(&self, command_line: &str) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("running: {command_line}");
//!     }
//! }
//!
//! let config = StampConfig::builder()
//!     .progress_callback(Arc::new(Launches(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by [`crate::stamp()`] as a job moves through its phases.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync` because a
/// config may be shared by jobs running on different tasks.
pub trait StampProgressCallback: Send + Sync {
    /// Called once inputs passed validation (or validation is disabled).
    ///
    /// # Arguments
    /// * `source`      — the document being stamped
    /// * `output_path` — where the stamped copy will be written
    fn on_validated(&self, source: &Path, output_path: &Path) {
        let _ = (source, output_path);
    }

    /// Called after inputs were copied into a staging directory.
    fn on_staged(&self, staging_dir: &Path) {
        let _ = staging_dir;
    }

    /// Called immediately before the external tool is launched.
    ///
    /// `command_line` is a display rendering of the invocation; the process
    /// itself receives a structured argument list, never this string.
    fn on_tool_start(&self, command_line: &str) {
        let _ = command_line;
    }

    /// Called when the tool exits (or is killed), before interpretation.
    fn on_tool_finish(&self, elapsed_ms: u64) {
        let _ = elapsed_ms;
    }

    /// Called exactly once per job with its final outcome.
    ///
    /// # Arguments
    /// * `success` — whether the job produced a stamped file
    /// * `message` — `"Success"` or the failure description
    fn on_complete(&self, success: bool, message: &str) {
        let _ = (success, message);
    }
}

/// Type alias for a shared, dynamic progress callback.
pub type ProgressCallback = Arc<dyn StampProgressCallback>;

/// No-op implementation used when no callback is configured.
pub(crate) struct NoopProgressCallback;

impl StampProgressCallback for NoopProgressCallback {}
