//! # pdfstamp
//!
//! Stamp an image onto the pages of a PDF by driving the `pdfstamp`
//! command-line engine.
//!
//! The engine does all the document work: parsing, compositing, writing.
//! This crate is the part around it that callers otherwise re-implement
//! badly: checking inputs by content rather than by name, computing the
//! output location, building an argument list that survives odd file names,
//! staging inputs for engine builds with path-handling quirks, bounding the
//! run with a timeout, and turning the engine's "print on failure"
//! convention into a typed error.
//!
//! ## Pipeline Overview
//!
//! ```text
//! StampJob + StampConfig
//!  │
//!  ├─ 1. Validate  readable inputs, writable output dir, sniffed content types
//!  ├─ 2. Conflict  existing <name>_stamped.<ext>: fail, or delete on overwrite
//!  ├─ 3. Assemble  -d -u -o -p… -pp… -l -i <image> <pdf>
//!  ├─ 4. Stage     optional private copy of the inputs under the working dir
//!  ├─ 5. Invoke    child process, timeout, cancellation
//!  └─ 6. Interpret any output text = failure, silence = success
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdfstamp::{stamp, StampConfig, StampJob};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let job = StampJob::builder("report.pdf", "logo.png")
//!         .output_dir("/tmp/out/")
//!         .location(36.0, 36.0)
//!         .pages([1, 3])
//!         .page_range(10, 12)
//!         .build()?;
//!
//!     // Tool located from PDFSTAMP_JAR / next to the binary / PDFSTAMP_HOME
//!     let output = stamp(&job, &StampConfig::default()).await?;
//!     println!("{}", output.output_path.display()); // /tmp/out/report_stamped.pdf
//!     Ok(())
//! }
//! ```
//!
//! Prefer a flat result? [`render`] returns a [`StampOutcome`] with
//! `success`, `message` and `output` fields and never fails.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfstamp` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stamp;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    Location, PageRange, StampConfig, StampConfigBuilder, StampJob, StampJobBuilder, StampTool,
};
pub use error::StampError;
pub use output::{StampOutcome, StampOutput};
pub use pipeline::command::Invocation;
pub use pipeline::detect::{ContentTypeDetector, MagicBytesDetector, SUPPORTED_OVERLAY_TYPES};
pub use progress::{ProgressCallback, StampProgressCallback};
pub use stamp::{plan, render, stamp, stamp_sync, stamp_with_cancel};
