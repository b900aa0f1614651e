//! Pipeline stages for a stamp run.
//!
//! Each submodule implements exactly one step, so each is testable on its
//! own and the detector can be swapped without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! validate ──▶ command ──▶ stage ──▶ invoke
//! (detect)     (argv)      (opt.)    (child process)
//! ```
//!
//! 1. [`validate`] — readability, writability and content-type checks, using
//!    a [`detect::ContentTypeDetector`]; resolves a pre-existing output file
//! 2. [`command`]  — assemble the tool's argument list
//! 3. [`stage`]    — optionally copy inputs into a private staging directory
//! 4. [`invoke`]   — run the tool with a timeout and cancellation, capture its
//!    output, interpret it

pub mod command;
pub mod detect;
pub mod invoke;
pub mod stage;
pub mod validate;
