//! Argument-list assembly for the stamping tool.
//!
//! The tool's interface:
//!
//! ```text
//! <tool> [-d dpi] [-u url] -o <dir> [-p page]... [-pp start-end]... -l x,y -i <image> <pdf>
//! ```
//!
//! Arguments are collected as a `Vec<OsString>` and handed to the process
//! launcher unchanged, so paths with spaces or quotes need no escaping.

use crate::config::{StampJob, StampTool};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

/// A fully assembled tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// Working directory for the child; `None` inherits ours.
    pub current_dir: Option<PathBuf>,
}

impl Invocation {
    pub fn new(tool: &StampTool, stamp_args: Vec<OsString>) -> Self {
        let mut args = tool.leading_args.clone();
        args.extend(stamp_args);
        Self {
            program: tool.program.clone(),
            args,
            current_dir: None,
        }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Human-readable rendering for logs and dry runs. Not for a shell.
    pub fn command_line(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(quote_for_display(self.program.as_os_str()));
        parts.extend(self.args.iter().map(|a| quote_for_display(a)));
        parts.join(" ")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

fn quote_for_display(arg: &OsStr) -> String {
    let s = arg.to_string_lossy();
    if s.is_empty() || s.chars().any(|c| c.is_whitespace() || c == '\'' || c == '"') {
        format!("'{}'", s.replace('\'', "'\\''"))
    } else {
        s.into_owned()
    }
}

/// Assemble the stamping flags for `job`.
///
/// `overlay` and `source` are passed separately from the job because staged
/// runs point the tool at the staged copies instead of the originals.
pub fn stamp_args(job: &StampJob, output_dir: &Path, overlay: &Path, source: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::new();

    if let Some(dpi) = job.dpi {
        args.push("-d".into());
        args.push(dpi.to_string().into());
    }
    if let Some(ref url) = job.stamp_url {
        args.push("-u".into());
        args.push(url.into());
    }

    args.push("-o".into());
    args.push(output_dir.as_os_str().to_owned());

    for page in job.pages.iter().filter(|&&p| p != 0) {
        args.push("-p".into());
        args.push(page.to_string().into());
    }
    for range in &job.page_ranges {
        args.push("-pp".into());
        args.push(range.normalized().to_string().into());
    }

    args.push("-l".into());
    args.push(job.location.to_string().into());

    args.push("-i".into());
    args.push(overlay.as_os_str().to_owned());
    args.push(source.as_os_str().to_owned());

    args
}
