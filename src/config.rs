//! Configuration types for a stamp run.
//!
//! Two values describe a run:
//!
//! * [`StampJob`] — *what* to stamp: source document, overlay image, output
//!   directory and placement parameters. Built via [`StampJobBuilder`] and
//!   immutable afterwards.
//! * [`StampConfig`] — *how* to run the stamping tool: which executable,
//!   how long to wait for it, which content-type detector to trust, where to
//!   stage inputs. Built via [`StampConfigBuilder`] or
//!   [`StampConfig::default()`].
//!
//! Splitting the two lets one config drive many jobs (a batch of documents
//! stamped with the same tool and timeout) without re-stating tool details.

use crate::error::StampError;
use crate::pipeline::detect::{ContentTypeDetector, MagicBytesDetector};
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Suffix inserted between the source stem and its extension.
pub const OUTPUT_SUFFIX: &str = "_stamped";

// ── Stamp job ────────────────────────────────────────────────────────────

/// A single stamping request: one source PDF, one overlay image.
///
/// # Example
/// ```rust
/// use pdfstamp::StampJob;
///
/// let job = StampJob::builder("report.pdf", "logo.png")
///     .output_dir("/tmp/out/")
///     .location(20.0, 40.0)
///     .pages([3, 7])
///     .page_range(8, 5)
///     .build()
///     .unwrap();
///
/// assert_eq!(
///     job.output_path_in(job.effective_output_dir()),
///     std::path::PathBuf::from("/tmp/out/report_stamped.pdf")
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StampJob {
    /// PDF document to stamp.
    pub source: PathBuf,

    /// Image placed onto the document.
    pub overlay: PathBuf,

    /// Directory the stamped copy is written to. Default: the source's directory.
    pub output_dir: Option<PathBuf>,

    /// Placement offset handed to the tool. Default: `0,0`.
    pub location: Location,

    /// DPI override for the overlay. Default: tool's own choice.
    pub dpi: Option<u32>,

    /// Alternate stamp source the tool fetches instead of the overlay.
    pub stamp_url: Option<String>,

    /// Individual pages to stamp (1-indexed), in the order given.
    ///
    /// A `0` entry is treated as empty and skipped.
    pub pages: Vec<u32>,

    /// Inclusive page ranges to stamp, in the order given.
    pub page_ranges: Vec<PageRange>,

    /// Replace an existing stamped file instead of failing. Default: false.
    pub overwrite: bool,

    /// Check readability and content types before invoking. Default: true.
    pub validate: bool,

    /// Copy inputs into a staging directory under the working directory
    /// before invoking the tool. Default: false.
    ///
    /// Works around tool builds that mishandle long or non-ASCII paths.
    pub stage_inputs: bool,
}

impl StampJob {
    /// Start building a job for `source` stamped with `overlay`.
    pub fn builder(source: impl Into<PathBuf>, overlay: impl Into<PathBuf>) -> StampJobBuilder {
        StampJobBuilder {
            job: StampJob {
                source: source.into(),
                overlay: overlay.into(),
                output_dir: None,
                location: Location::default(),
                dpi: None,
                stamp_url: None,
                pages: Vec::new(),
                page_ranges: Vec::new(),
                overwrite: false,
                validate: true,
                stage_inputs: false,
            },
        }
    }

    /// Source file name without its extension.
    pub fn file_stem(&self) -> String {
        self.source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Source extension without the leading dot, if any.
    pub fn extension(&self) -> Option<String> {
        self.source
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
    }

    /// Directory that holds the source document (`.` for a bare file name).
    pub fn source_dir(&self) -> &Path {
        match self.source.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }

    /// The configured output directory, else the source's directory.
    pub fn effective_output_dir(&self) -> &Path {
        self.output_dir.as_deref().unwrap_or_else(|| self.source_dir())
    }

    /// Name of the stamped file: `<stem>_stamped.<ext>`.
    pub fn output_file_name(&self) -> String {
        match self.extension() {
            Some(ext) => format!("{}{}.{}", self.file_stem(), OUTPUT_SUFFIX, ext),
            None => format!("{}{}", self.file_stem(), OUTPUT_SUFFIX),
        }
    }

    /// Full path of the stamped file inside `dir`.
    pub fn output_path_in(&self, dir: impl AsRef<Path>) -> PathBuf {
        dir.as_ref().join(self.output_file_name())
    }
}

/// Builder for [`StampJob`].
#[derive(Debug, Clone)]
pub struct StampJobBuilder {
    job: StampJob,
}

impl StampJobBuilder {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.job.output_dir = Some(dir.into());
        self
    }

    pub fn stamp_url(mut self, url: impl Into<String>) -> Self {
        self.job.stamp_url = Some(url.into());
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.job.dpi = Some(dpi);
        self
    }

    pub fn location(mut self, x: f64, y: f64) -> Self {
        self.job.location = Location { x, y };
        self
    }

    /// Add one page to the target list.
    pub fn page(mut self, page: u32) -> Self {
        self.job.pages.push(page);
        self
    }

    /// Add several pages to the target list, keeping their order.
    pub fn pages(mut self, pages: impl IntoIterator<Item = u32>) -> Self {
        self.job.pages.extend(pages);
        self
    }

    /// Add one inclusive range. Endpoints may be given in either order.
    pub fn page_range(mut self, start: u32, end: u32) -> Self {
        self.job.page_ranges.push(PageRange::new(start, end));
        self
    }

    pub fn page_ranges(mut self, ranges: impl IntoIterator<Item = PageRange>) -> Self {
        self.job.page_ranges.extend(ranges);
        self
    }

    pub fn overwrite(mut self) -> Self {
        self.job.overwrite = true;
        self
    }

    pub fn skip_validation(mut self) -> Self {
        self.job.validate = false;
        self
    }

    pub fn stage_in_working_dir(mut self) -> Self {
        self.job.stage_inputs = true;
        self
    }

    /// Build the job, validating constraints.
    pub fn build(self) -> Result<StampJob, StampError> {
        let j = &self.job;
        if j.source.as_os_str().is_empty() {
            return Err(StampError::InvalidConfig("source path is empty".into()));
        }
        if j.overlay.as_os_str().is_empty() {
            return Err(StampError::InvalidConfig("overlay path is empty".into()));
        }
        if j.dpi == Some(0) {
            return Err(StampError::InvalidConfig("DPI must be ≥ 1".into()));
        }
        if matches!(j.stamp_url.as_deref(), Some(u) if u.trim().is_empty()) {
            return Err(StampError::InvalidConfig("stamp URL is empty".into()));
        }
        if let Some(r) = j.page_ranges.iter().find(|r| r.start == 0 || r.end == 0) {
            return Err(StampError::InvalidConfig(format!(
                "page range '{r}' contains page 0; pages are 1-indexed"
            )));
        }
        if !j.location.x.is_finite() || !j.location.y.is_finite() {
            return Err(StampError::InvalidConfig(format!(
                "location must be finite, got {}",
                j.location
            )));
        }
        Ok(self.job)
    }
}

// ── Value types ──────────────────────────────────────────────────────────

/// Placement offset of the overlay, rendered as `x,y` on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

impl FromStr for Location {
    type Err = StampError;

    /// Parse `"x,y"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s.split_once(',').ok_or_else(|| {
            StampError::InvalidConfig(format!("location '{s}' must look like x,y"))
        })?;
        let parse = |v: &str| {
            v.trim().parse::<f64>().map_err(|_| {
                StampError::InvalidConfig(format!("invalid location coordinate '{}'", v.trim()))
            })
        };
        Ok(Location {
            x: parse(x)?,
            y: parse(y)?,
        })
    }
}

/// An inclusive page range, 1-indexed.
///
/// The tool requires ascending endpoints; [`PageRange::new`] normalises so
/// `PageRange::new(8, 5)` and `PageRange::new(5, 8)` are the same range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    pub fn new(a: u32, b: u32) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    /// Ascending copy, for ranges built field-by-field.
    pub fn normalized(self) -> Self {
        Self::new(self.start, self.end)
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl FromStr for PageRange {
    type Err = StampError;

    /// Parse `"a-b"`, or a bare `"n"` as `n-n`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |v: &str| {
            v.trim()
                .parse::<u32>()
                .map_err(|_| StampError::InvalidConfig(format!("invalid page number '{}'", v.trim())))
        };
        match s.split_once('-') {
            Some((a, b)) => Ok(PageRange::new(parse(a)?, parse(b)?)),
            None => {
                let p = parse(s)?;
                Ok(PageRange::new(p, p))
            }
        }
    }
}

// ── Tool ─────────────────────────────────────────────────────────────────

/// The external stamping executable and the arguments that precede the
/// stamping flags (e.g. `java` + `-jar /opt/pdfstamp.jar`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampTool {
    pub program: PathBuf,
    pub leading_args: Vec<OsString>,
}

impl StampTool {
    /// A tool launched directly, with no leading arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Run `jar` with the given java launcher.
    pub fn java_jar(java: impl Into<PathBuf>, jar: impl Into<PathBuf>) -> Self {
        let jar: PathBuf = jar.into();
        Self {
            program: java.into(),
            leading_args: vec![OsString::from("-jar"), jar.into_os_string()],
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.leading_args.push(arg.into());
        self
    }

    /// Copy with relative paths made absolute, for running from another
    /// working directory.
    ///
    /// The program is anchored when it names a path (`./bin/stamp`) rather
    /// than a bare command looked up on `PATH`; leading arguments are
    /// anchored when they name an existing relative file (the jar).
    pub fn anchored(&self) -> Self {
        let program = if self.program.is_relative() && self.program.components().count() > 1 {
            std::path::absolute(&self.program).unwrap_or_else(|_| self.program.clone())
        } else {
            self.program.clone()
        };
        let leading_args = self
            .leading_args
            .iter()
            .map(|arg| {
                let p = Path::new(arg);
                if p.is_relative() && p.is_file() {
                    std::path::absolute(p)
                        .map(PathBuf::into_os_string)
                        .unwrap_or_else(|_| arg.clone())
                } else {
                    arg.clone()
                }
            })
            .collect();
        Self {
            program,
            leading_args,
        }
    }

    /// Find `pdfstamp.jar` and a java runtime on this machine.
    pub fn locate() -> Result<Self, StampError> {
        let jar = pdfstamp_locate::locate_jar()?;
        Ok(Self::java_jar(pdfstamp_locate::java_binary(), jar))
    }
}

// ── Runner configuration ─────────────────────────────────────────────────

/// How stamp jobs are executed.
///
/// # Example
/// ```rust
/// use pdfstamp::{StampConfig, StampTool};
///
/// let config = StampConfig::builder()
///     .tool(StampTool::java_jar("java", "/opt/pdfstamp/pdfstamp.jar"))
///     .timeout_secs(60)
///     .build()
///     .unwrap();
/// assert_eq!(config.timeout_secs, 60);
/// ```
#[derive(Clone)]
pub struct StampConfig {
    /// Stamping executable. `None` locates `java -jar pdfstamp.jar` at run time.
    pub tool: Option<StampTool>,

    /// Upper bound on the tool's run time in seconds. Default: 300.
    ///
    /// When it elapses the child process is killed and the job fails with
    /// [`StampError::Timeout`].
    pub timeout_secs: u64,

    /// Content-type sniffer used by input validation.
    pub detector: Arc<dyn ContentTypeDetector>,

    /// Optional lifecycle callback.
    pub progress_callback: Option<ProgressCallback>,

    /// Parent directory for staging directories. Default: the process's
    /// current working directory.
    pub staging_root: Option<PathBuf>,
}

impl Default for StampConfig {
    fn default() -> Self {
        Self {
            tool: None,
            timeout_secs: 300,
            detector: Arc::new(MagicBytesDetector),
            progress_callback: None,
            staging_root: None,
        }
    }
}

impl fmt::Debug for StampConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StampConfig")
            .field("tool", &self.tool)
            .field("timeout_secs", &self.timeout_secs)
            .field("detector", &"<dyn ContentTypeDetector>")
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn StampProgressCallback>"),
            )
            .field("staging_root", &self.staging_root)
            .finish()
    }
}

impl StampConfig {
    /// Create a new builder for `StampConfig`.
    pub fn builder() -> StampConfigBuilder {
        StampConfigBuilder {
            config: Self::default(),
        }
    }

    /// The configured tool, or the locally installed one.
    pub fn resolve_tool(&self) -> Result<StampTool, StampError> {
        match &self.tool {
            Some(tool) => Ok(tool.clone()),
            None => StampTool::locate(),
        }
    }
}

/// Builder for [`StampConfig`].
#[derive(Debug)]
pub struct StampConfigBuilder {
    config: StampConfig,
}

impl StampConfigBuilder {
    pub fn tool(mut self, tool: StampTool) -> Self {
        self.config.tool = Some(tool);
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn detector(mut self, detector: Arc<dyn ContentTypeDetector>) -> Self {
        self.config.detector = detector;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn staging_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.staging_root = Some(dir.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<StampConfig, StampError> {
        if self.config.timeout_secs == 0 {
            return Err(StampError::InvalidConfig("timeout must be ≥ 1 second".into()));
        }
        if let Some(ref tool) = self.config.tool {
            if tool.program.as_os_str().is_empty() {
                return Err(StampError::InvalidConfig("tool program is empty".into()));
            }
        }
        Ok(self.config)
    }
}
