//! CLI binary for pdfstamp.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `StampJob` / `StampConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdfstamp::{
    plan, stamp_with_cancel, Location, PageRange, ProgressCallback, StampConfig, StampError,
    StampJob, StampOutcome, StampProgressCallback, StampTool,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner shown while the stamping tool runs.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        Arc::new(Self { bar })
    }
}

impl StampProgressCallback for CliProgressCallback {
    fn on_validated(&self, source: &Path, output_path: &Path) {
        self.bar.set_message(format!(
            "{} → {}",
            source.display(),
            output_path.display()
        ));
    }

    fn on_staged(&self, staging_dir: &Path) {
        self.bar
            .println(dim(&format!("  staged inputs in {}", staging_dir.display())));
    }

    fn on_tool_start(&self, _command_line: &str) {
        self.bar.set_prefix("Stamping");
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }

    fn on_tool_finish(&self, _elapsed_ms: u64) {
        self.bar.finish_and_clear();
    }

    fn on_complete(&self, _success: bool, _message: &str) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Stamp every page, write report_stamped.pdf next to report.pdf
  pdfstamp report.pdf logo.png

  # Pages 1 and 3 plus 10 through 12, into another directory
  pdfstamp report.pdf logo.png -o /tmp/out -p 1,3 --range 10-12

  # Offset the stamp and replace a previous run's output
  pdfstamp report.pdf seal.svg -l 36,720 --overwrite

  # Show the command that would run, without running it
  pdfstamp report.pdf logo.png --print-command

  # Machine-readable result
  pdfstamp report.pdf logo.png --json

SUPPORTED OVERLAY FORMATS (detected by content, not extension):
  PNG, JPEG, GIF, BMP, ICO, TIFF, SVG

ENVIRONMENT VARIABLES:
  PDFSTAMP_JAR     Path to pdfstamp.jar
  PDFSTAMP_HOME    Directory searched for pdfstamp.jar
  PDFSTAMP_JAVA    Java launcher (default: $JAVA_HOME/bin/java, else java)
  JAVA_HOME        Java installation used when PDFSTAMP_JAVA is unset
  RUST_LOG         Log filter, overrides --verbose/--quiet
"#;

/// Stamp an image onto PDF pages.
#[derive(Parser, Debug)]
#[command(
    name = "pdfstamp",
    version,
    about = "Stamp an image onto PDF pages",
    long_about = "Stamp an image onto the pages of a PDF document using the pdfstamp engine. \
Inputs are checked by content before the engine runs; the stamped copy is written as \
<name>_stamped.<ext> in the output directory.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF document to stamp.
    source: PathBuf,

    /// Overlay image (PNG, JPEG, GIF, BMP, ICO, TIFF or SVG).
    image: PathBuf,

    /// Directory for the stamped file. Default: the source's directory.
    #[arg(short, long, env = "PDFSTAMP_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// DPI override for the overlay.
    #[arg(short, long, env = "PDFSTAMP_DPI",
          value_parser = clap::value_parser!(u32).range(1..))]
    dpi: Option<u32>,

    /// Alternate stamp source URL passed through to the engine.
    #[arg(short = 'u', long, env = "PDFSTAMP_URL")]
    stamp_url: Option<String>,

    /// Placement offset as x,y.
    #[arg(short, long, env = "PDFSTAMP_LOCATION", default_value = "0,0",
          allow_hyphen_values = true)]
    location: String,

    /// Page to stamp (repeatable, or comma-separated: -p 1,3,5).
    #[arg(short = 'p', long = "page", value_delimiter = ',')]
    pages: Vec<u32>,

    /// Inclusive page range to stamp, e.g. 5-8 (repeatable).
    #[arg(long = "range", value_name = "START-END")]
    ranges: Vec<String>,

    /// Replace an existing stamped file.
    #[arg(long, env = "PDFSTAMP_OVERWRITE")]
    overwrite: bool,

    /// Skip readability and content-type checks.
    #[arg(long, env = "PDFSTAMP_NO_VALIDATE")]
    no_validate: bool,

    /// Copy inputs into a staging directory before running the engine.
    #[arg(long, env = "PDFSTAMP_STAGE")]
    stage: bool,

    /// Java launcher used to run the engine.
    #[arg(long, env = "PDFSTAMP_JAVA")]
    java: Option<PathBuf>,

    /// Path to pdfstamp.jar.
    #[arg(long, env = "PDFSTAMP_JAR")]
    jar: Option<PathBuf>,

    /// Seconds to wait for the engine before killing it.
    #[arg(long, env = "PDFSTAMP_TIMEOUT", default_value_t = 300,
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Print the result as JSON ({"success", "message", "output"}).
    #[arg(long, env = "PDFSTAMP_JSON")]
    json: bool,

    /// Print the engine command line and exit without running it.
    #[arg(long, env = "PDFSTAMP_PRINT_COMMAND")]
    print_command: bool,

    /// Disable the spinner.
    #[arg(long, env = "PDFSTAMP_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFSTAMP_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFSTAMP_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Keep INFO logs out of the way of the spinner; it already says what
    // is happening.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.print_command;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress || cli.json {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build job + config ───────────────────────────────────────────────
    let job = build_job(&cli)?;

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn StampProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Dry run ──────────────────────────────────────────────────────────
    if cli.print_command {
        let invocation = plan(&job, &config).context("Failed to assemble command")?;
        println!("{invocation}");
        return Ok(());
    }

    // ── Run ──────────────────────────────────────────────────────────────
    let result = stamp_with_cancel(&job, &config, ctrl_c()).await;

    if cli.json {
        let outcome = StampOutcome::from(result);
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome).context("Failed to serialise result")?
        );
        if !outcome.success {
            std::process::exit(1);
        }
        return Ok(());
    }

    match result {
        Ok(output) => {
            println!("{}", output.output_path.display());
            if !cli.quiet {
                eprintln!(
                    "{}  {}  {}",
                    green("✔"),
                    bold(&output.output_path.display().to_string()),
                    dim(&format!("{}ms", output.total_duration_ms)),
                );
            }
            Ok(())
        }
        Err(e) => {
            if !cli.quiet {
                eprintln!("{}  {}", red("✘"), red(&first_line(&e)));
            }
            Err(e).context("Stamping failed")
        }
    }
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed.
async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn first_line(e: &StampError) -> String {
    e.to_string().lines().next().unwrap_or_default().to_string()
}

/// Map CLI args to `StampJob`.
fn build_job(cli: &Cli) -> Result<StampJob> {
    let location: Location = cli
        .location
        .parse()
        .with_context(|| format!("Invalid --location '{}'", cli.location))?;
    let ranges = cli
        .ranges
        .iter()
        .map(|r| {
            r.parse::<PageRange>()
                .with_context(|| format!("Invalid --range '{r}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut builder = StampJob::builder(&cli.source, &cli.image)
        .location(location.x, location.y)
        .pages(cli.pages.iter().copied())
        .page_ranges(ranges);

    if let Some(ref dir) = cli.output_dir {
        builder = builder.output_dir(dir);
    }
    if let Some(dpi) = cli.dpi {
        builder = builder.dpi(dpi);
    }
    if let Some(ref url) = cli.stamp_url {
        builder = builder.stamp_url(url);
    }
    if cli.overwrite {
        builder = builder.overwrite();
    }
    if cli.no_validate {
        builder = builder.skip_validation();
    }
    if cli.stage {
        builder = builder.stage_in_working_dir();
    }

    builder.build().context("Invalid stamp job")
}

/// Map CLI args to `StampConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<StampConfig> {
    let mut builder = StampConfig::builder().timeout_secs(cli.timeout);

    // Either flag pins the tool; otherwise the library locates it per run.
    if cli.java.is_some() || cli.jar.is_some() {
        let java = cli
            .java
            .clone()
            .unwrap_or_else(pdfstamp_locate::java_binary);
        let jar = match cli.jar {
            Some(ref jar) => jar.clone(),
            None => pdfstamp_locate::locate_jar().context("Failed to locate pdfstamp.jar")?,
        };
        builder = builder.tool(StampTool::java_jar(java, jar));
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
