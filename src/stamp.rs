//! Stamping entry points.
//!
//! [`stamp`] is the primary API: it validates, assembles, runs and
//! interprets one job and returns `Result<StampOutput, StampError>`.
//! [`render`] wraps it for callers that want the flat
//! [`StampOutcome`] value instead, and [`plan`] shows what would run
//! without running it.

use crate::config::{StampConfig, StampJob};
use crate::error::StampError;
use crate::output::{StampOutcome, StampOutput};
use crate::pipeline::command::{self, Invocation};
use crate::pipeline::{invoke, stage, validate};
use crate::progress::{NoopProgressCallback, StampProgressCallback};
use std::future::{pending, Future};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Stamp `job.overlay` onto `job.source`.
///
/// # Steps
/// 1. Resolve the output directory (explicit, else the source's directory).
/// 2. Validate inputs unless the job disables validation.
/// 3. Resolve a pre-existing output: fail, or delete it when overwriting.
/// 4. Assemble the argument list; stage inputs first if requested.
/// 5. Run the tool, bounded by `config.timeout_secs`.
/// 6. Remove the staging directory, whatever the tool did.
/// 7. Any tool output is an error; silence means success.
///
/// # Example
/// ```rust,no_run
/// use pdfstamp::{stamp, StampConfig, StampJob};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let job = StampJob::builder("report.pdf", "logo.png")
///     .output_dir("/tmp/out/")
///     .build()?;
/// let out = stamp(&job, &StampConfig::default()).await?;
/// println!("stamped: {}", out.output_path.display());
/// # Ok(())
/// # }
/// ```
pub async fn stamp(job: &StampJob, config: &StampConfig) -> Result<StampOutput, StampError> {
    stamp_with_cancel(job, config, pending()).await
}

/// Like [`stamp`], but gives up when `cancel` resolves first.
///
/// On cancellation the tool process is killed, staged inputs are removed
/// and [`StampError::Cancelled`] is returned.
pub async fn stamp_with_cancel<F>(
    job: &StampJob,
    config: &StampConfig,
    cancel: F,
) -> Result<StampOutput, StampError>
where
    F: Future<Output = ()>,
{
    let result = run_job(job, config, cancel).await;

    let cb = progress(config);
    match &result {
        Ok(_) => cb.on_complete(true, StampOutcome::SUCCESS_MESSAGE),
        Err(e) => {
            if e.is_validation() {
                info!("Rejected before launch: {}", e);
            } else {
                warn!("Stamp failed: {}", e);
            }
            cb.on_complete(false, &e.to_string());
        }
    }
    result
}

/// Run a job and fold every failure into a [`StampOutcome`].
pub async fn render(job: &StampJob, config: &StampConfig) -> StampOutcome {
    stamp(job, config).await.into()
}

/// Synchronous wrapper around [`stamp`].
///
/// Creates a temporary tokio runtime internally.
pub fn stamp_sync(job: &StampJob, config: &StampConfig) -> Result<StampOutput, StampError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| StampError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(stamp(job, config))
}

/// The invocation [`stamp`] would launch for `job`, without touching the
/// filesystem. Staged runs would substitute staged copies for the inputs.
pub fn plan(job: &StampJob, config: &StampConfig) -> Result<Invocation, StampError> {
    let tool = config.resolve_tool()?;
    let output_dir = job.effective_output_dir();
    Ok(Invocation::new(
        &tool,
        command::stamp_args(job, output_dir, &job.overlay, &job.source),
    ))
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn run_job<F>(job: &StampJob, config: &StampConfig, cancel: F) -> Result<StampOutput, StampError>
where
    F: Future<Output = ()>,
{
    let total_start = Instant::now();
    let cb = progress(config);
    info!(
        "Stamping {} with {}",
        job.source.display(),
        job.overlay.display()
    );

    // ── Step 1: Output directory ─────────────────────────────────────────
    let output_dir = job.effective_output_dir().to_path_buf();

    // ── Step 2: Validate ─────────────────────────────────────────────────
    if job.validate {
        validate::check_inputs(job, &output_dir, config.detector.as_ref())?;
    } else {
        debug!("Input validation disabled");
    }

    // Resolve the tool before touching any existing output, so a missing
    // tool never costs the caller their previous stamped file.
    let tool = config.resolve_tool()?;

    // ── Step 3: Output conflict ──────────────────────────────────────────
    let output_path = job.output_path_in(&output_dir);
    validate::prepare_output(&output_path, job.overwrite)?;
    cb.on_validated(&job.source, &output_path);

    // ── Step 4: Assemble (and stage) ─────────────────────────────────────
    let (invocation, staged) = if job.stage_inputs {
        let root = staging_root(config)?;
        let staged = stage::stage_inputs(&root, &job.source, &job.overlay).await?;
        cb.on_staged(staged.dir());

        // The tool runs inside the staging directory, so every path it is
        // given must not depend on our working directory.
        let output_dir = absolute(&output_dir)?;
        let invocation = Invocation::new(
            &tool.anchored(),
            command::stamp_args(job, &output_dir, staged.overlay(), staged.source()),
        )
        .in_dir(staged.dir());
        (invocation, Some(staged))
    } else {
        let invocation = Invocation::new(
            &tool,
            command::stamp_args(job, &output_dir, &job.overlay, &job.source),
        );
        (invocation, None)
    };
    debug!("Invocation: {}", invocation);

    // ── Step 5: Run ──────────────────────────────────────────────────────
    cb.on_tool_start(&invocation.command_line());
    let tool_start = Instant::now();
    let ran = invoke::run(&invocation, config.timeout_secs, cancel).await;
    let tool_duration_ms = tool_start.elapsed().as_millis() as u64;
    cb.on_tool_finish(tool_duration_ms);

    // ── Step 6: Clean up staging ─────────────────────────────────────────
    let was_staged = staged.is_some();
    if let Some(staged) = staged {
        staged.cleanup();
    }

    // ── Step 7: Interpret ────────────────────────────────────────────────
    ran?.into_result()?;

    let total_duration_ms = total_start.elapsed().as_millis() as u64;
    info!(
        "Stamped {} in {}ms",
        output_path.display(),
        total_duration_ms
    );

    Ok(StampOutput {
        output_path,
        staged: was_staged,
        tool_duration_ms,
        total_duration_ms,
    })
}

fn progress(config: &StampConfig) -> &dyn StampProgressCallback {
    match config.progress_callback {
        Some(ref cb) => cb.as_ref(),
        None => &NoopProgressCallback,
    }
}

fn staging_root(config: &StampConfig) -> Result<PathBuf, StampError> {
    match config.staging_root {
        Some(ref root) => Ok(root.clone()),
        None => std::env::current_dir().map_err(|e| StampError::StagingFailed {
            path: PathBuf::from("."),
            reason: format!("cannot determine working directory: {e}"),
        }),
    }
}

fn absolute(path: &Path) -> Result<PathBuf, StampError> {
    std::path::absolute(path).map_err(|e| {
        StampError::Internal(format!("cannot make '{}' absolute: {}", path.display(), e))
    })
}
