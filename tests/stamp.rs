//! Integration tests for the stamping pipeline.
//!
//! The real engine is a Java program; these tests stand in a `sh -c` script
//! that behaves the way the engine does (silent on success, prints on
//! failure) and records what it was given. Unix only.

#![cfg(unix)]

use pdfstamp::{
    render, stamp, stamp_with_cancel, ContentTypeDetector, StampConfig, StampError, StampJob,
    StampProgressCallback, StampTool,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

const PDF_BYTES: &[u8] = b"%PDF-1.4\n1 0 obj << /Type /Catalog >> endobj\n%%EOF\n";
const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01\x08\x06\0\0\0";

/// A scratch directory holding `report.pdf` and `logo.png`.
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("report.pdf"), PDF_BYTES).unwrap();
        std::fs::write(dir.path().join("logo.png"), PNG_BYTES).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn source(&self) -> PathBuf {
        self.path("report.pdf")
    }

    fn overlay(&self) -> PathBuf {
        self.path("logo.png")
    }

    fn output(&self) -> PathBuf {
        self.path("report_stamped.pdf")
    }

    /// File the fake tool writes its argument list into, one per line.
    fn args_log(&self) -> PathBuf {
        self.path("args.log")
    }

    fn recorded_args(&self) -> Vec<String> {
        std::fs::read_to_string(self.args_log())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

/// A fake engine running `script`; `$@` holds the stamping flags.
fn fake_tool(script: &str) -> StampTool {
    StampTool::new("sh").arg("-c").arg(script).arg("pdfstamp")
}

/// A well-behaved engine: records its args, writes the output, prints nothing.
fn recording_tool(fx: &Fixture) -> StampTool {
    fake_tool(&format!(
        "printf '%s\\n' \"$@\" > '{}'; : > '{}'",
        fx.args_log().display(),
        fx.output().display()
    ))
}

fn config_with(tool: StampTool) -> StampConfig {
    StampConfig::builder().tool(tool).timeout_secs(10).build().unwrap()
}

fn is_empty_dir(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

// ── Success paths ────────────────────────────────────────────────────────────

#[tokio::test]
async fn stamps_into_source_directory_by_default() {
    let fx = Fixture::new();
    let job = StampJob::builder(fx.source(), fx.overlay()).build().unwrap();

    let out = stamp(&job, &config_with(recording_tool(&fx))).await.unwrap();

    assert_eq!(out.output_path, fx.output());
    assert!(out.output_path.exists());
    assert!(!out.staged);
    assert_eq!(
        fx.recorded_args(),
        vec![
            "-o".to_string(),
            fx.dir.path().display().to_string(),
            "-l".into(),
            "0,0".into(),
            "-i".into(),
            fx.overlay().display().to_string(),
            fx.source().display().to_string(),
        ]
    );
}

#[tokio::test]
async fn explicit_output_dir_is_used() {
    let fx = Fixture::new();
    let out_dir = fx.path("out");
    std::fs::create_dir(&out_dir).unwrap();
    let expected = out_dir.join("report_stamped.pdf");

    let job = StampJob::builder(fx.source(), fx.overlay())
        .output_dir(&out_dir)
        .build()
        .unwrap();
    let tool = fake_tool(&format!(": > '{}'", expected.display()));

    let out = stamp(&job, &config_with(tool)).await.unwrap();
    assert_eq!(out.output_path, expected);
    assert!(expected.exists());
}

#[tokio::test]
async fn pages_ranges_and_options_reach_the_tool() {
    let fx = Fixture::new();
    let job = StampJob::builder(fx.source(), fx.overlay())
        .dpi(150)
        .stamp_url("https://example.org/seal.png")
        .location(36.0, -12.5)
        .pages([3, 0, 7])
        .page_range(8, 5)
        .build()
        .unwrap();

    stamp(&job, &config_with(recording_tool(&fx))).await.unwrap();

    let args = fx.recorded_args();
    let joined = args.join(" ");
    assert!(joined.starts_with("-d 150 -u https://example.org/seal.png -o "), "{joined}");
    assert!(joined.contains(" -p 3 -p 7 -pp 5-8 -l 36,-12.5 -i "), "{joined}");
    assert_eq!(args.iter().filter(|a| *a == "-p").count(), 2);
}

#[tokio::test]
async fn render_reports_success() {
    let fx = Fixture::new();
    let job = StampJob::builder(fx.source(), fx.overlay()).build().unwrap();

    let outcome = render(&job, &config_with(recording_tool(&fx))).await;
    assert!(outcome.success);
    assert_eq!(outcome.message, "Success");
    assert_eq!(outcome.output, Some(fx.output()));
}

#[tokio::test]
async fn skip_validation_lets_the_tool_decide() {
    let fx = Fixture::new();
    std::fs::write(fx.source(), "not really a pdf").unwrap();
    let job = StampJob::builder(fx.source(), fx.overlay())
        .skip_validation()
        .build()
        .unwrap();

    let out = stamp(&job, &config_with(recording_tool(&fx))).await.unwrap();
    assert!(out.output_path.exists());
}

// ── Validation ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn text_file_named_pdf_is_rejected_before_launch() {
    let fx = Fixture::new();
    std::fs::write(fx.source(), "hello, I am plain text").unwrap();
    let job = StampJob::builder(fx.source(), fx.overlay()).build().unwrap();

    let err = stamp(&job, &config_with(recording_tool(&fx))).await.unwrap_err();

    match &err {
        StampError::UnsupportedSource { detected, .. } => assert_eq!(detected, "text/plain"),
        other => panic!("expected UnsupportedSource, got {other:?}"),
    }
    assert!(err.to_string().starts_with("Supported file format is only PDF"));
    assert!(err.is_validation());
    assert!(!fx.args_log().exists(), "tool must not run");
    assert!(!fx.output().exists());
}

#[tokio::test]
async fn unsupported_overlay_is_rejected() {
    let fx = Fixture::new();
    std::fs::write(fx.overlay(), PDF_BYTES).unwrap();
    let job = StampJob::builder(fx.source(), fx.overlay()).build().unwrap();

    let err = stamp(&job, &config_with(recording_tool(&fx))).await.unwrap_err();
    assert!(
        matches!(err, StampError::UnsupportedOverlay { ref detected, .. } if detected == "application/pdf"),
        "{err:?}"
    );
    assert!(!fx.args_log().exists());
}

#[tokio::test]
async fn missing_overlay_is_reported_after_source() {
    let fx = Fixture::new();
    let job = StampJob::builder(fx.source(), fx.path("nope.png")).build().unwrap();

    let outcome = render(&job, &config_with(recording_tool(&fx))).await;
    assert!(!outcome.success);
    assert!(outcome.message.starts_with("Image is not found nor readable"), "{}", outcome.message);
}

#[tokio::test]
async fn missing_output_dir_is_reported() {
    let fx = Fixture::new();
    let job = StampJob::builder(fx.source(), fx.overlay())
        .output_dir(fx.path("does/not/exist"))
        .build()
        .unwrap();

    let err = stamp(&job, &config_with(recording_tool(&fx))).await.unwrap_err();
    assert!(matches!(err, StampError::OutputDirNotWritable { .. }), "{err:?}");
}

struct AlwaysText;

impl ContentTypeDetector for AlwaysText {
    fn detect(&self, _path: &Path) -> std::io::Result<String> {
        Ok("text/plain".to_string())
    }
}

#[tokio::test]
async fn injected_detector_is_consulted() {
    let fx = Fixture::new();
    let job = StampJob::builder(fx.source(), fx.overlay()).build().unwrap();
    let config = StampConfig::builder()
        .tool(recording_tool(&fx))
        .detector(Arc::new(AlwaysText))
        .build()
        .unwrap();

    let err = stamp(&job, &config).await.unwrap_err();
    assert!(matches!(err, StampError::UnsupportedSource { .. }), "{err:?}");
}

// ── Existing output ──────────────────────────────────────────────────────────

#[tokio::test]
async fn existing_output_is_kept_without_overwrite() {
    let fx = Fixture::new();
    std::fs::write(fx.output(), "previous run").unwrap();
    let job = StampJob::builder(fx.source(), fx.overlay()).build().unwrap();

    let err = stamp(&job, &config_with(recording_tool(&fx))).await.unwrap_err();

    assert!(matches!(err, StampError::OutputExists { .. }), "{err:?}");
    assert!(!err.is_validation());
    assert!(err.to_string().starts_with("Stamped file already exists"));
    assert_eq!(std::fs::read_to_string(fx.output()).unwrap(), "previous run");
    assert!(!fx.args_log().exists());
}

#[tokio::test]
async fn overwrite_removes_output_before_launch() {
    let fx = Fixture::new();
    std::fs::write(fx.output(), "previous run").unwrap();
    let job = StampJob::builder(fx.source(), fx.overlay())
        .overwrite()
        .build()
        .unwrap();
    let out = fx.output().display().to_string();
    let tool = fake_tool(&format!(
        "if [ -e '{out}' ]; then echo 'output still present'; fi; echo fresh > '{out}'"
    ));

    stamp(&job, &config_with(tool)).await.unwrap();
    assert_eq!(std::fs::read_to_string(fx.output()).unwrap(), "fresh\n");
}

// ── Tool failures ────────────────────────────────────────────────────────────

#[tokio::test]
async fn tool_output_becomes_the_error_message() {
    let fx = Fixture::new();
    let job = StampJob::builder(fx.source(), fx.overlay()).build().unwrap();
    let tool = fake_tool("echo 'Exception: bad page'; echo 'at Stamper.main' >&2");

    let outcome = render(&job, &config_with(tool)).await;
    assert!(!outcome.success);
    assert_eq!(outcome.message, "Exception: bad page at Stamper.main");
    assert!(outcome.output.is_none());
}

#[tokio::test]
async fn blank_tool_output_is_a_failure() {
    let fx = Fixture::new();
    let job = StampJob::builder(fx.source(), fx.overlay()).build().unwrap();

    let outcome = render(&job, &config_with(fake_tool("echo; echo"))).await;
    assert!(!outcome.success);
    assert_ne!(outcome.message, "Success");
    assert!(outcome.output.is_none());
}

#[tokio::test]
async fn html_overlay_with_inline_svg_is_rejected() {
    let fx = Fixture::new();
    std::fs::write(
        fx.overlay(),
        "<!DOCTYPE html><html><body><svg width=\"8\" height=\"8\"></svg></body></html>",
    )
    .unwrap();
    let job = StampJob::builder(fx.source(), fx.overlay()).build().unwrap();

    let err = stamp(&job, &config_with(recording_tool(&fx))).await.unwrap_err();
    assert!(matches!(err, StampError::UnsupportedOverlay { .. }), "{err:?}");
    assert!(!fx.args_log().exists());
}

#[tokio::test]
async fn text_overlay_starting_with_bm_is_rejected() {
    let fx = Fixture::new();
    std::fs::write(fx.overlay(), "BMI chart notes for Q3\n").unwrap();
    let job = StampJob::builder(fx.source(), fx.overlay()).build().unwrap();

    let err = stamp(&job, &config_with(recording_tool(&fx))).await.unwrap_err();
    assert!(
        matches!(err, StampError::UnsupportedOverlay { ref detected, .. } if detected == "text/plain"),
        "{err:?}"
    );
}

#[tokio::test]
async fn silent_nonzero_exit_is_a_failure() {
    let fx = Fixture::new();
    let job = StampJob::builder(fx.source(), fx.overlay()).build().unwrap();

    let err = stamp(&job, &config_with(fake_tool("exit 3"))).await.unwrap_err();
    assert!(matches!(err, StampError::ToolFailed { code: Some(3) }), "{err:?}");
}

#[tokio::test]
async fn cancellation_kills_the_tool() {
    let fx = Fixture::new();
    let job = StampJob::builder(fx.source(), fx.overlay()).build().unwrap();
    let tool = fake_tool(&format!("sleep 10; : > '{}'", fx.output().display()));

    let err = stamp_with_cancel(
        &job,
        &config_with(tool),
        tokio::time::sleep(Duration::from_millis(200)),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, StampError::Cancelled), "{err:?}");
    assert!(!fx.output().exists());
}

// ── Staging ──────────────────────────────────────────────────────────────────

fn staged_config(tool: StampTool, root: &Path) -> StampConfig {
    StampConfig::builder()
        .tool(tool)
        .timeout_secs(10)
        .staging_root(root)
        .build()
        .unwrap()
}

#[tokio::test]
async fn staged_run_uses_bare_names_in_private_dir() {
    let fx = Fixture::new();
    let root = tempfile::tempdir().unwrap();
    let job = StampJob::builder(fx.source(), fx.overlay())
        .stage_in_working_dir()
        .build()
        .unwrap();
    let tool = fake_tool(&format!(
        "[ -f report.pdf ] && [ -f logo.png ] || echo 'inputs not staged'; \
         for a; do last=$a; done; \
         [ \"$last\" = report.pdf ] || echo \"unexpected source $last\"; \
         case \"$PWD\" in */.pdfstamp-stage-*) ;; *) echo \"wrong dir $PWD\";; esac; \
         : > '{}'",
        fx.output().display()
    ));

    let out = stamp(&job, &staged_config(tool, root.path())).await.unwrap();

    assert!(out.staged);
    assert_eq!(out.output_path, fx.output());
    assert!(fx.output().exists());
    assert!(is_empty_dir(root.path()), "staging directory left behind");
}

#[tokio::test]
async fn staging_is_removed_when_the_tool_fails() {
    let fx = Fixture::new();
    let root = tempfile::tempdir().unwrap();
    let job = StampJob::builder(fx.source(), fx.overlay())
        .stage_in_working_dir()
        .build()
        .unwrap();

    let err = stamp(&job, &staged_config(fake_tool("echo boom; exit 1"), root.path()))
        .await
        .unwrap_err();

    assert!(matches!(err, StampError::ToolReported(ref m) if m == "boom"), "{err:?}");
    assert!(is_empty_dir(root.path()));
}

#[tokio::test]
async fn staging_rejects_colliding_names() {
    let fx = Fixture::new();
    let root = tempfile::tempdir().unwrap();
    let other = fx.path("images");
    std::fs::create_dir(&other).unwrap();
    std::fs::write(other.join("report.pdf"), PNG_BYTES).unwrap();

    let job = StampJob::builder(fx.source(), other.join("report.pdf"))
        .stage_in_working_dir()
        .build()
        .unwrap();

    let err = stamp(&job, &staged_config(recording_tool(&fx), root.path()))
        .await
        .unwrap_err();
    assert!(matches!(err, StampError::StagingFailed { .. }), "{err:?}");
    assert!(is_empty_dir(root.path()));
}

// ── Progress ─────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Recorder(Mutex<Vec<String>>);

impl StampProgressCallback for Recorder {
    fn on_validated(&self, _source: &Path, _output_path: &Path) {
        self.0.lock().unwrap().push("validated".into());
    }
    fn on_staged(&self, _staging_dir: &Path) {
        self.0.lock().unwrap().push("staged".into());
    }
    fn on_tool_start(&self, _command_line: &str) {
        self.0.lock().unwrap().push("start".into());
    }
    fn on_tool_finish(&self, _elapsed_ms: u64) {
        self.0.lock().unwrap().push("finish".into());
    }
    fn on_complete(&self, success: bool, message: &str) {
        self.0.lock().unwrap().push(format!("complete {success} {message}"));
    }
}

#[tokio::test]
async fn progress_events_arrive_in_order() {
    let fx = Fixture::new();
    let root = tempfile::tempdir().unwrap();
    let recorder = Arc::new(Recorder::default());
    let job = StampJob::builder(fx.source(), fx.overlay())
        .stage_in_working_dir()
        .build()
        .unwrap();
    let config = StampConfig::builder()
        .tool(fake_tool(&format!(": > '{}'", fx.output().display())))
        .staging_root(root.path())
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    stamp(&job, &config).await.unwrap();

    assert_eq!(
        *recorder.0.lock().unwrap(),
        vec!["validated", "staged", "start", "finish", "complete true Success"]
    );
}

#[tokio::test]
async fn progress_sees_validation_failures() {
    let fx = Fixture::new();
    let recorder = Arc::new(Recorder::default());
    let job = StampJob::builder(fx.path("missing.pdf"), fx.overlay())
        .build()
        .unwrap();
    let config = StampConfig::builder()
        .tool(recording_tool(&fx))
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    assert!(stamp(&job, &config).await.is_err());

    let events = recorder.0.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert!(events[0].starts_with("complete false PDF is not found nor readable"));
}
