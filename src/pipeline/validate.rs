//! Precondition checks run before anything external is launched.
//!
//! The order is fixed and each check short-circuits: source readable,
//! overlay readable, output directory writable, source is a PDF, overlay is
//! a supported image. Only then is the output path checked for a conflict.

use crate::config::StampJob;
use crate::error::StampError;
use crate::pipeline::detect::{is_supported_overlay, ContentTypeDetector, PDF_MIME};
use std::path::Path;
use tracing::{debug, info};

/// Validate a job's inputs against `output_dir`.
pub fn check_inputs(
    job: &StampJob,
    output_dir: &Path,
    detector: &dyn ContentTypeDetector,
) -> Result<(), StampError> {
    if !is_readable_file(&job.source) {
        return Err(StampError::SourceUnreadable {
            path: job.source.clone(),
        });
    }
    if !is_readable_file(&job.overlay) {
        return Err(StampError::OverlayUnreadable {
            path: job.overlay.clone(),
        });
    }
    if !is_writable_dir(output_dir) {
        return Err(StampError::OutputDirNotWritable {
            path: output_dir.to_path_buf(),
        });
    }

    let source_type = detector
        .detect(&job.source)
        .map_err(|_| StampError::SourceUnreadable {
            path: job.source.clone(),
        })?;
    if source_type != PDF_MIME {
        return Err(StampError::UnsupportedSource {
            path: job.source.clone(),
            detected: source_type,
        });
    }

    let overlay_type = detector
        .detect(&job.overlay)
        .map_err(|_| StampError::OverlayUnreadable {
            path: job.overlay.clone(),
        })?;
    if !is_supported_overlay(&overlay_type) {
        return Err(StampError::UnsupportedOverlay {
            path: job.overlay.clone(),
            detected: overlay_type,
        });
    }

    debug!(
        "Validated {} ({}) with overlay {} ({})",
        job.source.display(),
        source_type,
        job.overlay.display(),
        overlay_type
    );
    Ok(())
}

/// Resolve a pre-existing output file: fail, or delete it when `overwrite`.
pub fn prepare_output(output_path: &Path, overwrite: bool) -> Result<(), StampError> {
    // symlink_metadata also sees dangling links, which the tool would trip over.
    if std::fs::symlink_metadata(output_path).is_err() {
        return Ok(());
    }
    if !overwrite {
        return Err(StampError::OutputExists {
            path: output_path.to_path_buf(),
        });
    }

    std::fs::remove_file(output_path).map_err(|e| StampError::RemoveExistingFailed {
        path: output_path.to_path_buf(),
        source: e,
    })?;
    info!("Removed existing output: {}", output_path.display());
    Ok(())
}

/// A regular file the process can open for reading.
fn is_readable_file(path: &Path) -> bool {
    match std::fs::File::open(path) {
        Ok(f) => f.metadata().map(|m| m.is_file()).unwrap_or(false),
        Err(_) => false,
    }
}

/// A directory the process can create files in.
///
/// Permission bits alone do not answer this (ACLs, read-only mounts, running
/// as root), so create an anonymous probe file; it is unlinked on drop.
fn is_writable_dir(path: &Path) -> bool {
    path.is_dir() && tempfile::tempfile_in(path).is_ok()
}
