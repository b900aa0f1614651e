//! Working-directory staging.
//!
//! Some builds of the stamping tool mishandle long, relative-to-elsewhere or
//! non-ASCII paths. Staging copies both inputs into a fresh directory
//! beneath the staging root and runs the tool *from* that directory with
//! bare file names.
//!
//! Each run gets its own `.pdfstamp-stage-XXXXXX` directory, so concurrent
//! jobs staged from the same working directory never see each other's
//! copies. The directory is a [`TempDir`]: [`StagedInputs::cleanup`] removes
//! it explicitly, and dropping it (early return, panic) removes it too.

use crate::error::StampError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

const STAGE_PREFIX: &str = ".pdfstamp-stage-";

/// Inputs copied into a private staging directory.
#[derive(Debug)]
pub struct StagedInputs {
    dir: TempDir,
    source_name: PathBuf,
    overlay_name: PathBuf,
}

impl StagedInputs {
    /// The staging directory; the tool runs with this as its working directory.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Source file name relative to [`Self::dir`].
    pub fn source(&self) -> &Path {
        &self.source_name
    }

    /// Overlay file name relative to [`Self::dir`].
    pub fn overlay(&self) -> &Path {
        &self.overlay_name
    }

    /// Remove the staging directory and everything in it.
    pub fn cleanup(self) {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => debug!("Removed staging directory {}", path.display()),
            Err(e) => warn!("Failed to remove staging directory {}: {}", path.display(), e),
        }
    }
}

/// Copy `source` and `overlay` into a new staging directory under `root`.
pub async fn stage_inputs(root: &Path, source: &Path, overlay: &Path) -> Result<StagedInputs, StampError> {
    let source_name = base_name(source)?;
    let overlay_name = base_name(overlay)?;
    if source_name == overlay_name {
        return Err(StampError::StagingFailed {
            path: overlay.to_path_buf(),
            reason: format!(
                "source and overlay share the file name '{}'",
                source_name.display()
            ),
        });
    }

    let dir = tempfile::Builder::new()
        .prefix(STAGE_PREFIX)
        .tempdir_in(root)
        .map_err(|e| StampError::StagingFailed {
            path: root.to_path_buf(),
            reason: format!("cannot create staging directory: {e}"),
        })?;

    copy_into(source, &dir.path().join(&source_name)).await?;
    copy_into(overlay, &dir.path().join(&overlay_name)).await?;
    debug!(
        "Staged {} and {} into {}",
        source.display(),
        overlay.display(),
        dir.path().display()
    );

    Ok(StagedInputs {
        dir,
        source_name,
        overlay_name,
    })
}

async fn copy_into(from: &Path, to: &Path) -> Result<(), StampError> {
    tokio::fs::copy(from, to)
        .await
        .map(|_| ())
        .map_err(|e| StampError::StagingFailed {
            path: from.to_path_buf(),
            reason: e.to_string(),
        })
}

fn base_name(path: &Path) -> Result<PathBuf, StampError> {
    path.file_name()
        .map(PathBuf::from)
        .ok_or_else(|| StampError::StagingFailed {
            path: path.to_path_buf(),
            reason: "path has no file name".into(),
        })
}
