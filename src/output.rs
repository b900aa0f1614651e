//! Result types returned by the stamping entry points.

use crate::error::StampError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Details of a successful stamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampOutput {
    /// Where the tool wrote the stamped document.
    pub output_path: PathBuf,
    /// Whether inputs were staged before the tool ran.
    pub staged: bool,
    /// Wall-clock time spent in the tool.
    pub tool_duration_ms: u64,
    /// Wall-clock time for the whole job.
    pub total_duration_ms: u64,
}

/// Uniform success/failure value for callers that want a flat result
/// instead of a `Result`.
///
/// Serialises as `{"success": bool, "message": "...", "output": "path" | null}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampOutcome {
    pub success: bool,
    pub message: String,
    pub output: Option<PathBuf>,
}

impl StampOutcome {
    pub const SUCCESS_MESSAGE: &'static str = "Success";

    pub fn success(output: PathBuf) -> Self {
        Self {
            success: true,
            message: Self::SUCCESS_MESSAGE.to_string(),
            output: Some(output),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            output: None,
        }
    }
}

impl From<Result<StampOutput, StampError>> for StampOutcome {
    fn from(result: Result<StampOutput, StampError>) -> Self {
        match result {
            Ok(out) => StampOutcome::success(out.output_path),
            Err(e) => StampOutcome::failure(e.to_string()),
        }
    }
}
