//! # pdfstamp-locate
//!
//! Find the `pdfstamp.jar` stamping engine and a `java` runtime to launch it
//! with, so callers of the `pdfstamp` crate do not have to hard-code either.
//!
//! ## Search order
//!
//! [`locate_jar`] returns the first candidate that exists:
//!
//! 1. `PDFSTAMP_JAR` — explicit path to the jar.
//! 2. The directory holding the current executable.
//! 3. The current working directory.
//! 4. `PDFSTAMP_HOME`, or the platform data directory
//!    (`~/.local/share/pdfstamp/` on Linux, `~/Library/Application Support/pdfstamp/`
//!    on macOS, `%APPDATA%\pdfstamp\` on Windows).
//!
//! [`java_binary`] prefers `$JAVA_HOME/bin/java` and otherwise falls back to
//! a bare `java`, leaving resolution to the operating system's `PATH` search.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pdfstamp_locate::{java_binary, locate_jar};
//!
//! let jar = locate_jar().expect("pdfstamp.jar not installed");
//! let java = java_binary();
//! println!("{} -jar {}", java.display(), jar.display());
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// File name of the stamping engine.
pub const JAR_NAME: &str = "pdfstamp.jar";

/// Environment variable naming the jar explicitly.
pub const JAR_ENV: &str = "PDFSTAMP_JAR";

/// Environment variable naming a directory that contains the jar.
pub const HOME_ENV: &str = "PDFSTAMP_HOME";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by pdfstamp-locate.
#[derive(Error, Debug)]
pub enum LocateError {
    /// None of the candidate locations holds the jar.
    #[error("pdfstamp.jar not found; searched: {}", format_paths(.searched))]
    JarNotFound { searched: Vec<PathBuf> },
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ── Jar lookup ───────────────────────────────────────────────────────────────

/// Directory used when neither `PDFSTAMP_JAR` nor a sibling jar is present.
///
/// Override by setting `PDFSTAMP_HOME`.
pub fn data_dir() -> PathBuf {
    if let Ok(home) = std::env::var(HOME_ENV) {
        return PathBuf::from(home);
    }

    let base = dirs::data_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
        .unwrap_or_else(std::env::temp_dir);

    base.join("pdfstamp")
}

/// Every location [`locate_jar`] will probe, in order.
pub fn jar_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::with_capacity(4);

    if let Ok(explicit) = std::env::var(JAR_ENV) {
        candidates.push(PathBuf::from(explicit));
    }
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        candidates.push(exe_dir.join(JAR_NAME));
    }
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join(JAR_NAME));
    }
    candidates.push(data_dir().join(JAR_NAME));

    candidates
}

/// Returns the path of the first existing `pdfstamp.jar`.
pub fn locate_jar() -> Result<PathBuf, LocateError> {
    let candidates = jar_candidates();
    match candidates.iter().find(|p| p.is_file()) {
        Some(found) => Ok(found.clone()),
        None => Err(LocateError::JarNotFound {
            searched: candidates,
        }),
    }
}

// ── Java runtime ─────────────────────────────────────────────────────────────

#[cfg(windows)]
const JAVA_EXE: &str = "java.exe";
#[cfg(not(windows))]
const JAVA_EXE: &str = "java";

/// The java launcher to run the jar with.
///
/// Uses `$JAVA_HOME/bin/java` when that file exists, else plain `java`.
pub fn java_binary() -> PathBuf {
    if let Ok(java_home) = std::env::var("JAVA_HOME") {
        let candidate = PathBuf::from(java_home).join("bin").join(JAVA_EXE);
        if candidate.is_file() {
            return candidate;
        }
    }
    PathBuf::from(JAVA_EXE)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
