//! Where the finished archive is written.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, warn};

#[cfg(windows)]
use crate::constants::{WINDOWS_FALLBACK_DESTINATION, WINDOWS_PRIMARY_DESTINATION};

/// True if a file can be created in `dir`.
pub fn is_writable_dir(dir: &Path) -> bool {
    if !dir.is_dir() {
        return false;
    }
    tempfile::Builder::new()
        .prefix(".diag-probe-")
        .tempfile_in(dir)
        .is_ok()
}

/// Directories tried in order when no output directory is given.
pub fn default_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    #[cfg(windows)]
    {
        candidates.push(PathBuf::from(WINDOWS_PRIMARY_DESTINATION));
        candidates.push(PathBuf::from(WINDOWS_FALLBACK_DESTINATION));
    }
    candidates.push(std::env::temp_dir());
    candidates
}

/// Resolve the archive directory.
///
/// An explicit directory is created if needed and must be writable. Without
/// one, the first writable default candidate wins.
pub fn resolve_destination(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        fs::create_dir_all(dir)
            .context(format!("Failed to create output directory: {}", dir.display()))?;
        if !is_writable_dir(dir) {
            anyhow::bail!("Output directory is not writable: {}", dir.display());
        }
        return Ok(dir.to_path_buf());
    }

    for candidate in default_candidates() {
        if is_writable_dir(&candidate) {
            debug!("Using output directory {}", candidate.display());
            return Ok(candidate);
        }
        warn!("Output directory {} is not writable, trying next", candidate.display());
    }

    anyhow::bail!("No writable output directory found")
}
