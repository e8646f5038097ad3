//! Job directory enumeration.

use std::path::{Path, PathBuf};

use super::error::CheckerError;

/// List the immediate subdirectories of `root` as absolute paths, sorted by name.
///
/// Non-directory entries (including symlinks) are skipped.
///
/// # Errors
///
/// Returns `CheckerError::Enumeration` if `root` or any entry cannot be read.
/// No partial listing is ever returned.
pub fn enumerate_jobs(root: &Path) -> Result<Vec<PathBuf>, CheckerError> {
    let wrap = |source| CheckerError::Enumeration {
        path: root.to_path_buf(),
        source,
    };

    let root_abs = std::path::absolute(root).map_err(wrap)?;
    let mut jobs = Vec::new();
    for entry in std::fs::read_dir(&root_abs).map_err(wrap)? {
        let entry = entry.map_err(wrap)?;
        if entry.file_type().map_err(wrap)?.is_dir() {
            jobs.push(root_abs.join(entry.file_name()));
        }
    }
    jobs.sort();

    tracing::info!(root = %root_abs.display(), count = jobs.len(), "found jobs");
    Ok(jobs)
}
