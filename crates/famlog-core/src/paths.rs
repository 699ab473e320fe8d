//! Log directory resolution.
//!
//! Per-port server logs live under a single directory. Resolution order:
//! 1. An explicit path from the caller (CLI flag or `FAMLOG_LOG_DIR`)
//! 2. `<data-local-dir>/famlog/logs`
//! 3. `./logs` when no data directory can be determined

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during log directory resolution.
#[derive(Debug, Error)]
pub enum PathError {
    /// An empty path was provided.
    #[error("Path cannot be empty")]
    EmptyPath,

    /// A path was expected to be a directory but was not.
    #[error("{} exists but is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// Failed to create a directory.
    #[error("Failed to create directory {}: {reason}", .path.display())]
    CreateFailed { path: PathBuf, reason: String },
}

/// Default log directory, without touching the filesystem.
pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir().map_or_else(
        || PathBuf::from("logs"),
        |data| data.join("famlog").join("logs"),
    )
}

/// Resolve and create the log directory.
pub fn resolve_log_dir(explicit: Option<&Path>) -> Result<PathBuf, PathError> {
    let dir = match explicit {
        Some(path) if path.as_os_str().is_empty() => return Err(PathError::EmptyPath),
        Some(path) => path.to_path_buf(),
        None => default_log_dir(),
    };

    if dir.exists() {
        if !dir.is_dir() {
            return Err(PathError::NotADirectory(dir));
        }
        return Ok(dir);
    }

    fs::create_dir_all(&dir).map_err(|e| PathError::CreateFailed {
        path: dir.clone(),
        reason: e.to_string(),
    })?;
    Ok(dir)
}
