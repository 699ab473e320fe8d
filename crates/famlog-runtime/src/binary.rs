//! Inference server binary resolution.
//!
//! The supervisor launches an external `llama-server` compatible binary. This
//! module finds it and checks that it can actually be executed before any
//! model is loaded, so a missing install surfaces once at startup instead of
//! as a launch error on every `load`.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Executable looked up on `PATH` when no explicit binary is configured.
pub const DEFAULT_SERVER_BINARY: &str = "llama-server";

/// Errors that can occur when resolving or validating the server binary.
#[derive(Debug, Error)]
pub enum ServerBinaryError {
    /// The binary was not found at the configured location.
    #[error(
        "Model server binary not found at: {}\n\nSet FAMLOG_LLAMA_SERVER or pass --server-binary.",
        .path.display()
    )]
    NotFound { path: PathBuf },

    /// Nothing named `llama-server` is on `PATH`.
    #[error(
        "No {name} on PATH\n\nInstall llama.cpp or set FAMLOG_LLAMA_SERVER to the server binary."
    )]
    NotOnPath { name: String },

    /// The file exists but has no execute bit.
    #[error("Model server binary exists but is not executable: {}", .path.display())]
    NotExecutable { path: PathBuf },

    /// The file exists but its metadata could not be read.
    #[error("Permission denied accessing model server binary: {}", .path.display())]
    PermissionDenied { path: PathBuf },
}

/// Resolve the server binary.
///
/// Precedence:
/// 1. `explicit` (CLI flag or `FAMLOG_LLAMA_SERVER`, wired by the caller)
/// 2. `llama-server` on `PATH`
pub fn resolve_server_binary(explicit: Option<&Path>) -> Result<PathBuf, ServerBinaryError> {
    if let Some(path) = explicit {
        if !path.as_os_str().is_empty() {
            return validate_binary(path);
        }
    }

    let found = which::which(DEFAULT_SERVER_BINARY).map_err(|_| ServerBinaryError::NotOnPath {
        name: DEFAULT_SERVER_BINARY.to_string(),
    })?;
    validate_binary(&found)
}

/// Validate that a binary exists and is executable.
pub fn validate_binary(path: &Path) -> Result<PathBuf, ServerBinaryError> {
    if !path.exists() {
        return Err(ServerBinaryError::NotFound {
            path: path.to_path_buf(),
        });
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(path) {
            Ok(metadata) => {
                if metadata.permissions().mode() & 0o111 == 0 {
                    return Err(ServerBinaryError::NotExecutable {
                        path: path.to_path_buf(),
                    });
                }
            }
            Err(_) => {
                return Err(ServerBinaryError::PermissionDenied {
                    path: path.to_path_buf(),
                });
            }
        }
    }

    Ok(path.to_path_buf())
}
