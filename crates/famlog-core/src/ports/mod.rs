//! Port definitions (trait abstractions) between the supervisor and its callers.
//!
//! # Design Rules
//!
//! - No process handles, signals or HTTP clients in any signature
//! - Intent-based methods only (load this model on this port)
//! - Every failure is a [`SupervisorError`]; stopping never fails

pub mod readiness;
pub mod supervisor;

use std::path::PathBuf;
use thiserror::Error;

pub use readiness::ReadinessOutcome;
pub use supervisor::{ModelSupervisorPort, StopOutcome};

/// Errors surfaced by the lifecycle controller.
///
/// Every variant leaves the registry consistent: either the port has no
/// entry or it holds a cleanly tracked live process, so `load` can always be
/// retried without manual cleanup.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The model artifact does not exist. Nothing was spawned.
    #[error("Model file not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    /// The multimodal projector artifact does not exist. Nothing was spawned.
    #[error("Projector file not found: {}", .0.display())]
    ProjectorNotFound(PathBuf),

    /// The per-port log file could not be opened. Nothing was spawned.
    #[error("Failed to open server log {}: {source}", .path.display())]
    LogSink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The OS refused to create the server process.
    #[error("Failed to launch model server on port {port}: {source}")]
    Launch {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// The server stayed alive but never reported ready. It has been unloaded.
    #[error("Model server on port {port} was not ready within {}s", .timeout.as_secs())]
    ReadinessTimeout {
        port: u16,
        timeout: std::time::Duration,
    },

    /// The server exited before reporting ready.
    #[error(
        "Model server on port {port} exited during startup ({}); see {}",
        describe_exit(.exit_code),
        .log_path.display()
    )]
    Crashed {
        port: u16,
        exit_code: Option<i32>,
        log_path: PathBuf,
    },

    /// Another caller occupied the port while this load was in flight.
    #[error("Port {0} was claimed by a concurrent load")]
    PortConflict(u16),

    /// The readiness HTTP client could not be built.
    #[error("Readiness probe unavailable: {0}")]
    Probe(String),
}

impl SupervisorError {
    /// True for errors raised before any process was spawned.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::ModelNotFound(_) | Self::ProjectorNotFound(_))
    }

    /// Log artifact worth showing to an operator, if any.
    #[must_use]
    pub fn log_path(&self) -> Option<&std::path::Path> {
        match self {
            Self::Crashed { log_path, .. } | Self::LogSink { path: log_path, .. } => {
                Some(log_path.as_path())
            }
            _ => None,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    code.map_or_else(
        || "terminated by signal".to_string(),
        |c| format!("exit code {c}"),
    )
}

/// Result alias for lifecycle operations.
pub type SupervisorResult<T> = Result<T, SupervisorError>;
