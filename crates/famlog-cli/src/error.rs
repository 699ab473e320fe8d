//! CLI-specific error types and mappings.
//!
//! Maps supervisor, settings and path errors to exit codes and user-facing
//! messages.

use famlog_core::{PathError, SettingsError, SupervisorError};
use famlog_runtime::ServerBinaryError;
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Argument or artifact path error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (log directory, settings file, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The model server failed to launch or crashed.
    #[error("Process error: {0}")]
    Process(String),

    /// The model server is not answering its readiness endpoint.
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// Ctrl-C or SIGTERM arrived before the command finished.
    #[error("Interrupted")]
    Interrupted,
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 0: Success
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 64-78: Reserved for specific error categories (see sysexits.h)
    /// - 130: Interrupted (128 + SIGINT)
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Arguments(_) => 2,    // EX_USAGE
            Self::Unavailable(_) => 69, // EX_UNAVAILABLE
            Self::Process(_) => 71,     // EX_OSERR
            Self::Io(_) => 74,          // EX_IOERR
            Self::Config(_) => 78,      // EX_CONFIG
            Self::Interrupted => 130,
        }
    }
}

impl From<SupervisorError> for CliError {
    fn from(err: SupervisorError) -> Self {
        let message = err.to_string();
        match err {
            SupervisorError::ModelNotFound(_) | SupervisorError::ProjectorNotFound(_) => {
                Self::Arguments(message)
            }
            SupervisorError::LogSink { .. } => Self::Io(message),
            SupervisorError::ReadinessTimeout { .. } => Self::Unavailable(message),
            SupervisorError::Probe(_) => Self::Config(message),
            SupervisorError::Launch { .. }
            | SupervisorError::Crashed { .. }
            | SupervisorError::PortConflict(_) => Self::Process(message),
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<ServerBinaryError> for CliError {
    fn from(err: ServerBinaryError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<PathError> for CliError {
    fn from(err: PathError) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
