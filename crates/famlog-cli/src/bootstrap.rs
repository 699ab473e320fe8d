//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where the supervisor is wired together:
//! settings are loaded and validated, the log directory and server binary
//! are resolved, and a `ModelSupervisor` is wrapped behind its port.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use famlog_core::{ModelSupervisorPort, SupervisorSettings, resolve_log_dir, validate_settings};
use famlog_runtime::{
    DEFAULT_SERVER_BINARY, ModelSupervisor, SupervisorPortImpl, resolve_server_binary,
};
use tracing::{debug, warn};

use crate::error::CliError;

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Explicit llama-server binary, if any.
    pub server_binary: Option<PathBuf>,
    /// Explicit log directory, if any.
    pub log_dir: Option<PathBuf>,
    /// JSON settings file, if any.
    pub settings_path: Option<PathBuf>,
}

/// Whether a missing server binary aborts bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryPolicy {
    /// Commands that spawn servers.
    Required,
    /// Commands that never spawn; fall back to the bare binary name.
    BestEffort,
}

/// Fully composed context for CLI commands.
pub struct CliContext {
    /// The supervisor, behind its port.
    pub supervisor: Arc<dyn ModelSupervisorPort>,
    /// Effective settings.
    pub settings: SupervisorSettings,
    /// Resolved log directory.
    pub log_dir: PathBuf,
    /// Resolved server binary.
    pub server_binary: PathBuf,
}

/// Load settings from a JSON file, or defaults when none is given.
///
/// Unset fields keep their defaults. The result is validated.
pub fn load_settings(path: Option<&Path>) -> Result<SupervisorSettings, CliError> {
    let settings = match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .map_err(|e| CliError::Io(format!("{}: {e}", path.display())))?;
            serde_json::from_str(&raw)
                .map_err(|e| CliError::Config(format!("{}: {e}", path.display())))?
        }
        None => SupervisorSettings::default(),
    };
    validate_settings(&settings)?;
    Ok(settings)
}

/// Build the CLI context.
pub fn bootstrap(config: &CliConfig, policy: BinaryPolicy) -> Result<CliContext, CliError> {
    let settings = load_settings(config.settings_path.as_deref())?;
    let log_dir = resolve_log_dir(config.log_dir.as_deref())?;

    let server_binary = match (resolve_server_binary(config.server_binary.as_deref()), policy) {
        (Ok(path), _) => path,
        (Err(e), BinaryPolicy::Required) => return Err(e.into()),
        (Err(e), BinaryPolicy::BestEffort) => {
            warn!(error = %e, "Server binary not resolved; continuing without it");
            config
                .server_binary
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SERVER_BINARY))
        }
    };
    debug!(binary = %server_binary.display(), log_dir = %log_dir.display(), "Bootstrapped supervisor");

    let supervisor = ModelSupervisor::new(&server_binary, &log_dir, settings.clone())?;
    Ok(CliContext {
        supervisor: Arc::new(SupervisorPortImpl::new(Arc::new(supervisor))),
        settings,
        log_dir,
        server_binary,
    })
}
