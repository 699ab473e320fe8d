//! Config command handler.
//!
//! Prints the effective configuration (resolved binary, log directory and
//! every setting with defaults filled in) as JSON.

use famlog_core::SupervisorSettings;
use serde::Serialize;
use std::path::Path;

use crate::error::CliError;

#[derive(Debug, Serialize)]
struct EffectiveConfig<'a> {
    server_binary: &'a Path,
    log_dir: &'a Path,
    settings: SupervisorSettings,
}

/// Render the effective configuration.
pub fn render(
    settings: &SupervisorSettings,
    log_dir: &Path,
    server_binary: &Path,
) -> Result<String, CliError> {
    let config = EffectiveConfig {
        server_binary,
        log_dir,
        settings: settings.resolved(),
    };
    serde_json::to_string_pretty(&config).map_err(|e| CliError::Config(e.to_string()))
}

/// Execute the config command.
pub fn execute(
    settings: &SupervisorSettings,
    log_dir: &Path,
    server_binary: &Path,
) -> Result<(), CliError> {
    println!("{}", render(settings, log_dir, server_binary)?);
    Ok(())
}
