//! Serve command handler.
//!
//! Loads one model, keeps it running until `until` resolves (Ctrl-C or
//! SIGTERM in the binary), then shuts the supervisor down. `until` is live
//! from the start, so an interrupt during startup stops the server too.

use famlog_core::{ActiveServer, LaunchOptions, ModelSupervisorPort};
use std::future::Future;
use std::path::Path;
use tracing::info;

use super::{describe_server, interruptible};
use crate::error::CliError;

/// Execute the serve command.
pub async fn execute<F>(
    supervisor: &dyn ModelSupervisorPort,
    model: &Path,
    port: u16,
    options: &LaunchOptions,
    until: F,
) -> Result<ActiveServer, CliError>
where
    F: Future<Output = ()>,
{
    let mut until = Box::pin(until);

    println!("Loading {} on port {port}...", model.display());
    let server = interruptible(supervisor, &mut until, supervisor.load(model, port, options)).await?;

    println!("{}", describe_server(&server));
    println!("Chat completions: {}", server.chat_completions_url());
    println!("Log: {}", server.log_path.display());
    println!("Press Ctrl-C to stop.");

    until.await;

    let stopped = supervisor.shutdown().await;
    info!(stopped, "Model servers stopped");
    Ok(server)
}
