//! Switch command handler.
//!
//! Loads the first model, switches the same port to the second one, keeps
//! it running until `until` resolves, then shuts the supervisor down. An
//! interrupt or failure at any step stops whatever was started.

use famlog_core::{ActiveServer, LaunchOptions, ModelSupervisorPort};
use std::future::Future;
use std::path::Path;
use tracing::info;

use super::{describe_server, interruptible};
use crate::error::CliError;

/// Execute the switch command.
pub async fn execute<F>(
    supervisor: &dyn ModelSupervisorPort,
    port: u16,
    from: &Path,
    to: &Path,
    options: &LaunchOptions,
    until: F,
) -> Result<ActiveServer, CliError>
where
    F: Future<Output = ()>,
{
    let mut until = Box::pin(until);

    println!("Loading {} on port {port}...", from.display());
    let first = interruptible(supervisor, &mut until, supervisor.load(from, port, options)).await?;
    println!("{}", describe_server(&first));

    println!("Switching port {port} to {}...", to.display());
    let second =
        interruptible(supervisor, &mut until, supervisor.switch(port, to, options)).await?;
    println!("{}", describe_server(&second));
    println!("Press Ctrl-C to stop.");

    until.await;

    let stopped = supervisor.shutdown().await;
    info!(stopped, "Model servers stopped");
    Ok(second)
}
