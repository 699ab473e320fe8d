//! CLI entry point - the composition root.
//!
//! Wires logging, environment, configuration and the supervisor together,
//! then dispatches to a handler. Errors are reported once here and mapped
//! to exit codes.

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use famlog_cli::{BinaryPolicy, Cli, CliConfig, CliError, Commands, bootstrap, handlers};

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Resolves on Ctrl-C or SIGTERM. A listener that cannot be installed
/// never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Could not listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Could not listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl-C"),
        () = terminate => info!("Received SIGTERM"),
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = CliConfig {
        server_binary: cli.server_binary,
        log_dir: cli.log_dir,
        settings_path: cli.settings,
    };

    match cli.command {
        Commands::Serve {
            model,
            port,
            launch,
        } => {
            let ctx = bootstrap(&config, BinaryPolicy::Required)?;
            let options = launch.to_launch_options();
            handlers::serve::execute(
                ctx.supervisor.as_ref(),
                &model,
                port,
                &options,
                shutdown_signal(),
            )
            .await?;
        }
        Commands::Switch {
            port,
            from,
            to,
            launch,
        } => {
            let ctx = bootstrap(&config, BinaryPolicy::Required)?;
            let options = launch.to_launch_options();
            handlers::switch::execute(
                ctx.supervisor.as_ref(),
                port,
                &from,
                &to,
                &options,
                shutdown_signal(),
            )
            .await?;
        }
        Commands::Probe { port } => {
            let ctx = bootstrap(&config, BinaryPolicy::BestEffort)?;
            handlers::probe::execute(ctx.supervisor.as_ref(), port).await?;
        }
        Commands::Config => {
            let ctx = bootstrap(&config, BinaryPolicy::BestEffort)?;
            handlers::config::execute(&ctx.settings, &ctx.log_dir, &ctx.server_binary)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before clap reads FAMLOG_* fallbacks
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
    Ok(())
}
