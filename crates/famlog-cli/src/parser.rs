//! Main CLI parser and top-level argument handling.

use clap::Parser;
use std::path::PathBuf;

use crate::commands::Commands;

/// Command-line interface of the famlog model supervisor.
///
/// Global options configure where the server binary, the logs and the
/// settings come from; each falls back to a `FAMLOG_*` environment variable.
#[derive(Parser)]
#[command(name = "famlog")]
#[command(about = "Start, switch and stop local llama-server model processes")]
#[command(version)]
pub struct Cli {
    /// Path to the llama-server binary (default: llama-server on PATH)
    #[arg(long = "server-binary", env = "FAMLOG_LLAMA_SERVER", global = true)]
    pub server_binary: Option<PathBuf>,

    /// Directory for per-port server logs
    #[arg(long = "log-dir", env = "FAMLOG_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    /// JSON file with supervisor settings overrides
    #[arg(long = "settings", env = "FAMLOG_SETTINGS", global = true)]
    pub settings: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from([
            "famlog",
            "--verbose",
            "--log-dir",
            "/tmp/famlog-logs",
            "probe",
            "--port",
            "8080",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.log_dir, Some(PathBuf::from("/tmp/famlog-logs")));
        assert!(matches!(cli.command, Commands::Probe { port: 8080 }));
    }

    #[test]
    fn test_global_args_after_subcommand() {
        let cli = Cli::parse_from([
            "famlog",
            "config",
            "--server-binary",
            "/opt/llama/llama-server",
        ]);
        assert_eq!(
            cli.server_binary,
            Some(PathBuf::from("/opt/llama/llama-server"))
        );
    }
}
