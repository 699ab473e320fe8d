//! Subcommand definitions.

use clap::{Args, Subcommand};
use famlog_core::LaunchOptions;
use std::path::PathBuf;
use std::time::Duration;

/// Launch options shared by every command that starts a server.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchArgs {
    /// Context size in tokens (default from settings)
    #[arg(short = 'c', long = "ctx-size")]
    pub ctx_size: Option<u64>,

    /// Layers to offload to the GPU (default: all)
    #[arg(long = "gpu-layers")]
    pub gpu_layers: Option<i32>,

    /// CPU threads for generation
    #[arg(short = 't', long = "threads")]
    pub threads: Option<u32>,

    /// Multimodal projector file for vision models
    #[arg(long = "mmproj")]
    pub mmproj: Option<PathBuf>,

    /// Seconds to wait for the server to become ready
    #[arg(long = "startup-timeout")]
    pub startup_timeout: Option<u64>,

    /// Extra flags passed verbatim to llama-server (after `--`)
    #[arg(last = true)]
    pub extra: Vec<String>,
}

impl LaunchArgs {
    /// Convert flags into launch options.
    pub fn to_launch_options(&self) -> LaunchOptions {
        let mut options = LaunchOptions::new().with_extra_args(self.extra.clone());
        if let Some(ctx) = self.ctx_size {
            options = options.with_context_size(ctx);
        }
        if let Some(layers) = self.gpu_layers {
            options = options.with_gpu_layers(layers);
        }
        if let Some(threads) = self.threads {
            options = options.with_threads(threads);
        }
        if let Some(projector) = &self.mmproj {
            options = options.with_projector(projector.clone());
        }
        if let Some(secs) = self.startup_timeout {
            options = options.with_startup_timeout(Duration::from_secs(secs));
        }
        options
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a model and keep it running until Ctrl-C
    Serve {
        /// Model file to serve
        #[arg(short, long)]
        model: PathBuf,
        /// Port the server listens on (loopback only)
        #[arg(short, long, default_value_t = 8080)]
        port: u16,
        #[command(flatten)]
        launch: LaunchArgs,
    },
    /// Load one model, then switch the same port to another
    Switch {
        /// Port the server listens on (loopback only)
        #[arg(short, long, default_value_t = 8080)]
        port: u16,
        /// Model loaded first
        #[arg(long)]
        from: PathBuf,
        /// Model switched to
        #[arg(long)]
        to: PathBuf,
        #[command(flatten)]
        launch: LaunchArgs,
    },
    /// Probe a port's readiness endpoint once
    Probe {
        #[arg(short, long)]
        port: u16,
    },
    /// Print the effective configuration as JSON
    Config,
}
