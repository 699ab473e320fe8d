//! Command builder for model server processes.
//!
//! Turns a model path, a port and [`LaunchOptions`] into a concrete
//! `llama-server` invocation and spawns it with output redirected into the
//! per-port log file.

use famlog_core::{LOOPBACK_HOST, LaunchOptions, SupervisorSettings};
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::{Child, Command};

use crate::process::ServerLogFile;

/// Fully resolved command line for one server process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInvocation {
    binary: PathBuf,
    model_path: PathBuf,
    port: u16,
    gpu_layers: i32,
    context_size: u64,
    projector_path: Option<PathBuf>,
    threads: Option<u32>,
    extra_args: Vec<String>,
}

impl ServerInvocation {
    /// Resolve an invocation, filling unset options from settings.
    pub fn new(
        binary: impl Into<PathBuf>,
        model_path: impl Into<PathBuf>,
        port: u16,
        options: &LaunchOptions,
        settings: &SupervisorSettings,
    ) -> Self {
        Self {
            binary: binary.into(),
            model_path: model_path.into(),
            port,
            gpu_layers: options
                .gpu_layers
                .unwrap_or_else(|| settings.effective_gpu_layers()),
            context_size: options
                .context_size
                .unwrap_or_else(|| settings.effective_context_size()),
            projector_path: options.projector_path.clone(),
            threads: options.threads,
            extra_args: options.extra_args.clone(),
        }
    }

    /// Arguments in the order they are passed to the binary.
    ///
    /// Passthrough flags come last so they can override anything above.
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-m".into(),
            self.model_path.clone().into_os_string(),
            "--host".into(),
            LOOPBACK_HOST.into(),
            "--port".into(),
            self.port.to_string().into(),
            "-ngl".into(),
            self.gpu_layers.to_string().into(),
            "-c".into(),
            self.context_size.to_string().into(),
        ];

        if let Some(projector) = &self.projector_path {
            args.push("--mmproj".into());
            args.push(projector.clone().into_os_string());
        }

        if let Some(threads) = self.threads {
            args.push("-t".into());
            args.push(threads.to_string().into());
        }

        args.extend(self.extra_args.iter().map(OsString::from));
        args
    }

    /// Human-readable command line for logs.
    pub fn display(&self) -> String {
        let mut parts = vec![self.binary.display().to_string()];
        parts.extend(self.args().iter().map(|a| a.to_string_lossy().into_owned()));
        parts.join(" ")
    }

    /// Spawn the server as the leader of a new process group.
    ///
    /// Stdout and stderr go to `log`; stdin is closed. Signals later sent to
    /// the group reach every process the server forks.
    pub fn spawn(&self, log: &ServerLogFile) -> io::Result<Child> {
        let (stdout, stderr) = log.stdio()?;

        let mut cmd = Command::new(&self.binary);
        cmd.args(self.args())
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .kill_on_drop(true);

        #[cfg(unix)]
        cmd.process_group(0);

        cmd.spawn()
    }
}
