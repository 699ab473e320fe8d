//! Lifecycle controller for local model servers.
//!
//! `ModelSupervisor` composes the process registry, the readiness prober and
//! the two-phase stop into the load / unload / switch operations the rest of
//! the pipeline relies on. It is the only code that spawns or kills servers.

use famlog_core::{
    ActiveServer, LaunchOptions, ReadinessOutcome, StopOutcome, SupervisorError,
    SupervisorResult, SupervisorSettings,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::command::ServerInvocation;
use crate::process::{
    Liveness, ManagedServer, ProcessRegistry, ReadinessProber, ServerLogFile, StopPolicy,
    log_path_for,
};

/// Supervises llama-server processes, one per port.
pub struct ModelSupervisor {
    registry: ProcessRegistry,
    prober: ReadinessProber,
    stop_policy: StopPolicy,
    settings: SupervisorSettings,
    server_binary: PathBuf,
    log_dir: PathBuf,
}

impl ModelSupervisor {
    /// Create a supervisor.
    ///
    /// `server_binary` is expected to be resolved already (see
    /// [`resolve_server_binary`](crate::resolve_server_binary)); `log_dir`
    /// is created on first load if missing.
    pub fn new(
        server_binary: impl Into<PathBuf>,
        log_dir: impl Into<PathBuf>,
        settings: SupervisorSettings,
    ) -> SupervisorResult<Self> {
        let prober =
            ReadinessProber::new(&settings).map_err(|e| SupervisorError::Probe(e.to_string()))?;
        Ok(Self {
            registry: ProcessRegistry::new(),
            prober,
            stop_policy: StopPolicy::from_settings(&settings),
            settings,
            server_binary: server_binary.into(),
            log_dir: log_dir.into(),
        })
    }

    pub fn server_binary(&self) -> &Path {
        &self.server_binary
    }

    /// Log file a server on `port` writes to.
    pub fn log_path(&self, port: u16) -> PathBuf {
        log_path_for(&self.log_dir, port)
    }

    /// Start `model_path` on `port` and block until it is ready.
    ///
    /// Whatever runs on `port` is unloaded first. On any error the port is
    /// left untracked and no process started by this call survives.
    pub async fn load(
        &self,
        model_path: &Path,
        port: u16,
        options: &LaunchOptions,
    ) -> SupervisorResult<ActiveServer> {
        if !model_path.exists() {
            return Err(SupervisorError::ModelNotFound(model_path.to_path_buf()));
        }
        if let Some(projector) = &options.projector_path {
            if !projector.exists() {
                return Err(SupervisorError::ProjectorNotFound(projector.clone()));
            }
        }

        let replaced = self.unload(port).await;
        if replaced != StopOutcome::NotTracked {
            info!(port = %port, outcome = ?replaced, "Unloaded previous server before load");
        }

        let invocation =
            ServerInvocation::new(&self.server_binary, model_path, port, options, &self.settings);

        let mut log =
            ServerLogFile::open(&self.log_dir, port).map_err(|source| SupervisorError::LogSink {
                path: self.log_path(port),
                source,
            })?;
        log.note(&format!("starting: {}", invocation.display()));

        let child = match invocation.spawn(&log) {
            Ok(child) => child,
            Err(source) => {
                warn!(port = %port, error = %source, binary = %self.server_binary.display(), "Failed to spawn model server");
                log.note(&format!("launch failed: {source}"));
                log.close();
                return Err(SupervisorError::Launch { port, source });
            }
        };

        let server = ManagedServer::new(port, model_path.to_path_buf(), child, log);
        let descriptor = server.describe();
        info!(
            port = %port,
            pid = ?descriptor.pid,
            model = %model_path.display(),
            "Spawned model server"
        );

        if let Err(rejected) = self.registry.insert(server).await {
            warn!(port = %port, "Port claimed by a concurrent load, discarding new server");
            rejected.stop(&self.stop_policy).await;
            return Err(SupervisorError::PortConflict(port));
        }

        let timeout = options
            .startup_timeout
            .unwrap_or_else(|| self.settings.startup_timeout());

        match self.prober.wait_ready(port, timeout, &self.registry).await {
            ReadinessOutcome::Ready { .. } => Ok(descriptor),
            ReadinessOutcome::TimedOut { attempts } => {
                warn!(
                    port = %port,
                    attempts,
                    timeout_secs = timeout.as_secs(),
                    "Model server never became ready, unloading"
                );
                self.unload(port).await;
                Err(SupervisorError::ReadinessTimeout { port, timeout })
            }
            ReadinessOutcome::Crashed { exit_code } => {
                warn!(
                    port = %port,
                    exit_code = ?exit_code,
                    log = %descriptor.log_path.display(),
                    "Model server crashed during startup"
                );
                Err(SupervisorError::Crashed {
                    port,
                    exit_code,
                    log_path: descriptor.log_path,
                })
            }
        }
    }

    /// Stop whatever runs on `port`.
    ///
    /// Never fails. An untracked port is a no-op.
    pub async fn unload(&self, port: u16) -> StopOutcome {
        let Some(server) = self.registry.take(port).await else {
            debug!(port = %port, "Nothing to unload");
            return StopOutcome::NotTracked;
        };

        info!(
            port = %port,
            pid = ?server.pid(),
            model = %server.model_path().display(),
            "Unloading model server"
        );
        let report = server.stop(&self.stop_policy).await;

        if report.outcome.is_clean() {
            info!(port = %port, outcome = ?report.outcome, "Model server stopped");
        } else {
            warn!(port = %port, outcome = ?report.outcome, "Model server survived forced kill; entry dropped anyway");
        }
        report.outcome
    }

    /// Replace whatever runs on `port` with `model_path`.
    ///
    /// Waits the configured settle delay between stop and start so device
    /// memory is released before the next model allocates.
    pub async fn switch(
        &self,
        port: u16,
        model_path: &Path,
        options: &LaunchOptions,
    ) -> SupervisorResult<ActiveServer> {
        info!(port = %port, model = %model_path.display(), "Switching model");
        self.unload(port).await;

        let delay = self.settings.settle_delay();
        if !delay.is_zero() {
            debug!(port = %port, delay_ms = delay.as_millis(), "Waiting for device memory to settle");
            sleep(delay).await;
        }
        self.load(model_path, port, options).await
    }

    /// Make sure `port` serves `model_path`.
    ///
    /// A live server already running exactly that model is reused as is;
    /// launch options are not compared.
    pub async fn ensure_loaded(
        &self,
        model_path: &Path,
        port: u16,
        options: &LaunchOptions,
    ) -> SupervisorResult<ActiveServer> {
        if self.registry.check(port).await == Liveness::Alive {
            if let Some(current) = self.registry.describe(port).await {
                if current.model_path == model_path {
                    debug!(port = %port, model = %model_path.display(), "Model already loaded");
                    return Ok(current);
                }
            }
            return self.switch(port, model_path, options).await;
        }
        self.load(model_path, port, options).await
    }

    /// Unload every tracked port. Returns the number of ports stopped.
    pub async fn shutdown(&self) -> usize {
        let ports = self.registry.ports().await;
        if ports.is_empty() {
            debug!("No model servers to shut down");
            return 0;
        }

        info!(count = ports.len(), "Shutting down model servers");
        for port in &ports {
            self.unload(*port).await;
        }
        ports.len()
    }

    /// Live servers as a port to model mapping. Dead entries are evicted first.
    pub async fn list_active(&self) -> BTreeMap<u16, PathBuf> {
        self.active_servers()
            .await
            .into_iter()
            .map(|server| (server.port, server.model_path))
            .collect()
    }

    /// Live servers with full descriptors, ordered by port.
    pub async fn active_servers(&self) -> Vec<ActiveServer> {
        let evicted = self.registry.reconcile().await;
        if !evicted.is_empty() {
            info!(ports = ?evicted, "Evicted exited model servers");
        }
        self.registry.snapshot().await
    }

    /// One readiness probe against `port`, tracked or not.
    pub async fn is_ready(&self, port: u16) -> bool {
        self.prober.probe_once(port).await.is_ready()
    }
}
