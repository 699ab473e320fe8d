//! Port-keyed registry of managed server processes.
//!
//! The registry is the only shared mutable state of the supervisor. Each
//! entry exclusively owns its process handle and log file; taking an entry
//! out of the map transfers that ownership, so cleanup happens exactly once
//! on whichever path ends up holding it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use famlog_core::{ActiveServer, StopOutcome};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use tokio::process::Child;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::logs::ServerLogFile;
use super::shutdown::{
    Delivery, StopPolicy, StopReport, force_kill_pid, kill_group_remnants, stop_process_group,
};

/// A tracked server process.
pub struct ManagedServer {
    port: u16,
    model_path: PathBuf,
    pid: Option<u32>,
    started_at: DateTime<Utc>,
    child: Child,
    log: ServerLogFile,
}

impl ManagedServer {
    pub fn new(port: u16, model_path: PathBuf, child: Child, log: ServerLogFile) -> Self {
        Self {
            port,
            model_path,
            pid: child.id(),
            started_at: Utc::now(),
            child,
            log,
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub const fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Caller-facing descriptor of this entry.
    pub fn describe(&self) -> ActiveServer {
        ActiveServer {
            port: self.port,
            model_path: self.model_path.clone(),
            pid: self.pid,
            started_at: self.started_at,
            log_path: self.log.path().to_path_buf(),
        }
    }

    /// Non-blocking exit check. Errors count as exited.
    fn exit_status(&mut self) -> Option<Option<ExitStatus>> {
        match self.child.try_wait() {
            Ok(Some(status)) => Some(Some(status)),
            Ok(None) => None,
            Err(e) => {
                warn!(port = %self.port, error = %e, "Error checking process");
                Some(None)
            }
        }
    }

    /// Kill anything the exited leader left behind in its group.
    fn sweep_group(&self) {
        if let Some(pgid) = self.pid {
            if kill_group_remnants(pgid) == Delivery::Sent {
                info!(port = %self.port, pgid, "Killed processes left behind by exited server");
            }
        }
    }

    /// Run the two-phase stop and release the entry.
    pub async fn stop(mut self, policy: &StopPolicy) -> StopReport {
        let report = stop_process_group(&mut self.child, policy).await;
        let trailer = match report.status {
            Some(status) => format!("stopped ({:?}), {status}", report.outcome),
            None => format!("stopped ({:?})", report.outcome),
        };
        self.release(&trailer);
        report
    }

    /// Close the log with a trailer line and drop the process handle.
    ///
    /// Consuming `self` is what makes release happen at most once.
    pub fn release(mut self, trailer: &str) {
        self.log.note(trailer);
        debug!(port = %self.port, log = %self.log.path().display(), "Released server entry");
        self.log.close();
    }
}

/// Liveness of the process tracked on a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Alive,
    /// The process exited; its entry has already been evicted.
    Exited { exit_code: Option<i32> },
    Untracked,
}

/// Source of liveness information for the readiness prober.
#[async_trait]
pub trait LivenessCheck: Send + Sync {
    /// Check the process on `port`, evicting it if it has exited.
    async fn liveness(&self, port: u16) -> Liveness;
}

/// Running processes keyed by port.
#[derive(Default)]
pub struct ProcessRegistry {
    entries: Mutex<HashMap<u16, ManagedServer>>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a server. An occupied port is never overwritten: the new
    /// entry is handed back so the caller can tear it down.
    pub async fn insert(&self, server: ManagedServer) -> Result<(), ManagedServer> {
        let mut entries = self.entries.lock().await;
        if entries.contains_key(&server.port) {
            return Err(server);
        }
        entries.insert(server.port, server);
        Ok(())
    }

    /// Remove and return the entry on `port`.
    pub async fn take(&self, port: u16) -> Option<ManagedServer> {
        self.entries.lock().await.remove(&port)
    }

    pub async fn contains(&self, port: u16) -> bool {
        self.entries.lock().await.contains_key(&port)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Tracked ports in ascending order.
    pub async fn ports(&self) -> Vec<u16> {
        let mut ports: Vec<u16> = self.entries.lock().await.keys().copied().collect();
        ports.sort_unstable();
        ports
    }

    /// Descriptor of the entry on `port`, without a liveness check.
    pub async fn describe(&self, port: u16) -> Option<ActiveServer> {
        self.entries.lock().await.get(&port).map(ManagedServer::describe)
    }

    /// Liveness of `port`; an exited process is evicted and released.
    pub async fn check(&self, port: u16) -> Liveness {
        let evicted = {
            let mut entries = self.entries.lock().await;
            let Some(server) = entries.get_mut(&port) else {
                return Liveness::Untracked;
            };
            match server.exit_status() {
                None => return Liveness::Alive,
                Some(status) => entries.remove(&port).map(|server| (server, status)),
            }
        };

        let Some((server, status)) = evicted else {
            return Liveness::Untracked;
        };
        let exit_code = status.and_then(|s| s.code());
        evict(server, status);
        Liveness::Exited { exit_code }
    }

    /// Evict every entry whose process has exited. Returns the evicted ports.
    pub async fn reconcile(&self) -> Vec<u16> {
        let dead: Vec<(ManagedServer, Option<ExitStatus>)> = {
            let mut entries = self.entries.lock().await;
            let exited: Vec<(u16, Option<ExitStatus>)> = entries
                .iter_mut()
                .filter_map(|(port, server)| server.exit_status().map(|status| (*port, status)))
                .collect();
            exited
                .into_iter()
                .filter_map(|(port, status)| entries.remove(&port).map(|s| (s, status)))
                .collect()
        };

        let mut ports = Vec::with_capacity(dead.len());
        for (server, status) in dead {
            ports.push(server.port);
            evict(server, status);
        }
        ports.sort_unstable();
        ports
    }

    /// Descriptors of every tracked entry, ordered by port.
    pub async fn snapshot(&self) -> Vec<ActiveServer> {
        let mut servers: Vec<ActiveServer> = self
            .entries
            .lock()
            .await
            .values()
            .map(ManagedServer::describe)
            .collect();
        servers.sort_by_key(|s| s.port);
        servers
    }
}

fn evict(server: ManagedServer, status: Option<ExitStatus>) {
    warn!(
        port = %server.port,
        pid = ?server.pid,
        model = %server.model_path.display(),
        status = ?status,
        "Model server exited; evicting"
    );
    let trailer = status.map_or_else(
        || format!("process gone ({:?})", StopOutcome::AlreadyExited),
        |s| format!("process exited: {s}"),
    );
    server.sweep_group();
    server.release(&trailer);
}

#[async_trait]
impl LivenessCheck for ProcessRegistry {
    async fn liveness(&self, port: u16) -> Liveness {
        self.check(port).await
    }
}

// Drop cannot await a graceful stop. Callers are expected to run
// `shutdown` first; this only catches processes that would otherwise be
// orphaned.
impl Drop for ProcessRegistry {
    fn drop(&mut self) {
        for (port, mut server) in self.entries.get_mut().drain() {
            if server.exit_status().is_some() {
                server.sweep_group();
                server.release("supervisor dropped after server exited");
                continue;
            }
            if let Some(pid) = server.pid {
                info!(port = %port, pid = %pid, "Force-killing server still running on drop");
                force_kill_pid(pid);
            }
            server.release("supervisor dropped while server was running");
        }
    }
}
