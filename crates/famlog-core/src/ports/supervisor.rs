//! Model supervisor port.
//!
//! This is the only way the rest of the pipeline (vision pass, session
//! assembly, summary job) affects GPU-resident models. Implementations own
//! every spawned process; callers only ever see ports and model paths.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::SupervisorResult;
use crate::domain::{ActiveServer, LaunchOptions};

/// How a tracked server was brought down.
///
/// Stopping never fails from the caller's point of view: every variant means
/// the registry entry is gone and its log was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopOutcome {
    /// Nothing was tracked on the port.
    NotTracked,
    /// The process had already exited before any signal was sent.
    AlreadyExited,
    /// The process group honored the graceful termination request.
    Graceful,
    /// The grace window elapsed and the group was force-killed.
    Forced,
    /// The process did not exit even after a forced kill. The entry was
    /// dropped anyway; the process may linger.
    KillIneffective,
}

impl StopOutcome {
    /// True when the process is known to be gone.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        !matches!(self, Self::KillIneffective)
    }
}

/// Control interface over local inference servers.
///
/// Operations on different ports are independent. Operations on the same
/// port must be issued sequentially by the caller.
#[async_trait]
pub trait ModelSupervisorPort: Send + Sync {
    /// Start `model_path` on `port` and wait until it is ready.
    ///
    /// Anything already running on `port` is unloaded first.
    async fn load(
        &self,
        model_path: &Path,
        port: u16,
        options: &LaunchOptions,
    ) -> SupervisorResult<ActiveServer>;

    /// Stop whatever runs on `port`. A no-op for untracked ports.
    async fn unload(&self, port: u16) -> StopOutcome;

    /// Unload `port`, wait for device memory to settle, then load `model_path`.
    async fn switch(
        &self,
        port: u16,
        model_path: &Path,
        options: &LaunchOptions,
    ) -> SupervisorResult<ActiveServer>;

    /// Load `model_path` on `port` unless it is already serving exactly that model.
    async fn ensure_loaded(
        &self,
        model_path: &Path,
        port: u16,
        options: &LaunchOptions,
    ) -> SupervisorResult<ActiveServer>;

    /// Unload every tracked port. Returns how many ports were stopped.
    async fn shutdown(&self) -> usize;

    /// Port to model mapping of live servers, after evicting dead ones.
    async fn list_active(&self) -> BTreeMap<u16, PathBuf>;

    /// Full descriptors of live servers, ordered by port.
    async fn active_servers(&self) -> Vec<ActiveServer>;

    /// Single readiness probe against `port`.
    async fn is_ready(&self, port: u16) -> bool;
}
