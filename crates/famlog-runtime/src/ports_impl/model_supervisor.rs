//! `ModelSupervisorPort` implementation backed by [`ModelSupervisor`].

use async_trait::async_trait;
use famlog_core::{
    ActiveServer, LaunchOptions, ModelSupervisorPort, StopOutcome, SupervisorResult,
};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::supervisor::ModelSupervisor;

/// Implementation of `ModelSupervisorPort` using [`ModelSupervisor`].
///
/// The supervisor is shared through an `Arc` so the same registry can be
/// handed to several consumers and to the shutdown hook.
pub struct SupervisorPortImpl {
    supervisor: Arc<ModelSupervisor>,
}

impl SupervisorPortImpl {
    pub const fn new(supervisor: Arc<ModelSupervisor>) -> Self {
        Self { supervisor }
    }
}

impl fmt::Debug for SupervisorPortImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupervisorPortImpl")
            .field("server_binary", &self.supervisor.server_binary())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ModelSupervisorPort for SupervisorPortImpl {
    async fn load(
        &self,
        model_path: &Path,
        port: u16,
        options: &LaunchOptions,
    ) -> SupervisorResult<ActiveServer> {
        self.supervisor.load(model_path, port, options).await
    }

    async fn unload(&self, port: u16) -> StopOutcome {
        self.supervisor.unload(port).await
    }

    async fn switch(
        &self,
        port: u16,
        model_path: &Path,
        options: &LaunchOptions,
    ) -> SupervisorResult<ActiveServer> {
        self.supervisor.switch(port, model_path, options).await
    }

    async fn ensure_loaded(
        &self,
        model_path: &Path,
        port: u16,
        options: &LaunchOptions,
    ) -> SupervisorResult<ActiveServer> {
        self.supervisor.ensure_loaded(model_path, port, options).await
    }

    async fn shutdown(&self) -> usize {
        self.supervisor.shutdown().await
    }

    async fn list_active(&self) -> BTreeMap<u16, PathBuf> {
        self.supervisor.list_active().await
    }

    async fn active_servers(&self) -> Vec<ActiveServer> {
        self.supervisor.active_servers().await
    }

    async fn is_ready(&self, port: u16) -> bool {
        self.supervisor.is_ready(port).await
    }
}
