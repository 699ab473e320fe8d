//! Command handlers.
//!
//! Handlers only talk to `ModelSupervisorPort`, so they can be exercised
//! against a mock supervisor.

pub mod config;
pub mod probe;
pub mod serve;
pub mod switch;

use famlog_core::{ActiveServer, ModelSupervisorPort, SupervisorResult};
use std::future::Future;
use std::pin::Pin;
use tracing::{info, warn};

use crate::error::CliError;

/// One-line summary of a ready server.
pub fn describe_server(server: &ActiveServer) -> String {
    let pid = server
        .pid
        .map_or_else(|| "unknown".to_string(), |pid| pid.to_string());
    format!(
        "{} ready on port {} (pid {pid}) at {}",
        server.model_name(),
        server.port,
        server.base_url()
    )
}

/// Drive `operation` unless `until` resolves first.
///
/// Any failure, interruption included, stops every server the supervisor
/// tracks before the error is returned.
pub(crate) async fn interruptible<T, U>(
    supervisor: &dyn ModelSupervisorPort,
    until: &mut Pin<Box<U>>,
    operation: impl Future<Output = SupervisorResult<T>>,
) -> Result<T, CliError>
where
    U: Future<Output = ()>,
{
    let outcome = tokio::select! {
        biased;
        result = operation => result.map_err(CliError::from),
        () = until.as_mut() => {
            warn!("Interrupted before the model server was ready");
            Err(CliError::Interrupted)
        }
    };

    if outcome.is_err() {
        let stopped = supervisor.shutdown().await;
        info!(stopped, "Model servers stopped after failed command");
    }
    outcome
}

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use chrono::Utc;
    use famlog_core::{
        ActiveServer, LaunchOptions, ModelSupervisorPort, StopOutcome, SupervisorResult,
    };
    use mockall::mock;
    use std::collections::BTreeMap;
    use std::future::pending;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};

    mock! {
        pub Supervisor {}

        #[async_trait]
        impl ModelSupervisorPort for Supervisor {
            async fn load(
                &self,
                model_path: &Path,
                port: u16,
                options: &LaunchOptions,
            ) -> SupervisorResult<ActiveServer>;
            async fn unload(&self, port: u16) -> StopOutcome;
            async fn switch(
                &self,
                port: u16,
                model_path: &Path,
                options: &LaunchOptions,
            ) -> SupervisorResult<ActiveServer>;
            async fn ensure_loaded(
                &self,
                model_path: &Path,
                port: u16,
                options: &LaunchOptions,
            ) -> SupervisorResult<ActiveServer>;
            async fn shutdown(&self) -> usize;
            async fn list_active(&self) -> BTreeMap<u16, PathBuf>;
            async fn active_servers(&self) -> Vec<ActiveServer>;
            async fn is_ready(&self, port: u16) -> bool;
        }
    }

    /// Supervisor whose servers never become ready. Counts shutdowns.
    #[derive(Default)]
    pub struct StalledSupervisor {
        shutdowns: AtomicUsize,
    }

    impl StalledSupervisor {
        pub fn shutdowns(&self) -> usize {
            self.shutdowns.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ModelSupervisorPort for StalledSupervisor {
        async fn load(
            &self,
            _model_path: &Path,
            _port: u16,
            _options: &LaunchOptions,
        ) -> SupervisorResult<ActiveServer> {
            pending().await
        }

        async fn unload(&self, _port: u16) -> StopOutcome {
            StopOutcome::NotTracked
        }

        async fn switch(
            &self,
            _port: u16,
            _model_path: &Path,
            _options: &LaunchOptions,
        ) -> SupervisorResult<ActiveServer> {
            pending().await
        }

        async fn ensure_loaded(
            &self,
            _model_path: &Path,
            _port: u16,
            _options: &LaunchOptions,
        ) -> SupervisorResult<ActiveServer> {
            pending().await
        }

        async fn shutdown(&self) -> usize {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
            1
        }

        async fn list_active(&self) -> BTreeMap<u16, PathBuf> {
            BTreeMap::new()
        }

        async fn active_servers(&self) -> Vec<ActiveServer> {
            Vec::new()
        }

        async fn is_ready(&self, _port: u16) -> bool {
            false
        }
    }

    pub fn server_at(model: &Path, port: u16, pid: u32) -> ActiveServer {
        ActiveServer {
            port,
            model_path: model.to_path_buf(),
            pid: Some(pid),
            started_at: Utc::now(),
            log_path: PathBuf::from(format!("/tmp/llama-server-{port}.log")),
        }
    }
}
