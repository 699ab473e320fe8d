//! Shared fixtures for supervisor integration tests.
//!
//! Managed servers are stood in for by small shell scripts that ignore their
//! arguments; readiness is served by an in-process axum app on the same port.

#![allow(dead_code)]

use axum::{Json, Router, routing::get};
use famlog_core::SupervisorSettings;
use famlog_runtime::ModelSupervisor;
use serde_json::json;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::time::sleep;

/// Stays up until signalled.
pub const SLEEPING_SERVER: &str = "exec sleep 600";

/// Dies right after launch with exit code 3.
pub const CRASHING_SERVER: &str = "echo 'failed to load model' >&2\nexit 3";

/// Leaves a background child behind, records its pid next to the script,
/// then dies with exit code 3.
pub const FORKING_CRASHING_SERVER: &str =
    "sleep 600 &\necho $! > \"$(dirname \"$0\")/leftover.pid\"\nexit 3";

/// Ignores the graceful termination request.
pub const STUBBORN_SERVER: &str = "trap '' TERM\nexec sleep 600";

/// Settings tuned so lifecycle tests finish in seconds.
pub fn fast_settings() -> SupervisorSettings {
    SupervisorSettings {
        startup_timeout_secs: Some(10),
        stop_grace_secs: Some(2),
        stop_poll_ms: Some(50),
        kill_wait_secs: Some(2),
        settle_delay_ms: Some(100),
        probe_interval_ms: Some(200),
        probe_request_timeout_secs: Some(1),
        ..SupervisorSettings::default()
    }
}

pub struct Fixture {
    pub dir: TempDir,
    pub supervisor: ModelSupervisor,
}

impl Fixture {
    /// Supervisor whose server binary is a script running `body`.
    pub fn new(body: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let binary = write_script(dir.path(), body);
        let supervisor =
            ModelSupervisor::new(binary, dir.path().join("logs"), fast_settings()).unwrap();
        Self { dir, supervisor }
    }

    /// Supervisor pointed at a binary that does not exist.
    pub fn with_missing_binary() -> Self {
        let dir = TempDir::new().unwrap();
        let supervisor = ModelSupervisor::new(
            dir.path().join("no-such-llama-server"),
            dir.path().join("logs"),
            fast_settings(),
        )
        .unwrap();
        Self { dir, supervisor }
    }

    /// Create an empty model artifact under `models/`.
    pub fn model(&self, name: &str) -> PathBuf {
        let models = self.dir.path().join("models");
        fs::create_dir_all(&models).unwrap();
        let path = models.join(name);
        fs::write(&path, b"GGUF").unwrap();
        path
    }

    pub fn read_log(&self, port: u16) -> String {
        fs::read_to_string(self.supervisor.log_path(port)).unwrap_or_default()
    }

    /// Pid written by [`FORKING_CRASHING_SERVER`].
    pub fn leftover_pid(&self) -> u32 {
        fs::read_to_string(self.dir.path().join("leftover.pid"))
            .unwrap()
            .trim()
            .parse()
            .unwrap()
    }
}

/// Whether `pid` is a live process. Zombies count as dead.
#[cfg(target_os = "linux")]
pub fn is_running(pid: u32) -> bool {
    fs::read_to_string(format!("/proc/{pid}/stat")).is_ok_and(|stat| {
        stat.rsplit(')')
            .next()
            .is_some_and(|rest| !rest.trim_start().starts_with('Z'))
    })
}

fn write_script(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-llama-server");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// A loopback port nothing is listening on.
pub fn unused_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Serve `{"status":"ok"}` on `/health`, starting to listen after `delay`.
pub fn spawn_health(delay: Duration) -> u16 {
    let port = unused_port();
    tokio::spawn(async move {
        sleep(delay).await;
        let listener = TcpListener::bind(("127.0.0.1", port)).await.unwrap();
        let app = Router::new().route("/health", get(|| async { Json(json!({"status": "ok"})) }));
        axum::serve(listener, app).await.ok();
    });
    port
}
