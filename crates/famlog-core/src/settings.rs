//! Supervisor settings and validation.
//!
//! Every timing knob of the lifecycle controller lives here. Fields are
//! optional so a partial settings file or environment only overrides what it
//! names; the `effective_*` accessors apply the documented defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default context window handed to a server when the caller sets none.
pub const DEFAULT_CONTEXT_SIZE: u64 = 8192;

/// Sentinel layer count meaning "offload every layer to the GPU".
pub const DEFAULT_GPU_LAYERS: i32 = 999;

/// Readiness endpoint exposed by llama-server.
pub const DEFAULT_READINESS_PATH: &str = "/health";

const DEFAULT_STARTUP_TIMEOUT_SECS: u64 = 120;
const DEFAULT_STOP_GRACE_SECS: u64 = 10;
const DEFAULT_STOP_POLL_MS: u64 = 100;
const DEFAULT_KILL_WAIT_SECS: u64 = 5;
const DEFAULT_SETTLE_DELAY_MS: u64 = 2000;
const DEFAULT_PROBE_INTERVAL_MS: u64 = 1000;
const DEFAULT_PROBE_REQUEST_TIMEOUT_SECS: u64 = 5;

/// Lifecycle controller settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SupervisorSettings {
    /// Seconds to wait for a freshly spawned server to report ready.
    pub startup_timeout_secs: Option<u64>,

    /// Seconds a server gets to exit after a graceful termination request.
    pub stop_grace_secs: Option<u64>,

    /// Liveness poll interval while waiting out the grace window (ms).
    pub stop_poll_ms: Option<u64>,

    /// Seconds to wait for reaping after a forced kill.
    pub kill_wait_secs: Option<u64>,

    /// Pause between unload and load during a switch (ms).
    pub settle_delay_ms: Option<u64>,

    /// Interval between readiness probe attempts (ms).
    pub probe_interval_ms: Option<u64>,

    /// Latency bound of a single readiness request (seconds).
    pub probe_request_timeout_secs: Option<u64>,

    /// Context size used when launch options set none.
    pub default_context_size: Option<u64>,

    /// GPU layer count used when launch options set none.
    pub default_gpu_layers: Option<i32>,

    /// HTTP path polled for readiness.
    pub readiness_path: Option<String>,
}

impl SupervisorSettings {
    /// Create settings with every default spelled out.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            startup_timeout_secs: Some(DEFAULT_STARTUP_TIMEOUT_SECS),
            stop_grace_secs: Some(DEFAULT_STOP_GRACE_SECS),
            stop_poll_ms: Some(DEFAULT_STOP_POLL_MS),
            kill_wait_secs: Some(DEFAULT_KILL_WAIT_SECS),
            settle_delay_ms: Some(DEFAULT_SETTLE_DELAY_MS),
            probe_interval_ms: Some(DEFAULT_PROBE_INTERVAL_MS),
            probe_request_timeout_secs: Some(DEFAULT_PROBE_REQUEST_TIMEOUT_SECS),
            default_context_size: Some(DEFAULT_CONTEXT_SIZE),
            default_gpu_layers: Some(DEFAULT_GPU_LAYERS),
            readiness_path: Some(DEFAULT_READINESS_PATH.to_string()),
        }
    }

    /// Copy with every unset field filled from the defaults.
    #[must_use]
    pub fn resolved(&self) -> Self {
        let defaults = Self::with_defaults();
        Self {
            startup_timeout_secs: self.startup_timeout_secs.or(defaults.startup_timeout_secs),
            stop_grace_secs: self.stop_grace_secs.or(defaults.stop_grace_secs),
            stop_poll_ms: self.stop_poll_ms.or(defaults.stop_poll_ms),
            kill_wait_secs: self.kill_wait_secs.or(defaults.kill_wait_secs),
            settle_delay_ms: self.settle_delay_ms.or(defaults.settle_delay_ms),
            probe_interval_ms: self.probe_interval_ms.or(defaults.probe_interval_ms),
            probe_request_timeout_secs: self
                .probe_request_timeout_secs
                .or(defaults.probe_request_timeout_secs),
            default_context_size: self.default_context_size.or(defaults.default_context_size),
            default_gpu_layers: self.default_gpu_layers.or(defaults.default_gpu_layers),
            readiness_path: self.readiness_path.clone().or(defaults.readiness_path),
        }
    }

    #[must_use]
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(
            self.startup_timeout_secs
                .unwrap_or(DEFAULT_STARTUP_TIMEOUT_SECS),
        )
    }

    #[must_use]
    pub fn stop_grace(&self) -> Duration {
        Duration::from_secs(self.stop_grace_secs.unwrap_or(DEFAULT_STOP_GRACE_SECS))
    }

    #[must_use]
    pub fn stop_poll_interval(&self) -> Duration {
        Duration::from_millis(self.stop_poll_ms.unwrap_or(DEFAULT_STOP_POLL_MS))
    }

    #[must_use]
    pub fn kill_wait(&self) -> Duration {
        Duration::from_secs(self.kill_wait_secs.unwrap_or(DEFAULT_KILL_WAIT_SECS))
    }

    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms.unwrap_or(DEFAULT_SETTLE_DELAY_MS))
    }

    #[must_use]
    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms.unwrap_or(DEFAULT_PROBE_INTERVAL_MS))
    }

    #[must_use]
    pub fn probe_request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.probe_request_timeout_secs
                .unwrap_or(DEFAULT_PROBE_REQUEST_TIMEOUT_SECS),
        )
    }

    #[must_use]
    pub fn effective_context_size(&self) -> u64 {
        self.default_context_size.unwrap_or(DEFAULT_CONTEXT_SIZE)
    }

    #[must_use]
    pub fn effective_gpu_layers(&self) -> i32 {
        self.default_gpu_layers.unwrap_or(DEFAULT_GPU_LAYERS)
    }

    #[must_use]
    pub fn readiness_path(&self) -> &str {
        self.readiness_path
            .as_deref()
            .unwrap_or(DEFAULT_READINESS_PATH)
    }
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("Stop poll interval ({poll_ms}ms) must not exceed the grace window ({grace_ms}ms)")]
    PollExceedsGrace { poll_ms: u64, grace_ms: u64 },

    #[error("Context size must be between 512 and 1,000,000, got {0}")]
    InvalidContextSize(u64),

    #[error("GPU layer count must be zero or positive, got {0}")]
    InvalidGpuLayers(i32),

    #[error("Readiness path must start with '/', got {0:?}")]
    InvalidReadinessPath(String),
}

/// Validate settings values.
pub fn validate_settings(settings: &SupervisorSettings) -> Result<(), SettingsError> {
    let durations = [
        ("startup_timeout_secs", settings.startup_timeout_secs),
        ("stop_grace_secs", settings.stop_grace_secs),
        ("stop_poll_ms", settings.stop_poll_ms),
        ("kill_wait_secs", settings.kill_wait_secs),
        ("probe_interval_ms", settings.probe_interval_ms),
        ("probe_request_timeout_secs", settings.probe_request_timeout_secs),
    ];
    for (name, value) in durations {
        if value == Some(0) {
            return Err(SettingsError::ZeroDuration(name));
        }
    }

    let poll = settings.stop_poll_interval();
    let grace = settings.stop_grace();
    if poll > grace {
        return Err(SettingsError::PollExceedsGrace {
            poll_ms: u64::try_from(poll.as_millis()).unwrap_or(u64::MAX),
            grace_ms: u64::try_from(grace.as_millis()).unwrap_or(u64::MAX),
        });
    }

    if let Some(ctx_size) = settings.default_context_size {
        if !(512..=1_000_000).contains(&ctx_size) {
            return Err(SettingsError::InvalidContextSize(ctx_size));
        }
    }

    if let Some(layers) = settings.default_gpu_layers {
        if layers < 0 {
            return Err(SettingsError::InvalidGpuLayers(layers));
        }
    }

    if let Some(path) = &settings.readiness_path {
        if !path.starts_with('/') {
            return Err(SettingsError::InvalidReadinessPath(path.clone()));
        }
    }

    Ok(())
}
