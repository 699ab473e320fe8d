//! Core domain types and port definitions for the famlog model supervisor.
//!
//! This crate carries no process, filesystem-watching or HTTP code. It
//! defines what the supervisor is asked to do (`LaunchOptions`), what it
//! reports back (`ActiveServer`, `StopOutcome`, `ReadinessOutcome`), how it
//! fails (`SupervisorError`), and the narrow control interface that the
//! rest of the note-taking pipeline consumes (`ModelSupervisorPort`).

pub mod domain;
pub mod paths;
pub mod ports;
pub mod settings;

pub use domain::{ActiveServer, LOOPBACK_HOST, LaunchOptions};
pub use paths::{PathError, default_log_dir, resolve_log_dir};
pub use ports::{
    ModelSupervisorPort, ReadinessOutcome, StopOutcome, SupervisorError, SupervisorResult,
};
pub use settings::{
    DEFAULT_CONTEXT_SIZE, DEFAULT_GPU_LAYERS, DEFAULT_READINESS_PATH, SettingsError,
    SupervisorSettings, validate_settings,
};
