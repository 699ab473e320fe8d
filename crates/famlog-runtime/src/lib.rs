//! Process runtime for the famlog model supervisor.
//!
//! Spawns `llama-server` processes, tracks them by port, waits for them to
//! become ready and tears them down again. Everything above this crate talks
//! to it through [`famlog_core::ModelSupervisorPort`].

#![deny(unsafe_code)]

mod binary;
mod command;
pub mod ports_impl;
pub mod process;
mod supervisor;

pub use binary::{DEFAULT_SERVER_BINARY, ServerBinaryError, resolve_server_binary, validate_binary};
pub use command::ServerInvocation;
pub use ports_impl::SupervisorPortImpl;
pub use process::{ProbeResponse, ReadinessProber, log_path_for};
pub use supervisor::ModelSupervisor;
