//! Process management for model servers.
//!
//! # Structure
//!
//! - `ProcessRegistry` / `ManagedServer` - port-keyed ownership of running servers
//! - `ReadinessProber` - startup readiness polling with crash detection
//! - `ServerLogFile` - per-port append-mode log sink
//! - `shutdown` - two-phase process group termination

mod logs;
mod readiness;
mod registry;
pub mod shutdown;

pub use logs::{ServerLogFile, log_path_for};
pub use readiness::{ProbeResponse, ReadinessProber};
pub use registry::{Liveness, LivenessCheck, ManagedServer, ProcessRegistry};
pub use shutdown::{StopPolicy, StopReport, stop_process_group};
