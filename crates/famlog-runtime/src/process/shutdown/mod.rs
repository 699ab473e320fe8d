//! Graceful process-group shutdown with escalation.
//!
//! - `group`: platform primitives (graceful request, forced kill)
//! - `stop`: the two-phase stop state machine built on top of them

mod group;
mod stop;

pub use group::{Delivery, force_kill, force_kill_pid, kill_group_remnants, request_graceful};
pub use stop::{StopPolicy, StopReport, stop_process_group};
