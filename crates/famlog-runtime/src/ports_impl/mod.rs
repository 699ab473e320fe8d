//! Port implementations for famlog-runtime.
//!
//! These adapters connect the abstract ports defined in famlog-core to the
//! process infrastructure in this crate.

pub mod model_supervisor;

pub use model_supervisor::SupervisorPortImpl;
