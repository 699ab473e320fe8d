//! The `famlog` command-line front end.
//!
//! Everything here is composition and presentation; lifecycle behaviour lives
//! in `famlog-runtime` and is reached only through `ModelSupervisorPort`.

#![deny(unsafe_code)]

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;

// Re-export primary types for convenient access
pub use bootstrap::{BinaryPolicy, CliConfig, CliContext, bootstrap, load_settings};
pub use commands::{Commands, LaunchArgs};
pub use error::CliError;
pub use parser::Cli;
