//! Domain types shared by the supervisor and its callers.

mod launch;
mod server;

pub use launch::LaunchOptions;
pub use server::{ActiveServer, LOOPBACK_HOST};
