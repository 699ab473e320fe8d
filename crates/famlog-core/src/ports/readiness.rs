//! Terminal classifications of a startup readiness wait.

use serde::{Deserialize, Serialize};

/// How a readiness wait ended.
///
/// A crash always wins over a timeout: a process observed to exit before a
/// ready response is `Crashed` even when the timeout window has not elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReadinessOutcome {
    /// The server answered the readiness endpoint with an "ok" status.
    Ready {
        /// Probe attempts made, including the successful one.
        attempts: u32,
    },
    /// The server process exited before it became ready.
    Crashed {
        /// Exit code when the process exited normally.
        exit_code: Option<i32>,
    },
    /// The window elapsed with the process alive and never ready.
    TimedOut {
        /// Probe attempts made before giving up.
        attempts: u32,
    },
}

impl ReadinessOutcome {
    /// Check if the outcome is `Ready`.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_tag() {
        let json = serde_json::to_string(&ReadinessOutcome::Crashed { exit_code: Some(2) }).unwrap();
        assert_eq!(json, r#"{"outcome":"crashed","exit_code":2}"#);
        assert!(ReadinessOutcome::Ready { attempts: 1 }.is_ready());
        assert!(!ReadinessOutcome::TimedOut { attempts: 5 }.is_ready());
    }
}
