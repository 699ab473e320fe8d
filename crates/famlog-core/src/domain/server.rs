//! Descriptor of a tracked, ready model server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Address every managed server binds to. Servers are never exposed on a
/// public interface.
pub const LOOPBACK_HOST: &str = "127.0.0.1";

/// Snapshot of a managed server as seen by callers.
///
/// The OpenAI-compatible endpoint of a managed server ignores the `model`
/// field of incoming requests and always answers with the artifact it was
/// launched with. `model_path` is therefore the only trustworthy record of
/// which model produced a completion; callers should address servers by
/// port via [`base_url`](Self::base_url) and never by model name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveServer {
    /// Port the server listens on (registry key).
    pub port: u16,
    /// Model artifact the process was started with.
    pub model_path: PathBuf,
    /// OS process id of the group leader, if still known.
    pub pid: Option<u32>,
    /// When the process was spawned.
    pub started_at: DateTime<Utc>,
    /// Per-port output log of the process.
    pub log_path: PathBuf,
}

impl ActiveServer {
    /// Base URL of the OpenAI-compatible API (`http://127.0.0.1:<port>/v1`).
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{LOOPBACK_HOST}:{}/v1", self.port)
    }

    /// Full URL of the chat-completion endpoint.
    #[must_use]
    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url())
    }

    /// File name of the served model, for display.
    #[must_use]
    pub fn model_name(&self) -> String {
        self.model_path.file_name().map_or_else(
            || self.model_path.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        )
    }
}
