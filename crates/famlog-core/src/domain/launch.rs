//! Launch options for a managed model server.
//!
//! This is an intent-based configuration: it expresses what the caller wants
//! the server to look like, not how the command line is assembled.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Optional knobs for starting a model server.
///
/// Every field falls back to a documented default in
/// [`SupervisorSettings`](crate::SupervisorSettings) when left unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchOptions {
    /// Number of layers to offload to the GPU (defaults to the all-layers sentinel).
    pub gpu_layers: Option<i32>,
    /// Context window size in tokens.
    pub context_size: Option<u64>,
    /// CPU thread count (server default when unset).
    pub threads: Option<u32>,
    /// Multimodal projector artifact for vision models.
    pub projector_path: Option<PathBuf>,
    /// Flags passed through to the server verbatim.
    pub extra_args: Vec<String>,
    /// Per-call override of the startup readiness timeout.
    #[serde(with = "optional_secs")]
    pub startup_timeout: Option<Duration>,
}

impl LaunchOptions {
    /// Create options with every field left at its default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of GPU layers.
    #[must_use]
    pub const fn with_gpu_layers(mut self, layers: i32) -> Self {
        self.gpu_layers = Some(layers);
        self
    }

    /// Set the context size.
    #[must_use]
    pub const fn with_context_size(mut self, size: u64) -> Self {
        self.context_size = Some(size);
        self
    }

    /// Set the thread count.
    #[must_use]
    pub const fn with_threads(mut self, threads: u32) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Attach a multimodal projector artifact.
    #[must_use]
    pub fn with_projector(mut self, path: impl Into<PathBuf>) -> Self {
        self.projector_path = Some(path.into());
        self
    }

    /// Add extra arguments to pass to the server.
    #[must_use]
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    /// Override the startup readiness timeout for this launch.
    #[must_use]
    pub const fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = Some(timeout);
        self
    }
}

mod optional_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, ser: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => ser.serialize_some(&d.as_secs()),
            None => ser.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(de)?.map(Duration::from_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let opts = LaunchOptions::new()
            .with_gpu_layers(20)
            .with_context_size(4096)
            .with_threads(8)
            .with_projector("/models/mmproj.gguf")
            .with_extra_args(vec!["--jinja".to_string()])
            .with_startup_timeout(Duration::from_secs(5));

        assert_eq!(opts.gpu_layers, Some(20));
        assert_eq!(opts.context_size, Some(4096));
        assert_eq!(opts.threads, Some(8));
        assert_eq!(opts.projector_path, Some(PathBuf::from("/models/mmproj.gguf")));
        assert_eq!(opts.extra_args, vec!["--jinja"]);
        assert_eq!(opts.startup_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let opts: LaunchOptions = serde_json::from_str(r#"{"context_size": 2048}"#).unwrap();
        assert_eq!(opts.context_size, Some(2048));
        assert_eq!(opts.gpu_layers, None);
        assert!(opts.extra_args.is_empty());
        assert_eq!(opts.startup_timeout, None);
    }

    #[test]
    fn startup_timeout_is_expressed_in_seconds() {
        let opts = LaunchOptions::new().with_startup_timeout(Duration::from_secs(30));
        let json = serde_json::to_value(&opts).unwrap();
        assert_eq!(json["startup_timeout"], 30);
    }
}
