//! Startup readiness probing for model servers.
//!
//! A server is ready when its readiness endpoint answers HTTP 200 with a JSON
//! body whose `status` is `"ok"`. llama-server answers 503 while the model is
//! still loading, so anything else counts as "not yet".
//!
//! Liveness is checked before every probe so a crashed process is reported
//! as such instead of waiting out the full window.

use famlog_core::{LOOPBACK_HOST, ReadinessOutcome, SupervisorSettings};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use super::registry::{Liveness, LivenessCheck};

/// Floor for a single request's timeout near the end of the window.
const MIN_REQUEST_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug, Deserialize)]
struct HealthBody {
    status: Option<String>,
}

/// Result of one readiness request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResponse {
    Ready,
    /// Answered, but not with a 200 "ok".
    NotReady { status: StatusCode },
    /// Connection refused, request timeout or unparseable body.
    Unreachable(String),
}

impl ProbeResponse {
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

#[derive(Debug, Clone, Copy)]
enum ProbeState {
    Probing { attempt: u32 },
    Done(ReadinessOutcome),
}

/// Polls a server's readiness endpoint.
#[derive(Debug, Clone)]
pub struct ReadinessProber {
    client: Client,
    interval: Duration,
    request_timeout: Duration,
    readiness_path: String,
}

impl ReadinessProber {
    pub fn new(settings: &SupervisorSettings) -> Result<Self, reqwest::Error> {
        let request_timeout = settings.probe_request_timeout();
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            client,
            interval: settings.probe_interval(),
            request_timeout,
            readiness_path: settings.readiness_path().to_string(),
        })
    }

    /// Readiness URL for a port.
    pub fn health_url(&self, port: u16) -> String {
        format!("http://{LOOPBACK_HOST}:{port}{}", self.readiness_path)
    }

    /// Issue a single readiness request.
    pub async fn probe_once(&self, port: u16) -> ProbeResponse {
        self.probe_with_timeout(port, self.request_timeout).await
    }

    async fn probe_with_timeout(&self, port: u16, timeout: Duration) -> ProbeResponse {
        let response = match self
            .client
            .get(self.health_url(port))
            .timeout(timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return ProbeResponse::Unreachable(e.to_string()),
        };

        let status = response.status();
        if status != StatusCode::OK {
            return ProbeResponse::NotReady { status };
        }

        match response.json::<HealthBody>().await {
            Ok(body) if body.status.as_deref() == Some("ok") => ProbeResponse::Ready,
            Ok(body) => {
                debug!(port = %port, status = ?body.status, "Health endpoint not ok yet");
                ProbeResponse::NotReady { status }
            }
            Err(e) => ProbeResponse::Unreachable(format!("unexpected health body: {e}")),
        }
    }

    /// Wait until the server on `port` is ready, its process exits, or
    /// `timeout` elapses.
    ///
    /// Crash detection takes precedence: a process that exits inside the
    /// window is `Crashed` no matter how much of the window is left. The
    /// registry entry of a crashed process is evicted by `liveness`.
    pub async fn wait_ready(
        &self,
        port: u16,
        timeout: Duration,
        liveness: &dyn LivenessCheck,
    ) -> ReadinessOutcome {
        let deadline = Instant::now() + timeout;
        info!(url = %self.health_url(port), timeout_secs = timeout.as_secs(), "Waiting for model server");

        let mut state = ProbeState::Probing { attempt: 1 };
        loop {
            state = match state {
                ProbeState::Done(outcome) => return outcome,
                ProbeState::Probing { attempt } => match liveness.liveness(port).await {
                    Liveness::Exited { exit_code } => {
                        warn!(port = %port, exit_code = ?exit_code, attempt, "Model server exited during startup");
                        ProbeState::Done(ReadinessOutcome::Crashed { exit_code })
                    }
                    Liveness::Untracked => {
                        warn!(port = %port, "Model server vanished from registry during startup");
                        ProbeState::Done(ReadinessOutcome::Crashed { exit_code: None })
                    }
                    Liveness::Alive => self.attempt(port, attempt, deadline).await,
                },
            };
        }
    }

    async fn attempt(&self, port: u16, attempt: u32, deadline: Instant) -> ProbeState {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let request_timeout = self.request_timeout.min(remaining).max(MIN_REQUEST_TIMEOUT);

        match self.probe_with_timeout(port, request_timeout).await {
            ProbeResponse::Ready => {
                info!(port = %port, attempts = attempt, "Model server is ready");
                return ProbeState::Done(ReadinessOutcome::Ready { attempts: attempt });
            }
            ProbeResponse::NotReady { status } => {
                debug!(port = %port, attempt, status = %status, "Not ready yet");
            }
            ProbeResponse::Unreachable(reason) => {
                debug!(port = %port, attempt, reason = %reason, "Readiness probe failed");
            }
        }

        let now = Instant::now();
        if now >= deadline {
            return ProbeState::Done(ReadinessOutcome::TimedOut { attempts: attempt });
        }
        sleep(self.interval.min(deadline - now)).await;
        ProbeState::Probing {
            attempt: attempt + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{Json, Router, http::StatusCode as AxumStatus, routing::get};
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::net::TcpListener;

    /// Liveness source that reports `Alive` a fixed number of times, then
    /// the configured terminal state.
    struct ScriptedLiveness {
        alive_checks: u32,
        then: Liveness,
        calls: AtomicU32,
    }

    impl ScriptedLiveness {
        fn alive() -> Self {
            Self::alive_then(u32::MAX, Liveness::Alive)
        }

        fn alive_then(alive_checks: u32, then: Liveness) -> Self {
            Self {
                alive_checks,
                then,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl LivenessCheck for ScriptedLiveness {
        async fn liveness(&self, _port: u16) -> Liveness {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.alive_checks {
                Liveness::Alive
            } else {
                self.then
            }
        }
    }

    fn fast_settings() -> SupervisorSettings {
        SupervisorSettings {
            probe_interval_ms: Some(100),
            probe_request_timeout_secs: Some(1),
            ..SupervisorSettings::default()
        }
    }

    fn unused_port() -> u16 {
        std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port()
    }

    async fn serve(router: Router) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });
        port
    }

    #[tokio::test]
    async fn ok_status_is_ready() {
        let port = serve(Router::new().route("/health", get(|| async { Json(json!({"status": "ok"})) }))).await;
        let prober = ReadinessProber::new(&fast_settings()).unwrap();

        assert_eq!(prober.probe_once(port).await, ProbeResponse::Ready);
        let outcome = prober
            .wait_ready(port, Duration::from_secs(5), &ScriptedLiveness::alive())
            .await;
        assert_eq!(outcome, ReadinessOutcome::Ready { attempts: 1 });
    }

    #[tokio::test]
    async fn loading_response_is_not_ready() {
        let port = serve(Router::new().route(
            "/health",
            get(|| async {
                (
                    AxumStatus::SERVICE_UNAVAILABLE,
                    Json(json!({"error": {"code": 503, "message": "Loading model"}})),
                )
            }),
        ))
        .await;
        let prober = ReadinessProber::new(&fast_settings()).unwrap();

        assert!(matches!(
            prober.probe_once(port).await,
            ProbeResponse::NotReady { status } if status == StatusCode::SERVICE_UNAVAILABLE
        ));
    }

    #[tokio::test]
    async fn ok_code_without_ok_status_is_not_ready() {
        let port = serve(Router::new().route("/health", get(|| async { Json(json!({"status": "loading"})) }))).await;
        let prober = ReadinessProber::new(&fast_settings()).unwrap();
        assert!(!prober.probe_once(port).await.is_ready());
    }

    #[tokio::test]
    async fn times_out_when_nothing_listens() {
        let port = unused_port();
        let prober = ReadinessProber::new(&fast_settings()).unwrap();

        let started = Instant::now();
        let outcome = prober
            .wait_ready(port, Duration::from_secs(1), &ScriptedLiveness::alive())
            .await;
        let elapsed = started.elapsed();

        assert!(matches!(outcome, ReadinessOutcome::TimedOut { attempts } if attempts > 1));
        assert!(elapsed >= Duration::from_secs(1));
        assert!(elapsed < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn crash_beats_timeout() {
        let port = unused_port();
        let prober = ReadinessProber::new(&fast_settings()).unwrap();
        let liveness = ScriptedLiveness::alive_then(2, Liveness::Exited { exit_code: Some(1) });

        let started = Instant::now();
        let outcome = prober
            .wait_ready(port, Duration::from_secs(60), &liveness)
            .await;

        assert_eq!(outcome, ReadinessOutcome::Crashed { exit_code: Some(1) });
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn vanished_entry_counts_as_crash() {
        let prober = ReadinessProber::new(&fast_settings()).unwrap();
        let liveness = ScriptedLiveness::alive_then(0, Liveness::Untracked);
        let outcome = prober
            .wait_ready(unused_port(), Duration::from_secs(60), &liveness)
            .await;
        assert_eq!(outcome, ReadinessOutcome::Crashed { exit_code: None });
    }

    #[test]
    fn health_url_uses_loopback_and_configured_path() {
        let settings = SupervisorSettings {
            readiness_path: Some("/v1/health".to_string()),
            ..SupervisorSettings::default()
        };
        let prober = ReadinessProber::new(&settings).unwrap();
        assert_eq!(prober.health_url(8080), "http://127.0.0.1:8080/v1/health");
    }
}
