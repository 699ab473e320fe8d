//! Two-phase stop of a managed server: request graceful exit, wait out a
//! bounded grace window, then escalate to a forced kill.

use famlog_core::{StopOutcome, SupervisorSettings};
use std::process::ExitStatus;
use std::time::Duration;
use tokio::process::Child;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, error, warn};

use super::group::{Delivery, force_kill, kill_group_remnants, request_graceful};

/// Timing of a two-phase stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopPolicy {
    /// How long the group may take to exit after the graceful request.
    pub grace: Duration,
    /// Liveness poll interval inside the grace window.
    pub poll_interval: Duration,
    /// How long to wait for reaping after the forced kill.
    pub kill_wait: Duration,
}

impl StopPolicy {
    pub fn from_settings(settings: &SupervisorSettings) -> Self {
        Self {
            grace: settings.stop_grace(),
            poll_interval: settings.stop_poll_interval(),
            kill_wait: settings.kill_wait(),
        }
    }
}

impl Default for StopPolicy {
    fn default() -> Self {
        Self::from_settings(&SupervisorSettings::default())
    }
}

/// Result of a stop attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopReport {
    pub outcome: StopOutcome,
    /// Exit status, when the process was reaped.
    pub status: Option<ExitStatus>,
}

impl StopReport {
    const fn new(outcome: StopOutcome, status: Option<ExitStatus>) -> Self {
        Self { outcome, status }
    }
}

#[derive(Debug, Clone, Copy)]
enum StopPhase {
    RequestGraceful,
    AwaitExit { deadline: Instant },
    Escalate,
    AwaitReap,
}

/// Stop the process group led by `child`.
///
/// Never fails: anything unexpected escalates, and a process that survives a
/// forced kill is reported as [`StopOutcome::KillIneffective`] rather than
/// blocking the caller. Once the leader is reaped, anything still left in its
/// group is killed, so background children of a server that exited on its
/// own do not outlive it.
pub async fn stop_process_group(child: &mut Child, policy: &StopPolicy) -> StopReport {
    // tokio forgets the pid once the child is reaped.
    let leader = child.id();
    let report = run_phases(child, policy).await;
    if let (Some(pgid), Some(_)) = (leader, report.status) {
        if kill_group_remnants(pgid) == Delivery::Sent {
            debug!(pgid, outcome = ?report.outcome, "Killed processes left in group after leader exit");
        }
    }
    report
}

async fn run_phases(child: &mut Child, policy: &StopPolicy) -> StopReport {
    let mut phase = StopPhase::RequestGraceful;

    loop {
        phase = match phase {
            StopPhase::RequestGraceful => {
                if let Ok(Some(status)) = child.try_wait() {
                    return StopReport::new(StopOutcome::AlreadyExited, Some(status));
                }
                match request_graceful(child) {
                    Ok(Delivery::Sent) => StopPhase::AwaitExit {
                        deadline: Instant::now() + policy.grace,
                    },
                    Ok(Delivery::Gone) => {
                        let status = timeout(policy.kill_wait, child.wait())
                            .await
                            .ok()
                            .and_then(Result::ok);
                        return StopReport::new(StopOutcome::AlreadyExited, status);
                    }
                    Ok(Delivery::Unsupported) => StopPhase::Escalate,
                    Err(e) => {
                        warn!(error = %e, "Graceful termination request failed");
                        StopPhase::Escalate
                    }
                }
            }
            StopPhase::AwaitExit { deadline } => match child.try_wait() {
                Ok(Some(status)) => {
                    return StopReport::new(StopOutcome::Graceful, Some(status));
                }
                Ok(None) if Instant::now() >= deadline => {
                    warn!(
                        grace_ms = %policy.grace.as_millis(),
                        "Process ignored graceful termination, escalating"
                    );
                    StopPhase::Escalate
                }
                Ok(None) => {
                    sleep(policy.poll_interval).await;
                    StopPhase::AwaitExit { deadline }
                }
                Err(e) => {
                    warn!(error = %e, "Liveness check failed during stop");
                    StopPhase::Escalate
                }
            },
            StopPhase::Escalate => {
                match force_kill(child) {
                    Ok(delivery) => debug!(?delivery, "Forced kill delivered"),
                    Err(e) => warn!(error = %e, "Forced kill failed"),
                }
                StopPhase::AwaitReap
            }
            StopPhase::AwaitReap => {
                return match timeout(policy.kill_wait, child.wait()).await {
                    Ok(Ok(status)) => StopReport::new(StopOutcome::Forced, Some(status)),
                    Ok(Err(e)) => {
                        error!(error = %e, "Failed to reap force-killed process");
                        StopReport::new(StopOutcome::KillIneffective, None)
                    }
                    Err(_) => {
                        error!(
                            pid = ?child.id(),
                            wait_ms = %policy.kill_wait.as_millis(),
                            "Process survived forced kill; dropping it from tracking"
                        );
                        StopReport::new(StopOutcome::KillIneffective, None)
                    }
                };
            }
        };
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tokio::process::Command;

    fn quick_policy() -> StopPolicy {
        StopPolicy {
            grace: Duration::from_millis(500),
            poll_interval: Duration::from_millis(50),
            kill_wait: Duration::from_secs(5),
        }
    }

    fn spawn_sh(script: &str) -> Child {
        Command::new("/bin/sh")
            .arg("-c")
            .arg(script)
            .process_group(0)
            .spawn()
            .expect("failed to spawn sh")
    }

    #[tokio::test]
    async fn stop_responds_to_sigterm() {
        let mut child = spawn_sh("exec sleep 30");
        let report = stop_process_group(&mut child, &quick_policy()).await;
        assert_eq!(report.outcome, StopOutcome::Graceful);
        assert!(report.status.is_some());
    }

    #[tokio::test]
    async fn stop_escalates_when_sigterm_is_ignored() {
        let mut child = spawn_sh("trap '' TERM; exec sleep 30");
        // Give the shell time to install the trap before signalling.
        sleep(Duration::from_millis(200)).await;

        let started = Instant::now();
        let report = stop_process_group(&mut child, &quick_policy()).await;
        assert_eq!(report.outcome, StopOutcome::Forced);
        assert!(started.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn stop_handles_already_exited() {
        let mut child = spawn_sh("exit 0");
        sleep(Duration::from_millis(200)).await;

        let report = stop_process_group(&mut child, &quick_policy()).await;
        assert_eq!(report.outcome, StopOutcome::AlreadyExited);
        assert!(report.status.is_some_and(|s| s.success()));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn stop_kills_children_left_by_exited_leader() {
        use tokio::io::{AsyncBufReadExt, BufReader};

        let mut child = Command::new("/bin/sh")
            .arg("-c")
            .arg("sleep 30 & echo $!; exit 0")
            .stdout(std::process::Stdio::piped())
            .process_group(0)
            .spawn()
            .expect("failed to spawn sh");
        let stdout = child.stdout.take().unwrap();
        let mut line = String::new();
        BufReader::new(stdout).read_line(&mut line).await.unwrap();
        let orphan: u32 = line.trim().parse().unwrap();
        sleep(Duration::from_millis(200)).await;

        let report = stop_process_group(&mut child, &quick_policy()).await;
        assert_eq!(report.outcome, StopOutcome::AlreadyExited);

        sleep(Duration::from_millis(200)).await;
        assert!(!is_running(orphan));
    }

    /// A pid counts as running unless it is gone or a zombie.
    #[cfg(target_os = "linux")]
    fn is_running(pid: u32) -> bool {
        std::fs::read_to_string(format!("/proc/{pid}/stat")).is_ok_and(|stat| {
            stat.rsplit(')')
                .next()
                .is_some_and(|rest| !rest.trim_start().starts_with('Z'))
        })
    }
}
