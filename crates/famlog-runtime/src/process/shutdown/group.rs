//! Platform termination primitives for a managed process group.
//!
//! The stop state machine only needs two capabilities from the host:
//! "ask this unit and everything it spawned to exit" and "make it exit now".
//! On Unix both are signals to the process group the server leads. Other
//! platforms have no graceful request, so only the forced path exists.

use std::io;
use tokio::process::Child;

#[cfg(unix)]
use nix::errno::Errno;
#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// What happened to a termination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The request reached at least one live process.
    Sent,
    /// No such process or group exists anymore.
    Gone,
    /// The platform has no such request; escalate instead.
    Unsupported,
}

/// Ask the process group led by `child` to terminate.
pub fn request_graceful(child: &Child) -> io::Result<Delivery> {
    #[cfg(unix)]
    {
        match child.id() {
            Some(pid) => signal_group(pid, Signal::SIGTERM),
            None => Ok(Delivery::Gone),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = child;
        Ok(Delivery::Unsupported)
    }
}

/// Force the process group led by `child` to terminate.
pub fn force_kill(child: &mut Child) -> io::Result<Delivery> {
    #[cfg(unix)]
    {
        match child.id() {
            Some(pid) => signal_group(pid, Signal::SIGKILL),
            None => Ok(Delivery::Gone),
        }
    }

    #[cfg(not(unix))]
    {
        match child.start_kill() {
            Ok(()) => Ok(Delivery::Sent),
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => Ok(Delivery::Gone),
            Err(e) => Err(e),
        }
    }
}

/// Best-effort synchronous forced kill by pid, for drop paths.
pub fn force_kill_pid(pid: u32) {
    #[cfg(unix)]
    {
        let _ = signal_group(pid, Signal::SIGKILL);
    }

    #[cfg(not(unix))]
    {
        let _ = pid;
    }
}

/// Kill whatever is left of the group once its leader has been reaped.
///
/// Only the group is signalled, never the pid itself: a reaped leader's pid
/// may already belong to an unrelated process.
pub fn kill_group_remnants(pgid: u32) -> Delivery {
    #[cfg(unix)]
    {
        let Ok(raw) = i32::try_from(pgid) else {
            return Delivery::Gone;
        };
        match signal::killpg(Pid::from_raw(raw), Signal::SIGKILL) {
            Ok(()) => Delivery::Sent,
            Err(_) => Delivery::Gone,
        }
    }

    #[cfg(not(unix))]
    {
        let _ = pgid;
        Delivery::Unsupported
    }
}

/// Signal the group led by `pid`, falling back to the pid itself when the
/// process never became a group leader.
#[cfg(unix)]
fn signal_group(pid: u32, sig: Signal) -> io::Result<Delivery> {
    let raw = i32::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
    let pid = Pid::from_raw(raw);

    match signal::killpg(pid, sig) {
        Ok(()) => return Ok(Delivery::Sent),
        Err(Errno::ESRCH) => {}
        Err(e) => return Err(io::Error::other(e)),
    }

    match signal::kill(pid, sig) {
        Ok(()) => Ok(Delivery::Sent),
        Err(Errno::ESRCH) => Ok(Delivery::Gone),
        Err(e) => Err(io::Error::other(e)),
    }
}
