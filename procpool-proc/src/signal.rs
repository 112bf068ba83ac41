//! Sending signals to a worker process by pid, independent of whether this
//! process is still the `tokio::process::Child`'s owner (needed when a
//! worker was discovered via stats reporting rather than spawned locally).

use crate::error::{ProcError, ProcResult};

/// Sends `SIGKILL` to `pid`. Used for forceful teardown when graceful
/// `TERMINATE` has no chance to be honored (e.g. test harnesses simulating
/// a crash).
#[cfg(unix)]
pub fn kill(pid: u32) -> ProcResult<()> {
    send_signal(pid, nix::sys::signal::Signal::SIGKILL)
}

#[cfg(unix)]
fn send_signal(pid: u32, signal: nix::sys::signal::Signal) -> ProcResult<()> {
    use nix::unistd::Pid;

    nix::sys::signal::kill(Pid::from_raw(pid as i32), signal)
        .map_err(|errno| ProcError::process_error(format!("signal {pid}"), errno.to_string()))
}

#[cfg(not(unix))]
pub fn kill(_pid: u32) -> ProcResult<()> {
    Err(ProcError::process_error(
        "kill",
        "sending signals by pid is only supported on unix targets",
    ))
}
