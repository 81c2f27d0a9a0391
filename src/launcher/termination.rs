//! Graceful and forced termination of a spawned child.

use std::io;
use std::process::{Child, ExitStatus};
use std::time::{Duration, Instant};

/// Interval between liveness polls while waiting for an exit.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Ask the child to shut down through its own handling.
#[cfg(unix)]
pub fn request_graceful(child: &mut Child) -> io::Result<()> {
    let pid = libc::pid_t::try_from(child.id())
        .map_err(|_| io::Error::other("pid out of range"))?;

    let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
    if rc == -1 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}

/// Windows offers no graceful request to a process without a console window,
/// so this is `TerminateProcess`.
#[cfg(windows)]
pub fn request_graceful(child: &mut Child) -> io::Result<()> {
    child.kill()
}

/// Poll until the child exits or `timeout` elapses.
///
/// Returns `None` when the child is still alive at the deadline.
pub fn wait_for_exit(child: &mut Child, timeout: Duration) -> io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        std::thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

/// Kill the child and reap it.
pub fn force_kill(child: &mut Child) -> io::Result<ExitStatus> {
    child.kill()?;
    child.wait()
}
