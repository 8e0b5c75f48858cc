// src/exec/process.rs

//! Process-group aware spawning and teardown.
//!
//! On unix every child is made the leader of a fresh process group, so the
//! launcher and everything it forks (build tools, the server itself) can be
//! signalled as one unit with `killpg`. Elsewhere only the direct child is
//! killed.

use std::time::Duration;

use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// Upper bound on waiting for a killed group to disappear.
const GROUP_EXIT_WAIT: Duration = Duration::from_secs(1);
const GROUP_POLL: Duration = Duration::from_millis(20);

/// Put the command's child into its own process group.
pub fn isolate_group(cmd: &mut Command) {
    #[cfg(unix)]
    cmd.process_group(0);
    #[cfg(not(unix))]
    let _ = cmd;
}

/// Stop `child` and every process in its group.
///
/// SIGTERM first, then after `grace` (or as soon as the leader exits) SIGKILL
/// for whatever is left. `pgid` must be the pid captured right after spawn,
/// since `child.id()` is gone once the leader has been reaped. Returns once
/// the group is empty or [`GROUP_EXIT_WAIT`] has passed.
pub async fn terminate_tree(child: &mut Child, pgid: Option<u32>, grace: Duration) {
    #[cfg(unix)]
    if let Some(pgid) = pgid {
        use nix::sys::signal::Signal;

        signal_group(pgid, Signal::SIGTERM);
        if tokio::time::timeout(grace, child.wait()).await.is_err() {
            debug!(pgid, "process group ignored SIGTERM within grace period");
        }
        signal_group(pgid, Signal::SIGKILL);
    }
    #[cfg(not(unix))]
    let _ = (pgid, grace);

    if let Err(e) = child.kill().await {
        debug!(error = %e, "child already gone while killing");
    }

    #[cfg(unix)]
    if let Some(pgid) = pgid {
        wait_group_empty(pgid).await;
    }
}

/// After the leader exited on its own, kill anything it left behind in its
/// group so the next unit can bind the port.
pub async fn reap_group(pgid: Option<u32>) {
    #[cfg(unix)]
    if let Some(pgid) = pgid {
        if signal_group(pgid, nix::sys::signal::Signal::SIGKILL) {
            debug!(pgid, "killed leftover processes in exited unit's group");
            wait_group_empty(pgid).await;
        }
    }
    #[cfg(not(unix))]
    let _ = pgid;
}

/// Poll with a null signal until no process is left in the group.
#[cfg(unix)]
async fn wait_group_empty(pgid: u32) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pgid) else {
        return;
    };
    let deadline = tokio::time::Instant::now() + GROUP_EXIT_WAIT;
    while killpg(Pid::from_raw(raw), None::<Signal>).is_ok() {
        if tokio::time::Instant::now() >= deadline {
            warn!(pgid, "process group still has members after SIGKILL");
            return;
        }
        tokio::time::sleep(GROUP_POLL).await;
    }
}

/// Returns true if at least one process received the signal.
#[cfg(unix)]
fn signal_group(pgid: u32, signal: nix::sys::signal::Signal) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::killpg;
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pgid) else {
        return false;
    };
    match killpg(Pid::from_raw(raw), signal) {
        Ok(()) => true,
        Err(Errno::ESRCH) => false,
        Err(e) => {
            warn!(pgid, ?signal, error = %e, "failed to signal process group");
            false
        }
    }
}
