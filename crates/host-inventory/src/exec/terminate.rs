//! Two-phase termination of isolated interpreter processes.
//!
//! A stop is first requested, the process gets a bounded grace period, and
//! whatever is still alive afterwards is force-killed. Both phases address
//! the whole process tree rooted at the interpreter.

use std::io;
use std::process::{Child, Command};
use std::time::Duration;

use wait_timeout::ChildExt;

pub trait ProcessTerminator: Send + Sync {
    /// Ask the process tree rooted at `pid` to exit.
    ///
    /// Returns an [`io::ErrorKind::Unsupported`] error when the platform has
    /// no way to ask; termination then skips the grace period.
    fn request_stop(&self, pid: u32) -> io::Result<()>;

    /// Kill the process tree rooted at `pid` without negotiation.
    fn force_kill(&self, pid: u32) -> io::Result<()>;
}

/// Terminator backed by the operating system.
///
/// On Unix the isolated interpreter leads its own process group, so both
/// phases signal the group (`SIGTERM`, then `SIGKILL`). On Windows only the
/// forced phase exists: `taskkill /T /F` walks the process tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTerminator;

#[cfg(unix)]
impl ProcessTerminator for SystemTerminator {
    fn request_stop(&self, pid: u32) -> io::Result<()> {
        signal_group(pid, nix::sys::signal::Signal::SIGTERM)
    }

    fn force_kill(&self, pid: u32) -> io::Result<()> {
        signal_group(pid, nix::sys::signal::Signal::SIGKILL)
    }
}

#[cfg(unix)]
fn signal_group(pid: u32, signal: nix::sys::signal::Signal) -> io::Result<()> {
    let pgid = i32::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, format!("pid {pid} out of range")))?;
    nix::sys::signal::killpg(nix::unistd::Pid::from_raw(pgid), signal).map_err(io::Error::from)
}

#[cfg(windows)]
impl ProcessTerminator for SystemTerminator {
    /// The interpreter runs windowless on a console of its own: `taskkill`
    /// without `/F` posts `WM_CLOSE`, which it never receives, and
    /// `CTRL_BREAK_EVENT` only reaches process groups on the caller's console.
    fn request_stop(&self, _pid: u32) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "windowless console processes cannot be asked to stop",
        ))
    }

    fn force_kill(&self, pid: u32) -> io::Result<()> {
        run_taskkill(&["/T", "/F", "/PID", &pid.to_string()])
    }
}

#[cfg(windows)]
fn run_taskkill(args: &[&str]) -> io::Result<()> {
    use std::process::Stdio;

    let status = Command::new(crate::windows_cmd::TASKKILL_EXE)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()?;
    if status.success() {
        Ok(())
    } else {
        Err(io::Error::other(format!("taskkill {} exited with {status}", args.join(" "))))
    }
}

/// Put the interpreter in a fresh process group (Unix) or console process
/// group (Windows) so its descendants can be signalled together.
pub(crate) fn isolate_process_tree(command: &mut Command) {
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;
        command.creation_flags(CREATE_NEW_PROCESS_GROUP | CREATE_NO_WINDOW);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Exited within the grace period after the stop request.
    Graceful,
    /// Force-killed, either after the grace period ran out or because no
    /// stop request could be delivered.
    Forced,
}

/// Stop `child` and its descendants, escalating after `grace`. The child is
/// always reaped before this returns.
pub(crate) fn terminate_tree(
    child: &mut Child,
    terminator: &dyn ProcessTerminator,
    grace: Duration,
) -> Termination {
    let pid = child.id();
    match terminator.request_stop(pid) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::Unsupported => {
            tracing::debug!(pid, error = %err, "stop request unsupported, forcing kill");
            return force_tree(child, terminator);
        }
        Err(err) => tracing::debug!(pid, error = %err, "stop request failed"),
    }

    if let Ok(Some(_)) = child.wait_timeout(grace) {
        // Sweep descendants that outlived the leader; usually nothing is left.
        let _ = terminator.force_kill(pid);
        return Termination::Graceful;
    }

    tracing::warn!(
        pid,
        grace_ms = grace.as_millis() as u64,
        "interpreter ignored stop request, forcing kill"
    );
    force_tree(child, terminator)
}

fn force_tree(child: &mut Child, terminator: &dyn ProcessTerminator) -> Termination {
    let pid = child.id();
    if let Err(err) = terminator.force_kill(pid) {
        tracing::debug!(pid, error = %err, "forced tree kill failed");
    }
    let _ = child.kill();
    let _ = child.wait();
    Termination::Forced
}
