use std::os::unix::io::{BorrowedFd, RawFd};
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

use nix::sys::wait::WaitStatus;
use nix::unistd;

/// Unbuffered `write(2)` of `message` to `fd`, ignoring failures.
///
/// Async-signal-safe: usable from signal handlers and between `fork` and `exec`.
pub(crate) fn write_raw(fd: RawFd, message: &[u8]) {
    // Safe: callers only pass the standard descriptors, which stay open.
    let fd = unsafe { BorrowedFd::borrow_raw(fd) };
    let _ = unistd::write(fd, message);
}

/// Smallsh Utility Extensions for `ExitStatus`
pub trait SmallshExitStatusExt {
    /// Create an ExitStatus to indicate *successful* program execution.
    fn from_success() -> Self;

    /// Create an ExitStatus to indicate *unsuccessful* program execution.
    fn from_failure() -> Self;

    /// Create an ExitStatus from a status code
    fn from_status(code: i32) -> Self;

    /// Create an ExitStatus for a process terminated by signal number `signal`.
    fn from_signal(signal: i32) -> Self;

    /// Converts a reaped `WaitStatus`. Returns `None` for statuses that do not
    /// represent termination, e.g. `StillAlive` from a `WNOHANG` poll.
    fn from_wait_status(wait_status: WaitStatus) -> Option<Self>
    where
        Self: Sized;

    /// Human readable outcome, either `exit value N` or `terminated by signal N`.
    fn describe(&self) -> String;
}

impl SmallshExitStatusExt for ExitStatus {
    /// # Examples
    /// ```rust
    /// use smallsh::SmallshExitStatusExt;
    /// use std::process::ExitStatus;
    /// assert!(ExitStatus::from_success().success());
    /// ```
    fn from_success() -> Self {
        ExitStatus::from_status(0)
    }

    /// # Examples
    /// ```rust
    /// use smallsh::SmallshExitStatusExt;
    /// use std::process::ExitStatus;
    /// assert!(!ExitStatus::from_failure().success());
    /// ```
    fn from_failure() -> Self {
        ExitStatus::from_status(1)
    }

    /// # Examples
    /// ```rust
    /// use smallsh::SmallshExitStatusExt;
    /// use std::process::ExitStatus;
    /// assert!(ExitStatus::from_status(0).success());
    /// assert_eq!(ExitStatus::from_status(3).code(), Some(3));
    /// ```
    fn from_status(code: i32) -> Self {
        ExitStatus::from_raw((code & 0xff) << 8)
    }

    fn from_signal(signal: i32) -> Self {
        ExitStatus::from_raw(signal & 0x7f)
    }

    fn from_wait_status(wait_status: WaitStatus) -> Option<Self> {
        match wait_status {
            WaitStatus::Exited(_, code) => Some(ExitStatus::from_status(code)),
            WaitStatus::Signaled(_, signal, _) => Some(ExitStatus::from_signal(signal as i32)),
            _ => None,
        }
    }

    fn describe(&self) -> String {
        match (self.code(), self.signal()) {
            (Some(code), _) => format!("exit value {}", code),
            (None, Some(signal)) => format!("terminated by signal {}", signal),
            (None, None) => format!("unknown status {}", self.into_raw()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use nix::sys::signal::Signal;
    use nix::unistd::Pid;

    #[test]
    fn describe_normal_exit() {
        assert_eq!(ExitStatus::from_status(0).describe(), "exit value 0");
        assert_eq!(ExitStatus::from_status(1).describe(), "exit value 1");
        assert_eq!(ExitStatus::from_status(255).describe(), "exit value 255");
    }

    #[test]
    fn describe_signal_termination() {
        assert_eq!(ExitStatus::from_signal(15).describe(), "terminated by signal 15");
        assert_eq!(ExitStatus::from_signal(2).describe(), "terminated by signal 2");
    }

    #[test]
    fn from_wait_status_ignores_still_alive() {
        assert!(ExitStatus::from_wait_status(WaitStatus::StillAlive).is_none());

        let pid = Pid::from_raw(42);
        let exited = ExitStatus::from_wait_status(WaitStatus::Exited(pid, 7)).unwrap();
        assert_eq!(exited.code(), Some(7));

        let signaled =
            ExitStatus::from_wait_status(WaitStatus::Signaled(pid, Signal::SIGKILL, false))
                .unwrap();
        assert_eq!(signaled.signal(), Some(9));
        assert_eq!(signaled.code(), None);
    }
}
