//! Runs non-builtin commands in a child process.
//!
//! Everything the child needs (argument vector, redirect paths, diagnostics) is
//! prepared before `fork`. The only allocation in the child is the argv pointer
//! array `execvp` builds, which is sound because the shell is single-threaded.
//! A program that cannot be executed is only discovered inside the child, which
//! reports it on stderr and exits with status 1.

use std::ffi::CString;
use std::io::Write;
use std::os::unix::io::RawFd;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

use nix::errno::Errno;
use nix::fcntl::{self, OFlag};
use nix::libc;
use nix::sys::signal::{self, SigHandler, Signal};
use nix::sys::stat::Mode;
use nix::sys::wait;
use nix::unistd::{self, ForkResult, Pid};

use crate::errors::{ErrorKind, Result, ResultExt};
use crate::parse::CommandLine;
use crate::shell::job_control::JobManager;
use crate::util::{self, SmallshExitStatusExt};

const NULL_DEVICE: &str = "/dev/null";
const CHILD_FAILURE_EXIT_STATUS: i32 = 1;

/// How a launched command was handled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Launch {
    /// Ran in the foreground and terminated with this status.
    Foreground(ExitStatus),
    /// Detached and registered with the job manager.
    Background(Pid),
}

/// An `open` + `dup2` to perform in the child.
#[derive(Debug)]
struct Redirect {
    path: CString,
    target: RawFd,
    flags: OFlag,
    mode: Mode,
    diagnostic: Vec<u8>,
}

impl Redirect {
    fn input(program: &str, path: &str) -> Result<Self> {
        Ok(Redirect {
            path: to_cstring(path)?,
            target: libc::STDIN_FILENO,
            flags: OFlag::O_RDONLY,
            mode: Mode::empty(),
            diagnostic: format!("{}: cannot open {} for input\n", program, path).into_bytes(),
        })
    }

    fn output(program: &str, path: &str) -> Result<Self> {
        Ok(Redirect {
            path: to_cstring(path)?,
            target: libc::STDOUT_FILENO,
            flags: OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
            mode: Mode::S_IRUSR | Mode::S_IWUSR | Mode::S_IRGRP | Mode::S_IROTH,
            diagnostic: format!("{}: cannot open {} for output\n", program, path).into_bytes(),
        })
    }

    /// Opens the file and moves it onto `target`, leaving no extra descriptor behind.
    fn apply(&self) -> nix::Result<()> {
        let fd = fcntl::open(self.path.as_c_str(), self.flags, self.mode)?;
        if fd != self.target {
            let result = unistd::dup2(fd, self.target);
            let _ = unistd::close(fd);
            result?;
        }
        Ok(())
    }
}

/// Spawns `command` in a child process.
///
/// A background request is honored only when `foreground_only` is false; the
/// job is then registered with `job_manager` and `background pid is <pid>` is
/// written to `stdout`. Otherwise this blocks until the child terminates.
pub fn spawn_command(
    command: &CommandLine,
    foreground_only: bool,
    job_manager: &mut JobManager,
    stdout: &mut dyn Write,
) -> Result<Launch> {
    let background = command.background && !foreground_only;
    if command.background && !background {
        debug!("foreground-only mode: running '{}' in the foreground", command.program());
    }

    let argv = command
        .arguments
        .iter()
        .map(|arg| to_cstring(arg))
        .collect::<Result<Vec<_>>>()?;
    let redirects = plan_redirects(command, background)?;

    // Buffered output would otherwise be lost or duplicated by the child.
    stdout.flush()?;

    // Safe: the shell has no other threads, so the child's heap and locks are
    // consistent until it reaches exec or _exit.
    match unsafe { unistd::fork() } {
        Ok(ForkResult::Child) => exec_child(&argv, &redirects, background),
        Ok(ForkResult::Parent { child }) => {
            debug!(
                "spawned '{}' as pid {} ({})",
                command.arguments.join(" "),
                child,
                if background { "background" } else { "foreground" }
            );
            if background {
                job_manager.add_job(child);
                writeln!(stdout, "background pid is {}", child)?;
                stdout.flush()?;
                Ok(Launch::Background(child))
            } else {
                let status = wait_for_process(child)?;
                if let Some(signal) = status.signal() {
                    writeln!(stdout, "terminated by signal {}", signal)?;
                    stdout.flush()?;
                }
                Ok(Launch::Foreground(status))
            }
        }
        Err(e) => Err(e).chain_err(|| ErrorKind::Fork),
    }
}

/// Explicit targets win; a background job without one gets the null device.
fn plan_redirects(command: &CommandLine, background: bool) -> Result<Vec<Redirect>> {
    let program = command.program();
    let mut redirects = Vec::with_capacity(2);

    match command.input_redirect {
        Some(ref path) => redirects.push(Redirect::input(program, path)?),
        None if background => redirects.push(Redirect::input(program, NULL_DEVICE)?),
        None => {}
    }

    match command.output_redirect {
        Some(ref path) => redirects.push(Redirect::output(program, path)?),
        None if background => redirects.push(Redirect::output(program, NULL_DEVICE)?),
        None => {}
    }

    Ok(redirects)
}

fn exec_child(argv: &[CString], redirects: &[Redirect], background: bool) -> ! {
    reset_signal_handlers(background);

    for redirect in redirects {
        if redirect.apply().is_err() {
            util::write_raw(libc::STDERR_FILENO, &redirect.diagnostic);
            exit_child(CHILD_FAILURE_EXIT_STATUS);
        }
    }

    let errno = match unistd::execvp(argv[0].as_c_str(), argv) {
        Ok(never) => match never {},
        Err(errno) => errno,
    };

    util::write_raw(libc::STDERR_FILENO, argv[0].as_bytes());
    util::write_raw(libc::STDERR_FILENO, b": ");
    util::write_raw(libc::STDERR_FILENO, errno.desc().as_bytes());
    util::write_raw(libc::STDERR_FILENO, b"\n");
    exit_child(CHILD_FAILURE_EXIT_STATUS)
}

fn reset_signal_handlers(background: bool) {
    let sigint = if background {
        SigHandler::SigIgn
    } else {
        SigHandler::SigDfl
    };

    // Safe: only dispositions are changed, no handlers are installed.
    unsafe {
        let _ = signal::signal(Signal::SIGINT, sigint);
        let _ = signal::signal(Signal::SIGTSTP, SigHandler::SigIgn);
        let _ = signal::signal(Signal::SIGPIPE, SigHandler::SigDfl);
    }
}

fn exit_child(code: i32) -> ! {
    // Safe: skips atexit handlers and stdio buffers that belong to the parent.
    unsafe { libc::_exit(code) }
}

/// Blocks until `pid` terminates.
fn wait_for_process(pid: Pid) -> Result<ExitStatus> {
    loop {
        match wait::waitpid(pid, None) {
            Ok(wait_status) => {
                if let Some(status) = ExitStatus::from_wait_status(wait_status) {
                    return Ok(status);
                }
            }
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

fn to_cstring(s: &str) -> Result<CString> {
    CString::new(s).chain_err(|| format!("{}: contains a nul byte", s.replace('\0', "\\0")))
}
