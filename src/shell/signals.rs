//! Interrupt and stop-signal handling for the interactive shell.
//!
//! Handlers may run at any instruction boundary of the main loop, including
//! between `fork` and `exec`. They only touch [`FOREGROUND_ONLY`] and issue raw
//! `write(2)` calls on stdout: no allocation, no locks, no buffered I/O.

use std::sync::atomic::{AtomicBool, Ordering};

use nix::libc;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};

use crate::errors::{Result, ResultExt};
use crate::util;

/// Set while `&` is being ignored. Toggled only by the SIGTSTP handler.
pub static FOREGROUND_ONLY: AtomicBool = AtomicBool::new(false);

const PROMPT_REDRAW: &[u8] = b"\n: ";
const ENTER_FOREGROUND_ONLY: &[u8] = b"\nEntering foreground-only mode (& is now ignored)\n: ";
const EXIT_FOREGROUND_ONLY: &[u8] = b"\nExiting foreground-only mode\n: ";

/// Installs the SIGINT and SIGTSTP handlers. Interrupted system calls are
/// restarted and every other signal is blocked while a handler runs.
pub fn install_handlers() -> Result<()> {
    let sigint = SigAction::new(
        SigHandler::Handler(handle_sigint),
        SaFlags::SA_RESTART,
        SigSet::all(),
    );
    let sigtstp = SigAction::new(
        SigHandler::Handler(handle_sigtstp),
        SaFlags::SA_RESTART,
        SigSet::all(),
    );

    // Safe: both handlers are async-signal-safe.
    unsafe {
        signal::sigaction(Signal::SIGINT, &sigint).chain_err(|| "failed to install SIGINT handler")?;
        signal::sigaction(Signal::SIGTSTP, &sigtstp)
            .chain_err(|| "failed to install SIGTSTP handler")?;
    }

    debug!("installed SIGINT and SIGTSTP handlers");
    Ok(())
}

/// Whether background requests are currently ignored.
pub fn is_foreground_only() -> bool {
    FOREGROUND_ONLY.load(Ordering::SeqCst)
}

extern "C" fn handle_sigint(_: libc::c_int) {
    write_stdout(PROMPT_REDRAW);
}

extern "C" fn handle_sigtstp(_: libc::c_int) {
    let was_foreground_only = FOREGROUND_ONLY.fetch_xor(true, Ordering::SeqCst);
    if was_foreground_only {
        write_stdout(EXIT_FOREGROUND_ONLY);
    } else {
        write_stdout(ENTER_FOREGROUND_ONLY);
    }
}

fn write_stdout(message: &[u8]) {
    util::write_raw(libc::STDOUT_FILENO, message);
}
