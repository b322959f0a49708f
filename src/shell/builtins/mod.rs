//! Smallsh builtins
//!
//! This module includes the implementations of the commands the shell runs
//! itself instead of spawning a process: `cd`, `exit` and `status`.

use std::io::Write;

use crate::parse::CommandLine;
use crate::shell::Shell;

use self::dirs::Cd;
use self::exit::Exit;
use self::status::Status;

pub mod prelude {
    pub use std::io::Write;

    pub use crate::errors::{Error, ErrorKind, Result};
    pub use crate::shell::Shell;
    pub use crate::util::SmallshExitStatusExt;
}

mod dirs;
mod exit;
mod status;

const CD_NAME: &str = "cd";
const EXIT_NAME: &str = "exit";
const STATUS_NAME: &str = "status";

/// Represents a Smallsh builtin command such as cd or status.
pub trait BuiltinCommand {
    /// The NAME of the command.
    const NAME: &'static str;
    /// Runs the command with the given arguments in the `shell` environment.
    fn run(shell: &mut Shell, args: &[String], stdout: &mut dyn Write) -> prelude::Result<()>;
}

pub fn is_builtin<T: AsRef<str>>(program: T) -> bool {
    [CD_NAME, EXIT_NAME, STATUS_NAME].contains(&program.as_ref())
}

/// Runs `command` if it names a builtin, reporting any failure on stderr.
///
/// Returns `false`, without side effects, when `command` is not a builtin.
pub fn dispatch(shell: &mut Shell, command: &mut CommandLine, stdout: &mut dyn Write) -> bool {
    if !is_builtin(command.program()) {
        return false;
    }

    // cd always runs in the shell process itself.
    if command.program() == Cd::NAME {
        command.background = false;
    }

    let result = match command.program() {
        CD_NAME => Cd::run(shell, command.args(), stdout),
        EXIT_NAME => Exit::run(shell, command.args(), stdout),
        STATUS_NAME => Status::run(shell, command.args(), stdout),
        _ => unreachable!(),
    };

    if let Err(e) = result {
        debug!("builtin '{}' failed: {}", command.program(), e);
        eprintln!("{}", e);
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::parse::CommandLineBuilder;
    use crate::shell::ShellConfig;
    use crate::util::SmallshExitStatusExt;

    #[test]
    fn recognizes_builtins() {
        assert!(is_builtin("cd"));
        assert!(is_builtin("exit"));
        assert!(is_builtin("status"));
        assert!(!is_builtin("ls"));
        assert!(!is_builtin("Status"));
        assert!(!is_builtin("help"));
    }

    #[test]
    fn names_match_dispatch_table() {
        for name in &[Cd::NAME, Exit::NAME, Status::NAME] {
            assert!(is_builtin(name));
        }
    }

    #[test]
    fn non_builtin_is_not_handled() {
        let mut shell = Shell::new(ShellConfig::noninteractive()).unwrap();
        let mut command = CommandLineBuilder::new("false").build();
        let mut stdout = Vec::new();

        assert!(!dispatch(&mut shell, &mut command, &mut stdout));
        assert!(stdout.is_empty());
        assert_eq!(shell.last_exit_status().describe(), "exit value 0");
    }

    #[test]
    fn status_is_handled() {
        let mut shell = Shell::new(ShellConfig::noninteractive()).unwrap();
        let mut command = CommandLineBuilder::new("status").build();
        let mut stdout = Vec::new();

        assert!(dispatch(&mut shell, &mut command, &mut stdout));
        assert_eq!(String::from_utf8(stdout).unwrap(), "exit value 0\n");
    }
}
