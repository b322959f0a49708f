use crate::shell::builtins::{self, prelude::*};

/// `exit`: sends SIGTERM to every background job, then exits the shell with a
/// status of 0. Arguments are ignored.
pub struct Exit;

impl builtins::BuiltinCommand for Exit {
    const NAME: &'static str = builtins::EXIT_NAME;

    fn run(shell: &mut Shell, args: &[String], stdout: &mut dyn Write) -> Result<()> {
        if !args.is_empty() {
            debug!("exit: ignoring arguments {:?}", args);
        }
        stdout.flush()?;
        shell.exit(None);
    }
}
