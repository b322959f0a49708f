use crate::shell::builtins::{self, prelude::*};

/// `status`: prints the exit value, or the terminating signal, of the last
/// foreground process. Builtins and background jobs do not change it.
pub struct Status;

impl builtins::BuiltinCommand for Status {
    const NAME: &'static str = builtins::STATUS_NAME;

    fn run(shell: &mut Shell, _args: &[String], stdout: &mut dyn Write) -> Result<()> {
        writeln!(stdout, "{}", shell.last_exit_status().describe())?;
        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::shell::builtins::BuiltinCommand;
    use crate::shell::ShellConfig;

    fn status_output(shell: &mut Shell) -> String {
        let mut stdout = Vec::new();
        Status::run(shell, &[], &mut stdout).unwrap();
        String::from_utf8(stdout).unwrap()
    }

    #[test]
    fn reports_last_foreground_exit_value() {
        let mut shell = Shell::new(ShellConfig::noninteractive()).unwrap();
        assert_eq!(status_output(&mut shell), "exit value 0\n");

        shell.execute_command_string("false").unwrap();
        assert_eq!(status_output(&mut shell), "exit value 1\n");
    }

    #[test]
    fn reports_terminating_signal() {
        let mut shell = Shell::new(ShellConfig::noninteractive()).unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let script = dir.path().join("self_kill.sh");
        std::fs::write(&script, "kill -KILL $$\n").unwrap();

        shell
            .execute_command_string(&format!("sh {}", script.display()))
            .unwrap();
        assert_eq!(status_output(&mut shell), "terminated by signal 9\n");
    }

    #[test]
    fn builtins_do_not_change_status() {
        let mut shell = Shell::new(ShellConfig::noninteractive()).unwrap();
        shell.execute_command_string("false").unwrap();
        shell.execute_command_string("status").unwrap();
        status_output(&mut shell);
        assert_eq!(status_output(&mut shell), "exit value 1\n");
    }
}
