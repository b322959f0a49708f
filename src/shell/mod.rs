//! Smallsh - Shell Module
//!
//! The Shell owns the background job table and the status of the last
//! foreground command, and drives the read-eval loop around them.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::{self, ExitStatus};

use crate::errors::{ErrorKind, Result, ResultExt};
use crate::parse::CommandLine;
use crate::util::SmallshExitStatusExt;

use self::execute_command::Launch;
use self::job_control::JobManager;

pub mod builtins;
pub mod execute_command;
pub mod job_control;
pub mod signals;

const PROMPT: &str = ": ";

/// Smallsh Shell
pub struct Shell {
    job_manager: JobManager,
    /// Exit status of the last foreground command executed.
    last_exit_status: ExitStatus,
    config: ShellConfig,
}

impl Shell {
    /// Constructs a new Shell, installing signal handlers if `config` asks for them.
    pub fn new(config: ShellConfig) -> Result<Shell> {
        if config.handle_signals {
            signals::install_handlers()?;
        }

        info!("smallsh started up");
        Ok(Shell {
            job_manager: Default::default(),
            last_exit_status: ExitStatus::from_success(),
            config,
        })
    }

    /// Status of the most recent foreground command. Background jobs never change it.
    pub fn last_exit_status(&self) -> ExitStatus {
        self.last_exit_status
    }

    /// Whether any background job is still tracked.
    pub fn has_background_jobs(&self) -> bool {
        self.job_manager.has_jobs()
    }

    /// Reaps finished background jobs and reports them on stdout.
    pub fn check_jobs(&mut self) {
        let stdout = io::stdout();
        let temp_result = self.job_manager.do_job_notification(&mut stdout.lock());
        log_if_err!(temp_result, "do_job_notification");
    }

    /// Runs a parsed command: a builtin if it names one, an external program otherwise.
    pub fn run(&mut self, command: &mut CommandLine) -> Result<()> {
        let stdout = io::stdout();
        let mut stdout = stdout.lock();

        if builtins::dispatch(self, command, &mut stdout) {
            return Ok(());
        }

        let foreground_only = signals::is_foreground_only();
        match execute_command::spawn_command(
            command,
            foreground_only,
            &mut self.job_manager,
            &mut stdout,
        ) {
            Ok(Launch::Foreground(status)) => {
                debug!("foreground command finished: {}", status.describe());
                self.last_exit_status = status;
                Ok(())
            }
            Ok(Launch::Background(_)) => Ok(()),
            Err(e) => {
                if let ErrorKind::Fork = *e.kind() {
                    self.last_exit_status = ExitStatus::from_failure();
                }
                Err(e)
            }
        }
    }

    /// Parses and runs one line of input. Blank lines and comments are ignored.
    pub fn execute_command_string(&mut self, input: &str) -> Result<()> {
        match CommandLine::parse(input)? {
            Some(mut command) => self.run(&mut command),
            None => Ok(()),
        }
    }

    /// Runs every line of `path` in order, reaping background jobs between lines.
    pub fn execute_commands_from_file(&mut self, path: &Path) -> Result<()> {
        let contents =
            fs::read(path).chain_err(|| format!("{}: cannot read file", path.display()))?;

        for line in String::from_utf8_lossy(&contents).lines() {
            self.check_jobs();
            let temp_result = self.execute_command_string(line);
            report_error(&temp_result);
        }

        Ok(())
    }

    /// Interactive read-eval loop. Returns at end of input.
    pub fn execute_from_stdin(&mut self) {
        let stdin = io::stdin();
        loop {
            self.check_jobs();

            let input = match self.prompt(&mut stdin.lock()) {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    error!("failed to read input: {}", e);
                    eprintln!("smallsh: {}", e);
                    break;
                }
            };

            let temp_result = self.execute_command_string(&input);
            report_error(&temp_result);
        }

        if self.config.display_prompt {
            println!();
        }
    }

    /// Displays the prompt and reads one line. Invalid UTF-8 is replaced
    /// rather than rejected. Returns `None` when end of file is reached.
    fn prompt(&self, input: &mut dyn BufRead) -> Result<Option<String>> {
        if self.config.display_prompt {
            let stdout = io::stdout();
            let mut stdout = stdout.lock();
            write!(stdout, "{}", PROMPT)?;
            stdout.flush()?;
        }

        let mut line = Vec::new();
        match input.read_until(b'\n', &mut line)? {
            0 => Ok(None),
            _ => Ok(Some(String::from_utf8_lossy(&line).into_owned())),
        }
    }

    /// Sends SIGTERM to every background job and terminates the process.
    ///
    /// Exits with `status`, or 0 when `None`.
    pub fn exit(&mut self, status: Option<ExitStatus>) -> ! {
        self.job_manager.kill_all();
        let _ = io::stdout().flush();

        let code = status.and_then(|s| s.code()).unwrap_or(0);
        info!("smallsh has shut down with code {}", code);
        process::exit(code);
    }
}

fn report_error(result: &Result<()>) {
    if let Err(ref e) = *result {
        warn!("{}", e);
        eprintln!("smallsh: {}", e);
    }
}

/// Policy object to control a Shell's behavior
#[derive(Debug, Copy, Clone)]
pub struct ShellConfig {
    /// Determines if the `: ` prompt is written before each line is read.
    display_prompt: bool,

    /// Determines if SIGINT redraws the prompt and SIGTSTP toggles
    /// foreground-only mode. When `false` both keep their default disposition.
    handle_signals: bool,
}

impl ShellConfig {
    /// Creates an interactive shell
    ///
    /// # Complete List
    /// - The prompt is displayed
    /// - SIGINT and SIGTSTP handlers are installed
    pub fn interactive() -> Self {
        Self {
            display_prompt: true,
            handle_signals: true,
        }
    }

    /// Creates a noninteractive shell, e.g. for `-c` and script files
    ///
    /// # Complete List
    /// - No prompt is displayed
    /// - Signal dispositions are left untouched
    pub fn noninteractive() -> Self {
        Default::default()
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            display_prompt: false,
            handle_signals: false,
        }
    }
}

impl std::fmt::Debug for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "last status: {}, {:?}",
            self.last_exit_status.describe(),
            self.job_manager
        )
    }
}
