use std::env;
use std::path::PathBuf;

use crate::shell::builtins::{self, prelude::*};

const HOME_VAR: &str = "HOME";

/// `cd [dir]`: changes the current directory to `dir`, or `$HOME` by default.
/// Always runs in the foreground.
pub struct Cd;

impl builtins::BuiltinCommand for Cd {
    const NAME: &'static str = builtins::CD_NAME;

    fn run(_shell: &mut Shell, args: &[String], _stdout: &mut dyn Write) -> Result<()> {
        let dir = match args.first() {
            Some(dir) => PathBuf::from(dir),
            None => env::var_os(HOME_VAR)
                .map(PathBuf::from)
                .ok_or_else(|| Error::builtin_command("cd: HOME not set"))?,
        };

        debug!("cd: changing directory to {}", dir.display());
        env::set_current_dir(&dir)
            .map_err(|e| Error::builtin_command(format!("cd: {}: {}", dir.display(), e)))
    }
}
