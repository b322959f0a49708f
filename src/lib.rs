//! Smallsh - a small command interpreter
//!
//! Runs the `cd`, `exit` and `status` builtins itself and every other command
//! in a child process, with optional `<`/`>` redirection and `&` detachment.
//! Background jobs are reaped before each prompt. SIGINT redraws the prompt and
//! SIGTSTP toggles foreground-only mode.

#![deny(trivial_casts, unused_import_braces)]

#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;

#[macro_use]
pub mod errors;
pub mod parse;
pub mod shell;
mod util;

pub use crate::shell::{Shell, ShellConfig};
pub use crate::util::SmallshExitStatusExt;
