//! Smallsh Parser
//!
//! Splits one line of user input into a [`CommandLine`]. Words are separated
//! by whitespace; there is no quoting, expansion, or pipeline syntax.

use crate::errors::{Error, Result};

/// Longest line accepted by the parser, in bytes.
pub const MAX_LINE_LENGTH: usize = 2048;
/// Maximum number of words (program name included) in one command.
pub const MAX_ARGS: usize = 512;

const COMMENT_MARKER: char = '#';
const INPUT_REDIRECT: &str = "<";
const OUTPUT_REDIRECT: &str = ">";
const BACKGROUND: &str = "&";

/// A parsed command, consumed once by the shell.
#[derive(Clone, Debug, PartialEq)]
pub struct CommandLine {
    /// Program name followed by its arguments. Never empty.
    pub arguments: Vec<String>,
    /// The name of the input file, if one is specified
    pub input_redirect: Option<String>,
    /// The file to write stdout to, if one is specified
    pub output_redirect: Option<String>,
    /// Run the command in the background, defaults to false
    pub background: bool,
}

impl CommandLine {
    /// Parses input string into a `CommandLine`.
    ///
    /// Returns `Ok(None)` for blank lines and comments.
    ///
    /// # Examples
    ///
    /// ```
    /// use smallsh::parse::{CommandLine, CommandLineBuilder};
    ///
    /// let command = CommandLine::parse("sort < in.txt > out.txt &").unwrap().unwrap();
    /// let mut expected = CommandLineBuilder::new("sort");
    /// expected.input_redirect("in.txt").output_redirect("out.txt").background(true);
    /// assert_eq!(command, expected.build());
    ///
    /// assert!(CommandLine::parse("# comment").unwrap().is_none());
    /// ```
    pub fn parse(input: &str) -> Result<Option<CommandLine>> {
        let input = input.trim_end_matches(|c| c == '\n' || c == '\r');
        if input.len() > MAX_LINE_LENGTH {
            return Err(Error::syntax(format!(
                "line exceeds {} characters",
                MAX_LINE_LENGTH
            )));
        }

        let trimmed = input.trim();
        if trimmed.is_empty() || input.starts_with(COMMENT_MARKER) {
            return Ok(None);
        }

        let mut words: Vec<&str> = trimmed.split_whitespace().collect();
        let background = words.last() == Some(&BACKGROUND);
        if background {
            words.pop();
        }

        let mut builder: Option<CommandLineBuilder> = None;
        let mut input_redirect = None;
        let mut output_redirect = None;
        let mut words = words.into_iter();
        while let Some(word) = words.next() {
            match word {
                INPUT_REDIRECT => {
                    let target = words.next().ok_or_else(|| Error::syntax(trimmed))?;
                    input_redirect = Some(target);
                }
                OUTPUT_REDIRECT => {
                    let target = words.next().ok_or_else(|| Error::syntax(trimmed))?;
                    output_redirect = Some(target);
                }
                _ => match builder {
                    Some(ref mut b) => {
                        b.arg(word);
                    }
                    None => builder = Some(CommandLineBuilder::new(word)),
                },
            }
        }

        let mut builder = builder.ok_or_else(|| Error::syntax(trimmed))?;
        if builder.arguments.len() > MAX_ARGS {
            return Err(Error::syntax(format!(
                "more than {} arguments",
                MAX_ARGS
            )));
        }

        if let Some(path) = input_redirect {
            builder.input_redirect(path);
        }
        if let Some(path) = output_redirect {
            builder.output_redirect(path);
        }
        builder.background(background);
        Ok(Some(builder.build()))
    }

    /// The program to execute, `arguments[0]`.
    pub fn program(&self) -> &str {
        &self.arguments[0]
    }

    /// Everything after the program name.
    pub fn args(&self) -> &[String] {
        &self.arguments[1..]
    }
}

/// Builds `CommandLine`s.
#[derive(Clone, Debug)]
pub struct CommandLineBuilder {
    arguments: Vec<String>,
    input_redirect: Option<String>,
    output_redirect: Option<String>,
    background: bool,
}

impl CommandLineBuilder {
    /// Construct a new `CommandLineBuilder` for `program`, with the following default
    /// configuration:
    ///
    /// * No arguments
    /// * No input/output redirection
    /// * Runs in foreground
    ///
    /// Builder methods are provided to change these defaults and otherwise configure the command.
    pub fn new(program: &str) -> CommandLineBuilder {
        CommandLineBuilder {
            arguments: vec![String::from(program)],
            input_redirect: None,
            output_redirect: None,
            background: false,
        }
    }

    /// Add an argument to pass to the program.
    pub fn arg(&mut self, arg: &str) -> &mut CommandLineBuilder {
        self.arguments.push(String::from(arg));
        self
    }

    /// Add several arguments to pass to the program.
    pub fn args(&mut self, args: &[&str]) -> &mut CommandLineBuilder {
        self.arguments.extend(args.iter().map(|x| (*x).to_owned()));
        self
    }

    /// Add input redirection from the specified filename.
    pub fn input_redirect(&mut self, filename: &str) -> &mut CommandLineBuilder {
        self.input_redirect = Some(String::from(filename));
        self
    }

    /// Add output redirection to the specified filename.
    pub fn output_redirect(&mut self, filename: &str) -> &mut CommandLineBuilder {
        self.output_redirect = Some(String::from(filename));
        self
    }

    /// Configure the command to run in the background.
    pub fn background(&mut self, background: bool) -> &mut CommandLineBuilder {
        self.background = background;
        self
    }

    /// Build the final command.
    pub fn build(self) -> CommandLine {
        CommandLine {
            arguments: self.arguments,
            input_redirect: self.input_redirect,
            output_redirect: self.output_redirect,
            background: self.background,
        }
    }
}
