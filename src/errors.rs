//! Error module. See the [error-chain](https://crates.io/crates/error-chain) crate for details.

#![allow(deprecated)]

error_chain! {
    foreign_links {
        Io(::std::io::Error);
        Nix(::nix::Error);
    }

    errors {
        Syntax(line: String) {
            description("syntax error")
            display("syntax error: '{}'", line)
        }

        BuiltinCommand(message: String) {
            description("builtin command error")
            display("{}", message)
        }

        Fork {
            description("fork failed")
            display("fork failed")
        }
    }
}

impl Error {
    pub(crate) fn syntax<T: AsRef<str>>(line: T) -> Error {
        ErrorKind::Syntax(line.as_ref().to_string()).into()
    }

    pub(crate) fn builtin_command<T: AsRef<str>>(message: T) -> Error {
        ErrorKind::BuiltinCommand(message.as_ref().to_string()).into()
    }
}

/// Logs `$result` at error level if it is an `Err`, prefixed with the given format message.
#[macro_export]
macro_rules! log_if_err {
    ($result:expr, $fmt:expr) => {{
        if let Err(ref e) = $result {
            error!(concat!($fmt, ": {}"), e);
        }
    }};
    ($result:expr, $fmt:expr, $($arg:tt)*) => {{
        if let Err(ref e) = $result {
            error!(concat!($fmt, ": {}"), $($arg)*, e);
        }
    }};
}
