//! Command runner abstractions.
//!
//! [`ProcessRunner`] spawns the external tool directly (no intermediate shell),
//! so channel names and property paths never need quoting on the way in.

use crate::shell;
use crate::ExternalToolError;
use std::process::Command;
use tracing::debug;

/// Trait describing how to execute the external query tool.
pub trait CommandRunner {
    /// Run `program` with `args` and return its standard output.
    fn run(&self, program: &str, args: &[&str]) -> Result<String, ExternalToolError>;
}

/// Production runner backed by [`std::process::Command`].
///
/// The child runs under the C locale: xfconf-query localizes its array
/// banner and prints doubles with the locale's decimal separator otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// Helper constructor for the process runner.
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<String, ExternalToolError> {
        let command = render(program, args);
        debug!(%command, "running");

        let output = Command::new(program)
            .args(args)
            .env("LC_ALL", "C")
            .env("LANG", "C")
            .output()
            .map_err(|source| ExternalToolError::Unavailable {
                tool: program.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(ExternalToolError::Failed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|_| ExternalToolError::Malformed {
            command,
            reason: "output is not valid UTF-8".to_string(),
        })
    }
}

/// Render an invocation the way a user would type it, for diagnostics.
pub fn render(program: &str, args: &[&str]) -> String {
    shell::join(std::iter::once(program).chain(args.iter().copied()))
}
