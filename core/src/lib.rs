//! Snapshot xfconf settings into a shell script that restores them.
//!
//! The pipeline is linear: a [`ConfigStore`] enumerates channels and their
//! properties, [`script`] formats one `xfconf-query` invocation per property,
//! and the result is written atomically as an executable script.

pub mod config;
pub mod extractor;
pub mod runner;
pub mod script;
pub mod shell;
pub mod store;

pub use config::{ChannelSelection, Config};
pub use extractor::{Extractor, Summary};
pub use runner::{CommandRunner, ProcessRunner};
pub use store::{Channel, ConfigStore, Property, Scalar, Value, ValueKind, Xfconf};

use std::path::PathBuf;
use thiserror::Error;

/// Failures of the external query tool.
#[derive(Debug, Error)]
pub enum ExternalToolError {
    /// The tool could not be started at all, typically because it is not installed.
    #[error("failed to run `{tool}`: {source} (is xfconf installed?)")]
    Unavailable {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool ran but reported a non-success status.
    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    /// The tool succeeded but printed something we cannot interpret.
    #[error("unexpected output from `{command}`: {reason}")]
    Malformed { command: String, reason: String },
}

/// Common error type for the extractor.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    ExternalTool(#[from] ExternalToolError),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },
}

/// Convenient alias for results returned by the core crate.
pub type Result<T> = std::result::Result<T, Error>;
