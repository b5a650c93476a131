//! Configuration models and loaders for the extractor.

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// File name used when no output path is given.
pub const DEFAULT_OUTPUT: &str = "xfce-settings.sh";

/// Name of the xfconf command line client.
pub const DEFAULT_TOOL: &str = "xfconf-query";

/// Channels holding the look and feel of an Xfce session.
pub const VISUAL_CHANNELS: &[&str] = &[
    "xfce4-desktop",
    "xfce4-panel",
    "xfce4-terminal",
    "xfwm4",
    "xsettings",
    "xfce4-notifyd",
];

/// High-level configuration for an extraction run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Query tool to run, either a bare name looked up on `PATH` or a path.
    pub tool: String,
    /// Command the generated script invokes to restore each property.
    pub restore_tool: String,
    /// Where the script is written.
    pub output: PathBuf,
    /// Restrict the dump to these channels. Empty means every channel.
    pub channels: Vec<String>,
    /// Restrict the dump to [`VISUAL_CHANNELS`] when `channels` is empty.
    pub visual: bool,
    /// Property path prefixes that are neither read nor written.
    pub exclude_properties: Vec<String>,
    /// Emit a comment block before each channel's commands.
    pub channel_headers: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tool: DEFAULT_TOOL.to_string(),
            restore_tool: DEFAULT_TOOL.to_string(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            channels: Vec::new(),
            visual: false,
            exclude_properties: Vec::new(),
            channel_headers: true,
        }
    }
}

/// Which channels a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelSelection {
    All,
    Visual,
    Only(Vec<String>),
}

impl Config {
    pub fn selection(&self) -> ChannelSelection {
        if !self.channels.is_empty() {
            ChannelSelection::Only(self.channels.clone())
        } else if self.visual {
            ChannelSelection::Visual
        } else {
            ChannelSelection::All
        }
    }

    /// The script location.
    ///
    /// A directory (an existing one, or any path ending in a separator) gets
    /// [`DEFAULT_OUTPUT`] inside it. A file name not ending in `.sh` gets the
    /// suffix appended.
    pub fn output_path(&self) -> PathBuf {
        let raw = self.output.as_os_str().to_string_lossy();
        let names_directory = raw.ends_with('/')
            || raw.ends_with(std::path::MAIN_SEPARATOR)
            || self.output.is_dir();
        if names_directory {
            return self.output.join(DEFAULT_OUTPUT);
        }
        if raw.ends_with(".sh") {
            return self.output.clone();
        }
        let mut path = self.output.clone().into_os_string();
        path.push(".sh");
        PathBuf::from(path)
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclude_properties
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

/// Load configuration from the provided TOML file.
///
/// Every key is optional:
/// - `tool` / `restore_tool` as strings
/// - `output` as a path
/// - `channels` and `exclude_properties` as arrays of strings
/// - `visual` and `channel_headers` as booleans
pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|err| Error::Config {
        path: path.to_path_buf(),
        reason: err.message().to_string(),
    })
}
