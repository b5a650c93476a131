//! The enumerate, format, write pipeline.

use crate::config::{ChannelSelection, Config, VISUAL_CHANNELS};
use crate::script;
use crate::store::{Channel, ConfigStore, Property, Value};
use crate::Result;
use std::path::PathBuf;
use tracing::{info, warn};

/// What a completed run wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub path: PathBuf,
    pub channels: usize,
    pub properties: usize,
    /// Properties written as comments because they cannot be restored.
    pub skipped: usize,
}

/// Captures a [`ConfigStore`] into a restoration script.
pub struct Extractor<S: ConfigStore> {
    store: S,
    config: Config,
}

impl<S: ConfigStore> Extractor<S> {
    pub fn new(store: S, config: Config) -> Self {
        Self { store, config }
    }

    /// Channels to capture, sorted.
    pub fn enumerate_channels(&self) -> Result<Vec<String>> {
        let available = self.store.list_channels()?;
        Ok(select_channels(&self.config.selection(), available))
    }

    /// Properties of `channel` not excluded by configuration, sorted by path.
    pub fn enumerate_properties(&self, channel: &str) -> Result<Vec<Property>> {
        let keep = |path: &str| !self.config.is_excluded(path);
        Ok(self.store.list_properties_filtered(channel, &keep)?)
    }

    /// Read every selected channel in full. Any failure aborts the snapshot.
    pub fn snapshot(&self) -> Result<Vec<Channel>> {
        let mut channels = Vec::new();
        for name in self.enumerate_channels()? {
            let properties = self.enumerate_properties(&name)?;
            info!(channel = %name, properties = properties.len(), "captured channel");
            channels.push(Channel { name, properties });
        }
        Ok(channels)
    }

    pub fn render(&self, channels: &[Channel]) -> String {
        script::render_script(&self.config.restore_tool, channels, self.config.channel_headers)
    }

    /// Snapshot the store and write the script.
    ///
    /// The output file is only touched once the snapshot is complete.
    pub fn run(&self) -> Result<Summary> {
        let channels = self.snapshot()?;
        let contents = self.render(&channels);
        let path = self.config.output_path();
        script::write_script(&path, &contents)?;

        let properties: usize = channels.iter().map(|c| c.properties.len()).sum();
        let skipped = channels
            .iter()
            .flat_map(|c| &c.properties)
            .filter(|p| matches!(p.value, Value::Unsupported(_)))
            .count();
        info!(path = %path.display(), properties, "wrote restoration script");
        Ok(Summary {
            path,
            channels: channels.len(),
            properties,
            skipped,
        })
    }
}

/// Apply `selection` to the channels the store reported.
pub fn select_channels(selection: &ChannelSelection, available: Vec<String>) -> Vec<String> {
    let mut selected: Vec<String> = match selection {
        ChannelSelection::All => available,
        ChannelSelection::Visual => available
            .into_iter()
            .filter(|c| VISUAL_CHANNELS.contains(&c.as_str()))
            .collect(),
        ChannelSelection::Only(wanted) => wanted
            .iter()
            .filter(|name| {
                let found = available.contains(name);
                if !found {
                    warn!(channel = %name, "channel not present in the store, skipping");
                }
                found
            })
            .cloned()
            .collect(),
    };
    selected.sort();
    selected.dedup();
    selected
}
