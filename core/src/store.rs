//! The external configuration store and the values it reports.

use crate::runner::{render, CommandRunner};
use crate::ExternalToolError;
use std::fmt;
use tracing::debug;

const CHANNELS_HEADER: &str = "Channels:";
const ARRAY_BANNER_PREFIX: &str = "Value is an array with ";
const ARRAY_BANNER_SUFFIX: &str = " items:";
const UNSUPPORTED: &str = "<<UNSUPPORTED>>";

/// Type tag passed to `xfconf-query -t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Int,
    Int64,
    Uint64,
    Double,
    String,
}

impl ValueKind {
    /// Pick the narrowest kind whose textual form is exactly `text`.
    pub fn infer(text: &str) -> Self {
        if text == "true" || text == "false" {
            return ValueKind::Bool;
        }
        if is_decimal_integer(text) {
            if text.parse::<i32>().is_ok() {
                return ValueKind::Int;
            }
            if text.parse::<i64>().is_ok() {
                return ValueKind::Int64;
            }
            if text.parse::<u64>().is_ok() {
                return ValueKind::Uint64;
            }
        }
        if is_plain_double(text) {
            return ValueKind::Double;
        }
        ValueKind::String
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Int64 => "int64",
            ValueKind::Uint64 => "uint64",
            ValueKind::Double => "double",
            ValueKind::String => "string",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "bool" => ValueKind::Bool,
            "int" => ValueKind::Int,
            "int64" => ValueKind::Int64,
            "uint64" => ValueKind::Uint64,
            "double" => ValueKind::Double,
            "string" => ValueKind::String,
            _ => return None,
        })
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Leading zeros and "+" would be normalized by the store, so they stay strings.
fn is_decimal_integer(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && (digits == "0" || !digits.starts_with('0'))
        && text != "-0"
}

fn is_plain_double(text: &str) -> bool {
    let body = text.strip_prefix('-').unwrap_or(text);
    match body.split_once('.') {
        Some((int, frac)) => {
            !int.is_empty()
                && !frac.is_empty()
                && int.bytes().all(|b| b.is_ascii_digit())
                && frac.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

/// A single typed value as the store printed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scalar {
    pub kind: ValueKind,
    pub text: String,
}

impl Scalar {
    pub fn new(kind: ValueKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Build a scalar whose kind is inferred from its text.
    pub fn inferred(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            kind: ValueKind::infer(&text),
            text,
        }
    }
}

/// The current value of a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Scalar(Scalar),
    Array(Vec<Scalar>),
    /// Something `xfconf-query -s` cannot recreate; kept as raw text.
    Unsupported(String),
}

/// One property path and its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub path: String,
    pub value: Value,
}

impl Property {
    pub fn new(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            value,
        }
    }
}

/// A channel together with the properties captured from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub name: String,
    pub properties: Vec<Property>,
}

/// The capability the extractor needs from the configuration store.
pub trait ConfigStore {
    /// Every channel the store knows about.
    fn list_channels(&self) -> Result<Vec<String>, ExternalToolError>;

    /// Every property path in `channel`.
    fn list_paths(&self, channel: &str) -> Result<Vec<String>, ExternalToolError>;

    /// The current value of `path` in `channel`.
    fn read_value(&self, channel: &str, path: &str) -> Result<Value, ExternalToolError>;

    /// All properties of `channel`, sorted by path.
    fn list_properties(&self, channel: &str) -> Result<Vec<Property>, ExternalToolError> {
        self.list_properties_filtered(channel, &|_: &str| true)
    }

    /// Properties of `channel` whose path satisfies `keep`, sorted by path.
    ///
    /// Rejected paths are never read.
    fn list_properties_filtered(
        &self,
        channel: &str,
        keep: &dyn Fn(&str) -> bool,
    ) -> Result<Vec<Property>, ExternalToolError> {
        let mut paths = self.list_paths(channel)?;
        paths.sort();
        paths.dedup();
        paths
            .into_iter()
            .filter(|path| keep(path.as_str()))
            .map(|path| {
                let value = self.read_value(channel, &path)?;
                Ok::<_, ExternalToolError>(Property { path, value })
            })
            .collect()
    }
}

/// [`ConfigStore`] backed by the `xfconf-query` command.
pub struct Xfconf<R: CommandRunner> {
    tool: String,
    runner: R,
}

impl<R: CommandRunner> Xfconf<R> {
    pub fn new(tool: impl Into<String>, runner: R) -> Self {
        Self {
            tool: tool.into(),
            runner,
        }
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    fn query(&self, args: &[&str]) -> Result<(String, String), ExternalToolError> {
        let stdout = self.runner.run(&self.tool, args)?;
        Ok((render(&self.tool, args), stdout))
    }
}

impl<R: CommandRunner> ConfigStore for Xfconf<R> {
    fn list_channels(&self) -> Result<Vec<String>, ExternalToolError> {
        let (command, stdout) = self.query(&["-l"])?;
        let channels = parse_channels(&stdout).map_err(|reason| ExternalToolError::Malformed {
            command,
            reason,
        })?;
        debug!(count = channels.len(), "listed channels");
        Ok(channels)
    }

    fn list_paths(&self, channel: &str) -> Result<Vec<String>, ExternalToolError> {
        let (command, stdout) = self.query(&["-c", channel, "-l"])?;
        parse_paths(&stdout).map_err(|reason| ExternalToolError::Malformed { command, reason })
    }

    fn read_value(&self, channel: &str, path: &str) -> Result<Value, ExternalToolError> {
        let (command, stdout) = self.query(&["-c", channel, "-p", path])?;
        parse_value(&stdout).map_err(|reason| ExternalToolError::Malformed { command, reason })
    }
}

/// Parse `xfconf-query -l`: a `Channels:` line followed by indented names.
pub fn parse_channels(stdout: &str) -> Result<Vec<String>, String> {
    let mut lines = stdout.lines();
    match lines.next() {
        Some(first) if first.trim() == CHANNELS_HEADER => {}
        Some(first) => return Err(format!("expected `{CHANNELS_HEADER}`, got `{first}`")),
        None => return Err("empty output".to_string()),
    }
    let mut channels: Vec<String> = lines
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    if channels.is_empty() {
        return Err("no channels listed".to_string());
    }
    channels.sort();
    channels.dedup();
    Ok(channels)
}

/// Parse `xfconf-query -c CHANNEL -l`: one absolute property path per line.
pub fn parse_paths(stdout: &str) -> Result<Vec<String>, String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            if line.starts_with('/') {
                Ok(line.to_string())
            } else {
                Err(format!("`{line}` is not a property path"))
            }
        })
        .collect()
}

/// Parse `xfconf-query -c CHANNEL -p PATH`.
///
/// Scalars are printed followed by a newline. Arrays are printed as
/// `Value is an array with N items:`, a blank line, then one element per line.
pub fn parse_value(stdout: &str) -> Result<Value, String> {
    if stdout.is_empty() {
        return Err("empty output".to_string());
    }
    let text = stdout.strip_suffix('\n').unwrap_or(stdout);

    if let Some(count) = array_banner(text) {
        let count = count.map_err(|banner| format!("bad array banner `{banner}`"))?;
        return parse_array(text, count);
    }
    if text == UNSUPPORTED {
        return Ok(Value::Unsupported(text.to_string()));
    }
    Ok(Value::Scalar(Scalar::inferred(text)))
}

fn array_banner(text: &str) -> Option<Result<usize, &str>> {
    let first = text.lines().next()?;
    let count = first
        .strip_prefix(ARRAY_BANNER_PREFIX)?
        .strip_suffix(ARRAY_BANNER_SUFFIX);
    Some(count.and_then(|n| n.parse().ok()).ok_or(first))
}

fn parse_array(text: &str, count: usize) -> Result<Value, String> {
    let mut lines = text.split('\n').skip(1);
    if count == 0 {
        return Ok(Value::Unsupported(text.to_string()));
    }
    match lines.next() {
        Some("") => {}
        _ => return Err("array banner is not followed by a blank line".to_string()),
    }
    let elements: Vec<&str> = lines.collect();
    if elements.len() != count {
        return Err(format!(
            "array announces {count} items but {} lines follow",
            elements.len()
        ));
    }
    Ok(Value::Array(
        elements.into_iter().map(Scalar::inferred).collect(),
    ))
}
