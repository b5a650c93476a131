//! Restoration script formatting and output.

use crate::shell;
use crate::store::{Channel, Property, Scalar, Value, ValueKind};
use crate::{Error, Result};
use std::io::Write;
use std::path::Path;
use tracing::warn;

pub const SHEBANG: &str = "#!/bin/sh";
const PREAMBLE: &str = "# Restores xfconf settings captured by xfconf-dump.";

/// Format the `xfconf-query` invocation that sets `property` back to its value.
///
/// Returns `None` for values the tool cannot recreate.
pub fn format_command(tool: &str, channel: &str, property: &Property) -> Option<String> {
    let mut words: Vec<String> = vec![
        shell::quote(tool),
        "-c".into(),
        shell::quote(channel),
        "-p".into(),
        shell::quote(&property.path),
        "-n".into(),
    ];
    let mut push = |scalar: &Scalar| {
        words.push("-t".into());
        words.push(scalar.kind.as_str().into());
        words.push("-s".into());
        words.push(shell::quote(&scalar.text));
    };
    match &property.value {
        Value::Scalar(scalar) => push(scalar),
        Value::Array(elements) => {
            elements.iter().for_each(&mut push);
            if elements.len() == 1 {
                words.push("--force-array".into());
            }
        }
        Value::Unsupported(_) => return None,
    }
    Some(words.join(" "))
}

fn skipped_comment(property: &Property) -> String {
    let raw = match &property.value {
        Value::Unsupported(raw) => raw.as_str(),
        _ => "",
    };
    format!(
        "# {}: {} (not restorable)",
        property.path.replace('\n', "\\n"),
        raw.replace('\n', "\\n")
    )
}

/// A restoration command read back from a script line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub tool: String,
    pub channel: String,
    pub property: Property,
}

/// Parse a line produced by [`format_command`].
pub fn parse_command(line: &str) -> std::result::Result<ParsedCommand, String> {
    let words = shell::split(line).map_err(|err| err.to_string())?;
    let mut words = words.into_iter();
    let tool = words.next().ok_or("empty line")?;

    let mut channel = None;
    let mut path = None;
    let mut pending_kind = None;
    let mut force_array = false;
    let mut scalars = Vec::new();

    while let Some(word) = words.next() {
        match word.as_str() {
            "-c" => channel = words.next(),
            "-p" => path = words.next(),
            "-n" => {}
            "--force-array" => force_array = true,
            "-t" => {
                let name = words.next().ok_or("-t without a type")?;
                pending_kind =
                    Some(ValueKind::from_name(&name).ok_or(format!("unknown type `{name}`"))?);
            }
            "-s" => {
                let text = words.next().ok_or("-s without a value")?;
                let kind = pending_kind.take().ok_or("-s without a preceding -t")?;
                scalars.push(Scalar::new(kind, text));
            }
            other => return Err(format!("unexpected argument `{other}`")),
        }
    }

    let value = match scalars.len() {
        0 => return Err("no value".to_string()),
        1 if !force_array => Value::Scalar(scalars.remove(0)),
        _ => Value::Array(scalars),
    };
    Ok(ParsedCommand {
        tool,
        channel: channel.ok_or("missing -c")?,
        property: Property {
            path: path.ok_or("missing -p")?,
            value,
        },
    })
}

/// Render the whole script for `channels`, in the given order.
pub fn render_script(tool: &str, channels: &[Channel], headers: bool) -> String {
    let mut out = format!("{SHEBANG}\n{PREAMBLE}\n");
    for channel in channels {
        out.push('\n');
        if headers {
            out.push_str(&format!("#\n#    Channel: {}\n#\n", channel.name));
        }
        for property in &channel.properties {
            match format_command(tool, &channel.name, property) {
                Some(line) => out.push_str(&line),
                None => {
                    warn!(
                        channel = %channel.name,
                        path = %property.path,
                        "value cannot be restored, commenting out"
                    );
                    out.push_str(&skipped_comment(property));
                }
            }
            out.push('\n');
        }
    }
    out
}

/// Write `contents` to `path` as an executable file.
///
/// The data goes to a temporary file next to `path` which is renamed into
/// place once complete; on any failure it is removed and `path` is untouched.
pub fn write_script(path: &Path, contents: &str) -> Result<()> {
    let io_err = |source: std::io::Error| Error::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = tempfile::Builder::new()
        .prefix(".xfconf-dump")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(io_err)?;
    file.write_all(contents.as_bytes()).map_err(io_err)?;
    file.flush().map_err(io_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o755))
            .map_err(io_err)?;
    }

    file.persist(path).map_err(|err| io_err(err.error))?;
    Ok(())
}
