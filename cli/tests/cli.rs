//! End-to-end tests running the `xfconf-dump` binary against a fake
//! `xfconf-query` written as a shell script.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const FAKE_XFCONF: &str = r#"#!/bin/sh
case "$*" in
  "-l") printf 'Channels:\n  xsettings\n  xfwm4\n  thunar\n' ;;
  "-c xfwm4 -l") printf '/general/title_font\n/general/theme\n' ;;
  "-c xfwm4 -p /general/theme") printf 'Default\n' ;;
  "-c xfwm4 -p /general/title_font") printf 'Sans Bold 9\n' ;;
  "-c xsettings -l") printf '/Net/IconThemeList\n/Net/EnableEventSounds\n' ;;
  "-c xsettings -p /Net/IconThemeList") printf 'Value is an array with 2 items:\n\na\nb c\n' ;;
  "-c xsettings -p /Net/EnableEventSounds") printf 'false\n' ;;
  "-c thunar -l") ;;
  *) echo "fake xfconf-query: unexpected arguments: $*" >&2; exit 1 ;;
esac
"#;

fn write_executable(path: &Path, contents: &str) {
    fs::write(path, contents).expect("Failed to write script");
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).expect("Failed to chmod");
}

/// Temp workspace holding the fake tool and an empty config home.
fn workspace(tool_script: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let tool = dir.path().join("xfconf-query");
    write_executable(&tool, tool_script);
    fs::create_dir(dir.path().join("config-home")).expect("Failed to create config home");
    (dir, tool)
}

fn xfconf_dump(dir: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_xfconf-dump"))
        .args(args)
        .current_dir(dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join("config-home"))
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute xfconf-dump")
}

fn command_lines(script: &str) -> Vec<&str> {
    script
        .lines()
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
}

#[test]
fn test_dump_writes_executable_script() {
    let (dir, tool) = workspace(FAKE_XFCONF);
    let output = xfconf_dump(&dir, &["--tool", tool.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let path = dir.path().join("xfce-settings.sh");
    let script = fs::read_to_string(&path).unwrap();
    assert!(script.starts_with("#!/bin/sh\n"));
    assert!(script.contains("#    Channel: thunar\n"));
    assert_eq!(
        command_lines(&script),
        vec![
            "xfconf-query -c xfwm4 -p /general/theme -n -t string -s Default",
            "xfconf-query -c xfwm4 -p /general/title_font -n -t string -s 'Sans Bold 9'",
            "xfconf-query -c xsettings -p /Net/EnableEventSounds -n -t bool -s false",
            "xfconf-query -c xsettings -p /Net/IconThemeList -n -t string -s a -t string -s 'b c'",
        ]
    );

    let mode = fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o111, 0o111);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Wrote 4 properties from 3 channels"), "{stdout}");
}

#[test]
fn test_dump_is_idempotent() {
    let (dir, tool) = workspace(FAKE_XFCONF);
    let tool = tool.to_str().unwrap();

    assert!(xfconf_dump(&dir, &["--tool", tool, "-o", "first.sh"]).status.success());
    assert!(xfconf_dump(&dir, &["--tool", tool, "-o", "second.sh"]).status.success());

    let first = fs::read(dir.path().join("first.sh")).unwrap();
    let second = fs::read(dir.path().join("second.sh")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_missing_tool_fails_without_output() {
    let (dir, _) = workspace(FAKE_XFCONF);
    let missing = dir.path().join("no-such-xfconf-query");
    let output = xfconf_dump(&dir, &["--tool", missing.to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no-such-xfconf-query"), "{stderr}");
    assert!(!dir.path().join("xfce-settings.sh").exists());
}

#[test]
fn test_failing_channel_aborts_run() {
    let broken = FAKE_XFCONF.replace(
        "\"-c xsettings -l\") printf",
        "\"-c xsettings -l\") echo 'Channel \"xsettings\" is locked' >&2; exit 1; printf",
    );
    let (dir, tool) = workspace(&broken);
    let output = xfconf_dump(&dir, &["--tool", tool.to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("-c xsettings -l"), "{stderr}");
    assert!(stderr.contains("is locked"), "{stderr}");
    assert!(!dir.path().join("xfce-settings.sh").exists());
}

#[test]
fn test_malformed_listing_is_rejected() {
    let (dir, tool) = workspace("#!/bin/sh\necho 'something else entirely'\n");
    let output = xfconf_dump(&dir, &["--tool", tool.to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unexpected output"), "{stderr}");
}

#[test]
fn test_empty_channel_listing_is_rejected() {
    let (dir, tool) = workspace("#!/bin/sh\nprintf 'Channels:\\n'\n");
    let output = xfconf_dump(&dir, &["--tool", tool.to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no channels listed"), "{stderr}");
    assert!(!dir.path().join("xfce-settings.sh").exists());
}

#[test]
fn test_unwritable_output_is_reported() {
    let (dir, tool) = workspace(FAKE_XFCONF);
    let output = xfconf_dump(
        &dir,
        &["--tool", tool.to_str().unwrap(), "-o", "missing-dir/restore.sh"],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing-dir/restore.sh"), "{stderr}");
}

#[test]
fn test_output_directory_gets_default_file_name() {
    let (dir, tool) = workspace(FAKE_XFCONF);
    fs::create_dir(dir.path().join("backups")).expect("Failed to create output dir");
    let output = xfconf_dump(&dir, &["--tool", tool.to_str().unwrap(), "-o", "backups"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let script = fs::read_to_string(dir.path().join("backups/xfce-settings.sh")).unwrap();
    assert!(script.starts_with("#!/bin/sh\n"));
    assert!(!dir.path().join("backups.sh").exists());
}

#[test]
fn test_config_file_selects_channels_and_names_output() {
    let (dir, tool) = workspace(FAKE_XFCONF);
    let config = dir.path().join("dump.toml");
    fs::write(
        &config,
        format!(
            concat!(
                "tool = \"{}\"\n",
                "channels = [\"xfwm4\"]\n",
                "exclude_properties = [\"/general/title\"]\n",
                "output = \"desktop\"\n",
            ),
            tool.display()
        ),
    )
    .unwrap();

    let output = xfconf_dump(&dir, &["--config", config.to_str().unwrap(), "--no-headers"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let script = fs::read_to_string(dir.path().join("desktop.sh")).unwrap();
    assert!(!script.contains("Channel:"));
    assert_eq!(
        command_lines(&script),
        vec!["xfconf-query -c xfwm4 -p /general/theme -n -t string -s Default"]
    );
}

#[test]
fn test_generated_script_replays_captured_values() {
    let (dir, tool) = workspace(FAKE_XFCONF);
    let log = dir.path().join("replayed");
    let recorder = dir.path().join("record");
    write_executable(
        &recorder,
        &format!(
            "#!/bin/sh\nprintf '%s\\0' \"$@\" >> '{log}'\nprintf '\\n' >> '{log}'\n",
            log = log.display()
        ),
    );
    let config = dir.path().join("config-home/xfconf-dump/config.toml");
    fs::create_dir_all(config.parent().unwrap()).unwrap();
    fs::write(&config, format!("restore_tool = \"{}\"\n", recorder.display())).unwrap();

    let output = xfconf_dump(&dir, &["--tool", tool.to_str().unwrap(), "--channel", "xsettings"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let status = Command::new("sh")
        .arg(dir.path().join("xfce-settings.sh"))
        .status()
        .unwrap();
    assert!(status.success());

    let replayed = fs::read_to_string(&log).unwrap();
    let calls: Vec<Vec<&str>> = replayed
        .lines()
        .map(|call| call.split_terminator('\0').collect())
        .collect();
    assert_eq!(
        calls,
        vec![
            vec![
                "-c",
                "xsettings",
                "-p",
                "/Net/EnableEventSounds",
                "-n",
                "-t",
                "bool",
                "-s",
                "false",
            ],
            vec![
                "-c",
                "xsettings",
                "-p",
                "/Net/IconThemeList",
                "-n",
                "-t",
                "string",
                "-s",
                "a",
                "-t",
                "string",
                "-s",
                "b c",
            ],
        ]
    );
}
