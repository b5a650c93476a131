use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use xfconf_dump_core::config::{self, Config};
use xfconf_dump_core::{Extractor, ProcessRunner, Xfconf};

/// Dump xfconf settings into a shell script that restores them.
#[derive(Debug, Parser)]
#[command(name = "xfconf-dump", version)]
struct Cli {
    /// Where to write the script. A directory gets "xfce-settings.sh" inside it,
    /// and ".sh" is appended to a file name that lacks it.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
    /// Path to a TOML config file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// The xfconf-query binary to run.
    #[arg(long, value_name = "PATH")]
    tool: Option<String>,
    /// Only dump this channel. May be repeated.
    #[arg(long = "channel", value_name = "NAME")]
    channels: Vec<String>,
    /// Only dump the channels that make up the desktop's look.
    #[arg(long)]
    visual: bool,
    /// Skip properties whose path starts with PREFIX. May be repeated.
    #[arg(long = "exclude-property", value_name = "PREFIX")]
    exclude_properties: Vec<String>,
    /// Do not write a comment block before each channel.
    #[arg(long)]
    no_headers: bool,
    /// Log every xfconf-query invocation.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,
    /// Only log errors.
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);
    debug!(?cli, "xfconf-dump v{} starting", env!("CARGO_PKG_VERSION"));

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = resolve_config(cli)?;
    let store = Xfconf::new(config.tool.clone(), ProcessRunner::new());
    debug!(tool = store.tool(), output = %config.output_path().display(), "resolved config");
    let summary = Extractor::new(store, config)
        .run()
        .context("extraction failed")?;

    if !cli.quiet {
        println!(
            "Wrote {} properties from {} channels to {}",
            summary.properties,
            summary.channels,
            summary.path.display()
        );
        if summary.skipped > 0 {
            println!(
                "{} properties could not be restored and were commented out",
                summary.skipped
            );
        }
    }
    Ok(())
}

/// Config file values, overridden by command line flags.
fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut cfg = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => match default_config_path() {
            Some(path) if path.is_file() => {
                debug!(path = %path.display(), "using default config file");
                config::load_config(&path)?
            }
            _ => Config::default(),
        },
    };

    if let Some(tool) = &cli.tool {
        cfg.tool = tool.clone();
    }
    if let Some(output) = &cli.output {
        cfg.output = output.clone();
    }
    if !cli.channels.is_empty() {
        cfg.channels = cli.channels.clone();
    }
    cfg.visual |= cli.visual;
    cfg.exclude_properties.extend(cli.exclude_properties.iter().cloned());
    if cli.no_headers {
        cfg.channel_headers = false;
    }
    Ok(cfg)
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("xfconf-dump").join("config.toml"))
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("xfconf_dump={level},xfconf_dump_core={level}"))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}
