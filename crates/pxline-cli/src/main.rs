//! pxline - extract PX-Web statistical tables
//!
//! Fetches table metadata, validates selections against it and downloads
//! the data in postal-code batches.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "pxline")]
#[command(about = "Extract datasets from PX-Web statistics APIs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./pxline.toml or ~/.config/pxline/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Connect timeout in seconds
    #[arg(long, global = true)]
    connect_timeout: Option<u64>,

    /// Whole-request timeout in seconds
    #[arg(long, global = true)]
    request_timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// Show the variables of a table
    Metadata(cmd::metadata::MetadataArgs),
    /// Batched extraction over postal codes
    Fetch(cmd::fetch::FetchArgs),
    /// Whole table in one request (best-effort, may exceed server limits)
    Snapshot(cmd::snapshot::SnapshotArgs),
    /// Latest N periods of the time variable
    Latest(cmd::snapshot::LatestArgs),
    /// List known municipalities and their postal codes
    Municipalities,
    /// Show current configuration
    Config,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let progress = Arc::new(pxline_core::ProgressContext::new());

    // TTY: bars show batch progress, logs stay quiet unless --debug.
    // Non-TTY: info logs are the only progress indicator.
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = is_tty && !cli.debug;
    pxline_core::init_logging(quiet, cli.debug, multi);

    let config = match cli.config {
        Some(path) => Config::from_file(&path)?,
        None => Config::load()?,
    };
    config.validate()?;

    // Config file defaults, CLI overrides
    pxline_core::set_http_config(pxline_core::HttpConfig {
        connect_timeout: Duration::from_secs(
            cli.connect_timeout.unwrap_or(config.http.connect_timeout),
        ),
        request_timeout: Duration::from_secs(
            cli.request_timeout.unwrap_or(config.http.request_timeout),
        ),
    });

    match cli.command {
        Command::Metadata(args) => cmd::metadata::run(args, &config, &progress),
        Command::Fetch(args) => cmd::fetch::run(args, &config, &progress),
        Command::Snapshot(args) => cmd::snapshot::run_snapshot(args, &config, &progress),
        Command::Latest(args) => cmd::snapshot::run_latest(args, &config, &progress),
        Command::Municipalities => {
            cmd::metadata::print_municipalities();
            Ok(ExitCode::SUCCESS)
        }
        Command::Config => {
            config.print();
            Ok(ExitCode::SUCCESS)
        }
    }
}
