//! Single-request extractions: whole table, or latest N periods

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use pxline_core::{SharedProgress, fmt_bytes};
use pxline_pxweb::{Extractor, MetadataProvider, RawDataset};

use super::output::{SourceArgs, fetch_metadata, print_summary, timestamped, write_dataset};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct SnapshotArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Args, Debug)]
pub struct LatestArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Number of most recent periods
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub top: u32,
}

pub fn run_snapshot(args: SnapshotArgs, config: &Config, progress: &SharedProgress) -> Result<ExitCode> {
    let source = args.source.source(config);
    let format = args.source.format(config);
    let metadata = Arc::new(fetch_metadata(&source, progress)?);

    let pb = progress.stage_line("snapshot");
    pb.set_message(metadata.title.clone());
    let raw = Extractor::new()
        .extract(&metadata, &source.api_url(), &format)
        .context("Snapshot extraction failed");
    pb.finish_and_clear();

    save(&args.source, config, "snapshot", &raw?)
}

pub fn run_latest(args: LatestArgs, config: &Config, progress: &SharedProgress) -> Result<ExitCode> {
    let source = args.source.source(config);
    let format = args.source.format(config);
    let metadata = Arc::new(fetch_metadata(&source, progress)?);

    let pb = progress.stage_line("latest");
    pb.set_message(format!("{} (top {})", metadata.title, args.top));
    let raw = Extractor::new()
        .extract_latest(&metadata, &source.api_url(), args.top, &format)
        .context("Latest-period extraction failed");
    pb.finish_and_clear();

    save(&args.source, config, &format!("latest{}", args.top), &raw?)
}

fn save(args: &SourceArgs, config: &Config, prefix: &str, raw: &RawDataset) -> Result<ExitCode> {
    let output_dir = args.output_dir(config);
    let path = write_dataset(&output_dir, &timestamped(prefix), raw)?;
    print_summary(
        "Extraction",
        &[
            ("Dataset", raw.metadata.title.clone()),
            ("Format", raw.format.clone()),
            ("Data size", fmt_bytes(raw.size())),
            ("Saved to", path.display().to_string()),
        ],
    );
    Ok(ExitCode::SUCCESS)
}
