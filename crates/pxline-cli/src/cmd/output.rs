//! Shared arguments and file output for extraction commands

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use pxline_core::ProgressContext;
use pxline_pxweb::{DatasetMetadata, MetadataProvider, PxWebSource, RawDataset};

use crate::config::Config;

/// Table location, response format and output directory
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Table URL, PX-Web UI or API form (default: from config)
    #[arg(short, long)]
    pub url: Option<String>,

    /// Response format, e.g. json-stat2, csv, px (default: from config)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Output directory (default: from config)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl SourceArgs {
    pub fn source(&self, config: &Config) -> PxWebSource {
        PxWebSource::new(
            self.url
                .clone()
                .unwrap_or_else(|| config.source.dataset_url.clone()),
        )
    }

    pub fn format(&self, config: &Config) -> String {
        self.format
            .clone()
            .unwrap_or_else(|| config.source.format.clone())
    }

    pub fn output_dir(&self, config: &Config) -> PathBuf {
        self.output.clone().unwrap_or_else(|| config.output.dir.clone())
    }
}

/// Fetch metadata behind a spinner.
pub fn fetch_metadata(source: &PxWebSource, progress: &ProgressContext) -> Result<DatasetMetadata> {
    let pb = progress.stage_line("metadata");
    pb.set_message(source.api_url());
    let metadata = source
        .fetch_metadata()
        .with_context(|| format!("Failed to fetch metadata from {}", source.api_url()));
    pb.finish_and_clear();
    metadata
}

/// File extension for a PX-Web response format
pub fn file_extension(format: &str) -> &str {
    match format {
        "json" | "json-stat" | "json-stat2" => "json",
        "csv" | "csv2" | "csv3" => "csv",
        other => other,
    }
}

/// Write one response body verbatim as `<stem>.<ext>`.
pub fn write_dataset(dir: &Path, stem: &str, raw: &RawDataset) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Cannot create output directory {}", dir.display()))?;
    let path = dir.join(format!("{stem}.{}", file_extension(&raw.format)));
    std::fs::write(&path, &raw.data)
        .with_context(|| format!("Cannot write {}", path.display()))?;
    log::debug!("Saved {}", path.display());
    Ok(path)
}

/// Write the metadata the datasets were extracted against.
pub fn write_metadata(dir: &Path, metadata: &DatasetMetadata) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Cannot create output directory {}", dir.display()))?;
    let path = dir.join("metadata.json");
    let json = serde_json::to_string_pretty(metadata).context("Cannot serialize metadata")?;
    std::fs::write(&path, json).with_context(|| format!("Cannot write {}", path.display()))?;
    Ok(path)
}

/// Filename stem with a local timestamp, e.g. `snapshot_20250114T093000`
pub fn timestamped(prefix: &str) -> String {
    format!("{prefix}_{}", chrono::Local::now().format("%Y%m%dT%H%M%S"))
}

/// Print a key-value summary table on stderr
pub fn print_summary(title: &str, rows: &[(&str, String)]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new(title).fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    eprintln!("\n{table}");
}
