//! Fetch subcommand - batched extraction over postal codes

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Args;
use pxline_core::{SharedProgress, fmt_bytes, fmt_num};
use pxline_pxweb::{
    BatchReport, DatasetMetadata, Extractor, MetadataProvider, QueryConfig, regions,
};

use super::output::{
    SourceArgs, fetch_metadata, print_summary, timestamped, write_dataset, write_metadata,
};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct FetchArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Municipalities by name or code (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub municipalities: Vec<String>,

    /// Extra postal codes (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub postal_codes: Vec<String>,

    /// Years (comma-separated, default: start year through current year)
    #[arg(short, long, value_delimiter = ',')]
    pub years: Vec<String>,

    /// Building type codes (comma-separated, default: from profile)
    #[arg(long, value_delimiter = ',')]
    pub building_types: Option<Vec<String>>,

    /// Metric codes (comma-separated, default: from profile)
    #[arg(long, value_delimiter = ',')]
    pub metrics: Option<Vec<String>>,

    /// Postal codes per request
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Milliseconds between batch requests
    #[arg(long)]
    pub delay_ms: Option<u64>,
}

/// Postal codes from municipalities plus explicit codes, first occurrence
/// wins. Nothing requested means every known postal code.
fn resolve_postal_codes(municipalities: &[String], extra: &[String]) -> Result<Vec<String>> {
    if municipalities.is_empty() && extra.is_empty() {
        return Ok(regions::all_postal_codes());
    }

    let mut codes: Vec<String> = Vec::new();
    for name in municipalities {
        let m = regions::municipality(name).with_context(|| {
            format!(
                "Unknown municipality: {name} (known: {})",
                regions::municipality_names().join(", ")
            )
        })?;
        codes.extend(m.postal_codes.iter().map(|c| c.to_string()));
    }
    codes.extend(extra.iter().cloned());

    let mut seen = std::collections::HashSet::new();
    codes.retain(|c| seen.insert(c.clone()));
    Ok(codes)
}

fn build_config(args: &FetchArgs, config: &Config) -> Result<QueryConfig> {
    let postal_codes = resolve_postal_codes(&args.municipalities, &args.postal_codes)?;
    let years = if args.years.is_empty() {
        regions::year_range(
            config.extract.start_year,
            chrono::Datelike::year(&chrono::Local::now()),
        )
    } else {
        args.years.clone()
    };
    Ok(QueryConfig {
        postal_codes,
        years,
        building_types: args.building_types.clone(),
        metrics: args.metrics.clone(),
    })
}

/// Write one run into a fresh `<base>/<run>` directory: `metadata.json`
/// plus `batch_NNN` per successful batch. Returns the directory and bytes written.
fn write_run(
    base: &Path,
    run: &str,
    metadata: &DatasetMetadata,
    report: &BatchReport,
) -> Result<(PathBuf, usize)> {
    std::fs::create_dir_all(base)
        .with_context(|| format!("Cannot create output directory {}", base.display()))?;
    let dir = base.join(run);
    std::fs::create_dir(&dir)
        .with_context(|| format!("Cannot create run directory {}", dir.display()))?;

    write_metadata(&dir, metadata)?;
    let mut bytes = 0;
    for outcome in &report.outcomes {
        if let Ok(raw) = &outcome.result {
            write_dataset(&dir, &format!("batch_{:03}", outcome.index + 1), raw)?;
            bytes += raw.size();
        }
    }
    Ok((dir, bytes))
}

pub fn run(args: FetchArgs, config: &Config, progress: &SharedProgress) -> Result<ExitCode> {
    let start = Instant::now();
    let source = args.source.source(config);
    let format = args.source.format(config);
    let output_dir = args.source.output_dir(config);
    let batch_size = args.batch_size.unwrap_or(config.extract.batch_size);
    let delay = Duration::from_millis(args.delay_ms.unwrap_or(config.extract.delay_ms));
    let query_config = build_config(&args, config)?;

    let metadata = Arc::new(fetch_metadata(&source, progress)?);
    log::info!("Dataset: {}", metadata.title);

    let expected_batches = query_config.postal_codes.len().div_ceil(batch_size.max(1));
    let extractor = Extractor::new()
        .profile(config.profile.clone())
        .delay(delay)
        .progress(progress.batch_bar("fetch", expected_batches as u64));

    let report = extractor
        .extract_batched(&metadata, &source.api_url(), &query_config, batch_size, &format)
        .context("Batched extraction failed")?;

    let (run_dir, bytes) = write_run(&output_dir, &timestamped("fetch"), &metadata, &report)?;

    log_failures(&report);
    print_summary(
        "Fetch",
        &[
            ("Dataset", metadata.title.clone()),
            ("Postal codes requested", fmt_num(query_config.postal_codes.len())),
            ("Postal codes dropped", fmt_num(report.dropped_postal_codes)),
            ("Years dropped", fmt_num(report.dropped_years)),
            ("Building types dropped", fmt_num(report.dropped_building_types)),
            (
                "Batches",
                format!("{}/{} succeeded", report.succeeded(), report.planned()),
            ),
            ("Data written", fmt_bytes(bytes)),
            ("Output", run_dir.display().to_string()),
            ("Time", format!("{:.1}s", start.elapsed().as_secs_f64())),
        ],
    );

    if report.is_complete() {
        Ok(ExitCode::SUCCESS)
    } else {
        log::error!("{} of {} batches failed", report.failed(), report.planned());
        Ok(ExitCode::from(1))
    }
}

fn log_failures(report: &BatchReport) {
    for (outcome, err) in report.failures() {
        let codes = &outcome.postal_codes;
        log::warn!(
            "Batch {} ({}-{}) missing: {err}",
            outcome.index + 1,
            codes.first().map_or("?", String::as_str),
            codes.last().map_or("?", String::as_str),
        );
    }
}
