//! Metadata and catalogue listings

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use pxline_core::SharedProgress;
use pxline_pxweb::{DatasetMetadata, Variable, regions};

use super::output::{fetch_metadata, print_summary};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct MetadataArgs {
    /// Table URL, PX-Web UI or API form (default: from config)
    #[arg(short, long)]
    pub url: Option<String>,

    /// List value codes of one variable instead of the variable overview
    #[arg(short, long)]
    pub variable: Option<String>,
}

fn styled_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(headers.iter().map(|h| Cell::new(h).fg(Color::Cyan)));
    table
}

fn flag(value: bool) -> &'static str {
    if value { "yes" } else { "" }
}

pub fn run(args: MetadataArgs, config: &Config, progress: &SharedProgress) -> Result<ExitCode> {
    let source = pxline_pxweb::PxWebSource::new(
        args.url
            .unwrap_or_else(|| config.source.dataset_url.clone()),
    );
    let metadata = fetch_metadata(&source, progress)?;

    match args.variable {
        Some(code) => {
            let Some(var) = metadata.variable(&code) else {
                let known: Vec<&str> = metadata.variables.iter().map(|v| v.code.as_str()).collect();
                anyhow::bail!("No variable {code} (known: {})", known.join(", "));
            };
            print_values(var);
        }
        None => print_variables(&metadata),
    }
    Ok(ExitCode::SUCCESS)
}

fn print_variables(metadata: &DatasetMetadata) {
    print_summary(
        "Dataset",
        &[
            ("Title", metadata.title.clone()),
            ("Source", metadata.source.clone().unwrap_or_default()),
            ("Updated", metadata.updated.clone().unwrap_or_default()),
            ("Variables", metadata.variables.len().to_string()),
        ],
    );

    let mut table = styled_table(&["Code", "Text", "Values", "Time", "Elimination"]);
    for var in &metadata.variables {
        table.add_row(vec![
            Cell::new(&var.code),
            Cell::new(&var.text),
            Cell::new(var.values.len()),
            Cell::new(flag(var.is_time())),
            Cell::new(flag(var.is_eliminable())),
        ]);
    }
    eprintln!("\n{table}");
}

fn print_values(var: &Variable) {
    let mut table = styled_table(&["Code", "Text"]);
    for (code, text) in var.values.iter().zip(&var.value_texts) {
        table.add_row(vec![code, text]);
    }
    eprintln!("\n{} ({})\n{table}", var.text, var.code);
}

/// Print the built-in municipality catalogue
pub fn print_municipalities() {
    let mut table = styled_table(&["Municipality", "Code", "Postal codes", "Range"]);
    for m in regions::MUNICIPALITIES {
        let range = match (m.postal_codes.first(), m.postal_codes.last()) {
            (Some(first), Some(last)) => format!("{first}-{last}"),
            _ => String::new(),
        };
        table.add_row(vec![
            Cell::new(m.name),
            Cell::new(m.code),
            Cell::new(m.postal_codes.len()),
            Cell::new(range),
        ]);
    }
    eprintln!("\n{table}");
}
