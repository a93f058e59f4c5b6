// ==============================================================================
// main.rs - SOLAR Tabulation Entry Point
// ==============================================================================
// Description: Command-line entry point: tabulates polygenic.out reports from
//              SOLAR run directories into one wide table
// Author: Matt Barham
// Created: 2025-10-31
// Modified: 2026-10-17
// Version: 2.0.0
// ==============================================================================

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use solar_tabulate::output::{OutputFormat, TableWriter, DEFAULT_NA_VALUE};
use solar_tabulate::processor::TabulationJob;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// SOLAR run directories (containing polygenic.out) or report files
    #[arg(required = true, value_name = "PATH")]
    files: Vec<PathBuf>,

    /// Token written for missing values
    #[arg(long, env = "SOLAR_NA_VALUE", default_value = DEFAULT_NA_VALUE)]
    na_value: String,

    /// Skip reports that are missing or did not run to completion
    #[arg(long)]
    skip_failures: bool,

    /// Output format
    #[arg(long, value_enum, env = "SOLAR_OUTPUT_FORMAT", default_value_t = OutputFormat::Tsv)]
    format: OutputFormat,

    /// Write the table to FILE instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize tracing; stdout is reserved for the table
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "solar_tabulate=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();

    let outcome = TabulationJob::new(args.files, args.skip_failures).run()?;

    for skipped in &outcome.skipped {
        info!("Skipped {}: {}", skipped.path.display(), skipped.reason);
    }

    let writer = TableWriter::new(args.format, args.na_value);

    match args.output {
        Some(path) => {
            let file = File::create(&path)
                .with_context(|| format!("Failed to create output file '{}'", path.display()))?;
            let mut out = BufWriter::new(file);
            writer.write(&outcome.table, &mut out)?;
            out.flush()
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
            info!("Wrote {} rows to {}", outcome.table.len(), path.display());
        }
        None => {
            let stdout = io::stdout();
            if !args.format.is_text() && stdout.is_terminal() {
                anyhow::bail!(
                    "Refusing to write {} output to a terminal; use --output FILE",
                    args.format.extension()
                );
            }
            let mut out = BufWriter::new(stdout);
            writer.write(&outcome.table, &mut out)?;
            out.flush().context("Failed to write to stdout")?;
        }
    }

    Ok(())
}
