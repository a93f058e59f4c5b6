// ==============================================================================
// processor.rs - Report Tabulation Pipeline
// ==============================================================================
// Description: Reads and parses polygenic.out reports, applies the failure
//              policy and assembles the wide table
// Author: Matt Barham
// Created: 2026-10-14
// Modified: 2026-10-17
// Version: 1.0.0
// ==============================================================================

use anyhow::Result;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::locator::{self, LocateError};
use crate::models::Record;
use crate::parsers::{PolygenicParseError, PolygenicParser};
use crate::table::{Table, TableAssembler};

/// Why a single report could not be tabulated
#[derive(Error, Debug)]
pub enum ReportFailure {
    #[error(transparent)]
    Locate(#[from] LocateError),

    #[error(transparent)]
    Parse(#[from] PolygenicParseError),
}

impl ReportFailure {
    /// Missing/unreadable files and incomplete SOLAR runs may be skipped;
    /// malformed reports never are
    pub fn is_recoverable(&self) -> bool {
        match self {
            ReportFailure::Locate(_) => true,
            ReportFailure::Parse(error) => error.is_recoverable(),
        }
    }
}

/// A report left out of the table because of a recoverable failure
#[derive(Debug, Clone)]
pub struct SkippedReport {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of a tabulation run
#[derive(Debug)]
pub struct TabulationOutcome {
    pub table: Table,
    /// Reports that made it into the table, in row order
    pub processed: Vec<PathBuf>,
    pub skipped: Vec<SkippedReport>,
}

pub struct TabulationJob {
    inputs: Vec<PathBuf>,
    skip_failures: bool,
}

impl TabulationJob {
    pub fn new(inputs: Vec<PathBuf>, skip_failures: bool) -> Self {
        Self {
            inputs,
            skip_failures,
        }
    }

    /// Main processing pipeline
    ///
    /// Reports are read and parsed in parallel; results are then handled in
    /// input order so rows and column discovery do not depend on scheduling.
    /// Any fatal failure aborts the run before a table is produced.
    pub fn run(&self) -> Result<TabulationOutcome> {
        info!("Tabulating {} SOLAR reports", self.inputs.len());

        // 1. Read and parse every report
        let parsed: Vec<(PathBuf, Result<Record, ReportFailure>)> = self
            .inputs
            .par_iter()
            .map(|input| load_report(input))
            .collect();

        // 2. Apply the failure policy and assemble rows in input order
        let mut assembler = TableAssembler::new();
        let mut processed = Vec::new();
        let mut skipped = Vec::new();

        for (path, result) in parsed {
            match result {
                Ok(record) => {
                    if record.traits.is_empty() {
                        warn!("'{}' declares no traits", path.display());
                    }
                    assembler.add(&record);
                    processed.push(path);
                }
                Err(failure) if self.skip_failures && failure.is_recoverable() => {
                    warn!("Failed to read '{}': {}; skipping", path.display(), failure);
                    skipped.push(SkippedReport {
                        path,
                        reason: failure.to_string(),
                    });
                }
                Err(failure) => {
                    return Err(anyhow::Error::new(failure)
                        .context(format!("Failed to read '{}'", path.display())));
                }
            }
        }

        // 3. Fix the column set
        let table = assembler.finalize();

        info!(
            "Tabulated {} reports into {} columns ({} skipped)",
            table.len(),
            table.columns().len(),
            skipped.len()
        );

        Ok(TabulationOutcome {
            table,
            processed,
            skipped,
        })
    }
}

fn load_report(input: &Path) -> (PathBuf, Result<Record, ReportFailure>) {
    match locator::read_report(input) {
        Ok(source) => {
            let result = PolygenicParser::parse(&source.text).map_err(ReportFailure::from);
            (source.path, result)
        }
        Err(error) => (locator::resolve_report_path(input), Err(error.into())),
    }
}
