// ==============================================================================
// output.rs - Table Output Generation
// ==============================================================================
// Description: Serialize the finalized wide table as TSV, JSON or Parquet
// Author: Matt Barham
// Created: 2025-11-06
// Modified: 2026-10-17
// Version: 2.0.0
// ==============================================================================

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::Arc;
use tracing::info;

// Apache Arrow/Parquet for columnar data
use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;

use crate::column_key::ColumnKey;
use crate::models::Scalar;
use crate::table::Table;

/// Token written for cells a report has no value for
pub const DEFAULT_NA_VALUE: &str = "NA";

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Tab-separated text (default; diffable, R/pandas friendly)
    Tsv,
    /// JSON object with `columns` and `rows`
    Json,
    /// Apache Parquet (best for data science: Python, R, Spark)
    Parquet,
}

impl OutputFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Tsv => "tsv",
            OutputFormat::Json => "json",
            OutputFormat::Parquet => "parquet",
        }
    }

    /// Whether the format is plain text and safe to print on a terminal
    pub fn is_text(&self) -> bool {
        !matches!(self, OutputFormat::Parquet)
    }
}

/// JSON layout: column names once, then one array of cells per report
#[derive(Debug, Serialize)]
struct JsonTable<'a> {
    columns: &'a [ColumnKey],
    rows: Vec<Vec<Option<&'a Scalar>>>,
}

/// Writes a finalized table in one output format
pub struct TableWriter {
    format: OutputFormat,
    na_value: String,
}

impl TableWriter {
    pub fn new(format: OutputFormat, na_value: impl Into<String>) -> Self {
        Self {
            format,
            na_value: na_value.into(),
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Serialize `table` to `out`
    ///
    /// Missing cells are written as the NA token in TSV, `null` in JSON and
    /// null in Parquet.
    pub fn write<W: Write + Send>(&self, table: &Table, out: W) -> Result<()> {
        match self.format {
            OutputFormat::Tsv => self.write_tsv(table, out),
            OutputFormat::Json => self.write_json(table, out),
            OutputFormat::Parquet => self.write_parquet(table, out),
        }
    }

    /// Header line of column names, then one line per report
    fn write_tsv<W: Write>(&self, table: &Table, mut out: W) -> Result<()> {
        if table.columns().is_empty() {
            // Nothing was tabulated; keep one (empty) line per row
            for _ in 0..=table.len() {
                writeln!(out).context("Failed to write TSV output")?;
            }
            return Ok(());
        }

        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .quote_style(csv::QuoteStyle::Never)
            .from_writer(out);

        writer
            .write_record(table.columns().iter().map(ColumnKey::as_str))
            .context("Failed to write TSV header")?;

        for row in table.rows() {
            let fields: Vec<String> = table
                .row_values(row)
                .map(|value| match value {
                    Some(value) => value.to_string(),
                    None => self.na_value.clone(),
                })
                .collect();

            writer
                .write_record(&fields)
                .context("Failed to write TSV row")?;
        }

        writer.flush().context("Failed to flush TSV output")?;

        info!(
            "TSV output complete: {} rows, {} columns",
            table.len(),
            table.columns().len()
        );

        Ok(())
    }

    fn write_json<W: Write>(&self, table: &Table, mut out: W) -> Result<()> {
        let json = JsonTable {
            columns: table.columns(),
            rows: table
                .rows()
                .iter()
                .map(|row| table.row_values(row).collect())
                .collect(),
        };

        serde_json::to_writer_pretty(&mut out, &json).context("Failed to write JSON output")?;
        writeln!(out).context("Failed to write JSON output")?;

        info!("JSON output complete: {} rows", table.len());

        Ok(())
    }

    /// One nullable UTF-8 column per table column, Snappy compressed
    fn write_parquet<W: Write + Send>(&self, table: &Table, out: W) -> Result<()> {
        if table.columns().is_empty() {
            anyhow::bail!("Cannot write a table without columns as Parquet");
        }

        let schema = Arc::new(Schema::new(
            table
                .columns()
                .iter()
                .map(|column| Field::new(column.as_str(), DataType::Utf8, true))
                .collect::<Vec<_>>(),
        ));

        let arrays: Vec<ArrayRef> = table
            .columns()
            .iter()
            .map(|column| {
                let values: Vec<Option<String>> = table
                    .rows()
                    .iter()
                    .map(|row| row.get(column.as_str()).map(|value| value.to_string()))
                    .collect();
                Arc::new(StringArray::from(values)) as ArrayRef
            })
            .collect();

        let batch = RecordBatch::try_new(schema.clone(), arrays)
            .context("Failed to create Arrow RecordBatch")?;

        let props = WriterProperties::builder()
            .set_compression(parquet::basic::Compression::SNAPPY)
            .build();

        let mut writer = ArrowWriter::try_new(out, schema, Some(props))
            .context("Failed to create Parquet writer")?;

        writer
            .write(&batch)
            .context("Failed to write Parquet data")?;
        writer.close().context("Failed to close Parquet writer")?;

        info!(
            "Parquet output complete: {} rows, {} columns",
            table.len(),
            table.columns().len()
        );

        Ok(())
    }
}
