//! Output formats for listing and search results.
//!
//! The CLI writes rows, ranked hits and per-file summaries as an aligned
//! text table, JSON or CSV.

mod csv;
mod table;

use crate::models::{FileSummary, Record, ScoredRecord};
use crate::{Error, Result};
use std::fmt;
use std::io::Write;
use std::str::FromStr;

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Aligned text table.
    #[default]
    Table,
    /// Pretty-printed JSON array.
    Json,
    /// CSV with a header row.
    Csv,
}

impl OutputFormat {
    /// Returns the format as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "table" | "text" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(Error::InvalidInput(format!(
                "unknown output format '{other}' (expected table, json or csv)"
            ))),
        }
    }
}

/// Cells of one row, in column order.
fn record_cells(columns: &[String], record: &Record) -> Vec<String> {
    columns
        .iter()
        .map(|c| record.get(c).map(ToString::to_string).unwrap_or_default())
        .collect()
}

const FILE_HEADERS: [&str; 4] = ["filename", "file_uuid", "chunk_num", "char_num"];

fn file_cells(file: &FileSummary) -> Vec<String> {
    vec![
        file.filename.clone(),
        file.file_uuid.clone(),
        file.chunk_count.to_string(),
        file.char_count.to_string(),
    ]
}

fn write_json<W: Write, T: serde::Serialize + ?Sized>(mut out: W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, value).map_err(|e| Error::operation("write_json", e))?;
    writeln!(out).map_err(|e| Error::operation("write_json", e))
}

/// Writes rows.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_records<W: Write>(
    out: W,
    format: OutputFormat,
    columns: &[String],
    rows: &[Record],
) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(out, rows),
        OutputFormat::Table | OutputFormat::Csv => {
            let body: Vec<Vec<String>> = rows.iter().map(|r| record_cells(columns, r)).collect();
            write_grid(out, format, columns, &body)
        },
    }
}

/// Writes ranked hits with a trailing score column.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_hits<W: Write>(
    out: W,
    format: OutputFormat,
    columns: &[String],
    score_label: &str,
    hits: &[ScoredRecord],
) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(out, hits),
        OutputFormat::Table | OutputFormat::Csv => {
            let mut headers = columns.to_vec();
            headers.push(score_label.to_string());
            let body: Vec<Vec<String>> = hits
                .iter()
                .map(|hit| {
                    let mut cells = record_cells(columns, &hit.record);
                    cells.push(format!("{:.4}", hit.score));
                    cells
                })
                .collect();
            write_grid(out, format, &headers, &body)
        },
    }
}

/// Writes per-file summaries.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_files<W: Write>(out: W, format: OutputFormat, files: &[FileSummary]) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(out, files),
        OutputFormat::Table | OutputFormat::Csv => {
            let headers: Vec<String> = FILE_HEADERS.iter().map(ToString::to_string).collect();
            let body: Vec<Vec<String>> = files.iter().map(file_cells).collect();
            write_grid(out, format, &headers, &body)
        },
    }
}

fn write_grid<W: Write>(
    out: W,
    format: OutputFormat,
    headers: &[String],
    body: &[Vec<String>],
) -> Result<()> {
    if format == OutputFormat::Csv {
        csv::write_csv(out, headers, body)
    } else {
        table::write_table(out, headers, body)
    }
}
