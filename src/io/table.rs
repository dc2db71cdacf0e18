//! Aligned text table output.

use crate::{Error, Result};
use std::io::Write;

/// Longest cell shown before truncation, in characters.
const MAX_CELL_CHARS: usize = 60;

fn clip(cell: &str) -> String {
    if cell.chars().count() <= MAX_CELL_CHARS {
        cell.to_string()
    } else {
        let mut clipped: String = cell.chars().take(MAX_CELL_CHARS - 3).collect();
        clipped.push_str("...");
        clipped
    }
}

/// Writes the rows as space-padded columns under a header and a rule.
pub fn write_table<W: Write>(mut out: W, headers: &[String], body: &[Vec<String>]) -> Result<()> {
    let header: Vec<String> = headers.iter().map(|h| clip(h)).collect();
    let rows: Vec<Vec<String>> = body
        .iter()
        .map(|row| row.iter().map(|c| clip(c)).collect())
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();

    let mut text = line(&header);
    text.push('\n');
    text.push_str(&line(&rule));
    text.push('\n');
    for row in &rows {
        text.push_str(&line(row));
        text.push('\n');
    }
    out.write_all(text.as_bytes())
        .map_err(|e| Error::operation("write_table", e))
}
