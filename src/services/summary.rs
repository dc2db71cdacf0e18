//! Per-file aggregation of chunk rows.

use crate::models::{FILE_UUID, FILENAME, FileSummary, Record};
use std::collections::BTreeMap;

/// Groups rows by filename, sorted by filename.
///
/// Each group keeps the uuid of its first row, the number of rows and the
/// total chunk text length in characters. Rows without a filename group
/// under the empty name.
#[must_use]
pub fn summarize_by_filename(rows: &[Record]) -> Vec<FileSummary> {
    let mut groups: BTreeMap<&str, FileSummary> = BTreeMap::new();
    for row in rows {
        let filename = row.text(FILENAME).unwrap_or_default();
        let summary = groups.entry(filename).or_insert_with(|| FileSummary {
            filename: filename.to_string(),
            file_uuid: row.text(FILE_UUID).unwrap_or_default().to_string(),
            chunk_count: 0,
            char_count: 0,
        });
        summary.chunk_count += 1;
        summary.char_count += row.chunk_chars();
    }
    groups.into_values().collect()
}
