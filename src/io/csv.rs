//! CSV output.

use crate::{Error, Result};
use std::io::Write;

/// Writes a header row and the body rows as CSV.
pub fn write_csv<W: Write>(out: W, headers: &[String], body: &[Vec<String>]) -> Result<()> {
    let mut writer = ::csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(out);

    writer
        .write_record(headers)
        .map_err(|e| Error::operation("write_csv_headers", e))?;
    for row in body {
        writer
            .write_record(row)
            .map_err(|e| Error::operation("write_csv", e))?;
    }
    writer.flush().map_err(|e| Error::operation("flush_csv", e))
}
