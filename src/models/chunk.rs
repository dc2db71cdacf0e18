//! The chunk record shape and its helpers.

use super::{ColumnDef, ColumnType, Record, TableSchema, Value};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Field holding the chunk text (full-text indexed).
pub const CHUNK_TEXT: &str = "chunk_text";
/// Field holding the uuid of the source file.
pub const FILE_UUID: &str = "file_uuid";
/// Field holding the source filename.
pub const FILENAME: &str = "filename";
/// Field holding the embedding vector.
pub const VECTOR: &str = "vector";

/// A text chunk with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// The chunk text.
    pub chunk_text: String,
    /// Uuid of the file the chunk came from.
    pub file_uuid: String,
    /// Name of the file the chunk came from.
    pub filename: String,
    /// Embedding vector.
    pub vector: Vec<f32>,
}

impl From<Chunk> for Record {
    fn from(chunk: Chunk) -> Self {
        Self::new()
            .with(CHUNK_TEXT, chunk.chunk_text)
            .with(FILE_UUID, chunk.file_uuid)
            .with(FILENAME, chunk.filename)
            .with(VECTOR, chunk.vector)
    }
}

/// Builds the default chunk table schema for a given vector dimension.
///
/// Text columns default to the empty string; the vector has no default, so
/// every record must carry one.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if `dimension` is zero.
pub fn default_chunk_schema(dimension: usize) -> Result<TableSchema> {
    if dimension == 0 {
        return Err(Error::InvalidInput(
            "vector dimension must be greater than zero".to_string(),
        ));
    }
    TableSchema::new(vec![
        ColumnDef::new(CHUNK_TEXT, ColumnType::Varchar).with_default(""),
        ColumnDef::new(FILE_UUID, ColumnType::Varchar).with_default(""),
        ColumnDef::new(FILENAME, ColumnType::Varchar).with_default(""),
        ColumnDef::new(VECTOR, ColumnType::Vector { dimension }),
    ])
}

/// Checks that a schema carries the chunk fields with their expected types.
pub(crate) fn check_chunk_schema(schema: &TableSchema) -> Result<()> {
    for name in [CHUNK_TEXT, FILE_UUID, FILENAME] {
        match schema.column(name) {
            Some(c) if c.column_type == ColumnType::Varchar => {},
            Some(c) => {
                return Err(Error::InvalidInput(format!(
                    "column '{name}' must be varchar, not {}",
                    c.column_type
                )));
            },
            None => return Err(Error::InvalidInput(format!("schema lacks column '{name}'"))),
        }
    }
    match schema.column(VECTOR).map(|c| c.column_type) {
        Some(ColumnType::Vector { .. }) => Ok(()),
        Some(other) => Err(Error::InvalidInput(format!(
            "column '{VECTOR}' must be a vector, not {other}"
        ))),
        None => Err(Error::InvalidInput(format!("schema lacks column '{VECTOR}'"))),
    }
}

/// Parses a comma-separated list of numbers into a vector.
///
/// Whitespace around components is ignored, as are surrounding brackets, so
/// both `1.0, 1.2, 0.8` and `[1.0,1.2,0.8]` parse.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the input is empty or a component is not
/// a finite number.
pub fn parse_vector(input: &str) -> Result<Vec<f32>> {
    let trimmed = input
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("vector is empty".to_string()));
    }

    trimmed
        .split(',')
        .map(|part| {
            let part = part.trim();
            match part.parse::<f32>() {
                Ok(x) if x.is_finite() => Ok(x),
                _ => Err(Error::InvalidInput(format!(
                    "vector component '{part}' is not a number"
                ))),
            }
        })
        .collect()
}

impl Record {
    /// Length of the chunk text in characters (0 when absent).
    #[must_use]
    pub fn chunk_chars(&self) -> usize {
        self.text(CHUNK_TEXT).map_or(0, |t| t.chars().count())
    }
}

impl TryFrom<&Record> for Chunk {
    type Error = Error;

    fn try_from(record: &Record) -> Result<Self> {
        let text = |name: &str| record.text(name).unwrap_or_default().to_string();
        let vector = match record.get(VECTOR) {
            Some(Value::Vector(v)) => v.clone(),
            _ => return Err(Error::InvalidInput(format!("record lacks '{VECTOR}'"))),
        };
        Ok(Self {
            chunk_text: text(CHUNK_TEXT),
            file_uuid: text(FILE_UUID),
            filename: text(FILENAME),
            vector,
        })
    }
}
