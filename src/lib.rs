//! # Chunkbase
//!
//! Text chunks with embedding vectors, stored in an embedded engine that
//! provides full-text and dense vector search.
//!
//! Chunkbase keeps the engine at arm's length: the [`StorageEngine`] trait is
//! the whole contract, and [`ChunkStore`] is the thin access layer on top of
//! it that validates records and turns every engine failure into a typed
//! [`Error`]. A small web form UI ([`ui`]) and a CLI drive the store.
//!
//! ## Example
//!
//! ```rust,ignore
//! use chunkbase::{Chunk, ChunkStore, StoreSettings};
//! use chunkbase::storage::SqliteEngine;
//!
//! let engine = SqliteEngine::in_memory();
//! let store = ChunkStore::open(engine, StoreSettings::default())?;
//! store.insert_chunk(Chunk {
//!     chunk_text: "Office for Harmful Blooms".to_string(),
//!     file_uuid: "1234567890".to_string(),
//!     filename: "test2.txt".to_string(),
//!     vector: vec![4.0, 4.2, 4.3, 4.5],
//! })?;
//! store.ensure_index()?;
//! let hits = store.search_by_text("blooms", 10)?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod config;
pub mod io;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;
pub mod ui;

pub use config::ChunkbaseConfig;
pub use models::{
    Chunk, ColumnDef, ColumnType, ConflictPolicy, DenseQuery, DistanceMetric, FileSummary,
    IndexDefinition, IndexKind, Record, ScoredRecord, TableSchema, TextQuery, Value,
};
pub use services::{ChunkStore, InsertReport, RejectedRecord, StoreSettings};
pub use storage::{SqliteEngine, StorageEngine, TableHandle};

/// Error type for chunkbase operations.
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Malformed vectors, empty conditions or queries, bad identifiers, schema violations |
/// | `DimensionMismatch` | A record or query vector does not match the column dimension |
/// | `NotFound` | The database, table, index or column does not exist |
/// | `AlreadyExists` | A create call with `ConflictPolicy::Error` hits an existing object |
/// | `Conflict` | An object exists under the same name with a different definition |
/// | `OperationFailed` | The engine, filesystem or server failed |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A vector has the wrong number of components.
    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension declared by the column.
        expected: usize,
        /// Dimension of the offending vector.
        actual: usize,
    },

    /// The named object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The named object already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The named object exists with a different definition.
    ///
    /// Raised when:
    /// - `ensure_table` finds a table whose schema differs from the configured one
    /// - `create_index` finds an index with the same name on another column or kind
    #[error("conflict: {0}")]
    Conflict(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - `SQLite` statements fail (including malformed delete conditions)
    /// - Filesystem I/O errors occur while opening or removing the workspace
    /// - The UI server cannot bind or serve
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Builds an [`Error::OperationFailed`] from an operation name and any displayable cause.
    pub fn operation(operation: &str, cause: impl std::fmt::Display) -> Self {
        Self::OperationFailed {
            operation: operation.to_string(),
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for chunkbase operations.
pub type Result<T> = std::result::Result<T, Error>;
