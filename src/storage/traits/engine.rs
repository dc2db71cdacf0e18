//! Storage engine trait.
//!
//! The engine owns everything hard: persistence, full-text ranking, vector
//! scoring and transactions. Chunkbase only calls into it through this trait,
//! which keeps the store testable against a fake engine.
//!
//! # Available Implementations
//!
//! | Engine | Use Case | Full-text | Dense search |
//! |--------|----------|-----------|--------------|
//! | `SqliteEngine` | Default; embedded, one file per database | FTS5 with BM25 ranking | Exhaustive scan |
//!
//! # Conflict Policies
//!
//! Create and drop calls take a [`ConflictPolicy`]. With
//! [`ConflictPolicy::Error`] an existing target is [`crate::Error::AlreadyExists`]
//! (a missing one, for drops, is [`crate::Error::NotFound`]); with
//! [`ConflictPolicy::Ignore`] the call succeeds without touching anything.
//! Engines never compare definitions; that is the caller's job.
//!
//! # Conditions
//!
//! `delete`, `scan` and [`DenseQuery::filter`] take condition strings in the
//! engine's own filter language. They are forwarded unparsed.

use crate::Result;
use crate::models::{
    ConflictPolicy, DenseQuery, IndexDefinition, Record, ScoredRecord, TableSchema, TextQuery,
};

/// Handle to an existing table: database name, table name and schema.
#[derive(Debug, Clone, PartialEq)]
pub struct TableHandle {
    /// Database holding the table.
    pub database: String,
    /// Table name.
    pub table: String,
    /// Schema the table was created with.
    pub schema: TableSchema,
}

impl TableHandle {
    /// Creates a handle.
    #[must_use]
    pub fn new(database: impl Into<String>, table: impl Into<String>, schema: TableSchema) -> Self {
        Self {
            database: database.into(),
            table: table.into(),
            schema,
        }
    }
}

/// Trait for storage engines.
///
/// # Implementor Notes
///
/// - Methods use `&self` so one engine can be shared behind an `Arc`
/// - Use interior mutability (e.g., `Mutex<Connection>`) for connection state
/// - `insert` is one batch: all rows land or none do
/// - Ranked results come back best first
pub trait StorageEngine: Send + Sync {
    /// Short engine name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Returns true if the database exists.
    fn has_database(&self, name: &str) -> Result<bool>;

    /// Creates a database.
    fn create_database(&self, name: &str, policy: ConflictPolicy) -> Result<()>;

    /// Returns the schema of a table, or `None` if it does not exist.
    fn describe_table(&self, database: &str, table: &str) -> Result<Option<TableSchema>>;

    /// Creates a table.
    fn create_table(
        &self,
        database: &str,
        table: &str,
        schema: &TableSchema,
        policy: ConflictPolicy,
    ) -> Result<()>;

    /// Drops a table with its indexes.
    fn drop_table(&self, database: &str, table: &str, policy: ConflictPolicy) -> Result<()>;

    /// Returns an index definition, or `None` if no index has that name.
    fn describe_index(&self, table: &TableHandle, name: &str) -> Result<Option<IndexDefinition>>;

    /// Creates an index and indexes the existing rows.
    fn create_index(
        &self,
        table: &TableHandle,
        index: &IndexDefinition,
        policy: ConflictPolicy,
    ) -> Result<()>;

    /// Inserts rows in one batch, returning how many were written.
    fn insert(&self, table: &TableHandle, rows: &[Record]) -> Result<usize>;

    /// Deletes rows matching `condition`, returning how many were removed.
    fn delete(&self, table: &TableHandle, condition: &str) -> Result<usize>;

    /// Runs a ranked full-text match.
    fn match_text(&self, table: &TableHandle, query: &TextQuery) -> Result<Vec<ScoredRecord>>;

    /// Runs a dense vector match.
    fn match_dense(&self, table: &TableHandle, query: &DenseQuery) -> Result<Vec<ScoredRecord>>;

    /// Returns every row (optionally filtered) in insertion order.
    fn scan(&self, table: &TableHandle, filter: Option<&str>) -> Result<Vec<Record>>;

    /// Returns the number of rows.
    fn count(&self, table: &TableHandle) -> Result<usize>;

    /// Removes every database of the workspace.
    fn destroy(&self) -> Result<()>;
}
