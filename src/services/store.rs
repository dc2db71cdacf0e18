//! The chunk store: a thin access layer over one storage engine.
//!
//! The store makes sure its database, table and full-text index exist,
//! validates records before they reach the engine, and forwards every other
//! call. Engine failures come back as [`Error`] values and are logged here;
//! nothing is swallowed.

use super::summary::summarize_by_filename;
use crate::models::{
    CHUNK_TEXT, Chunk, ConflictPolicy, DenseQuery, DistanceMetric, FILENAME, FileSummary,
    IndexDefinition, IndexKind, Record, ScoredRecord, TableSchema, TextQuery, check_chunk_schema,
    default_chunk_schema,
};
use crate::storage::{StorageEngine, TableHandle};
use crate::{Error, Result};
use serde::Serialize;
use std::sync::{PoisonError, RwLock};
use tracing::instrument;

/// Default database name.
pub const DEFAULT_DATABASE: &str = "my_db";
/// Default table name.
pub const DEFAULT_TABLE: &str = "my_table";
/// Default full-text index name.
pub const DEFAULT_INDEX: &str = "my_index";
/// Default vector dimension.
pub const DEFAULT_DIMENSION: usize = 4;

/// Where the store keeps its chunks and how the table looks.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSettings {
    /// Database name.
    pub database: String,
    /// Table name.
    pub table: String,
    /// Table schema; must carry the chunk fields.
    pub schema: TableSchema,
    /// Full-text index created by [`ChunkStore::ensure_index`].
    pub index: IndexDefinition,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            database: DEFAULT_DATABASE.to_string(),
            table: DEFAULT_TABLE.to_string(),
            schema: default_chunk_schema(DEFAULT_DIMENSION).unwrap_or_else(|_| unreachable!()),
            index: IndexDefinition::full_text(DEFAULT_INDEX, CHUNK_TEXT),
        }
    }
}

/// A record the store refused to insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRecord {
    /// Position of the record in the submitted batch.
    pub index: usize,
    /// Why it was refused.
    pub reason: String,
}

/// Outcome of a batch insert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InsertReport {
    /// Rows written by the engine.
    pub inserted: usize,
    /// Records refused before reaching the engine.
    pub rejected: Vec<RejectedRecord>,
}

impl InsertReport {
    /// Whether every submitted record was inserted.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Builds the equality condition on `filename` used by filtered searches.
///
/// Returns `None` for a blank filename. Single quotes are doubled.
#[must_use]
pub fn filename_condition(filename: &str) -> Option<String> {
    let filename = filename.trim();
    if filename.is_empty() {
        None
    } else {
        Some(format!("{FILENAME} = '{}'", filename.replace('\'', "''")))
    }
}

/// Logs an error at the store boundary and passes the result through.
fn logged<T>(operation: &'static str, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        if matches!(e, Error::OperationFailed { .. }) {
            tracing::error!(operation, error = %e, "Store operation failed");
        } else {
            tracing::warn!(operation, error = %e, "Store operation rejected");
        }
    }
    result
}

/// Access layer over one storage engine.
///
/// Constructed once by the entry point and shared behind an `Arc`.
pub struct ChunkStore<E: StorageEngine> {
    engine: E,
    settings: StoreSettings,
    /// Handle of the ensured table; `None` after a drop.
    table: RwLock<Option<TableHandle>>,
}

impl<E: StorageEngine> ChunkStore<E> {
    /// Opens a store: ensures the database and the table exist.
    ///
    /// The full-text index is left to [`Self::ensure_index`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the schema lacks a chunk field,
    /// [`Error::Conflict`] if the table exists with another schema, or the
    /// engine's error.
    pub fn open(engine: E, settings: StoreSettings) -> Result<Self> {
        check_chunk_schema(&settings.schema)?;
        let store = Self::attach(engine, settings);
        store.ensure_table()?;
        tracing::info!(
            engine = store.engine.name(),
            database = %store.settings.database,
            table = %store.settings.table,
            "Opened chunk store"
        );
        Ok(store)
    }

    /// Wraps an engine without touching it.
    ///
    /// Nothing is created or checked, so a table stored with another schema
    /// can still be dropped. Reads and writes answer [`Error::NotFound`] until
    /// [`Self::ensure_table`] runs.
    pub const fn attach(engine: E, settings: StoreSettings) -> Self {
        Self {
            engine,
            settings,
            table: RwLock::new(None),
        }
    }

    /// The engine.
    pub const fn engine(&self) -> &E {
        &self.engine
    }

    /// The settings the store was opened with.
    pub const fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    /// Creates the database unless it exists.
    ///
    /// # Errors
    ///
    /// Returns the engine's error.
    #[instrument(skip(self), fields(database = %self.settings.database))]
    pub fn ensure_database(&self) -> Result<()> {
        let database = &self.settings.database;
        let result = if self.engine.has_database(database)? {
            Ok(())
        } else {
            self.engine.create_database(database, ConflictPolicy::Ignore)
        };
        logged("ensure_database", result)
    }

    /// Creates the table unless it exists, then caches its handle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] if a table of that name exists with a
    /// different schema, or the engine's error.
    #[instrument(skip(self), fields(table = %self.settings.table))]
    pub fn ensure_table(&self) -> Result<TableHandle> {
        let result = (|| -> Result<_> {
            self.ensure_database()?;
            let StoreSettings {
                database,
                table,
                schema,
                ..
            } = &self.settings;

            match self.engine.describe_table(database, table)? {
                Some(existing) if existing == *schema => {},
                Some(_) => {
                    return Err(Error::Conflict(format!(
                        "table '{table}' exists with a different schema"
                    )));
                },
                None => {
                    self.engine
                        .create_table(database, table, schema, ConflictPolicy::Ignore)?;
                },
            }

            let handle = TableHandle::new(database.clone(), table.clone(), schema.clone());
            *self.table.write().unwrap_or_else(PoisonError::into_inner) = Some(handle.clone());
            Ok(handle)
        })();
        logged("ensure_table", result)
    }

    /// Creates the configured full-text index unless it exists.
    ///
    /// # Errors
    ///
    /// See [`Self::create_index`].
    pub fn ensure_index(&self) -> Result<()> {
        let index = self.settings.index.clone();
        self.create_index(&index)
    }

    /// Creates an index unless an identical one exists.
    ///
    /// Existing rows are indexed on creation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] if an index of that name exists with a
    /// different definition, [`Error::NotFound`] if the table was dropped, or
    /// the engine's error.
    #[instrument(skip(self), fields(index = %definition))]
    pub fn create_index(&self, definition: &IndexDefinition) -> Result<()> {
        let result = (|| -> Result<_> {
            let handle = self.handle()?;
            match self.engine.describe_index(&handle, &definition.name)? {
                Some(existing) if existing == *definition => Ok(()),
                Some(existing) => Err(Error::Conflict(format!(
                    "index '{}' exists as {existing}",
                    definition.name
                ))),
                None => self
                    .engine
                    .create_index(&handle, definition, ConflictPolicy::Ignore),
            }
        })();
        logged("create_index", result)
    }

    /// Inserts a batch of records.
    ///
    /// Records that do not fit the schema are left out and reported; the
    /// rest go to the engine in one call. When nothing is valid the engine
    /// is not called.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the table was dropped, or the engine's
    /// error for the batch.
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub fn insert(&self, records: Vec<Record>) -> Result<InsertReport> {
        let result = (|| -> Result<_> {
            let handle = self.handle()?;
            let mut report = InsertReport::default();
            let mut valid = Vec::with_capacity(records.len());

            for (index, record) in records.into_iter().enumerate() {
                match handle.schema.validate(&record) {
                    Ok(()) => valid.push(record),
                    Err(e) => {
                        tracing::warn!(index, error = %e, "Rejected record");
                        metrics::counter!(
                            "chunk_store_rejected_records_total",
                            "table" => handle.table.clone()
                        )
                        .increment(1);
                        report.rejected.push(RejectedRecord {
                            index,
                            reason: e.to_string(),
                        });
                    },
                }
            }

            if !valid.is_empty() {
                report.inserted = self.engine.insert(&handle, &valid)?;
            }
            tracing::info!(
                inserted = report.inserted,
                rejected = report.rejected.len(),
                "Inserted records"
            );
            Ok(report)
        })();
        logged("insert", result)
    }

    /// Inserts one chunk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] or [`Error::InvalidInput`] if the
    /// chunk does not fit the schema, [`Error::NotFound`] if the table was
    /// dropped, or the engine's error.
    pub fn insert_chunk(&self, chunk: Chunk) -> Result<()> {
        let result = (|| -> Result<_> {
            let handle = self.handle()?;
            let record = Record::from(chunk);
            handle.schema.validate(&record)?;
            self.engine.insert(&handle, &[record])?;
            Ok(())
        })();
        logged("insert_chunk", result)
    }

    /// Deletes the rows matching `condition`; returns how many went.
    ///
    /// The condition is forwarded to the engine unparsed. No match is not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a blank condition,
    /// [`Error::NotFound`] if the table was dropped, or the engine's error.
    #[instrument(skip(self))]
    pub fn delete(&self, condition: &str) -> Result<usize> {
        let result = (|| -> Result<_> {
            if condition.trim().is_empty() {
                return Err(Error::InvalidInput(
                    "delete condition is empty".to_string(),
                ));
            }
            let handle = self.handle()?;
            let deleted = self.engine.delete(&handle, condition)?;
            tracing::info!(deleted, "Deleted records");
            Ok(deleted)
        })();
        logged("delete", result)
    }

    /// Full-text search over the indexed text column, best match first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a blank query, a zero `top_k` or
    /// bad query syntax; [`Error::NotFound`] if no full-text index exists;
    /// or the engine's error.
    #[instrument(skip(self), fields(query_length = query.len()))]
    pub fn search_by_text(&self, query: &str, top_k: usize) -> Result<Vec<ScoredRecord>> {
        let result = (|| -> Result<_> {
            if query.trim().is_empty() {
                return Err(Error::InvalidInput("search query is empty".to_string()));
            }
            check_top_k(top_k)?;
            let handle = self.handle()?;
            let column = if self.settings.index.kind == IndexKind::FullText {
                self.settings.index.column.clone()
            } else {
                CHUNK_TEXT.to_string()
            };
            self.engine.match_text(
                &handle,
                &TextQuery {
                    column,
                    query: query.to_string(),
                    limit: top_k,
                },
            )
        })();
        logged("search_by_text", result)
    }

    /// Dense vector search, best match first.
    ///
    /// # Errors
    ///
    /// See [`Self::search_dense`].
    pub fn search_by_vector(
        &self,
        column: &str,
        vector: Vec<f32>,
        metric: DistanceMetric,
        top_k: usize,
    ) -> Result<Vec<ScoredRecord>> {
        self.search_dense(&DenseQuery::new(column, vector, metric, top_k))
    }

    /// Dense vector search with an optional filter condition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the query vector does not fit
    /// the column, [`Error::InvalidInput`] for a zero limit,
    /// [`Error::NotFound`] if the table was dropped, or the engine's error.
    #[instrument(skip(self, query), fields(column = %query.column, metric = %query.metric, limit = query.limit))]
    pub fn search_dense(&self, query: &DenseQuery) -> Result<Vec<ScoredRecord>> {
        let result = (|| -> Result<_> {
            check_top_k(query.limit)?;
            let handle = self.handle()?;
            self.engine.match_dense(&handle, query)
        })();
        logged("search_dense", result)
    }

    /// Every row, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the table was dropped, or the engine's
    /// error.
    pub fn list_all(&self) -> Result<Vec<Record>> {
        let result = self.handle().and_then(|handle| self.engine.scan(&handle, None));
        logged("list_all", result)
    }

    /// Rows grouped by filename.
    ///
    /// # Errors
    ///
    /// See [`Self::list_all`].
    pub fn list_by_filename(&self) -> Result<Vec<FileSummary>> {
        self.list_all().map(|rows| summarize_by_filename(&rows))
    }

    /// Number of rows.
    ///
    /// # Errors
    ///
    /// See [`Self::list_all`].
    pub fn count(&self) -> Result<usize> {
        let result = self.handle().and_then(|handle| self.engine.count(&handle));
        logged("count", result)
    }

    /// Drops the table. Later data calls fail with [`Error::NotFound`] until
    /// [`Self::ensure_table`] runs.
    ///
    /// # Errors
    ///
    /// Returns the engine's error.
    #[instrument(skip(self), fields(table = %self.settings.table))]
    pub fn drop_table(&self) -> Result<()> {
        let result = (|| -> Result<_> {
            if self.engine.has_database(&self.settings.database)? {
                self.engine.drop_table(
                    &self.settings.database,
                    &self.settings.table,
                    ConflictPolicy::Ignore,
                )?;
            }
            self.forget_table();
            Ok(())
        })();
        logged("drop_table", result)
    }

    /// Removes every database of the workspace.
    ///
    /// # Errors
    ///
    /// Returns the engine's error.
    #[instrument(skip(self))]
    pub fn drop_workspace(&self) -> Result<()> {
        self.forget_table();
        logged("drop_workspace", self.engine.destroy())
    }

    fn forget_table(&self) {
        *self.table.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn handle(&self) -> Result<TableHandle> {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "table '{}' (dropped; recreate it first)",
                    self.settings.table
                ))
            })
    }
}

fn check_top_k(top_k: usize) -> Result<()> {
    if top_k == 0 {
        Err(Error::InvalidInput("top_k must be at least 1".to_string()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IndexDefinition, VECTOR};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory engine that counts insert calls.
    #[derive(Default)]
    struct FakeEngine {
        tables: Mutex<HashMap<String, TableSchema>>,
        indexes: Mutex<HashMap<String, IndexDefinition>>,
        rows: Mutex<Vec<Record>>,
        databases: Mutex<Vec<String>>,
        insert_calls: AtomicUsize,
    }

    impl StorageEngine for FakeEngine {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn has_database(&self, name: &str) -> Result<bool> {
            Ok(self.databases.lock().unwrap().iter().any(|d| d == name))
        }

        fn create_database(&self, name: &str, _policy: ConflictPolicy) -> Result<()> {
            self.databases.lock().unwrap().push(name.to_string());
            Ok(())
        }

        fn describe_table(&self, _database: &str, table: &str) -> Result<Option<TableSchema>> {
            Ok(self.tables.lock().unwrap().get(table).cloned())
        }

        fn create_table(
            &self,
            _database: &str,
            table: &str,
            schema: &TableSchema,
            _policy: ConflictPolicy,
        ) -> Result<()> {
            self.tables
                .lock()
                .unwrap()
                .insert(table.to_string(), schema.clone());
            Ok(())
        }

        fn drop_table(&self, _database: &str, table: &str, _policy: ConflictPolicy) -> Result<()> {
            self.tables.lock().unwrap().remove(table);
            self.indexes.lock().unwrap().clear();
            self.rows.lock().unwrap().clear();
            Ok(())
        }

        fn describe_index(
            &self,
            _table: &TableHandle,
            name: &str,
        ) -> Result<Option<IndexDefinition>> {
            Ok(self.indexes.lock().unwrap().get(name).cloned())
        }

        fn create_index(
            &self,
            _table: &TableHandle,
            index: &IndexDefinition,
            _policy: ConflictPolicy,
        ) -> Result<()> {
            self.indexes
                .lock()
                .unwrap()
                .insert(index.name.clone(), index.clone());
            Ok(())
        }

        fn insert(&self, _table: &TableHandle, rows: &[Record]) -> Result<usize> {
            self.insert_calls.fetch_add(1, Ordering::SeqCst);
            self.rows.lock().unwrap().extend_from_slice(rows);
            Ok(rows.len())
        }

        fn delete(&self, _table: &TableHandle, _condition: &str) -> Result<usize> {
            Ok(0)
        }

        fn match_text(&self, _table: &TableHandle, _query: &TextQuery) -> Result<Vec<ScoredRecord>> {
            Ok(Vec::new())
        }

        fn match_dense(&self, _table: &TableHandle, _query: &DenseQuery) -> Result<Vec<ScoredRecord>> {
            Ok(Vec::new())
        }

        fn scan(&self, _table: &TableHandle, _filter: Option<&str>) -> Result<Vec<Record>> {
            Ok(self.rows.lock().unwrap().clone())
        }

        fn count(&self, _table: &TableHandle) -> Result<usize> {
            Ok(self.rows.lock().unwrap().len())
        }

        fn destroy(&self) -> Result<()> {
            self.databases.lock().unwrap().clear();
            self.tables.lock().unwrap().clear();
            self.rows.lock().unwrap().clear();
            Ok(())
        }
    }

    fn store() -> ChunkStore<FakeEngine> {
        ChunkStore::open(FakeEngine::default(), StoreSettings::default()).unwrap()
    }

    fn chunk(vector: Vec<f32>) -> Chunk {
        Chunk {
            chunk_text: "text".to_string(),
            file_uuid: "1".to_string(),
            filename: "a.txt".to_string(),
            vector,
        }
    }

    #[test]
    fn test_open_is_idempotent() {
        let engine = FakeEngine::default();
        let store = ChunkStore::open(engine, StoreSettings::default()).unwrap();
        assert!(store.ensure_table().is_ok());
        assert!(store.ensure_database().is_ok());
        assert_eq!(store.engine().databases.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_open_rejects_schema_without_chunk_fields() {
        let settings = StoreSettings {
            schema: TableSchema::new(vec![crate::models::ColumnDef::new(
                "other",
                crate::models::ColumnType::Varchar,
            )])
            .unwrap(),
            ..StoreSettings::default()
        };
        assert!(matches!(
            ChunkStore::open(FakeEngine::default(), settings),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_ensure_table_conflicts_on_other_schema() {
        let engine = FakeEngine::default();
        engine
            .tables
            .lock()
            .unwrap()
            .insert(DEFAULT_TABLE.to_string(), default_chunk_schema(8).unwrap());
        assert!(matches!(
            ChunkStore::open(engine, StoreSettings::default()),
            Err(Error::Conflict(_))
        ));
    }

    #[test]
    fn test_insert_reports_rejects_and_skips_engine_when_none_valid() {
        let store = store();
        let report = store
            .insert(vec![
                Record::new().with(VECTOR, vec![1.0_f32, 2.0, 3.0]),
                Record::new().with("unknown", "x").with(VECTOR, vec![1.0_f32; 4]),
            ])
            .unwrap();
        assert_eq!(report.inserted, 0);
        assert_eq!(report.rejected.len(), 2);
        assert_eq!(report.rejected[1].index, 1);
        assert_eq!(store.engine().insert_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_insert_mixed_batch() {
        let store = store();
        let report = store
            .insert(vec![
                chunk(vec![1.0; 4]).into(),
                chunk(vec![1.0; 5]).into(),
                chunk(vec![2.0; 4]).into(),
            ])
            .unwrap();
        assert_eq!(report.inserted, 2);
        assert!(!report.is_complete());
        assert!(report.rejected[0].reason.contains("dimension"));
        assert_eq!(store.engine().insert_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_insert_chunk_dimension_mismatch() {
        let store = store();
        assert!(matches!(
            store.insert_chunk(chunk(vec![1.0; 3])),
            Err(Error::DimensionMismatch {
                expected: 4,
                actual: 3
            })
        ));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_blank_inputs_rejected() {
        let store = store();
        assert!(matches!(store.delete("  "), Err(Error::InvalidInput(_))));
        assert!(matches!(
            store.search_by_text("", 3),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            store.search_by_text("bloom", 0),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            store.search_by_vector(VECTOR, vec![1.0; 4], DistanceMetric::L2, 0),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_index_conflict() {
        let store = store();
        store.ensure_index().unwrap();
        store.ensure_index().unwrap();
        assert!(matches!(
            store.create_index(&IndexDefinition::full_text(DEFAULT_INDEX, FILENAME)),
            Err(Error::Conflict(_))
        ));
    }

    #[test]
    fn test_drop_table_then_ensure() {
        let store = store();
        store.drop_table().unwrap();
        assert!(matches!(
            store.insert_chunk(chunk(vec![1.0; 4])),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(store.list_all(), Err(Error::NotFound(_))));
        store.ensure_table().unwrap();
        store.insert_chunk(chunk(vec![1.0; 4])).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_drop_workspace_then_ensure() {
        let store = store();
        store.insert_chunk(chunk(vec![1.0; 4])).unwrap();
        store.drop_workspace().unwrap();
        assert!(matches!(store.count(), Err(Error::NotFound(_))));
        store.ensure_table().unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_filename_condition() {
        assert_eq!(filename_condition("  "), None);
        assert_eq!(
            filename_condition("test1.txt").as_deref(),
            Some("filename = 'test1.txt'")
        );
        assert_eq!(
            filename_condition("it's.txt").as_deref(),
            Some("filename = 'it''s.txt'")
        );
    }
}
