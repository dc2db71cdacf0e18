//! Embedded `SQLite` storage engine.
//!
//! One connection per database, all behind a single mutex. Full-text indexes
//! are FTS5 external-content tables maintained by triggers; dense matches
//! scan the table and score every vector with the requested metric.

use super::catalog;
use super::connection::{acquire_lock, open_file, open_memory};
use super::metrics::record_operation;
use super::row::{bind_value, read_record};
use super::sql::{
    ROW_ID, create_fts_sql, create_table_sql, fts_table_name, insert_sql, quote_ident,
    secondary_index_name, select_columns, where_clause,
};
use crate::models::{
    ColumnType, ConflictPolicy, DenseQuery, IndexDefinition, IndexKind, ScoredRecord,
    TableSchema, TextQuery, is_valid_identifier,
};
use crate::storage::traits::{StorageEngine, TableHandle};
use crate::storage::workspace::Workspace;
use crate::{Error, Record, Result};
use rusqlite::{Connection, TransactionBehavior, params, params_from_iter};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;
use tracing::instrument;

const BACKEND: &str = "sqlite";

/// `SQLite`-backed [`StorageEngine`].
pub struct SqliteEngine {
    workspace: Workspace,
    /// Open connections keyed by database name.
    databases: Mutex<HashMap<String, Connection>>,
}

impl SqliteEngine {
    /// Creates an engine over a workspace. Databases open lazily.
    #[must_use]
    pub fn new(workspace: Workspace) -> Self {
        Self {
            workspace,
            databases: Mutex::new(HashMap::new()),
        }
    }

    /// Creates an engine over a storage address (`:memory:` or a directory).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the address is not usable.
    pub fn connect(address: &str) -> Result<Self> {
        Ok(Self::new(Workspace::parse(address)?))
    }

    /// Creates an engine with an in-memory workspace (useful for testing).
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Workspace::InMemory)
    }

    /// Runs `f` with the connection of `database`, opening it from disk if
    /// it exists but is not open yet.
    fn with_db<T>(
        &self,
        database: &str,
        f: impl FnOnce(&mut Connection) -> Result<T>,
    ) -> Result<T> {
        let mut databases = acquire_lock(&self.databases);
        if !databases.contains_key(database) {
            let conn = match self.workspace.database_path(database) {
                Some(path) if path.is_file() => open_file(&path)?,
                _ => return Err(Error::NotFound(format!("database '{database}'"))),
            };
            catalog::ensure_catalog(&conn)?;
            databases.insert(database.to_string(), conn);
        }
        let conn = databases
            .get_mut(database)
            .ok_or_else(|| Error::NotFound(format!("database '{database}'")))?;
        f(conn)
    }

    fn database_exists(&self, databases: &HashMap<String, Connection>, name: &str) -> bool {
        databases.contains_key(name)
            || self
                .workspace
                .database_path(name)
                .is_some_and(|path| path.is_file())
    }
}

fn check_identifier(kind: &str, name: &str) -> Result<()> {
    if is_valid_identifier(name) && !name.starts_with('_') {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("invalid {kind} name '{name}'")))
    }
}

/// Maps a failure while running a `MATCH` statement.
///
/// FTS5 reports any unparsable query as a plain `SQLITE_ERROR`, including a
/// bare `-` read as a column filter (`space - efficient`). Any other failure
/// stays an engine failure.
fn match_error(e: rusqlite::Error) -> Error {
    match e {
        rusqlite::Error::SqliteFailure(err, message)
            if err.code == rusqlite::ErrorCode::Unknown =>
        {
            let message = message.unwrap_or_else(|| err.to_string());
            Error::InvalidInput(format!("full-text query: {message}"))
        },
        other => Error::operation("match_text", other),
    }
}

fn to_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

impl StorageEngine for SqliteEngine {
    fn name(&self) -> &'static str {
        BACKEND
    }

    #[instrument(skip(self), fields(operation = "has_database", backend = BACKEND))]
    fn has_database(&self, name: &str) -> Result<bool> {
        let databases = acquire_lock(&self.databases);
        Ok(self.database_exists(&databases, name))
    }

    #[instrument(skip(self), fields(operation = "create_database", backend = BACKEND))]
    fn create_database(&self, name: &str, policy: ConflictPolicy) -> Result<()> {
        let start = Instant::now();
        let result = (|| -> Result<_> {
            check_identifier("database", name)?;
            let mut databases = acquire_lock(&self.databases);
            if self.database_exists(&databases, name) {
                return match policy {
                    ConflictPolicy::Ignore => Ok(()),
                    ConflictPolicy::Error => {
                        Err(Error::AlreadyExists(format!("database '{name}'")))
                    },
                };
            }

            let conn = match self.workspace.database_path(name) {
                Some(path) => open_file(&path)?,
                None => open_memory()?,
            };
            catalog::ensure_catalog(&conn)?;
            databases.insert(name.to_string(), conn);
            tracing::info!(database = name, workspace = %self.workspace, "Created database");
            Ok(())
        })();
        record_operation(BACKEND, "create_database", start, result)
    }

    #[instrument(skip(self), fields(operation = "describe_table", backend = BACKEND))]
    fn describe_table(&self, database: &str, table: &str) -> Result<Option<TableSchema>> {
        self.with_db(database, |conn| catalog::load_table(conn, table))
    }

    #[instrument(skip(self, schema), fields(operation = "create_table", backend = BACKEND))]
    fn create_table(
        &self,
        database: &str,
        table: &str,
        schema: &TableSchema,
        policy: ConflictPolicy,
    ) -> Result<()> {
        let start = Instant::now();
        let result = (|| -> Result<_> {
            check_identifier("table", table)?;
            self.with_db(database, |conn| {
                let tx = conn
                    .transaction_with_behavior(TransactionBehavior::Immediate)
                    .map_err(|e| Error::operation("begin_transaction", e))?;

                if catalog::load_table(&tx, table)?.is_some() {
                    return match policy {
                        ConflictPolicy::Ignore => Ok(()),
                        ConflictPolicy::Error => {
                            Err(Error::AlreadyExists(format!("table '{table}'")))
                        },
                    };
                }

                tx.execute_batch(&create_table_sql(table, schema))
                    .map_err(|e| Error::operation("create_table", e))?;
                catalog::save_table(&tx, table, schema)?;
                tx.commit()
                    .map_err(|e| Error::operation("commit_transaction", e))?;
                tracing::info!(database, table, "Created table");
                Ok(())
            })
        })();
        record_operation(BACKEND, "create_table", start, result)
    }

    #[instrument(skip(self), fields(operation = "drop_table", backend = BACKEND))]
    fn drop_table(&self, database: &str, table: &str, policy: ConflictPolicy) -> Result<()> {
        let start = Instant::now();
        let result = self.with_db(database, |conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(|e| Error::operation("begin_transaction", e))?;

            if catalog::load_table(&tx, table)?.is_none() {
                return match policy {
                    ConflictPolicy::Ignore => Ok(()),
                    ConflictPolicy::Error => Err(Error::NotFound(format!("table '{table}'"))),
                };
            }

            for index in catalog::load_indexes(&tx, table)? {
                if index.kind == IndexKind::FullText {
                    let fts = fts_table_name(table, &index.name);
                    tx.execute_batch(&format!("DROP TABLE IF EXISTS {}", quote_ident(&fts)))
                        .map_err(|e| Error::operation("drop_fts_table", e))?;
                }
            }
            tx.execute_batch(&format!("DROP TABLE IF EXISTS {}", quote_ident(table)))
                .map_err(|e| Error::operation("drop_table", e))?;
            catalog::forget_table(&tx, table)?;
            tx.commit()
                .map_err(|e| Error::operation("commit_transaction", e))?;
            tracing::info!(database, table, "Dropped table");
            Ok(())
        });
        record_operation(BACKEND, "drop_table", start, result)
    }

    fn describe_index(&self, table: &TableHandle, name: &str) -> Result<Option<IndexDefinition>> {
        self.with_db(&table.database, |conn| {
            catalog::load_index(conn, &table.table, name)
        })
    }

    #[instrument(
        skip(self, table),
        fields(operation = "create_index", backend = BACKEND, table = %table.table, index = %index.name)
    )]
    fn create_index(
        &self,
        table: &TableHandle,
        index: &IndexDefinition,
        policy: ConflictPolicy,
    ) -> Result<()> {
        let start = Instant::now();
        let result = (|| -> Result<_> {
            check_identifier("index", &index.name)?;
            let column = table
                .schema
                .column(&index.column)
                .ok_or_else(|| Error::NotFound(format!("column '{}'", index.column)))?;
            match (index.kind, column.column_type) {
                (IndexKind::FullText, ColumnType::Varchar) => {},
                (IndexKind::Secondary, ColumnType::Vector { .. }) | (IndexKind::FullText, _) => {
                    return Err(Error::InvalidInput(format!(
                        "a {} index cannot cover {} column '{}'",
                        index.kind, column.column_type, column.name
                    )));
                },
                (IndexKind::Secondary, _) => {},
            }

            self.with_db(&table.database, |conn| {
                let tx = conn
                    .transaction_with_behavior(TransactionBehavior::Immediate)
                    .map_err(|e| Error::operation("begin_transaction", e))?;

                if catalog::load_table(&tx, &table.table)?.is_none() {
                    return Err(Error::NotFound(format!("table '{}'", table.table)));
                }
                if catalog::load_index(&tx, &table.table, &index.name)?.is_some() {
                    return match policy {
                        ConflictPolicy::Ignore => Ok(()),
                        ConflictPolicy::Error => {
                            Err(Error::AlreadyExists(format!("index '{}'", index.name)))
                        },
                    };
                }

                let ddl = match index.kind {
                    IndexKind::FullText => create_fts_sql(&table.table, &index.name, &index.column),
                    IndexKind::Secondary => format!(
                        "CREATE INDEX {} ON {} ({})",
                        quote_ident(&secondary_index_name(&table.table, &index.name)),
                        quote_ident(&table.table),
                        quote_ident(&index.column)
                    ),
                };
                tx.execute_batch(&ddl)
                    .map_err(|e| Error::operation("create_index", e))?;
                catalog::save_index(&tx, &table.table, index)?;
                tx.commit()
                    .map_err(|e| Error::operation("commit_transaction", e))?;
                tracing::info!(table = %table.table, index = %index, "Created index");
                Ok(())
            })
        })();
        record_operation(BACKEND, "create_index", start, result)
    }

    #[instrument(
        skip(self, table, rows),
        fields(operation = "insert", backend = BACKEND, table = %table.table, count = rows.len())
    )]
    fn insert(&self, table: &TableHandle, rows: &[Record]) -> Result<usize> {
        let start = Instant::now();
        let result = (|| -> Result<_> {
            for (i, row) in rows.iter().enumerate() {
                table.schema.validate(row).map_err(|e| match e {
                    Error::InvalidInput(msg) => Error::InvalidInput(format!("row {i}: {msg}")),
                    other => other,
                })?;
            }

            self.with_db(&table.database, |conn| {
                let tx = conn
                    .transaction_with_behavior(TransactionBehavior::Immediate)
                    .map_err(|e| Error::operation("begin_transaction", e))?;
                let mut inserted = 0;
                {
                    let mut stmt = tx
                        .prepare(&insert_sql(&table.table, &table.schema))
                        .map_err(|e| Error::operation("prepare_insert", e))?;
                    for row in rows {
                        let values = table.schema.columns().iter().map(|c| bind_value(c, row));
                        inserted += stmt
                            .execute(params_from_iter(values))
                            .map_err(|e| Error::operation("insert_row", e))?;
                    }
                }
                tx.commit()
                    .map_err(|e| Error::operation("commit_transaction", e))?;
                Ok(inserted)
            })
        })();
        record_operation(BACKEND, "insert", start, result)
    }

    #[instrument(
        skip(self, table),
        fields(operation = "delete", backend = BACKEND, table = %table.table)
    )]
    fn delete(&self, table: &TableHandle, condition: &str) -> Result<usize> {
        let start = Instant::now();
        let result = self.with_db(&table.database, |conn| {
            let sql = format!(
                "DELETE FROM {}{}",
                quote_ident(&table.table),
                where_clause(Some(condition))
            );
            conn.execute(&sql, [])
                .map_err(|e| Error::operation("delete", e))
        });
        record_operation(BACKEND, "delete", start, result)
    }

    #[instrument(
        skip(self, table, query),
        fields(operation = "match_text", backend = BACKEND, table = %table.table, query_length = query.query.len(), limit = query.limit)
    )]
    fn match_text(&self, table: &TableHandle, query: &TextQuery) -> Result<Vec<ScoredRecord>> {
        let start = Instant::now();
        let result = self.with_db(&table.database, |conn| {
            let index = catalog::load_indexes(conn, &table.table)?
                .into_iter()
                .find(|i| i.kind == IndexKind::FullText && i.column == query.column)
                .ok_or_else(|| {
                    Error::NotFound(format!("full-text index on column '{}'", query.column))
                })?;

            let fts = quote_ident(&fts_table_name(&table.table, &index.name));
            // bm25() is negative with better matches more negative; negate so
            // higher scores rank first.
            let sql = format!(
                "SELECT {columns}, -bm25({fts}) AS score
                 FROM {fts}
                 JOIN {table_q} ON {table_q}.{row_id} = {fts}.rowid
                 WHERE {fts} MATCH ?1
                 ORDER BY score DESC
                 LIMIT ?2",
                columns = select_columns(&table.table, &table.schema),
                table_q = quote_ident(&table.table),
                row_id = quote_ident(ROW_ID),
            );

            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| Error::operation("prepare_match_text", e))?;
            let width = table.schema.columns().len();
            let rows = stmt
                .query_map(params![query.query, to_limit(query.limit)], |row| {
                    let record = read_record(row, &table.schema, 0)?;
                    let score: f64 = row.get(width)?;
                    Ok((record, score))
                })
                .map_err(match_error)?;

            let mut hits = Vec::new();
            for row in rows {
                let (record, score) = row.map_err(match_error)?;
                #[allow(clippy::cast_possible_truncation)]
                hits.push(ScoredRecord {
                    record,
                    score: score as f32,
                });
            }
            Ok(hits)
        });
        record_operation(BACKEND, "match_text", start, result)
    }

    #[instrument(
        skip(self, table, query),
        fields(operation = "match_dense", backend = BACKEND, table = %table.table, metric = %query.metric, limit = query.limit)
    )]
    fn match_dense(&self, table: &TableHandle, query: &DenseQuery) -> Result<Vec<ScoredRecord>> {
        let start = Instant::now();
        let result = (|| -> Result<_> {
            let column = table
                .schema
                .column(&query.column)
                .ok_or_else(|| Error::NotFound(format!("column '{}'", query.column)))?;
            let Some(expected) = column.column_type.dimension() else {
                return Err(Error::InvalidInput(format!(
                    "column '{}' is not a vector column",
                    column.name
                )));
            };
            if query.vector.len() != expected {
                return Err(Error::DimensionMismatch {
                    expected,
                    actual: query.vector.len(),
                });
            }

            let rows = self.scan(table, query.filter.as_deref())?;
            let mut hits: Vec<ScoredRecord> = rows
                .into_iter()
                .filter_map(|record| {
                    let score = query
                        .metric
                        .score(&query.vector, record.vector(&query.column)?);
                    Some(ScoredRecord { record, score })
                })
                .collect();
            hits.sort_by(|a, b| query.metric.rank(a.score, b.score));
            hits.truncate(query.limit);
            Ok(hits)
        })();
        record_operation(BACKEND, "match_dense", start, result)
    }

    #[instrument(
        skip(self, table),
        fields(operation = "scan", backend = BACKEND, table = %table.table)
    )]
    fn scan(&self, table: &TableHandle, filter: Option<&str>) -> Result<Vec<Record>> {
        let start = Instant::now();
        let result = self.with_db(&table.database, |conn| {
            let sql = format!(
                "SELECT {} FROM {}{} ORDER BY {}",
                select_columns(&table.table, &table.schema),
                quote_ident(&table.table),
                where_clause(filter),
                quote_ident(ROW_ID)
            );
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| Error::operation("prepare_scan", e))?;
            let rows = stmt
                .query_map([], |row| read_record(row, &table.schema, 0))
                .map_err(|e| Error::operation("scan", e))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(|e| Error::operation("read_scan_row", e))
        });
        record_operation(BACKEND, "scan", start, result)
    }

    fn count(&self, table: &TableHandle) -> Result<usize> {
        self.with_db(&table.database, |conn| {
            let count: i64 = conn
                .query_row(
                    &format!("SELECT COUNT(*) FROM {}", quote_ident(&table.table)),
                    [],
                    |row| row.get(0),
                )
                .map_err(|e| Error::operation("count", e))?;
            Ok(usize::try_from(count).unwrap_or(0))
        })
    }

    #[instrument(skip(self), fields(operation = "destroy", backend = BACKEND))]
    fn destroy(&self) -> Result<()> {
        let start = Instant::now();
        let result = (|| -> Result<_> {
            let mut databases = acquire_lock(&self.databases);
            // Close every connection before its file goes away.
            databases.clear();
            let removed = self.workspace.remove_databases()?;
            tracing::warn!(workspace = %self.workspace, removed, "Destroyed workspace");
            Ok(())
        })();
        record_operation(BACKEND, "destroy", start, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DistanceMetric, default_chunk_schema};
    use tempfile::TempDir;

    fn engine_with_table() -> (SqliteEngine, TableHandle) {
        let engine = SqliteEngine::in_memory();
        let schema = default_chunk_schema(4).unwrap();
        engine
            .create_database("my_db", ConflictPolicy::Error)
            .unwrap();
        engine
            .create_table("my_db", "my_table", &schema, ConflictPolicy::Error)
            .unwrap();
        (engine, TableHandle::new("my_db", "my_table", schema))
    }

    fn row(text: &str, filename: &str, vector: [f32; 4]) -> Record {
        Record::new()
            .with("chunk_text", text)
            .with("filename", filename)
            .with("file_uuid", "1234567890")
            .with("vector", vector.to_vec())
    }

    #[test]
    fn test_create_database_policies() {
        let engine = SqliteEngine::in_memory();
        assert!(!engine.has_database("db").unwrap());
        engine.create_database("db", ConflictPolicy::Error).unwrap();
        assert!(engine.has_database("db").unwrap());
        assert!(engine.create_database("db", ConflictPolicy::Ignore).is_ok());
        assert!(matches!(
            engine.create_database("db", ConflictPolicy::Error),
            Err(Error::AlreadyExists(_))
        ));
        assert!(matches!(
            engine.create_database("bad-name", ConflictPolicy::Error),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_missing_database_is_not_found() {
        let engine = SqliteEngine::in_memory();
        assert!(matches!(
            engine.describe_table("nope", "t"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_create_table_policies() {
        let (engine, handle) = engine_with_table();
        assert_eq!(
            engine.describe_table("my_db", "my_table").unwrap(),
            Some(handle.schema.clone())
        );
        assert!(
            engine
                .create_table("my_db", "my_table", &handle.schema, ConflictPolicy::Ignore)
                .is_ok()
        );
        assert!(matches!(
            engine.create_table("my_db", "my_table", &handle.schema, ConflictPolicy::Error),
            Err(Error::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_insert_scan_and_count() {
        let (engine, handle) = engine_with_table();
        let inserted = engine
            .insert(
                &handle,
                &[
                    row("unnecessary and harmful", "test1.txt", [1.0, 1.2, 0.8, 0.9]),
                    Record::new().with("vector", vec![4.0_f32, 4.2, 4.3, 4.5]),
                ],
            )
            .unwrap();
        assert_eq!(inserted, 2);
        assert_eq!(engine.count(&handle).unwrap(), 2);

        let rows = engine.scan(&handle, None).unwrap();
        assert_eq!(rows[0].text("filename"), Some("test1.txt"));
        assert_eq!(rows[1].text("filename"), Some(""));

        let filtered = engine
            .scan(&handle, Some("filename = 'test1.txt'"))
            .unwrap();
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_insert_batch_is_atomic() {
        let (engine, handle) = engine_with_table();
        let result = engine.insert(
            &handle,
            &[
                row("ok", "a.txt", [1.0, 1.0, 1.0, 1.0]),
                Record::new().with("vector", vec![1.0_f32]),
            ],
        );
        assert!(matches!(result, Err(Error::DimensionMismatch { .. })));
        assert_eq!(engine.count(&handle).unwrap(), 0);
    }

    #[test]
    fn test_delete_by_condition() {
        let (engine, handle) = engine_with_table();
        engine
            .insert(
                &handle,
                &[
                    row("a", "test1.txt", [1.0; 4]),
                    row("b", "test2.txt", [2.0; 4]),
                ],
            )
            .unwrap();

        assert_eq!(engine.delete(&handle, "filename = 'test1.txt'").unwrap(), 1);
        assert_eq!(engine.delete(&handle, "filename = 'nothing'").unwrap(), 0);
        assert_eq!(engine.count(&handle).unwrap(), 1);

        assert_eq!(
            engine
                .scan(&handle, Some("filename = 'test2.txt' -- only the second file"))
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            engine
                .delete(&handle, "filename = 'test2.txt' -- remove test file")
                .unwrap(),
            1
        );
        assert_eq!(engine.count(&handle).unwrap(), 0);
        assert!(matches!(
            engine.delete(&handle, "no_such_column = 1"),
            Err(Error::OperationFailed { .. })
        ));
    }

    #[test]
    fn test_full_text_index_tracks_inserts_and_deletes() {
        let (engine, handle) = engine_with_table();
        engine
            .insert(&handle, &[row("Office for Harmful Blooms", "test2.txt", [4.0; 4])])
            .unwrap();
        engine
            .create_index(
                &handle,
                &IndexDefinition::full_text("my_index", "chunk_text"),
                ConflictPolicy::Error,
            )
            .unwrap();
        engine
            .insert(
                &handle,
                &[row(
                    "A Bloom filter is a space efficient probabilistic data structure",
                    "test2.txt",
                    [4.0; 4],
                )],
            )
            .unwrap();

        let query = TextQuery {
            column: "chunk_text".to_string(),
            query: "bloom".to_string(),
            limit: 10,
        };
        assert_eq!(engine.match_text(&handle, &query).unwrap().len(), 2);

        engine.delete(&handle, "chunk_text LIKE 'Office%'").unwrap();
        let hits = engine.match_text(&handle, &query).unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].score > 0.0);
    }

    #[test]
    fn test_match_text_requires_index() {
        let (engine, handle) = engine_with_table();
        let query = TextQuery {
            column: "chunk_text".to_string(),
            query: "bloom".to_string(),
            limit: 10,
        };
        assert!(matches!(
            engine.match_text(&handle, &query),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_match_text_syntax_error_is_invalid_input() {
        let (engine, handle) = engine_with_table();
        engine
            .create_index(
                &handle,
                &IndexDefinition::full_text("my_index", "chunk_text"),
                ConflictPolicy::Error,
            )
            .unwrap();
        let query = TextQuery {
            column: "chunk_text".to_string(),
            query: "\"unterminated".to_string(),
            limit: 10,
        };
        assert!(matches!(
            engine.match_text(&handle, &query),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_match_text_unknown_column_filter_is_invalid_input() {
        let (engine, handle) = engine_with_table();
        engine
            .insert(
                &handle,
                &[row("a space-efficient structure", "test2.txt", [4.0; 4])],
            )
            .unwrap();
        engine
            .create_index(
                &handle,
                &IndexDefinition::full_text("my_index", "chunk_text"),
                ConflictPolicy::Error,
            )
            .unwrap();

        let query = TextQuery {
            column: "chunk_text".to_string(),
            query: "space - efficient".to_string(),
            limit: 10,
        };
        match engine.match_text(&handle, &query) {
            Err(Error::InvalidInput(msg)) => assert!(msg.contains("efficient"), "{msg}"),
            other => panic!("expected InvalidInput, got {other:?}"),
        }

        let escaped = TextQuery {
            query: "\"space-efficient\"".to_string(),
            ..query
        };
        assert_eq!(engine.match_text(&handle, &escaped).unwrap().len(), 1);
    }

    #[test]
    fn test_create_index_policies_and_kinds() {
        let (engine, handle) = engine_with_table();
        let index = IndexDefinition::full_text("my_index", "chunk_text");
        engine
            .create_index(&handle, &index, ConflictPolicy::Error)
            .unwrap();
        assert_eq!(
            engine.describe_index(&handle, "my_index").unwrap(),
            Some(index.clone())
        );
        assert!(matches!(
            engine.create_index(&handle, &index, ConflictPolicy::Error),
            Err(Error::AlreadyExists(_))
        ));
        assert!(
            engine
                .create_index(&handle, &index, ConflictPolicy::Ignore)
                .is_ok()
        );
        assert!(matches!(
            engine.create_index(
                &handle,
                &IndexDefinition::full_text("vec_fts", "vector"),
                ConflictPolicy::Error
            ),
            Err(Error::InvalidInput(_))
        ));
        assert!(
            engine
                .create_index(
                    &handle,
                    &IndexDefinition::secondary("by_file", "filename"),
                    ConflictPolicy::Error
                )
                .is_ok()
        );
    }

    #[test]
    fn test_match_dense_orders_by_metric() {
        let (engine, handle) = engine_with_table();
        engine
            .insert(
                &handle,
                &[
                    row("far", "a.txt", [4.0, 4.2, 4.3, 4.5]),
                    row("near", "a.txt", [1.0, 1.2, 0.8, 0.9]),
                    row("other", "b.txt", [1.0, 1.2, 0.8, 1.0]),
                ],
            )
            .unwrap();

        let query = DenseQuery::new("vector", vec![1.0, 1.2, 0.8, 0.9], DistanceMetric::L2, 2);
        let hits = engine.match_dense(&handle, &query).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].record.text("chunk_text"), Some("near"));
        assert!(hits[0].score.abs() < f32::EPSILON);
        assert_eq!(hits[1].record.text("chunk_text"), Some("other"));

        let filtered = engine
            .match_dense(&handle, &query.clone().with_filter("filename = 'a.txt'"))
            .unwrap();
        assert_eq!(filtered[1].record.text("chunk_text"), Some("far"));

        let wrong = DenseQuery::new("vector", vec![1.0, 2.0, 3.0], DistanceMetric::L2, 2);
        assert!(matches!(
            engine.match_dense(&handle, &wrong),
            Err(Error::DimensionMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_drop_table_removes_indexes() {
        let (engine, handle) = engine_with_table();
        engine
            .create_index(
                &handle,
                &IndexDefinition::full_text("my_index", "chunk_text"),
                ConflictPolicy::Error,
            )
            .unwrap();
        engine
            .drop_table("my_db", "my_table", ConflictPolicy::Error)
            .unwrap();
        assert!(engine.describe_table("my_db", "my_table").unwrap().is_none());
        assert!(
            engine
                .drop_table("my_db", "my_table", ConflictPolicy::Ignore)
                .is_ok()
        );
        assert!(matches!(
            engine.drop_table("my_db", "my_table", ConflictPolicy::Error),
            Err(Error::NotFound(_))
        ));

        // Same names can be reused after a drop.
        engine
            .create_table("my_db", "my_table", &handle.schema, ConflictPolicy::Error)
            .unwrap();
        engine
            .create_index(
                &handle,
                &IndexDefinition::full_text("my_index", "chunk_text"),
                ConflictPolicy::Error,
            )
            .unwrap();
    }

    #[test]
    fn test_file_workspace_reopens_and_destroys() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("workspace");
        let schema = default_chunk_schema(4).unwrap();
        {
            let engine = SqliteEngine::connect(root.to_str().unwrap()).unwrap();
            engine.create_database("my_db", ConflictPolicy::Error).unwrap();
            engine
                .create_table("my_db", "my_table", &schema, ConflictPolicy::Error)
                .unwrap();
            let handle = TableHandle::new("my_db", "my_table", schema.clone());
            engine.insert(&handle, &[row("persisted", "a.txt", [1.0; 4])]).unwrap();
        }

        let engine = SqliteEngine::connect(root.to_str().unwrap()).unwrap();
        assert!(engine.has_database("my_db").unwrap());
        let handle = TableHandle::new("my_db", "my_table", schema);
        assert_eq!(engine.count(&handle).unwrap(), 1);

        engine.destroy().unwrap();
        assert!(!engine.has_database("my_db").unwrap());
        assert!(!root.exists());
    }
}
