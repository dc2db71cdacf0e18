//! Catalog tables recording table schemas and index definitions.
//!
//! Each database file carries its own catalog, so a database copied out of
//! the workspace is still self-describing.

use crate::models::{IndexDefinition, TableSchema};
use crate::{Error, Result};
use rusqlite::{Connection, OptionalExtension, params};

const CREATE_CATALOG: &str = "
    CREATE TABLE IF NOT EXISTS _chunkbase_tables (
        name TEXT PRIMARY KEY,
        schema TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS _chunkbase_indexes (
        table_name TEXT NOT NULL,
        name TEXT NOT NULL,
        column_name TEXT NOT NULL,
        kind TEXT NOT NULL,
        PRIMARY KEY (table_name, name)
    );
";

/// Creates the catalog tables if missing.
pub fn ensure_catalog(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_CATALOG)
        .map_err(|e| Error::operation("create_catalog", e))
}

/// Loads a table schema.
pub fn load_table(conn: &Connection, table: &str) -> Result<Option<TableSchema>> {
    let json: Option<String> = conn
        .query_row(
            "SELECT schema FROM _chunkbase_tables WHERE name = ?1",
            params![table],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| Error::operation("load_table_schema", e))?;

    json.map(|j| serde_json::from_str(&j).map_err(|e| Error::operation("parse_table_schema", e)))
        .transpose()
}

/// Records a table schema.
pub fn save_table(conn: &Connection, table: &str, schema: &TableSchema) -> Result<()> {
    let json = serde_json::to_string(schema).map_err(|e| Error::operation("encode_schema", e))?;
    conn.execute(
        "INSERT INTO _chunkbase_tables (name, schema) VALUES (?1, ?2)",
        params![table, json],
    )
    .map_err(|e| Error::operation("save_table_schema", e))?;
    Ok(())
}

/// Removes a table and its indexes from the catalog.
pub fn forget_table(conn: &Connection, table: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM _chunkbase_indexes WHERE table_name = ?1",
        params![table],
    )
    .map_err(|e| Error::operation("forget_indexes", e))?;
    conn.execute(
        "DELETE FROM _chunkbase_tables WHERE name = ?1",
        params![table],
    )
    .map_err(|e| Error::operation("forget_table", e))?;
    Ok(())
}

/// Loads every index of a table.
pub fn load_indexes(conn: &Connection, table: &str) -> Result<Vec<IndexDefinition>> {
    let mut stmt = conn
        .prepare(
            "SELECT name, column_name, kind FROM _chunkbase_indexes
             WHERE table_name = ?1 ORDER BY name",
        )
        .map_err(|e| Error::operation("prepare_load_indexes", e))?;

    let rows = stmt
        .query_map(params![table], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })
        .map_err(|e| Error::operation("load_indexes", e))?;

    let mut indexes = Vec::new();
    for row in rows {
        let (name, column, kind) = row.map_err(|e| Error::operation("read_index_row", e))?;
        indexes.push(IndexDefinition {
            name,
            column,
            kind: kind.parse()?,
        });
    }
    Ok(indexes)
}

/// Loads one index by name.
pub fn load_index(conn: &Connection, table: &str, name: &str) -> Result<Option<IndexDefinition>> {
    Ok(load_indexes(conn, table)?
        .into_iter()
        .find(|index| index.name == name))
}

/// Records an index definition.
pub fn save_index(conn: &Connection, table: &str, index: &IndexDefinition) -> Result<()> {
    conn.execute(
        "INSERT INTO _chunkbase_indexes (table_name, name, column_name, kind)
         VALUES (?1, ?2, ?3, ?4)",
        params![table, index.name, index.column, index.kind.as_str()],
    )
    .map_err(|e| Error::operation("save_index", e))?;
    Ok(())
}
