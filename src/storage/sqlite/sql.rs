//! SQL construction helpers for the `SQLite` engine.
//!
//! Every identifier that reaches a statement has passed
//! [`is_valid_identifier`](crate::models::is_valid_identifier); quoting is
//! still applied so reserved words work as column names.

use crate::Error;
use crate::models::{ColumnType, TableSchema};

/// Internal row id column of every data table.
pub const ROW_ID: &str = "_row_id";

/// Quotes an identifier for use in SQL.
///
/// # Examples
///
/// ```
/// use chunkbase::storage::sqlite::quote_ident;
///
/// assert_eq!(quote_ident("filename"), "\"filename\"");
/// assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
/// ```
#[must_use]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `SQLite` storage class for a column type.
#[must_use]
pub const fn sql_type(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::Varchar => "TEXT",
        ColumnType::Integer => "INTEGER",
        ColumnType::Float => "REAL",
        ColumnType::Vector { .. } => "BLOB",
    }
}

/// Name of the FTS5 shadow table backing a full-text index.
#[must_use]
pub fn fts_table_name(table: &str, index: &str) -> String {
    format!("{table}__fts_{index}")
}

/// Name of the B-tree index backing a secondary index.
#[must_use]
pub fn secondary_index_name(table: &str, index: &str) -> String {
    format!("{table}__idx_{index}")
}

/// `CREATE TABLE` statement for a schema.
#[must_use]
pub fn create_table_sql(table: &str, schema: &TableSchema) -> String {
    let mut columns = vec![format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", quote_ident(ROW_ID))];
    columns.extend(
        schema
            .columns()
            .iter()
            .map(|c| format!("{} {}", quote_ident(&c.name), sql_type(c.column_type))),
    );
    format!(
        "CREATE TABLE {} ({})",
        quote_ident(table),
        columns.join(", ")
    )
}

/// `INSERT` statement with one numbered parameter per schema column.
#[must_use]
pub fn insert_sql(table: &str, schema: &TableSchema) -> String {
    let names: Vec<String> = schema.column_names().map(quote_ident).collect();
    let params: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table),
        names.join(", "),
        params.join(", ")
    )
}

/// Comma-separated, table-qualified schema column list.
#[must_use]
pub fn select_columns(table: &str, schema: &TableSchema) -> String {
    let qualifier = quote_ident(table);
    schema
        .column_names()
        .map(|c| format!("{qualifier}.{}", quote_ident(c)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Wraps an optional filter condition in a `WHERE` clause.
///
/// The closing parenthesis sits on its own line so a condition ending in a
/// `--` comment still terminates.
#[must_use]
pub fn where_clause(filter: Option<&str>) -> String {
    match filter.map(str::trim) {
        Some(condition) if !condition.is_empty() => format!(" WHERE ({condition}\n)"),
        _ => String::new(),
    }
}

/// Statements creating an FTS5 external-content index over `column`, the
/// triggers that keep it in sync, and the initial rebuild.
#[must_use]
pub fn create_fts_sql(table: &str, index: &str, column: &str) -> String {
    let fts = fts_table_name(table, index);
    let fts_q = quote_ident(&fts);
    let table_q = quote_ident(table);
    let col = quote_ident(column);
    let row_id = quote_ident(ROW_ID);
    let ai = quote_ident(&format!("{fts}_ai"));
    let ad = quote_ident(&format!("{fts}_ad"));
    let au = quote_ident(&format!("{fts}_au"));

    format!(
        "CREATE VIRTUAL TABLE {fts_q} USING fts5({col}, content='{table}', content_rowid='{ROW_ID}', tokenize='porter unicode61');
         CREATE TRIGGER {ai} AFTER INSERT ON {table_q} BEGIN
             INSERT INTO {fts_q}(rowid, {col}) VALUES (new.{row_id}, new.{col});
         END;
         CREATE TRIGGER {ad} AFTER DELETE ON {table_q} BEGIN
             INSERT INTO {fts_q}({fts_q}, rowid, {col}) VALUES ('delete', old.{row_id}, old.{col});
         END;
         CREATE TRIGGER {au} AFTER UPDATE ON {table_q} BEGIN
             INSERT INTO {fts_q}({fts_q}, rowid, {col}) VALUES ('delete', old.{row_id}, old.{col});
             INSERT INTO {fts_q}(rowid, {col}) VALUES (new.{row_id}, new.{col});
         END;
         INSERT INTO {fts_q}({fts_q}) VALUES ('rebuild');"
    )
}

/// Encodes a vector as little-endian `f32` bytes.
#[must_use]
pub fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|x| x.to_le_bytes()).collect()
}

/// Decodes little-endian `f32` bytes.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the length is not a multiple of four.
pub fn decode_vector(bytes: &[u8]) -> crate::Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(Error::InvalidInput(format!(
            "vector blob of {} bytes is not a whole number of f32 values",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}
