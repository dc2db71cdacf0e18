//! Conversion between [`Record`]s and `SQLite` rows.

use super::sql::{decode_vector, encode_vector};
use crate::models::{ColumnDef, ColumnType, Record, TableSchema, Value};
use rusqlite::Row;
use rusqlite::types::{Type, Value as SqlValue};

/// Builds the parameter for one column of an insert.
///
/// Missing fields take the column default; without a default they are NULL.
/// Integers bound to float columns are widened.
#[must_use]
pub fn bind_value(column: &ColumnDef, record: &Record) -> SqlValue {
    let value = record.get(&column.name).or(column.default.as_ref());
    match (column.column_type, value) {
        (_, None) => SqlValue::Null,
        (ColumnType::Float, Some(Value::Integer(i))) => {
            #[allow(clippy::cast_precision_loss)]
            let widened = *i as f64;
            SqlValue::Real(widened)
        },
        (_, Some(Value::Text(s))) => SqlValue::Text(s.clone()),
        (_, Some(Value::Integer(i))) => SqlValue::Integer(*i),
        (_, Some(Value::Float(x))) => SqlValue::Real(*x),
        (_, Some(Value::Vector(v))) => SqlValue::Blob(encode_vector(v)),
    }
}

/// Reads the schema columns of a row, starting at column `offset`.
///
/// NULL columns are left out of the record.
pub fn read_record(row: &Row<'_>, schema: &TableSchema, offset: usize) -> rusqlite::Result<Record> {
    let mut record = Record::new();
    for (i, column) in schema.columns().iter().enumerate() {
        let idx = offset + i;
        let value = match column.column_type {
            ColumnType::Varchar => row.get::<_, Option<String>>(idx)?.map(Value::Text),
            ColumnType::Integer => row.get::<_, Option<i64>>(idx)?.map(Value::Integer),
            ColumnType::Float => row.get::<_, Option<f64>>(idx)?.map(Value::Float),
            ColumnType::Vector { .. } => match row.get::<_, Option<Vec<u8>>>(idx)? {
                Some(bytes) => Some(Value::Vector(decode_vector(&bytes).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(idx, Type::Blob, Box::new(e))
                })?)),
                None => None,
            },
        };
        if let Some(value) = value {
            record.insert(column.name.clone(), value);
        }
    }
    Ok(record)
}
