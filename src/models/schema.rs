//! Column types and table schemas.
//!
//! Column types use the same textual form the table definitions are written
//! in: `varchar`, `integer`, `float` and `vector, <dimension>, float`.

use super::{Record, Value};
use crate::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,63}$").unwrap_or_else(|_| unreachable!())
});

/// Returns true if `name` can be used as a database, table, column or index name.
#[must_use]
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Variable-length text.
    Varchar,
    /// 64-bit signed integer.
    Integer,
    /// 64-bit float.
    Float,
    /// Fixed-length vector of `f32` components.
    Vector {
        /// Number of components.
        dimension: usize,
    },
}

impl ColumnType {
    /// Returns the dimension for vector columns.
    #[must_use]
    pub const fn dimension(&self) -> Option<usize> {
        match self {
            Self::Vector { dimension } => Some(*dimension),
            _ => None,
        }
    }

    /// Returns true if `value` has the right kind for this column.
    ///
    /// Vector length is not checked here; see [`TableSchema::validate`].
    #[must_use]
    pub const fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Varchar, Value::Text(_))
                | (Self::Integer, Value::Integer(_))
                | (Self::Float, Value::Float(_) | Value::Integer(_))
                | (Self::Vector { .. }, Value::Vector(_))
        )
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Varchar => f.write_str("varchar"),
            Self::Integer => f.write_str("integer"),
            Self::Float => f.write_str("float"),
            Self::Vector { dimension } => write!(f, "vector, {dimension}, float"),
        }
    }
}

impl FromStr for ColumnType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<String> = s
            .split(',')
            .map(|p| p.trim().to_lowercase())
            .collect();

        match parts.as_slice() {
            [t] if t == "varchar" || t == "text" => Ok(Self::Varchar),
            [t] if t == "integer" || t == "int" || t == "int64" => Ok(Self::Integer),
            [t] if t == "float" || t == "double" => Ok(Self::Float),
            [t, dim, elem] if t == "vector" => {
                if elem != "float" && elem != "float32" {
                    return Err(Error::InvalidInput(format!(
                        "unsupported vector element type '{elem}' (only float)"
                    )));
                }
                let dimension: usize = dim.parse().map_err(|_| {
                    Error::InvalidInput(format!("invalid vector dimension '{dim}'"))
                })?;
                if dimension == 0 {
                    return Err(Error::InvalidInput(
                        "vector dimension must be greater than zero".to_string(),
                    ));
                }
                Ok(Self::Vector { dimension })
            },
            _ => Err(Error::InvalidInput(format!("unknown column type '{s}'"))),
        }
    }
}

impl Serialize for ColumnType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ColumnType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A column: name, declared type and optional default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Value used when an inserted record omits the column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ColumnDef {
    /// Creates a column without a default.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            default: None,
        }
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Ordered column list of a table. Defined once; never migrated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableSchema {
    columns: Vec<ColumnDef>,
}

impl TableSchema {
    /// Creates a schema, checking names, duplicates and defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the schema is empty, a column name is
    /// not an identifier or starts with `_`, a name repeats, or a default does
    /// not fit its column type.
    pub fn new(columns: Vec<ColumnDef>) -> Result<Self> {
        if columns.is_empty() {
            return Err(Error::InvalidInput("schema has no columns".to_string()));
        }
        for (i, column) in columns.iter().enumerate() {
            if !is_valid_identifier(&column.name) || column.name.starts_with('_') {
                return Err(Error::InvalidInput(format!(
                    "invalid column name '{}'",
                    column.name
                )));
            }
            if columns[..i].iter().any(|c| c.name == column.name) {
                return Err(Error::InvalidInput(format!(
                    "duplicate column '{}'",
                    column.name
                )));
            }
            if let Some(default) = &column.default {
                check_value(column, default)?;
            }
        }
        Ok(Self { columns })
    }

    /// Columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Checks a record against the schema.
    ///
    /// Unknown fields, kind mismatches and wrong vector lengths are errors.
    /// Missing fields are fine when the column has a default; a missing vector
    /// without a default is an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] for wrong vector lengths and
    /// [`Error::InvalidInput`] for every other violation.
    pub fn validate(&self, record: &Record) -> Result<()> {
        for (name, value) in record.fields() {
            let column = self
                .column(name)
                .ok_or_else(|| Error::InvalidInput(format!("unknown field '{name}'")))?;
            check_value(column, value)?;
        }
        for column in &self.columns {
            let missing = record.get(&column.name).is_none();
            if missing && column.default.is_none() && column.column_type.dimension().is_some() {
                return Err(Error::InvalidInput(format!(
                    "missing vector field '{}'",
                    column.name
                )));
            }
        }
        Ok(())
    }
}

fn check_value(column: &ColumnDef, value: &Value) -> Result<()> {
    if !column.column_type.accepts(value) {
        return Err(Error::InvalidInput(format!(
            "field '{}' expects {}, got {}",
            column.name,
            column.column_type,
            value.kind()
        )));
    }
    if let (Some(expected), Value::Vector(v)) = (column.column_type.dimension(), value) {
        if v.len() != expected {
            return Err(Error::DimensionMismatch {
                expected,
                actual: v.len(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("varchar", ColumnType::Varchar ; "varchar")]
    #[test_case("VARCHAR", ColumnType::Varchar ; "uppercase")]
    #[test_case("integer", ColumnType::Integer ; "integer")]
    #[test_case("double", ColumnType::Float ; "double alias")]
    #[test_case("vector, 4, float", ColumnType::Vector { dimension: 4 } ; "vector with spaces")]
    #[test_case("vector,768,float", ColumnType::Vector { dimension: 768 } ; "vector compact")]
    fn test_parse_column_type(input: &str, expected: ColumnType) {
        assert_eq!(input.parse::<ColumnType>().unwrap(), expected);
    }

    #[test_case("vector, 0, float" ; "zero dimension")]
    #[test_case("vector, 4, int8" ; "unsupported element")]
    #[test_case("vector, four, float" ; "non numeric dimension")]
    #[test_case("blob" ; "unknown type")]
    fn test_parse_column_type_rejects(input: &str) {
        assert!(matches!(
            input.parse::<ColumnType>(),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_column_type_display_round_trips() {
        let t = ColumnType::Vector { dimension: 4 };
        assert_eq!(t.to_string().parse::<ColumnType>().unwrap(), t);
    }

    fn schema() -> TableSchema {
        TableSchema::new(vec![
            ColumnDef::new("chunk_text", ColumnType::Varchar).with_default(""),
            ColumnDef::new("vector", ColumnType::Vector { dimension: 4 }),
        ])
        .unwrap()
    }

    #[test]
    fn test_validate_accepts_defaulted_fields() {
        let record = Record::new().with("vector", vec![1.0_f32, 2.0, 3.0, 4.0]);
        assert!(schema().validate(&record).is_ok());
    }

    #[test]
    fn test_validate_rejects_wrong_dimension() {
        let record = Record::new().with("vector", vec![1.0_f32, 2.0, 3.0]);
        assert!(matches!(
            schema().validate(&record),
            Err(Error::DimensionMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_validate_rejects_unknown_and_missing() {
        let unknown = Record::new()
            .with("vector", vec![1.0_f32, 2.0, 3.0, 4.0])
            .with("num", 3_i64);
        assert!(matches!(
            schema().validate(&unknown),
            Err(Error::InvalidInput(msg)) if msg.contains("num")
        ));

        let missing = Record::new().with("chunk_text", "no vector");
        assert!(matches!(
            schema().validate(&missing),
            Err(Error::InvalidInput(msg)) if msg.contains("missing vector")
        ));
    }

    #[test]
    fn test_schema_rejects_bad_columns() {
        let dup = TableSchema::new(vec![
            ColumnDef::new("a", ColumnType::Varchar),
            ColumnDef::new("a", ColumnType::Integer),
        ]);
        assert!(dup.is_err());

        let reserved = TableSchema::new(vec![ColumnDef::new("_row_id", ColumnType::Integer)]);
        assert!(reserved.is_err());

        let bad_default = TableSchema::new(vec![
            ColumnDef::new("a", ColumnType::Varchar).with_default(1_i64),
        ]);
        assert!(bad_default.is_err());
    }

    #[test]
    fn test_identifier_validation() {
        assert!(is_valid_identifier("my_table"));
        assert!(is_valid_identifier("_internal"));
        assert!(!is_valid_identifier("1table"));
        assert!(!is_valid_identifier("my-table"));
        assert!(!is_valid_identifier("t; DROP TABLE x"));
        assert!(!is_valid_identifier(""));
    }

    #[test]
    fn test_schema_toml_form() {
        let toml_src = r#"
            [[columns]]
            name = "chunk_text"
            type = "varchar"
            default = ""

            [[columns]]
            name = "vector"
            type = "vector, 4, float"
        "#;

        #[derive(Deserialize)]
        struct Wrapper {
            columns: Vec<ColumnDef>,
        }

        let parsed: Wrapper = toml::from_str(toml_src).unwrap();
        let schema = TableSchema::new(parsed.columns).unwrap();
        assert_eq!(schema, self::schema());
    }
}
