//! Index definitions and conflict policies.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a create or drop call does when the target already exists (or,
/// for drops, does not exist).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// Fail with [`Error::AlreadyExists`] / [`Error::NotFound`].
    #[default]
    Error,
    /// Treat the call as done.
    Ignore,
}

/// Kind of index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// Ranked keyword search over a varchar column.
    #[serde(alias = "full_text", alias = "fts")]
    FullText,
    /// Ordered lookup index over a scalar column.
    Secondary,
}

impl IndexKind {
    /// Returns the kind as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FullText => "fulltext",
            Self::Secondary => "secondary",
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fulltext" | "full_text" | "fts" => Ok(Self::FullText),
            "secondary" => Ok(Self::Secondary),
            other => Err(Error::InvalidInput(format!("unknown index kind '{other}'"))),
        }
    }
}

/// A named index over one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    /// Index name, unique per table.
    pub name: String,
    /// Indexed column.
    pub column: String,
    /// Index kind.
    pub kind: IndexKind,
}

impl IndexDefinition {
    /// Creates a full-text index definition.
    #[must_use]
    pub fn full_text(name: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
            kind: IndexKind::FullText,
        }
    }

    /// Creates a secondary index definition.
    #[must_use]
    pub fn secondary(name: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
            kind: IndexKind::Secondary,
        }
    }
}

impl fmt::Display for IndexDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} on {})", self.name, self.kind, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_kind_parse() {
        assert_eq!("FullText".parse::<IndexKind>().unwrap(), IndexKind::FullText);
        assert_eq!("fts".parse::<IndexKind>().unwrap(), IndexKind::FullText);
        assert_eq!(
            "secondary".parse::<IndexKind>().unwrap(),
            IndexKind::Secondary
        );
        assert!("hnsw".parse::<IndexKind>().is_err());
    }

    #[test]
    fn test_index_definition_display() {
        let def = IndexDefinition::full_text("my_index", "chunk_text");
        assert_eq!(def.to_string(), "my_index (fulltext on chunk_text)");
    }
}
