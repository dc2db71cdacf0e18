//! Search requests and results.

use super::Record;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Distance metric for dense vector search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Euclidean distance (lower is closer).
    #[default]
    L2,
    /// Cosine similarity (higher is closer).
    Cosine,
    /// Inner product (higher is closer).
    Ip,
}

impl DistanceMetric {
    /// Returns the metric as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::L2 => "l2",
            Self::Cosine => "cosine",
            Self::Ip => "ip",
        }
    }

    /// Returns true if larger scores mean closer vectors.
    #[must_use]
    pub const fn higher_is_closer(&self) -> bool {
        !matches!(self, Self::L2)
    }

    /// Label of the score this metric produces.
    #[must_use]
    pub const fn score_label(&self) -> &'static str {
        match self {
            Self::L2 => "distance",
            Self::Cosine | Self::Ip => "similarity",
        }
    }

    /// Scores `b` against the query `a`. Both slices must have equal length.
    #[must_use]
    pub fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::L2 => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt(),
            Self::Ip => dot(a, b),
            Self::Cosine => {
                let norm_a = dot(a, a).sqrt();
                let norm_b = dot(b, b).sqrt();
                if norm_a == 0.0 || norm_b == 0.0 {
                    0.0
                } else {
                    dot(a, b) / (norm_a * norm_b)
                }
            },
        }
    }

    /// Orders two scores so the closer one comes first.
    #[must_use]
    pub fn rank(&self, a: f32, b: f32) -> Ordering {
        if self.higher_is_closer() {
            b.total_cmp(&a)
        } else {
            a.total_cmp(&b)
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "l2" | "euclidean" => Ok(Self::L2),
            "cosine" | "cos" => Ok(Self::Cosine),
            "ip" | "dot" | "inner_product" => Ok(Self::Ip),
            other => Err(Error::InvalidInput(format!(
                "unknown distance metric '{other}' (expected l2, cosine or ip)"
            ))),
        }
    }
}

/// A full-text match request.
#[derive(Debug, Clone)]
pub struct TextQuery {
    /// Column carrying the full-text index.
    pub column: String,
    /// Query in the engine's full-text syntax, forwarded verbatim.
    pub query: String,
    /// Maximum number of rows.
    pub limit: usize,
}

/// A dense vector match request.
#[derive(Debug, Clone)]
pub struct DenseQuery {
    /// Vector column to search.
    pub column: String,
    /// Query vector.
    pub vector: Vec<f32>,
    /// Distance metric.
    pub metric: DistanceMetric,
    /// Maximum number of rows.
    pub limit: usize,
    /// Optional filter condition restricting the candidate rows.
    pub filter: Option<String>,
}

impl DenseQuery {
    /// Creates a request without a filter.
    #[must_use]
    pub fn new(
        column: impl Into<String>,
        vector: Vec<f32>,
        metric: DistanceMetric,
        limit: usize,
    ) -> Self {
        Self {
            column: column.into(),
            vector,
            metric,
            limit,
            filter: None,
        }
    }

    /// Restricts candidates to rows matching `condition`.
    #[must_use]
    pub fn with_filter(mut self, condition: impl Into<String>) -> Self {
        self.filter = Some(condition.into());
        self
    }
}

/// A row returned by a ranked search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    /// The matching row.
    pub record: Record,
    /// Relevance (text search) or metric value (vector search).
    pub score: f32,
}

/// Per-file aggregate of the chunk table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    /// Source filename (empty for chunks stored without one).
    pub filename: String,
    /// Uuid of the first chunk seen for the file.
    pub file_uuid: String,
    /// Number of chunks.
    pub chunk_count: usize,
    /// Total chunk text length in characters.
    pub char_count: usize,
}
