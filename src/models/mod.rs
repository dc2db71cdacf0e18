//! Data models for chunkbase.
//!
//! Records, schemas, index definitions and search types shared by the
//! engine contract, the store and both user surfaces.

mod chunk;
mod index;
mod record;
mod schema;
mod search;

pub use chunk::{
    CHUNK_TEXT, Chunk, FILE_UUID, FILENAME, VECTOR, default_chunk_schema, parse_vector,
};
pub(crate) use chunk::check_chunk_schema;
pub use index::{ConflictPolicy, IndexDefinition, IndexKind};
pub use record::{Record, Value};
pub use schema::{ColumnDef, ColumnType, TableSchema, is_valid_identifier};
pub use search::{DenseQuery, DistanceMetric, FileSummary, ScoredRecord, TextQuery};
