//! Business logic services.
//!
//! The [`ChunkStore`] orchestrates one storage engine and provides the
//! high-level chunk operations both user surfaces call.

mod seed;
mod store;
mod summary;

pub use seed::{DEMO_QUERIES, demo_records};
pub use store::{
    ChunkStore, DEFAULT_DATABASE, DEFAULT_DIMENSION, DEFAULT_INDEX, DEFAULT_TABLE, InsertReport,
    RejectedRecord, StoreSettings, filename_condition,
};
pub use summary::summarize_by_filename;
