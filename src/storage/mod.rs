//! Storage layer.
//!
//! - [`traits`]: the engine contract ([`StorageEngine`], [`TableHandle`])
//! - [`sqlite`]: the embedded `SQLite` engine (FTS5 full-text, scanned dense search)
//! - [`workspace`]: where an engine keeps its databases

// Allow cast precision loss for score calculations where exact precision is not critical.
#![allow(clippy::cast_precision_loss)]
// Allow significant_drop_tightening - dropping database connections slightly early
// provides no meaningful benefit.
#![allow(clippy::significant_drop_tightening)]

pub mod sqlite;
pub mod traits;
pub mod workspace;

pub use sqlite::SqliteEngine;
pub use traits::{StorageEngine, TableHandle};
pub use workspace::Workspace;
