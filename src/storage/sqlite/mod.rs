//! Embedded `SQLite` storage engine.
//!
//! ## Module Structure
//!
//! - [`SqliteEngine`]: the [`StorageEngine`](crate::storage::StorageEngine) implementation
//! - `catalog`: per-database tables recording schemas and index definitions
//! - `connection`: connection opening, pragmas and lock acquisition
//! - `row`: conversion between [`Record`](crate::Record)s and rows
//! - `sql`: statement builders and the vector blob codec
//! - `metrics`: operation counters and latency histograms
//!
//! Each database is one file in the workspace directory, opened in WAL mode.

mod catalog;
mod connection;
mod engine;
mod metrics;
mod row;
mod sql;

pub use connection::{BUSY_TIMEOUT_MS, acquire_lock};
pub use engine::SqliteEngine;
pub use sql::{ROW_ID, decode_vector, encode_vector, quote_ident};
