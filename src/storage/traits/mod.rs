//! Storage engine traits.

mod engine;

pub use engine::{StorageEngine, TableHandle};
