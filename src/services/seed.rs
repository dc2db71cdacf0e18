//! Demo rows for a fresh workspace.

use crate::models::{CHUNK_TEXT, Chunk, Record, VECTOR};

/// The four demo records for the default 4-dimensional chunk table.
///
/// The last one has no filename or uuid; the column defaults fill them in.
#[must_use]
pub fn demo_records() -> Vec<Record> {
    vec![
        Chunk {
            chunk_text: "unnecessary and harmful".to_string(),
            file_uuid: "1234567890".to_string(),
            filename: "test1.txt".to_string(),
            vector: vec![1.0, 1.2, 0.8, 0.9],
        }
        .into(),
        Chunk {
            chunk_text: "Office for Harmful Blooms".to_string(),
            file_uuid: "1234567890".to_string(),
            filename: "test2.txt".to_string(),
            vector: vec![4.0, 4.2, 4.3, 4.5],
        }
        .into(),
        Chunk {
            chunk_text: "A Bloom filter is a space - efficient probabilistic data structure, \
                         conceived by Burton Howard Bloom in 1970, that is used to test whether \
                         an element is a member of a set."
                .to_string(),
            file_uuid: "1234567893".to_string(),
            filename: "test2.txt".to_string(),
            vector: vec![4.0, 4.2, 4.3, 4.5],
        }
        .into(),
        Record::new()
            .with(
                CHUNK_TEXT,
                "The American Football Conference (AFC) harm chemical anarchism add test is one \
                 of harm chemical the two conferences of the National Football League (NFL). \
                 This add test conference and its counterpart, the National Football \
                 Conference (NFC), currently contain 16 teams each, making up the 32 teams of \
                 the NFL. The current AFC title holder is the New England Patriots.",
            )
            .with(VECTOR, vec![4.0_f32, 4.2, 4.3, 4.5]),
    ]
}

/// Full-text queries that exercise the demo rows.
pub const DEMO_QUERIES: [&str; 5] = [
    "blooms",
    "Bloom filter",
    "\"Bloom filter\"",
    "space efficient",
    "NEAR(harmful chemical, 10)",
];
