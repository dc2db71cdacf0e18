//! Property-based tests for vector parsing, distance metrics and per-file summaries.
//!
//! Uses proptest to verify invariants across random inputs:
//! - Formatted vectors parse back to the same components
//! - Metrics are symmetric and rank a vector's own copy first
//! - Per-file summaries account for every row
//! - Filename conditions survive arbitrary quotes

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::float_cmp)]

use chunkbase::models::{CHUNK_TEXT, FILENAME, parse_vector};
use chunkbase::services::{filename_condition, summarize_by_filename};
use chunkbase::{DistanceMetric, Record};
use proptest::prelude::*;
use std::cmp::Ordering;

fn vector(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-100.0_f32..100.0, dim)
}

proptest! {
    /// Property: a comma-joined vector parses back exactly, brackets or not.
    #[test]
    fn prop_parse_vector_roundtrip(v in prop::collection::vec(-1.0e6_f32..1.0e6, 1..16), bracketed in any::<bool>()) {
        let joined = v.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
        let input = if bracketed { format!("[{joined}]") } else { joined };
        prop_assert_eq!(parse_vector(&input).unwrap(), v);
    }

    /// Property: anything with a non-numeric component is rejected.
    #[test]
    fn prop_parse_vector_rejects_words(word in "[a-z]{1,8}") {
        let input = format!("1.0, {word}, 2.0");
        prop_assert!(parse_vector(&input).is_err());
    }

    /// Property: every metric is symmetric.
    #[test]
    fn prop_metric_symmetric(a in vector(4), b in vector(4)) {
        for metric in [DistanceMetric::L2, DistanceMetric::Cosine, DistanceMetric::Ip] {
            let ab = metric.score(&a, &b);
            let ba = metric.score(&b, &a);
            prop_assert!((ab - ba).abs() <= 1e-3 * ab.abs().max(1.0));
        }
    }

    /// Property: L2 puts a vector's own copy at distance zero, never behind anything.
    #[test]
    fn prop_l2_self_is_closest(a in vector(4), b in vector(4)) {
        let metric = DistanceMetric::L2;
        let own = metric.score(&a, &a);
        prop_assert_eq!(own, 0.0);
        prop_assert_ne!(metric.rank(own, metric.score(&a, &b)), Ordering::Greater);
    }

    /// Property: cosine similarity stays within [-1, 1].
    #[test]
    fn prop_cosine_bounded(a in vector(4), b in vector(4)) {
        let score = DistanceMetric::Cosine.score(&a, &b);
        prop_assert!((-1.0001..=1.0001).contains(&score));
    }

    /// Property: summaries count every row and every character once.
    #[test]
    fn prop_summary_accounts_for_all_rows(
        rows in prop::collection::vec(("[a-c]\\.txt", "[a-zé ]{0,20}"), 0..30)
    ) {
        let records: Vec<Record> = rows
            .iter()
            .map(|(filename, text)| Record::new().with(FILENAME, filename.as_str()).with(CHUNK_TEXT, text.as_str()))
            .collect();
        let summary = summarize_by_filename(&records);

        let chunks: usize = summary.iter().map(|s| s.chunk_count).sum();
        let chars: usize = summary.iter().map(|s| s.char_count).sum();
        prop_assert_eq!(chunks, rows.len());
        prop_assert_eq!(chars, rows.iter().map(|(_, t)| t.chars().count()).sum::<usize>());
        prop_assert!(summary.windows(2).all(|w| w[0].filename < w[1].filename));
    }

    /// Property: filename conditions quote the name as one literal.
    #[test]
    fn prop_filename_condition_quotes(name in "[a-z' ]{1,20}") {
        match filename_condition(&name) {
            Some(condition) => {
                let literal = condition.strip_prefix("filename = ").unwrap();
                prop_assert!(literal.starts_with('\'') && literal.ends_with('\''));
                let inner = &literal[1..literal.len() - 1];
                prop_assert_eq!(inner.replace("''", "'"), name.trim());
            },
            None => prop_assert!(name.trim().is_empty()),
        }
    }
}
