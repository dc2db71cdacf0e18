//! Operation metrics for the `SQLite` engine.

use std::time::Instant;

/// Records the count and latency of one engine operation.
///
/// Emits `storage_operations_total` and `storage_operation_duration_ms`,
/// labelled by backend, operation and outcome. Returns the result unchanged
/// so calls can wrap an operation's tail expression.
pub fn record_operation<T, E>(
    backend: &'static str,
    operation: &'static str,
    start: Instant,
    result: Result<T, E>,
) -> Result<T, E> {
    let status = if result.is_ok() { "success" } else { "error" };
    metrics::counter!(
        "storage_operations_total",
        "backend" => backend,
        "operation" => operation,
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "storage_operation_duration_ms",
        "backend" => backend,
        "operation" => operation,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64() * 1000.0);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_operation_passes_result_through() {
        let ok: Result<u8, String> = record_operation("sqlite", "test", Instant::now(), Ok(7));
        assert_eq!(ok, Ok(7));

        let err: Result<u8, String> =
            record_operation("sqlite", "test", Instant::now(), Err("boom".to_string()));
        assert_eq!(err, Err("boom".to_string()));
    }
}
