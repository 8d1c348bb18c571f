//! Shared metrics recording for `SQLite` backends.

use std::time::Instant;

/// Records a counter and a latency histogram for one storage operation.
///
/// # Arguments
///
/// * `store` - Store name (`"corpus"`, `"selection"`)
/// * `operation` - Operation name (`"lookup"`, `"insert_rows"`, ...)
/// * `start` - Operation start time
/// * `status` - `"success"` or `"error"`
pub fn record_operation_metrics(
    store: &'static str,
    operation: &'static str,
    start: Instant,
    status: &'static str,
) {
    metrics::counter!(
        "storage_operations_total",
        "backend" => "sqlite",
        "store" => store,
        "operation" => operation,
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "storage_operation_duration_ms",
        "backend" => "sqlite",
        "store" => store,
        "operation" => operation,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64() * 1000.0);
}

/// Maps a result to its metrics status label.
pub const fn status_of<T>(result: &crate::Result<T>) -> &'static str {
    if result.is_ok() { "success" } else { "error" }
}
