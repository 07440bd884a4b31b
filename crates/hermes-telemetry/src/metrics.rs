//! Operational counters.
//!
//! Counters are recorded through the `metrics` facade. No exporter is
//! installed here; a host that wants them installs a recorder of its choice
//! before the first invocation.
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `hermes_validation_failures_total` | Counter | `location` | Fields that failed their schema |
//! | `hermes_unexpected_errors_total` | Counter | - | Errors normalized to 500 |
//! | `hermes_batch_item_failures_total` | Counter | `mode` | Failed queue messages |

use metrics::{counter, describe_counter};

/// Metric names.
pub mod names {
    /// Fields that failed their schema.
    pub const VALIDATION_FAILURES: &str = "hermes_validation_failures_total";

    /// Errors replaced by the generic internal error.
    pub const UNEXPECTED_ERRORS: &str = "hermes_unexpected_errors_total";

    /// Queue messages reported as batch item failures.
    pub const BATCH_ITEM_FAILURES: &str = "hermes_batch_item_failures_total";
}

/// Registers descriptions for every Hermes metric with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(
        names::VALIDATION_FAILURES,
        "Number of declared fields that failed schema validation"
    );
    describe_counter!(
        names::UNEXPECTED_ERRORS,
        "Number of unexpected errors normalized to an internal error"
    );
    describe_counter!(
        names::BATCH_ITEM_FAILURES,
        "Number of queue messages reported as batch item failures"
    );
}

/// Records a field that failed validation.
pub fn record_validation_failure(location: &str) {
    counter!(names::VALIDATION_FAILURES, "location" => location.to_string()).increment(1);
}

/// Records an unexpected error.
pub fn record_unexpected_error() {
    counter!(names::UNEXPECTED_ERRORS).increment(1);
}

/// Records `count` failed messages of one batch.
pub fn record_batch_item_failures(mode: &'static str, count: usize) {
    if count > 0 {
        counter!(names::BATCH_ITEM_FAILURES, "mode" => mode).increment(count as u64);
    }
}
