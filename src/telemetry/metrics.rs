//! Metric instrument factories for igloo-rs.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! All instruments are created lazily from the `"igloo-rs"` meter. Without
//! a provider they are no-ops.

use opentelemetry::metrics::{Counter, Histogram, Meter};

/// Returns the shared meter for igloo-rs instruments.
fn meter() -> Meter {
    opentelemetry::global::meter("igloo-rs")
}

/// Counter: dispatches admitted for immediate execution.
/// Labels: `store`, `payload`.
pub fn dispatch_admitted() -> Counter<u64> {
    meter()
        .u64_counter("igloo.dispatch.admitted")
        .with_description("Number of dispatches admitted immediately")
        .build()
}

/// Counter: dispatches deferred because their condition was false.
/// Labels: `store`, `queue` ("closures" | "actions").
pub fn dispatch_deferred() -> Counter<u64> {
    meter()
        .u64_counter("igloo.dispatch.deferred")
        .with_description("Number of dispatches deferred to a pending queue")
        .build()
}

/// Counter: top-level dispatches that failed.
/// Labels: `store`.
pub fn dispatch_failed() -> Counter<u64> {
    meter()
        .u64_counter("igloo.dispatch.failed")
        .with_description("Number of failed dispatches")
        .build()
}

/// Counter: pending items replayed during a drain.
/// Labels: `store`, `queue`.
pub fn pending_replayed() -> Counter<u64> {
    meter()
        .u64_counter("igloo.pending.replayed")
        .with_description("Number of pending items replayed")
        .build()
}

/// Counter: replayed pending items that failed.
/// Labels: `store`, `queue`.
pub fn pending_failed() -> Counter<u64> {
    meter()
        .u64_counter("igloo.pending.failed")
        .with_description("Number of replayed pending items that failed")
        .build()
}

/// Histogram: drain duration in milliseconds.
/// Labels: `store`.
pub fn drain_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("igloo.drain.duration_ms")
        .with_description("Drain duration in milliseconds")
        .with_unit("ms")
        .build()
}
