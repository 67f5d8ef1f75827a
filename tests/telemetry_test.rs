//! Integration tests for telemetry initialization and span helpers.

use igloo_rs::store::{PendingId, QueueKind};
use igloo_rs::telemetry::dispatch::{record_outcome, start_dispatch_span, start_replay_span};
use igloo_rs::telemetry::{TelemetryConfig, init_telemetry};
use uuid::Uuid;

#[test]
fn telemetry_initializes_without_endpoint() {
    // Only one global subscriber per process; a second init returns Err,
    // which is acceptable here.
    let config = TelemetryConfig {
        endpoint: None,
        service_name: "igloo-test".to_string(),
        log_level: "debug".to_string(),
    };
    if let Ok(guard) = init_telemetry(config) {
        assert!(!guard.is_exporting());
        guard.force_flush();
    }
}

#[test]
fn dispatch_span_creates_and_records_outcome() {
    let id = Uuid::new_v4();
    let span = start_dispatch_span("ledger", &id, "Increment");
    record_outcome(&span, "deferred");
    record_outcome(&span, "admitted");
}

#[test]
fn replay_span_creates() {
    let span = start_replay_span("ledger", QueueKind::Actions, PendingId(3));
    let _entered = span.enter();
}

#[test]
fn metric_instruments_build_without_a_provider() {
    use opentelemetry::KeyValue;
    use igloo_rs::telemetry::metrics;

    metrics::dispatch_admitted().add(1, &[KeyValue::new("store", "ledger")]);
    metrics::dispatch_deferred().add(1, &[]);
    metrics::dispatch_failed().add(1, &[]);
    metrics::pending_replayed().add(1, &[]);
    metrics::drain_duration_ms().record(1.5, &[]);
}
