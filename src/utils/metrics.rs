//! OTel-native metrics instruments.
//!
//! Failure paths of the call pipeline, reported alongside logs so that
//! undercounting is visible. All instruments are lazily initialized and
//! feature-gated behind `otel`.
//!
//! Naming follows OTel semantic conventions (dot-separated).

use std::sync::LazyLock;

use opentelemetry::metrics::{Counter, Meter};
use opentelemetry::{global, KeyValue};

static METER: LazyLock<Meter> = LazyLock::new(|| global::meter("callcount"));

/// Call events the bus could not accept (queue full or closed).
pub static PUBLISH_DROPPED_TOTAL: LazyLock<Counter<u64>> = LazyLock::new(|| {
    METER
        .u64_counter("callcount.publish.dropped.total")
        .with_description("Call events dropped before reaching subscribers")
        .build()
});

/// Handler invocations that failed or panicked.
pub static HANDLER_FAILURE_TOTAL: LazyLock<Counter<u64>> = LazyLock::new(|| {
    METER
        .u64_counter("callcount.handler.failure.total")
        .with_description("Call handler failures")
        .build()
});

/// Create a bus_type label.
pub fn bus_type_attr(bus_type: &str) -> KeyValue {
    KeyValue::new("bus_type", bus_type.to_string())
}

/// Create a handler label.
pub fn handler_attr(handler: &str) -> KeyValue {
    KeyValue::new("handler", handler.to_string())
}
