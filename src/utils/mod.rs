//! Shared utilities for binaries and observability.

pub mod bootstrap;
#[cfg(feature = "otel")]
pub mod metrics;
