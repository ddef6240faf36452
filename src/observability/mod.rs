//! Observability subsystem.
//!
//! Tracing is initialized in main; this module owns the Prometheus
//! exporter and the metric recording helpers used across the runtime.

pub mod metrics;
