//! Observability: runtime telemetry (metrics) and sink abstractions.
//!
//! Store and workflow code never touch the counter state directly; every
//! instrumentation point goes through `sink::record`.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{CollectionCounters, EventOps, EventReport};
pub use sink::{
    ExecKind, MetricsEvent, MetricsSink, Span, metrics_report, metrics_reset_all,
    with_metrics_sink,
};
