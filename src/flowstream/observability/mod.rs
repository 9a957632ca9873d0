//! Pipeline metrics and logging utilities.

pub mod rate_limit;

pub use rate_limit::RateLimitedLog;

use prometheus::{Histogram, HistogramOpts, IntCounter, Opts, Registry};

/// Counters and distributions exposed by the aggregation pipeline.
///
/// All metrics live in a dedicated registry owned by this struct so that
/// embedding applications and tests can create independent instances.
pub struct PipelineMetrics {
    pub registry: Registry,

    /// Flow records decoded off the source topic.
    pub flows_from_kafka: IntCounter,
    /// (window, flow) contributions that survived allocation.
    pub flows_in_window: IntCounter,
    /// Summary documents written to the document sink.
    pub flows_to_es: IntCounter,

    /// Flows dropped before windowing (missing exporter, negative byte or
    /// duration values).
    pub flows_malformed_dropped: IntCounter,
    /// (window, flow) pairs dropped by the assigner's skew guard.
    pub flows_skew_dropped: IntCounter,
    /// Contributions dropped because their window was past allowed lateness.
    pub flows_late_dropped: IntCounter,
    /// Flows that arrived without delta_switched and had it synthesized from
    /// first_switched.
    pub delta_switched_synthesized: IntCounter,

    pub panes_on_time: IntCounter,
    pub panes_late: IntCounter,
    pub sink_retries: IntCounter,

    /// Wall-clock lag of records at ingest, in milliseconds.
    pub from_kafka_drift_ms: Histogram,
    /// Wall-clock lag of summaries at sink write, in milliseconds.
    pub to_es_drift_ms: Histogram,
}

impl PipelineMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let counter = |name: &str, help: &str| -> Result<IntCounter, prometheus::Error> {
            IntCounter::with_opts(Opts::new(name, help))
        };
        // Drift ranges from sub-second (live traffic) to hours (replays).
        let drift = |name: &str, help: &str| -> Result<Histogram, prometheus::Error> {
            Histogram::with_opts(
                HistogramOpts::new(name, help)
                    .buckets(prometheus::exponential_buckets(100.0, 4.0, 10)?),
            )
        };

        let metrics = PipelineMetrics {
            flows_from_kafka: counter("flows_from_kafka", "Flow records consumed from Kafka")?,
            flows_in_window: counter("flows_in_window", "Per-window flow contributions")?,
            flows_to_es: counter("flows_to_es", "Summaries written to the document sink")?,
            flows_malformed_dropped: counter(
                "flows_malformed_dropped",
                "Flows dropped due to invalid fields",
            )?,
            flows_skew_dropped: counter(
                "flows_skew_dropped",
                "Window assignments dropped by the skew guard",
            )?,
            flows_late_dropped: counter(
                "flows_late_dropped",
                "Contributions dropped past allowed lateness",
            )?,
            delta_switched_synthesized: counter(
                "delta_switched_synthesized",
                "Flows with delta_switched defaulted to first_switched",
            )?,
            panes_on_time: counter("panes_on_time", "On-time pane firings")?,
            panes_late: counter("panes_late", "Late pane firings")?,
            sink_retries: counter("sink_retries", "Transient sink failures retried")?,
            from_kafka_drift_ms: drift(
                "from_kafka_drift_ms",
                "Lag between event time and ingest time",
            )?,
            to_es_drift_ms: drift("to_es_drift_ms", "Lag between event time and sink write")?,
            registry,
        };

        metrics.registry.register(Box::new(metrics.flows_from_kafka.clone()))?;
        metrics.registry.register(Box::new(metrics.flows_in_window.clone()))?;
        metrics.registry.register(Box::new(metrics.flows_to_es.clone()))?;
        metrics
            .registry
            .register(Box::new(metrics.flows_malformed_dropped.clone()))?;
        metrics.registry.register(Box::new(metrics.flows_skew_dropped.clone()))?;
        metrics.registry.register(Box::new(metrics.flows_late_dropped.clone()))?;
        metrics
            .registry
            .register(Box::new(metrics.delta_switched_synthesized.clone()))?;
        metrics.registry.register(Box::new(metrics.panes_on_time.clone()))?;
        metrics.registry.register(Box::new(metrics.panes_late.clone()))?;
        metrics.registry.register(Box::new(metrics.sink_retries.clone()))?;
        metrics.registry.register(Box::new(metrics.from_kafka_drift_ms.clone()))?;
        metrics.registry.register(Box::new(metrics.to_es_drift_ms.clone()))?;

        Ok(metrics)
    }
}
