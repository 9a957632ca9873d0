//! Streaming aggregation of network flow telemetry.
//!
//! Consumes per-connection flow records from a Kafka topic, attributes each
//! flow's bytes to the fixed event-time windows it spans, and emits
//! per-exporter/interface totals plus top-K breakdowns by application, host
//! and conversation to Elasticsearch and (optionally) a downstream topic.

pub mod flowstream;

// Re-export the main API
pub use flowstream::config::AggregatorOptions;
pub use flowstream::error::PipelineError;
pub use flowstream::flow::{Direction, FlowCodec, FlowDocument, NodeInfo};
pub use flowstream::observability::PipelineMetrics;
pub use flowstream::pipeline::runner::run_pipeline;
pub use flowstream::pipeline::summary::FlowSummary;
pub use flowstream::pipeline::FlowAggregator;
pub use flowstream::sink::{ElasticSink, IndexStrategy, SummarySink};
