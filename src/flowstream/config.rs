//! Runtime options for the aggregation pipeline.

use std::fmt;

use clap::Parser;

use crate::flowstream::sink::IndexStrategy;

/// All tunables of the pipeline, with the defaults the service ships with.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "flowstream",
    about = "Aggregates flow telemetry from Kafka into windowed traffic summaries"
)]
pub struct AggregatorOptions {
    /// Comma-separated Kafka broker addresses
    #[arg(long, default_value = "localhost:9092")]
    pub bootstrap_servers: String,

    /// Topic carrying length-prefixed flow records
    #[arg(long, default_value = "flows")]
    pub flow_source_topic: String,

    /// Optional topic that also receives every summary as JSON
    #[arg(long)]
    pub flow_dest_topic: Option<String>,

    /// Kafka consumer group
    #[arg(long, default_value = "flowstream")]
    pub group_id: String,

    /// Let Kafka auto-commit offsets instead of committing after sink
    /// acknowledgement
    #[arg(long)]
    pub auto_commit: bool,

    /// Elasticsearch base URL
    #[arg(long, default_value = "http://localhost:9200")]
    pub elastic_url: String,

    #[arg(long)]
    pub elastic_user: Option<String>,

    #[arg(long)]
    pub elastic_password: Option<String>,

    /// Base name of the summary index; the index strategy appends a time
    /// suffix
    #[arg(long, default_value = "aggregated-flows")]
    pub elastic_flow_index: String,

    /// DAILY, HOURLY or MONTHLY
    #[arg(long, default_value = "MONTHLY")]
    pub elastic_index_strategy: IndexStrategy,

    /// Width of the fixed aggregation windows
    #[arg(long, default_value_t = 60_000)]
    pub fixed_window_size_ms: i64,

    /// Longest flow the assigner will reach back for; older window
    /// assignments are dropped
    #[arg(long, default_value_t = 900_000)]
    pub max_flow_duration_ms: i64,

    /// How far event time may trail the newest record per partition before
    /// the watermark moves on
    #[arg(long, default_value_t = 300_000)]
    pub default_max_input_delay_ms: i64,

    /// Processing-time delay that coalesces bursts of late records into one
    /// pane firing
    #[arg(long, default_value_t = 60_000)]
    pub late_processing_delay_ms: i64,

    /// How long past a window's end late records are still accepted
    #[arg(long, default_value_t = 14_400_000)]
    pub allowed_lateness_ms: i64,

    /// Contributors to keep per exporter/interface and breakdown
    #[arg(long, default_value_t = 10)]
    pub top_k: usize,
}

impl Default for AggregatorOptions {
    fn default() -> Self {
        AggregatorOptions {
            bootstrap_servers: "localhost:9092".to_string(),
            flow_source_topic: "flows".to_string(),
            flow_dest_topic: None,
            group_id: "flowstream".to_string(),
            auto_commit: false,
            elastic_url: "http://localhost:9200".to_string(),
            elastic_user: None,
            elastic_password: None,
            elastic_flow_index: "aggregated-flows".to_string(),
            elastic_index_strategy: IndexStrategy::Monthly,
            fixed_window_size_ms: 60_000,
            max_flow_duration_ms: 900_000,
            default_max_input_delay_ms: 300_000,
            late_processing_delay_ms: 60_000,
            allowed_lateness_ms: 14_400_000,
            top_k: 10,
        }
    }
}

impl AggregatorOptions {
    /// Rejects configurations the pipeline cannot run with. Called once at
    /// startup; failures are fatal.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bootstrap_servers.trim().is_empty() {
            return Err(ConfigError::invalid("bootstrap-servers", "must not be empty"));
        }
        if self.flow_source_topic.trim().is_empty() {
            return Err(ConfigError::invalid("flow-source-topic", "must not be empty"));
        }
        if self.elastic_url.trim().is_empty() {
            return Err(ConfigError::invalid("elastic-url", "must not be empty"));
        }
        if self.fixed_window_size_ms <= 0 {
            return Err(ConfigError::invalid("fixed-window-size-ms", "must be positive"));
        }
        if self.max_flow_duration_ms <= 0 {
            return Err(ConfigError::invalid("max-flow-duration-ms", "must be positive"));
        }
        if self.default_max_input_delay_ms < 0 {
            return Err(ConfigError::invalid(
                "default-max-input-delay-ms",
                "must not be negative",
            ));
        }
        if self.late_processing_delay_ms < 0 {
            return Err(ConfigError::invalid(
                "late-processing-delay-ms",
                "must not be negative",
            ));
        }
        if self.allowed_lateness_ms < 0 {
            return Err(ConfigError::invalid("allowed-lateness-ms", "must not be negative"));
        }
        Ok(())
    }
}

/// A rejected configuration value.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub option: String,
    pub message: String,
}

impl ConfigError {
    fn invalid(option: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError {
            option: option.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid option --{}: {}", self.option, self.message)
    }
}

impl std::error::Error for ConfigError {}
