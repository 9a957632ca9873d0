//! Typed consumer for the flow source topic.
//!
//! Wraps an rdkafka `StreamConsumer`: each poll yields a decoded flow
//! together with its partition, offset and extracted event time, and feeds
//! the per-partition watermark tracker. A flow's event time is its
//! `last_switched` timestamp.

use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use futures::StreamExt;
use log::info;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::error::KafkaError;
use rdkafka::message::Message;

use crate::flowstream::config::AggregatorOptions;
use crate::flowstream::flow::{FlowCodec, FlowDocument};
use crate::flowstream::observability::PipelineMetrics;
use crate::flowstream::pipeline::watermark::WatermarkTracker;

use super::error::ConsumerError;

/// One flow as pulled off the bus.
#[derive(Debug, Clone)]
pub struct SourcedFlow {
    pub partition: i32,
    pub offset: i64,
    pub event_time_ms: i64,
    pub flow: FlowDocument,
}

pub struct FlowConsumer {
    consumer: StreamConsumer,
    topic: String,
    codec: FlowCodec,
    // Behind a mutex so polling can share the consumer with commit calls.
    watermarks: Mutex<WatermarkTracker>,
    metrics: Arc<PipelineMetrics>,
}

impl FlowConsumer {
    pub fn new(
        options: &AggregatorOptions,
        metrics: Arc<PipelineMetrics>,
    ) -> Result<Self, ConsumerError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &options.bootstrap_servers)
            .set("group.id", &options.group_id)
            .set(
                "enable.auto.commit",
                if options.auto_commit { "true" } else { "false" },
            )
            .set("auto.offset.reset", "latest")
            .create()?;

        info!(
            "created flow consumer for topic {} on {} (group {})",
            options.flow_source_topic, options.bootstrap_servers, options.group_id
        );

        Ok(FlowConsumer {
            consumer,
            topic: options.flow_source_topic.clone(),
            codec: FlowCodec::new(),
            watermarks: Mutex::new(WatermarkTracker::new(options.default_max_input_delay_ms)),
            metrics,
        })
    }

    pub fn subscribe(&self) -> Result<(), ConsumerError> {
        self.consumer.subscribe(&[self.topic.as_str()])?;
        Ok(())
    }

    /// Pulls and decodes the next flow. Records missing `delta_switched`
    /// have it synthesized from `first_switched` here, before anything else
    /// sees them.
    pub async fn poll_flow(&self) -> Result<SourcedFlow, ConsumerError> {
        let mut stream = self.consumer.stream();
        let message = match stream.next().await {
            Some(result) => result?,
            // The message stream only ends when the consumer is shut down.
            None => return Err(ConsumerError::Kafka(KafkaError::NoMessageReceived)),
        };
        let partition = message.partition();
        let offset = message.offset();
        let payload = message
            .payload()
            .ok_or(ConsumerError::EmptyPayload { partition, offset })?;

        let mut flow = self.codec.decode(payload)?;
        if flow.delta_switched.is_none() {
            flow.delta_switched = Some(flow.first_switched);
            self.metrics.delta_switched_synthesized.inc();
        }

        let event_time_ms = flow.last_switched;
        self.observe_watermark(partition, event_time_ms);
        self.metrics.flows_from_kafka.inc();
        self.metrics
            .from_kafka_drift_ms
            .observe((epoch_ms() - event_time_ms).max(0) as f64);

        Ok(SourcedFlow {
            partition,
            offset,
            event_time_ms,
            flow,
        })
    }

    /// Global watermark over everything consumed so far.
    pub fn watermark(&self) -> Option<i64> {
        match self.watermarks.lock() {
            Ok(tracker) => tracker.watermark(),
            Err(poisoned) => poisoned.into_inner().watermark(),
        }
    }

    fn observe_watermark(&self, partition: i32, event_time_ms: i64) {
        match self.watermarks.lock() {
            Ok(mut tracker) => tracker.observe(partition, event_time_ms),
            Err(poisoned) => poisoned.into_inner().observe(partition, event_time_ms),
        }
    }

    /// Commits the current consumed position. Only used when auto-commit is
    /// disabled, after the sink has acknowledged the corresponding output.
    pub fn commit(&self) -> Result<(), ConsumerError> {
        self.consumer.commit_consumer_state(CommitMode::Async)?;
        Ok(())
    }
}

fn epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
