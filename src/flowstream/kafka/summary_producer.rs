//! Producer for the optional summary destination topic.
//!
//! Summaries go out as JSON with a null key; consumers downstream treat the
//! topic as append-only. Sends are enqueued without blocking the pipeline;
//! delivery results are reported through [`LoggingProducerContext`] and the
//! queue is flushed on shutdown.

use std::time::Duration;

use log::info;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{BaseRecord, Producer, ThreadedProducer};
use rdkafka::util::Timeout;

use crate::flowstream::pipeline::summary::FlowSummary;

use super::error::ProducerError;
use super::producer_context::LoggingProducerContext;

pub struct SummaryProducer {
    producer: ThreadedProducer<LoggingProducerContext>,
    topic: String,
}

impl SummaryProducer {
    pub fn new(brokers: &str, topic: &str) -> Result<Self, ProducerError> {
        let producer: ThreadedProducer<LoggingProducerContext> = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create_with_context(LoggingProducerContext)?;

        info!("created summary producer for topic {} on {}", topic, brokers);

        Ok(SummaryProducer {
            producer,
            topic: topic.to_string(),
        })
    }

    /// Enqueues one summary. Failures here mean the local queue rejected the
    /// record; broker-side delivery results arrive via the producer context.
    pub fn send_summary(&self, summary: &FlowSummary) -> Result<(), ProducerError> {
        let payload = serde_json::to_string(summary)?;
        let record = BaseRecord::<String, String>::to(&self.topic).payload(&payload);
        self.producer
            .send(record)
            .map_err(|(error, _)| ProducerError::from(error))?;
        Ok(())
    }

    /// Blocks until queued messages have been delivered or the timeout hits.
    pub fn flush(&self, timeout: Duration) -> Result<(), ProducerError> {
        self.producer.flush(Timeout::After(timeout))?;
        Ok(())
    }
}
