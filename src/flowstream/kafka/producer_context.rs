//! Client context for the summary producer.
//!
//! Routes librdkafka's internal logging through the `log` crate and reports
//! per-message delivery results, so broker-side failures on the destination
//! topic are visible even though sends are not individually awaited.

use log::{error, trace, warn};
use rdkafka::client::ClientContext;
use rdkafka::config::RDKafkaLogLevel;
use rdkafka::error::KafkaError;
use rdkafka::message::{DeliveryResult, Message};
use rdkafka::producer::ProducerContext;

pub struct LoggingProducerContext;

impl ClientContext for LoggingProducerContext {
    fn log(&self, level: RDKafkaLogLevel, fac: &str, message: &str) {
        log::log!(convert_kafka_log_level(level), "librdkafka {}: {}", fac, message);
    }

    fn error(&self, error: KafkaError, reason: &str) {
        error!("kafka client error: {}, reason: {}", error, reason);
    }
}

impl ProducerContext for LoggingProducerContext {
    type DeliveryOpaque = ();

    fn delivery(&self, delivery_result: &DeliveryResult<'_>, _delivery_opaque: ()) {
        match delivery_result {
            Ok(message) => trace!(
                "summary delivered to partition {} at offset {}",
                message.partition(),
                message.offset()
            ),
            Err((error, _)) => warn!("summary delivery failed: {}", error),
        }
    }
}

/// Maps librdkafka's syslog-style levels onto the `log` crate's levels.
pub fn convert_kafka_log_level(level: RDKafkaLogLevel) -> log::Level {
    match level {
        RDKafkaLogLevel::Emerg
        | RDKafkaLogLevel::Alert
        | RDKafkaLogLevel::Critical
        | RDKafkaLogLevel::Error => log::Level::Error,
        RDKafkaLogLevel::Warning => log::Level::Warn,
        RDKafkaLogLevel::Notice | RDKafkaLogLevel::Info => log::Level::Info,
        RDKafkaLogLevel::Debug => log::Level::Debug,
    }
}
