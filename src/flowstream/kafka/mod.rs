//! Kafka bus adapters: the flow source and the optional summary topic sink.

mod error;
mod flow_consumer;
mod producer_context;
mod summary_producer;

pub use error::{ConsumerError, ProducerError};
pub use flow_consumer::{FlowConsumer, SourcedFlow};
pub use producer_context::{convert_kafka_log_level, LoggingProducerContext};
pub use summary_producer::SummaryProducer;
