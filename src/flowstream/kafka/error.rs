//! Errors surfaced by the Kafka source and sink adapters.

use std::fmt;

use rdkafka::error::KafkaError;

use crate::flowstream::flow::CodecError;

/// Errors raised while pulling flows from the source topic.
#[derive(Debug)]
pub enum ConsumerError {
    /// Transport or broker problem; the client keeps retrying internally.
    Kafka(KafkaError),
    /// The message payload was not a decodable flow record.
    Codec(CodecError),
    /// A message arrived without any payload bytes.
    EmptyPayload { partition: i32, offset: i64 },
}

impl fmt::Display for ConsumerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsumerError::Kafka(e) => write!(f, "kafka consumer error: {}", e),
            ConsumerError::Codec(e) => write!(f, "flow payload error: {}", e),
            ConsumerError::EmptyPayload { partition, offset } => {
                write!(f, "empty payload at partition {} offset {}", partition, offset)
            }
        }
    }
}

impl std::error::Error for ConsumerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConsumerError::Kafka(e) => Some(e),
            ConsumerError::Codec(e) => Some(e),
            ConsumerError::EmptyPayload { .. } => None,
        }
    }
}

impl From<KafkaError> for ConsumerError {
    fn from(e: KafkaError) -> Self {
        ConsumerError::Kafka(e)
    }
}

impl From<CodecError> for ConsumerError {
    fn from(e: CodecError) -> Self {
        ConsumerError::Codec(e)
    }
}

impl ConsumerError {
    /// Whether the record should simply be skipped rather than tearing the
    /// pipeline down.
    pub fn is_per_record(&self) -> bool {
        matches!(
            self,
            ConsumerError::Codec(_) | ConsumerError::EmptyPayload { .. }
        )
    }
}

/// Errors raised while publishing summaries to the destination topic.
#[derive(Debug)]
pub enum ProducerError {
    Kafka(KafkaError),
    Serialization(serde_json::Error),
}

impl fmt::Display for ProducerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProducerError::Kafka(e) => write!(f, "kafka producer error: {}", e),
            ProducerError::Serialization(e) => write!(f, "summary serialization error: {}", e),
        }
    }
}

impl std::error::Error for ProducerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProducerError::Kafka(e) => Some(e),
            ProducerError::Serialization(e) => Some(e),
        }
    }
}

impl From<KafkaError> for ProducerError {
    fn from(e: KafkaError) -> Self {
        ProducerError::Kafka(e)
    }
}

impl From<serde_json::Error> for ProducerError {
    fn from(e: serde_json::Error) -> Self {
        ProducerError::Serialization(e)
    }
}
