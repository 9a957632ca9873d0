//! Top-level pipeline error, aggregating the per-subsystem errors.

use std::fmt;

use crate::flowstream::config::ConfigError;
use crate::flowstream::kafka::{ConsumerError, ProducerError};
use crate::flowstream::sink::SinkError;

/// A fault that ends the pipeline. Per-record problems never surface here;
/// they are absorbed where they occur with a counter and a sampled warning.
#[derive(Debug)]
pub enum PipelineError {
    Config(ConfigError),
    Consumer(ConsumerError),
    Producer(ProducerError),
    Sink(SinkError),
    Metrics(prometheus::Error),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Config(e) => write!(f, "configuration error: {}", e),
            PipelineError::Consumer(e) => write!(f, "source error: {}", e),
            PipelineError::Producer(e) => write!(f, "destination topic error: {}", e),
            PipelineError::Sink(e) => write!(f, "document sink error: {}", e),
            PipelineError::Metrics(e) => write!(f, "metrics registry error: {}", e),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Config(e) => Some(e),
            PipelineError::Consumer(e) => Some(e),
            PipelineError::Producer(e) => Some(e),
            PipelineError::Sink(e) => Some(e),
            PipelineError::Metrics(e) => Some(e),
        }
    }
}

impl From<ConfigError> for PipelineError {
    fn from(e: ConfigError) -> Self {
        PipelineError::Config(e)
    }
}

impl From<ConsumerError> for PipelineError {
    fn from(e: ConsumerError) -> Self {
        PipelineError::Consumer(e)
    }
}

impl From<ProducerError> for PipelineError {
    fn from(e: ProducerError) -> Self {
        PipelineError::Producer(e)
    }
}

impl From<SinkError> for PipelineError {
    fn from(e: SinkError) -> Self {
        PipelineError::Sink(e)
    }
}

impl From<prometheus::Error> for PipelineError {
    fn from(e: prometheus::Error) -> Self {
        PipelineError::Metrics(e)
    }
}
