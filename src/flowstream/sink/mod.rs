//! Summary sinks.
//!
//! The document sink contract is an id-keyed upsert: writing the same
//! document id twice replaces the first write. Combined with stable summary
//! ids this makes at-least-once delivery and late re-firings safe.

pub mod elastic;

pub use elastic::{ElasticSink, IndexStrategy};

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::flowstream::pipeline::summary::FlowSummary;

/// Errors from sink writes, split by whether retrying can help.
#[derive(Debug, Clone)]
pub enum SinkError {
    /// Worth retrying: network failures, timeouts, overload responses.
    Transient { message: String },
    /// Retrying cannot succeed: authentication, mapping conflicts, bad
    /// configuration.
    Permanent { message: String },
}

impl SinkError {
    pub fn transient(message: impl Into<String>) -> Self {
        SinkError::Transient {
            message: message.into(),
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        SinkError::Permanent {
            message: message.into(),
        }
    }

    pub fn is_permanent(&self) -> bool {
        matches!(self, SinkError::Permanent { .. })
    }
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::Transient { message } => write!(f, "transient sink error: {}", message),
            SinkError::Permanent { message } => write!(f, "permanent sink error: {}", message),
        }
    }
}

impl std::error::Error for SinkError {}

/// Bounded exponential backoff for transient sink failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 5,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based), doubling each time up
    /// to the cap.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// A destination for summary documents, idempotent on the document id.
#[async_trait]
pub trait SummarySink: Send + Sync {
    async fn upsert(&self, summary: &FlowSummary) -> Result<(), SinkError>;
}
