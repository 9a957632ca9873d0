//! Event-time watermarks derived from observed record timestamps.
//!
//! Each source partition gets a policy whose watermark trails the largest
//! event time seen on that partition by a fixed allowance for out-of-order
//! delivery. The pipeline's global watermark is the minimum across
//! partitions, so a slow partition holds every window open.

use std::collections::HashMap;

/// Per-partition policy: `watermark = max_seen_event_time - max_delay`.
/// Monotone because the maximum never decreases.
#[derive(Debug, Clone)]
pub struct LimitedDelayTimestampPolicy {
    max_delay_ms: i64,
    max_event_time_ms: Option<i64>,
}

impl LimitedDelayTimestampPolicy {
    pub fn new(max_delay_ms: i64) -> Self {
        LimitedDelayTimestampPolicy {
            max_delay_ms,
            max_event_time_ms: None,
        }
    }

    pub fn observe(&mut self, event_time_ms: i64) {
        self.max_event_time_ms = Some(match self.max_event_time_ms {
            Some(current) => current.max(event_time_ms),
            None => event_time_ms,
        });
    }

    /// `None` until the first record is observed.
    pub fn watermark(&self) -> Option<i64> {
        self.max_event_time_ms.map(|t| t - self.max_delay_ms)
    }
}

/// Tracks one policy per partition and combines them into the global
/// watermark.
#[derive(Debug)]
pub struct WatermarkTracker {
    max_delay_ms: i64,
    partitions: HashMap<i32, LimitedDelayTimestampPolicy>,
}

impl WatermarkTracker {
    pub fn new(max_delay_ms: i64) -> Self {
        WatermarkTracker {
            max_delay_ms,
            partitions: HashMap::new(),
        }
    }

    pub fn observe(&mut self, partition: i32, event_time_ms: i64) {
        self.partitions
            .entry(partition)
            .or_insert_with(|| LimitedDelayTimestampPolicy::new(self.max_delay_ms))
            .observe(event_time_ms);
    }

    /// Minimum watermark across all observed partitions, `None` before any
    /// record has been seen.
    pub fn watermark(&self) -> Option<i64> {
        self.partitions.values().filter_map(|p| p.watermark()).min()
    }
}
