//! Token-bucket gate for noisy per-record warnings.
//!
//! Drop-and-warn paths (malformed flows, skew violations, too-late records)
//! can trigger once per record. Each call site owns a `RateLimitedLog` and
//! only emits when `should_log()` returns true, bounding output to at most
//! `max_rate` messages per interval.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Allows at most `max_rate` log messages per `interval`, refilling
/// continuously rather than in discrete bursts.
#[derive(Debug)]
pub struct RateLimitedLog {
    max_tokens: f64,
    refill_per_sec: f64,
    bucket: Mutex<Bucket>,
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl RateLimitedLog {
    /// At most `max_rate` messages every `interval`.
    pub fn new(max_rate: u32, interval: Duration) -> Self {
        let max_tokens = f64::from(max_rate.max(1));
        let refill_per_sec = max_tokens / interval.as_secs_f64().max(f64::MIN_POSITIVE);
        RateLimitedLog {
            max_tokens,
            refill_per_sec,
            bucket: Mutex::new(Bucket {
                tokens: max_tokens,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Takes a token if one is available. The caller skips the log statement
    /// when this returns false.
    pub fn should_log(&self) -> bool {
        let mut bucket = match self.bucket.lock() {
            Ok(guard) => guard,
            // A poisoned bucket only ever gates logging, keep emitting.
            Err(poisoned) => poisoned.into_inner(),
        };
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.max_tokens);
        bucket.last_refill = now;
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

impl Default for RateLimitedLog {
    /// Matches the upstream collector's logging budget of five messages every
    /// ten seconds per call site.
    fn default() -> Self {
        RateLimitedLog::new(5, Duration::from_secs(10))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_burst_up_to_max_rate() {
        let limiter = RateLimitedLog::new(3, Duration::from_secs(60));
        assert!(limiter.should_log());
        assert!(limiter.should_log());
        assert!(limiter.should_log());
        assert!(!limiter.should_log());
    }

    #[test]
    fn refills_over_time() {
        let limiter = RateLimitedLog::new(1000, Duration::from_millis(10));
        for _ in 0..1000 {
            limiter.should_log();
        }
        std::thread::sleep(Duration::from_millis(20));
        assert!(limiter.should_log());
    }
}
