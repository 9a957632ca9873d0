//! Fixed event-time windows and the assigner that dispatches each flow to
//! every window its active interval touches.

use log::warn;

use crate::flowstream::flow::FlowDocument;
use crate::flowstream::observability::RateLimitedLog;

/// Half-open interval `[start, end)` on event time, aligned so that
/// `start % size == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Window {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl Window {
    pub fn of(start_ms: i64, size_ms: i64) -> Window {
        Window {
            start_ms,
            end_ms: start_ms + size_ms,
        }
    }

    /// The aligned window containing `timestamp_ms`.
    pub fn containing(timestamp_ms: i64, size_ms: i64) -> Window {
        Window::of(timestamp_ms.div_euclid(size_ms) * size_ms, size_ms)
    }
}

/// Emits one window per overlap with a flow's active interval
/// `[delta_switched, last_switched]`, guarding against assignments that
/// would drag event time too far behind the current input.
pub struct WindowAssigner {
    window_size_ms: i64,
    max_flow_duration_ms: i64,
    skew_log: RateLimitedLog,
}

impl WindowAssigner {
    pub fn new(window_size_ms: i64, max_flow_duration_ms: i64) -> Self {
        WindowAssigner {
            window_size_ms,
            max_flow_duration_ms,
            skew_log: RateLimitedLog::default(),
        }
    }

    /// Returns the windows the flow belongs to together with the number of
    /// assignments suppressed by the skew guard. A flow starting exactly on
    /// a boundary belongs only to the later window.
    pub fn assign(&self, flow: &FlowDocument, input_timestamp_ms: i64) -> (Vec<Window>, u64) {
        let flow_start = flow.delta_switched_or_first();
        let horizon = input_timestamp_ms - self.max_flow_duration_ms;

        let mut windows = Vec::new();
        let mut skew_dropped = 0;
        let mut start = flow_start.div_euclid(self.window_size_ms) * self.window_size_ms;
        while start <= flow.last_switched {
            if start <= horizon {
                skew_dropped += 1;
                if self.skew_log.should_log() {
                    warn!(
                        "skipping window assignment past allowed skew: flow [{}..{}], window start {}, input timestamp {}",
                        flow_start, flow.last_switched, start, input_timestamp_ms
                    );
                }
            } else {
                windows.push(Window::of(start, self.window_size_ms));
            }
            start += self.window_size_ms;
        }
        (windows, skew_dropped)
    }
}
