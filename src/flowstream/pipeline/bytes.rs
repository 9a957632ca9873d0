//! Byte accounting: the in/out counter pair and the proportional allocator
//! that splits a flow's bytes across the windows it spans.

use crate::flowstream::flow::{Direction, FlowDocument};

use super::window::Window;

/// Directional byte counters. Forms a commutative monoid under
/// component-wise addition with `BytesInOut::default()` as identity, so
/// partial sums can be combined in any order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BytesInOut {
    pub bytes_in: u64,
    pub bytes_out: u64,
}

impl BytesInOut {
    pub fn new(bytes_in: u64, bytes_out: u64) -> Self {
        BytesInOut { bytes_in, bytes_out }
    }

    pub fn sum(left: BytesInOut, right: BytesInOut) -> BytesInOut {
        BytesInOut {
            bytes_in: left.bytes_in + right.bytes_in,
            bytes_out: left.bytes_out + right.bytes_out,
        }
    }

    pub fn total(&self) -> u64 {
        self.bytes_in + self.bytes_out
    }

    /// Derives counters from a flow, scaled by `multiplier` in `[0, 1]` and
    /// rounded down. A single flow only ever counts in one direction.
    pub fn from_flow_scaled(flow: &FlowDocument, multiplier: f64) -> BytesInOut {
        let bytes = (flow.num_bytes.max(0) as f64 * multiplier) as u64;
        match flow.direction() {
            Direction::Ingress => BytesInOut::new(bytes, 0),
            Direction::Egress => BytesInOut::new(0, bytes),
        }
    }

    pub fn from_flow(flow: &FlowDocument) -> BytesInOut {
        BytesInOut::from_flow_scaled(flow, 1.0)
    }
}

/// Computes a flow's byte contribution to one window, proportional to the
/// overlap between the window and the flow's active interval.
///
/// Returns `None` when the flow contributes nothing to this window: negative
/// duration (malformed), a zero-duration flow outside the window, or no
/// overlap at all.
pub fn windowed_bytes(window: &Window, flow: &FlowDocument) -> Option<BytesInOut> {
    let delta = flow.delta_switched_or_first();
    let duration_ms = flow.last_switched - delta;

    if duration_ms < 0 {
        return None;
    }

    if duration_ms == 0 {
        // Instantaneous flow: all-or-nothing on containment.
        if delta >= window.start_ms && flow.last_switched <= window.end_ms {
            return Some(BytesInOut::from_flow(flow));
        }
        return None;
    }

    let overlap_ms = flow.last_switched.min(window.end_ms) - delta.max(window.start_ms);
    if overlap_ms <= 0 {
        return None;
    }

    let multiplier = overlap_ms as f64 / duration_ms as f64;
    Some(BytesInOut::from_flow_scaled(flow, multiplier))
}
