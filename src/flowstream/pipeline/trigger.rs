//! Watermark-driven pane firing over per-window key state.
//!
//! The engine owns one accumulator map per open window. Panes fire in
//! accumulating mode: every firing re-emits the complete state of the
//! window, so downstream upserts replace the previous pane's output.
//!
//! Lifecycle of a window `[start, end)`:
//! - contributions accumulate while `watermark <= end + allowed_lateness`;
//! - when the watermark crosses `end`, an on-time pane fires;
//! - contributions arriving after that mark the window dirty and schedule a
//!   late pane after `late_processing_delay` of processing time, coalescing
//!   bursts of stragglers into one firing;
//! - once `watermark > end + allowed_lateness` the window's state is
//!   discarded; the advance that expires a window still delivers its
//!   crossing pane (and a pending late pane) first, and afterwards nothing
//!   fires for it again.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use tokio::time::Instant;

use super::bytes::BytesInOut;
use super::keys::CompoundKey;
use super::window::Window;

/// Whether a pane fired at the watermark or from late arrivals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneTiming {
    OnTime,
    Late,
}

/// One firing of one window: the full accumulated state at firing time.
#[derive(Debug, Clone)]
pub struct PaneFiring {
    pub window: Window,
    pub timing: PaneTiming,
    /// 0 for the on-time pane, incremented for each late re-firing.
    pub index: u64,
    pub entries: Vec<(CompoundKey, BytesInOut)>,
}

struct WindowState {
    window: Window,
    accumulator: HashMap<CompoundKey, BytesInOut>,
    fired_on_time: bool,
    panes_fired: u64,
    /// Processing-time deadline for the pending late pane, set by the first
    /// late arrival after the previous firing.
    late_fire_due: Option<Instant>,
}

impl WindowState {
    fn new(window: Window) -> Self {
        WindowState {
            window,
            accumulator: HashMap::new(),
            fired_on_time: false,
            panes_fired: 0,
            late_fire_due: None,
        }
    }

    fn fire(&mut self, timing: PaneTiming) -> PaneFiring {
        let firing = PaneFiring {
            window: self.window,
            timing,
            index: self.panes_fired,
            entries: self
                .accumulator
                .iter()
                .map(|(key, bytes)| (key.clone(), *bytes))
                .collect(),
        };
        self.panes_fired += 1;
        if timing == PaneTiming::OnTime {
            self.fired_on_time = true;
        }
        self.late_fire_due = None;
        firing
    }
}

/// Per-window accumulation and trigger state, keyed by window start.
pub struct WindowTriggerEngine {
    allowed_lateness_ms: i64,
    late_processing_delay: Duration,
    watermark_ms: Option<i64>,
    windows: BTreeMap<i64, WindowState>,
}

impl WindowTriggerEngine {
    pub fn new(allowed_lateness_ms: i64, late_processing_delay: Duration) -> Self {
        WindowTriggerEngine {
            allowed_lateness_ms,
            late_processing_delay,
            watermark_ms: None,
            windows: BTreeMap::new(),
        }
    }

    pub fn watermark(&self) -> Option<i64> {
        self.watermark_ms
    }

    /// Number of windows currently holding state.
    pub fn open_windows(&self) -> usize {
        self.windows.len()
    }

    /// Adds a contribution to `(window, key)`. Returns false when the window
    /// is already past allowed lateness and the contribution was dropped.
    pub fn accumulate(
        &mut self,
        window: Window,
        key: CompoundKey,
        bytes: BytesInOut,
        now: Instant,
    ) -> bool {
        if let Some(watermark) = self.watermark_ms {
            if watermark > window.end_ms + self.allowed_lateness_ms {
                return false;
            }
        }
        let state = self
            .windows
            .entry(window.start_ms)
            .or_insert_with(|| WindowState::new(window));
        let slot = state.accumulator.entry(key).or_default();
        *slot = BytesInOut::sum(*slot, bytes);
        if state.fired_on_time && state.late_fire_due.is_none() {
            state.late_fire_due = Some(now + self.late_processing_delay);
        }
        true
    }

    /// Advances the watermark (never backwards), firing an on-time pane for
    /// every window the watermark has crossed and evicting windows past
    /// allowed lateness. The crossing pane fires even when the same advance
    /// carries the watermark past the window's lateness bound, and a window
    /// evicted with a late pane still pending gets one final coalesced
    /// firing; only after that is its state discarded.
    pub fn advance_watermark(&mut self, watermark_ms: i64) -> Vec<PaneFiring> {
        let watermark = match self.watermark_ms {
            Some(current) => current.max(watermark_ms),
            None => watermark_ms,
        };
        self.watermark_ms = Some(watermark);

        let mut firings = Vec::new();
        for state in self.windows.values_mut() {
            if state.window.end_ms > watermark {
                // Windows are ordered by start; everything later is open too.
                break;
            }
            if !state.fired_on_time {
                firings.push(state.fire(PaneTiming::OnTime));
            } else if watermark > state.window.end_ms + self.allowed_lateness_ms
                && state.late_fire_due.is_some()
            {
                firings.push(state.fire(PaneTiming::Late));
            }
        }

        let lateness = self.allowed_lateness_ms;
        self.windows
            .retain(|_, state| watermark <= state.window.end_ms + lateness);
        firings
    }

    /// Fires every late pane whose coalescing delay has elapsed.
    pub fn fire_due_late_panes(&mut self, now: Instant) -> Vec<PaneFiring> {
        let mut firings = Vec::new();
        for state in self.windows.values_mut() {
            if let Some(due) = state.late_fire_due {
                if due <= now {
                    firings.push(state.fire(PaneTiming::Late));
                }
            }
        }
        firings
    }

    /// Shutdown path: fires pending late panes and the on-time panes of
    /// windows the watermark has completed, then clears all state. Windows
    /// the watermark never reached are discarded unfired; their data is
    /// re-read from the bus on restart.
    pub fn drain(&mut self) -> Vec<PaneFiring> {
        let watermark = self.watermark_ms;
        let mut firings = Vec::new();
        for state in self.windows.values_mut() {
            let complete = watermark.is_some_and(|wm| wm >= state.window.end_ms);
            if !state.fired_on_time {
                if complete {
                    firings.push(state.fire(PaneTiming::OnTime));
                }
            } else if state.late_fire_due.is_some() {
                firings.push(state.fire(PaneTiming::Late));
            }
        }
        self.windows.clear();
        firings
    }
}
