mod common;

use std::time::Duration;

use common::base_flow;
use flowstream::flowstream::pipeline::bytes::BytesInOut;
use flowstream::flowstream::pipeline::keys::CompoundKey;
use flowstream::flowstream::pipeline::trigger::{PaneTiming, WindowTriggerEngine};
use flowstream::flowstream::pipeline::window::Window;
use tokio::time::Instant;

const W: i64 = 60_000;
const LATENESS: i64 = 14_400_000;
const LATE_DELAY: Duration = Duration::from_secs(60);

fn engine() -> WindowTriggerEngine {
    WindowTriggerEngine::new(LATENESS, LATE_DELAY)
}

fn total_key() -> CompoundKey {
    CompoundKey::by_exporter_interface(&base_flow()).unwrap()
}

#[test]
fn fires_on_time_when_watermark_crosses_window_end() {
    let mut engine = engine();
    let window = Window::of(0, W);
    let now = Instant::now();

    assert!(engine.accumulate(window, total_key(), BytesInOut::new(100, 0), now));
    assert!(engine.advance_watermark(59_999).is_empty());

    let firings = engine.advance_watermark(60_000);
    assert_eq!(firings.len(), 1);
    assert_eq!(firings[0].timing, PaneTiming::OnTime);
    assert_eq!(firings[0].window, window);
    assert_eq!(firings[0].entries, vec![(total_key(), BytesInOut::new(100, 0))]);
}

#[test]
fn each_window_fires_on_time_exactly_once() {
    let mut engine = engine();
    let now = Instant::now();
    engine.accumulate(Window::of(0, W), total_key(), BytesInOut::new(1, 0), now);

    assert_eq!(engine.advance_watermark(60_000).len(), 1);
    assert!(engine.advance_watermark(60_000).is_empty());
    assert!(engine.advance_watermark(90_000).is_empty());
}

#[test]
fn watermark_never_regresses() {
    let mut engine = engine();
    engine.advance_watermark(100_000);
    engine.advance_watermark(50_000);
    assert_eq!(engine.watermark(), Some(100_000));
}

#[test]
fn late_arrivals_refire_with_accumulated_state() {
    let mut engine = engine();
    let window = Window::of(0, W);
    let start = Instant::now();

    engine.accumulate(window, total_key(), BytesInOut::new(100, 0), start);
    engine.advance_watermark(60_000);

    // A straggler within allowed lateness schedules a coalesced late pane.
    assert!(engine.accumulate(window, total_key(), BytesInOut::new(0, 50), start));
    assert!(engine.fire_due_late_panes(start + LATE_DELAY - Duration::from_millis(1)).is_empty());

    let firings = engine.fire_due_late_panes(start + LATE_DELAY);
    assert_eq!(firings.len(), 1);
    assert_eq!(firings[0].timing, PaneTiming::Late);
    // Accumulating mode: the late pane re-emits everything seen so far.
    assert_eq!(firings[0].entries, vec![(total_key(), BytesInOut::new(100, 50))]);
    assert!(firings[0].index > 0);
}

#[test]
fn late_bursts_coalesce_into_one_pane() {
    let mut engine = engine();
    let window = Window::of(0, W);
    let start = Instant::now();

    engine.accumulate(window, total_key(), BytesInOut::new(10, 0), start);
    engine.advance_watermark(60_000);

    engine.accumulate(window, total_key(), BytesInOut::new(10, 0), start);
    engine.accumulate(
        window,
        total_key(),
        BytesInOut::new(10, 0),
        start + Duration::from_secs(30),
    );

    // The deadline comes from the first late arrival, not the last.
    let firings = engine.fire_due_late_panes(start + LATE_DELAY);
    assert_eq!(firings.len(), 1);
    assert_eq!(firings[0].entries, vec![(total_key(), BytesInOut::new(30, 0))]);
    assert!(engine.fire_due_late_panes(start + 2 * LATE_DELAY).is_empty());
}

#[test]
fn contributions_past_allowed_lateness_are_dropped() {
    let mut engine = engine();
    let window = Window::of(0, W);
    let now = Instant::now();

    engine.accumulate(window, total_key(), BytesInOut::new(100, 0), now);
    engine.advance_watermark(60_000);
    engine.advance_watermark(W + LATENESS + 1);

    assert!(!engine.accumulate(window, total_key(), BytesInOut::new(1, 0), now));
    assert!(engine.fire_due_late_panes(now + 10 * LATE_DELAY).is_empty());
    assert_eq!(engine.open_windows(), 0);
}

#[test]
fn watermark_jump_past_lateness_still_fires_the_crossing_pane() {
    let mut engine = engine();
    let window = Window::of(0, W);
    let now = Instant::now();

    engine.accumulate(window, total_key(), BytesInOut::new(100, 0), now);
    // The watermark jumps straight past end + allowed lateness in one
    // advance: the on-time pane still fires before the state is evicted.
    let firings = engine.advance_watermark(W + LATENESS + 1);
    assert_eq!(firings.len(), 1);
    assert_eq!(firings[0].timing, PaneTiming::OnTime);
    assert_eq!(firings[0].entries, vec![(total_key(), BytesInOut::new(100, 0))]);
    assert_eq!(engine.open_windows(), 0);

    // After the eviction nothing fires for the window again.
    assert!(!engine.accumulate(window, total_key(), BytesInOut::new(1, 0), now));
    assert!(engine.fire_due_late_panes(now + 10 * LATE_DELAY).is_empty());
}

#[test]
fn eviction_flushes_a_pending_late_pane() {
    let mut engine = engine();
    let window = Window::of(0, W);
    let now = Instant::now();

    engine.accumulate(window, total_key(), BytesInOut::new(100, 0), now);
    engine.advance_watermark(60_000);
    // A straggler schedules a late pane, but the watermark expires the
    // window before the coalescing delay elapses.
    engine.accumulate(window, total_key(), BytesInOut::new(0, 50), now);

    let firings = engine.advance_watermark(W + LATENESS + 1);
    assert_eq!(firings.len(), 1);
    assert_eq!(firings[0].timing, PaneTiming::Late);
    assert_eq!(firings[0].entries, vec![(total_key(), BytesInOut::new(100, 50))]);
    assert_eq!(engine.open_windows(), 0);
}

#[test]
fn drain_flushes_complete_windows_and_pending_late_panes() {
    let mut engine = engine();
    let now = Instant::now();

    // Complete but unfired window state is flushed on drain.
    engine.accumulate(Window::of(0, W), total_key(), BytesInOut::new(5, 0), now);
    engine.advance_watermark(60_000);
    engine.accumulate(Window::of(0, W), total_key(), BytesInOut::new(5, 0), now);

    // This window is still ahead of the watermark and is discarded.
    engine.accumulate(Window::of(120_000, W), total_key(), BytesInOut::new(9, 0), now);

    let firings = engine.drain();
    assert_eq!(firings.len(), 1);
    assert_eq!(firings[0].window, Window::of(0, W));
    assert_eq!(firings[0].timing, PaneTiming::Late);
    assert_eq!(firings[0].entries, vec![(total_key(), BytesInOut::new(10, 0))]);
    assert_eq!(engine.open_windows(), 0);
}

#[test]
fn windows_accumulate_independently() {
    let mut engine = engine();
    let now = Instant::now();
    engine.accumulate(Window::of(0, W), total_key(), BytesInOut::new(1, 0), now);
    engine.accumulate(Window::of(60_000, W), total_key(), BytesInOut::new(2, 0), now);

    let firings = engine.advance_watermark(120_000);
    assert_eq!(firings.len(), 2);
    assert_eq!(firings[0].entries[0].1, BytesInOut::new(1, 0));
    assert_eq!(firings[1].entries[0].1, BytesInOut::new(2, 0));
}
