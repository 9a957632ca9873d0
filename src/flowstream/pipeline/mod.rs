//! The windowed aggregation pipeline.
//!
//! Flows enter through [`FlowAggregator::process`], which dispatches each
//! record to the windows it overlaps, allocates its bytes proportionally and
//! accumulates them under the four grouping dimensions. Watermark advances
//! and the late-pane clock turn accumulated state into [`FlowSummary`]
//! batches for the sinks.

pub mod bytes;
pub mod keys;
pub mod runner;
pub mod summary;
pub mod topk;
pub mod trigger;
pub mod watermark;
pub mod window;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::warn;
use tokio::time::Instant;

use crate::flowstream::config::AggregatorOptions;
use crate::flowstream::flow::FlowDocument;
use crate::flowstream::observability::{PipelineMetrics, RateLimitedLog};

use bytes::windowed_bytes;
use keys::{CompoundKey, ExporterInterfaceKey, GroupedBy};
use summary::{AggregationType, FlowSummary};
use topk::TopKAccumulator;
use trigger::{PaneFiring, PaneTiming, WindowTriggerEngine};
use window::WindowAssigner;

/// Windowed aggregation state machine: feed flows in, advance the watermark,
/// collect summaries out.
pub struct FlowAggregator {
    top_k: usize,
    assigner: WindowAssigner,
    engine: WindowTriggerEngine,
    metrics: Arc<PipelineMetrics>,
    malformed_log: RateLimitedLog,
    late_log: RateLimitedLog,
}

impl FlowAggregator {
    pub fn new(options: &AggregatorOptions, metrics: Arc<PipelineMetrics>) -> Self {
        FlowAggregator {
            top_k: options.top_k,
            assigner: WindowAssigner::new(options.fixed_window_size_ms, options.max_flow_duration_ms),
            engine: WindowTriggerEngine::new(
                options.allowed_lateness_ms,
                Duration::from_millis(options.late_processing_delay_ms.max(0) as u64),
            ),
            metrics,
            malformed_log: RateLimitedLog::default(),
            late_log: RateLimitedLog::default(),
        }
    }

    /// Feeds one flow record, stamped with its event time by the source.
    /// Malformed records are dropped here; everything downstream can assume
    /// a well-formed flow.
    pub fn process(&mut self, flow: &FlowDocument, event_time_ms: i64) {
        if flow.exporter.is_none() || flow.num_bytes < 0 || flow.duration_ms() < 0 {
            self.metrics.flows_malformed_dropped.inc();
            if self.malformed_log.should_log() {
                warn!(
                    "dropping malformed flow: exporter present: {}, bytes: {}, duration: {}ms",
                    flow.exporter.is_some(),
                    flow.num_bytes,
                    flow.duration_ms()
                );
            }
            return;
        }

        let (windows, skew_dropped) = self.assigner.assign(flow, event_time_ms);
        if skew_dropped > 0 {
            self.metrics.flows_skew_dropped.inc_by(skew_dropped);
        }

        // One key set per flow, shared across its windows.
        let mut flow_keys: Vec<CompoundKey> = Vec::with_capacity(5);
        flow_keys.extend(CompoundKey::by_exporter_interface(flow));
        flow_keys.extend(CompoundKey::by_exporter_interface_application(flow));
        flow_keys.extend(CompoundKey::by_exporter_interface_host(flow));
        flow_keys.extend(CompoundKey::by_exporter_interface_conversation(flow));

        let now = Instant::now();
        for window in windows {
            let Some(bytes) = windowed_bytes(&window, flow) else {
                continue;
            };
            self.metrics.flows_in_window.inc();
            for key in &flow_keys {
                if !self.engine.accumulate(window, key.clone(), bytes, now) {
                    self.metrics.flows_late_dropped.inc();
                    if self.late_log.should_log() {
                        warn!(
                            "dropping contribution past allowed lateness: window [{}..{}), watermark {:?}",
                            window.start_ms,
                            window.end_ms,
                            self.engine.watermark()
                        );
                    }
                }
            }
        }
    }

    /// Advances the watermark and returns the summaries of every pane that
    /// fired as a result.
    pub fn advance_watermark(&mut self, watermark_ms: i64) -> Vec<FlowSummary> {
        let firings = self.engine.advance_watermark(watermark_ms);
        self.summaries_of(firings)
    }

    /// Fires late panes whose coalescing delay has elapsed.
    pub fn fire_due_late_panes(&mut self, now: Instant) -> Vec<FlowSummary> {
        let firings = self.engine.fire_due_late_panes(now);
        self.summaries_of(firings)
    }

    /// Shutdown: flush everything the watermark has completed.
    pub fn drain(&mut self) -> Vec<FlowSummary> {
        let firings = self.engine.drain();
        self.summaries_of(firings)
    }

    pub fn watermark(&self) -> Option<i64> {
        self.engine.watermark()
    }

    fn summaries_of(&self, firings: Vec<PaneFiring>) -> Vec<FlowSummary> {
        let mut summaries = Vec::new();
        for firing in firings {
            match firing.timing {
                PaneTiming::OnTime => self.metrics.panes_on_time.inc(),
                PaneTiming::Late => self.metrics.panes_late.inc(),
            }
            summaries.extend(build_summaries(&firing, self.top_k));
        }
        summaries
    }
}

/// Projects one pane firing into its TOTAL and top-K summaries.
///
/// TOTAL summaries come straight from the `ExporterInterface` entries. The
/// remaining entries are re-keyed by their outer key and dimension, pushed
/// through a bounded top-K selection, and ranked 1-based in comparator
/// order.
pub fn build_summaries(firing: &PaneFiring, top_k: usize) -> Vec<FlowSummary> {
    let mut summaries = Vec::new();
    let mut groups: HashMap<(GroupedBy, ExporterInterfaceKey), TopKAccumulator> = HashMap::new();

    for (key, bytes) in &firing.entries {
        match key {
            CompoundKey::ExporterInterface(_) => {
                summaries.push(FlowSummary::of(
                    AggregationType::Total,
                    firing.window,
                    key,
                    *bytes,
                ));
            }
            _ => {
                groups
                    .entry((key.grouped_by(), key.outer_key()))
                    .or_insert_with(|| TopKAccumulator::new(top_k))
                    .push(key.clone(), *bytes);
            }
        }
    }

    for (_, accumulator) in groups {
        for (position, entry) in accumulator.into_ranked().into_iter().enumerate() {
            let mut summary = FlowSummary::of(
                AggregationType::Topk,
                firing.window,
                &entry.key,
                entry.bytes,
            );
            summary.ranking = position as i64 + 1;
            summaries.push(summary);
        }
    }

    summaries
}
