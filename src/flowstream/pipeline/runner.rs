//! The async driver loop: pull flows, aggregate, deliver summaries.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::{info, warn};
use tokio::time::Instant;

use crate::flowstream::config::AggregatorOptions;
use crate::flowstream::error::PipelineError;
use crate::flowstream::kafka::{FlowConsumer, SummaryProducer};
use crate::flowstream::observability::{PipelineMetrics, RateLimitedLog};
use crate::flowstream::sink::{ElasticSink, SummarySink};

use super::summary::FlowSummary;
use super::FlowAggregator;

/// How often pending late panes are checked for their coalescing deadline.
const LATE_PANE_TICK: Duration = Duration::from_secs(1);

/// Runs the pipeline until ctrl-c or an unrecoverable fault.
///
/// On shutdown the loop stops pulling, fires every pane the watermark has
/// completed, flushes the sinks and commits offsets, then returns `Ok`.
pub async fn run_pipeline(
    options: AggregatorOptions,
    metrics: Arc<PipelineMetrics>,
) -> Result<(), PipelineError> {
    let consumer = FlowConsumer::new(&options, Arc::clone(&metrics))?;
    consumer.subscribe()?;

    let elastic = ElasticSink::new(&options, Arc::clone(&metrics))?;
    let producer = match &options.flow_dest_topic {
        Some(topic) => Some(SummaryProducer::new(&options.bootstrap_servers, topic)?),
        None => None,
    };

    let mut aggregator = FlowAggregator::new(&options, Arc::clone(&metrics));
    let decode_log = RateLimitedLog::default();

    let mut late_tick = tokio::time::interval(LATE_PANE_TICK);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        "aggregating {} into {}ms windows (top {} per breakdown)",
        options.flow_source_topic, options.fixed_window_size_ms, options.top_k
    );

    loop {
        tokio::select! {
            polled = consumer.poll_flow() => {
                match polled {
                    Ok(sourced) => {
                        aggregator.process(&sourced.flow, sourced.event_time_ms);
                        if let Some(watermark) = consumer.watermark() {
                            let summaries = aggregator.advance_watermark(watermark);
                            deliver(&elastic, producer.as_ref(), &summaries, &metrics).await?;
                            commit_after_delivery(&consumer, &options, &summaries)?;
                        }
                    }
                    Err(error) if error.is_per_record() => {
                        if decode_log.should_log() {
                            warn!("skipping undecodable record: {}", error);
                        }
                    }
                    Err(error) => {
                        // Broker-level errors: the client reconnects on its
                        // own, the watermark simply stalls meanwhile.
                        warn!("source error, continuing: {}", error);
                    }
                }
            }
            _ = late_tick.tick() => {
                let mut summaries = aggregator.fire_due_late_panes(Instant::now());
                if let Some(watermark) = consumer.watermark() {
                    summaries.extend(aggregator.advance_watermark(watermark));
                }
                deliver(&elastic, producer.as_ref(), &summaries, &metrics).await?;
                commit_after_delivery(&consumer, &options, &summaries)?;
            }
            _ = &mut shutdown => {
                info!("shutdown requested, draining complete windows");
                let summaries = aggregator.drain();
                deliver(&elastic, producer.as_ref(), &summaries, &metrics).await?;
                if let Some(producer) = &producer {
                    if let Err(error) = producer.flush(Duration::from_secs(5)) {
                        warn!("failed to flush destination topic: {}", error);
                    }
                }
                if !options.auto_commit {
                    consumer.commit()?;
                }
                break;
            }
        }
    }

    info!("pipeline stopped");
    Ok(())
}

/// Writes a batch of summaries to the document sink and, when configured,
/// the destination topic. Sink errors here are already past the retry
/// policy, so they abort the pipeline.
pub async fn deliver(
    sink: &dyn SummarySink,
    producer: Option<&SummaryProducer>,
    summaries: &[FlowSummary],
    metrics: &PipelineMetrics,
) -> Result<(), PipelineError> {
    for summary in summaries {
        sink.upsert(summary).await?;
        if let Some(producer) = producer {
            producer.send_summary(summary)?;
        }
        metrics.flows_to_es.inc();
        metrics
            .to_es_drift_ms
            .observe((epoch_ms() - summary.timestamp).max(0) as f64);
    }
    Ok(())
}

fn commit_after_delivery(
    consumer: &FlowConsumer,
    options: &AggregatorOptions,
    summaries: &[FlowSummary],
) -> Result<(), PipelineError> {
    if !options.auto_commit && !summaries.is_empty() {
        consumer.commit()?;
    }
    Ok(())
}

fn epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
