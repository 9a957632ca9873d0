//! Elasticsearch document sink.
//!
//! Summaries are written with `doc_as_upsert` partial updates keyed on the
//! summary's document id, into a time-suffixed index derived from the
//! document's `@timestamp`.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::warn;
use serde_json::json;

use crate::flowstream::config::AggregatorOptions;
use crate::flowstream::observability::PipelineMetrics;
use crate::flowstream::pipeline::summary::FlowSummary;

use super::{RetryPolicy, SinkError, SummarySink};

/// How index names roll over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStrategy {
    Daily,
    Hourly,
    Monthly,
}

impl IndexStrategy {
    /// Index for a document timestamp, e.g. `aggregated-flows-2020-04-14`
    /// for `Daily`. Suffixes are rendered in UTC.
    pub fn index_name(&self, base: &str, timestamp_ms: i64) -> String {
        let time =
            DateTime::<Utc>::from_timestamp_millis(timestamp_ms).unwrap_or(DateTime::UNIX_EPOCH);
        let suffix = match self {
            IndexStrategy::Monthly => time.format("%Y-%m"),
            IndexStrategy::Daily => time.format("%Y-%m-%d"),
            IndexStrategy::Hourly => time.format("%Y-%m-%d-%H"),
        };
        format!("{}-{}", base, suffix)
    }
}

impl FromStr for IndexStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DAILY" => Ok(IndexStrategy::Daily),
            "HOURLY" => Ok(IndexStrategy::Hourly),
            "MONTHLY" => Ok(IndexStrategy::Monthly),
            other => Err(format!(
                "unknown index strategy '{}', expected DAILY, HOURLY or MONTHLY",
                other
            )),
        }
    }
}

pub struct ElasticSink {
    client: reqwest::Client,
    base_url: String,
    index_base: String,
    strategy: IndexStrategy,
    username: Option<String>,
    password: Option<String>,
    retry: RetryPolicy,
    metrics: Arc<PipelineMetrics>,
}

impl ElasticSink {
    pub fn new(
        options: &AggregatorOptions,
        metrics: Arc<PipelineMetrics>,
    ) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| SinkError::permanent(format!("failed to build http client: {}", e)))?;

        Ok(ElasticSink {
            client,
            base_url: options.elastic_url.trim_end_matches('/').to_string(),
            index_base: options.elastic_flow_index.clone(),
            strategy: options.elastic_index_strategy,
            username: options.elastic_user.clone(),
            password: options.elastic_password.clone(),
            retry: RetryPolicy::default(),
            metrics,
        })
    }

    async fn attempt_upsert(
        &self,
        index: &str,
        id: &str,
        summary: &FlowSummary,
    ) -> Result<(), SinkError> {
        let url = format!("{}/{}/_update/{}", self.base_url, index, id);
        let body = json!({ "doc": summary, "doc_as_upsert": true });

        let mut request = self.client.post(&url).json(&body);
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_deref());
        }

        let response = request
            .send()
            .await
            .map_err(|e| SinkError::transient(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let detail = response.text().await.unwrap_or_default();
        if status.is_server_error() || status.as_u16() == 429 {
            Err(SinkError::transient(format!(
                "{} returned {}: {}",
                url, status, detail
            )))
        } else {
            // Auth and mapping problems are not going to fix themselves.
            Err(SinkError::permanent(format!(
                "{} returned {}: {}",
                url, status, detail
            )))
        }
    }
}

#[async_trait]
impl SummarySink for ElasticSink {
    async fn upsert(&self, summary: &FlowSummary) -> Result<(), SinkError> {
        let index = self.strategy.index_name(&self.index_base, summary.timestamp);
        let id = summary.document_id();

        let mut attempt = 0;
        loop {
            match self.attempt_upsert(&index, &id, summary).await {
                Ok(()) => return Ok(()),
                Err(error @ SinkError::Transient { .. })
                    if attempt + 1 < self.retry.max_attempts =>
                {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        "sink write for {} failed, retrying in {:?}: {}",
                        id, delay, error
                    );
                    self.metrics.sink_retries.inc();
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}
