//! Flat summary records emitted to the sinks.

use serde::{Deserialize, Serialize};

use super::bytes::BytesInOut;
use super::keys::{CompoundKey, GroupedBy};
use super::window::Window;

/// Whether a summary is a per-key total or a top-K ranking entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AggregationType {
    Total,
    Topk,
}

impl AggregationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationType::Total => "TOTAL",
            AggregationType::Topk => "TOPK",
        }
    }
}

/// Exporter identity as flattened into sink documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExporterNode {
    pub foreign_source: String,
    pub foreign_id: String,
    pub node_id: i64,
}

/// One aggregate for one window, flattened for the document sink. Field
/// names are part of the sink contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSummary {
    /// Same as `range_end`; the document's nominal time.
    #[serde(rename = "@timestamp")]
    pub timestamp: i64,
    #[serde(rename = "range_start")]
    pub range_start_ms: i64,
    #[serde(rename = "range_end")]
    pub range_end_ms: i64,
    /// 1-based position within the top-K list; 0 for totals.
    pub ranking: i64,
    pub grouped_by: GroupedBy,
    pub grouped_by_key: String,
    pub aggregation_type: AggregationType,
    pub bytes_ingress: u64,
    pub bytes_egress: u64,
    pub bytes_total: u64,
    pub exporter: ExporterNode,
    pub if_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_key: Option<String>,
}

impl FlowSummary {
    /// Projects one aggregated `(key, bytes)` pair into a summary, flattening
    /// the key's fields by shape. Rankings for top-K entries are assigned by
    /// the caller.
    pub fn of(
        aggregation_type: AggregationType,
        window: Window,
        key: &CompoundKey,
        bytes: BytesInOut,
    ) -> FlowSummary {
        let outer = key.outer_key();
        let mut summary = FlowSummary {
            timestamp: window.end_ms,
            range_start_ms: window.start_ms,
            range_end_ms: window.end_ms,
            ranking: 0,
            grouped_by: key.grouped_by(),
            grouped_by_key: key.grouped_by_key(),
            aggregation_type,
            bytes_ingress: bytes.bytes_in,
            bytes_egress: bytes.bytes_out,
            bytes_total: bytes.total(),
            exporter: ExporterNode {
                foreign_source: outer.exporter.foreign_source,
                foreign_id: outer.exporter.foreign_id,
                node_id: outer.exporter.node_id,
            },
            if_index: outer.if_index,
            application: None,
            host_address: None,
            conversation_key: None,
        };
        match key {
            CompoundKey::ExporterInterface(_) => {}
            CompoundKey::ExporterInterfaceApplication { application, .. } => {
                summary.application = Some(application.clone());
            }
            CompoundKey::ExporterInterfaceHost { host_address, .. } => {
                summary.host_address = Some(host_address.clone());
            }
            CompoundKey::ExporterInterfaceConversation { conversation, .. } => {
                summary.conversation_key = Some(conversation.encode());
            }
        }
        summary
    }

    /// Stable identity of this summary in the document sink. Re-firings of
    /// the same window produce the same id for the same (key, ranking), so
    /// late panes overwrite instead of duplicating.
    pub fn document_id(&self) -> String {
        format!(
            "{}_{}_{}_{}_{}",
            self.timestamp,
            self.grouped_by.as_str(),
            self.grouped_by_key,
            self.aggregation_type.as_str(),
            self.ranking
        )
    }
}
