//! In-memory model of a network flow record.
//!
//! A `FlowDocument` is the already-decoded form of a single NetFlow/IPFIX
//! style record as it travels over the bus: one unidirectional stream of
//! packets sharing a 5-tuple, with byte counts and switching timestamps.
//! Records are immutable once ingested.

/// Name substituted when a flow carries no application classification.
pub const UNKNOWN_APPLICATION: &str = "__unknown__";

/// Direction of a flow relative to the interface that exported it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ::prost::Enumeration)]
#[repr(i32)]
pub enum Direction {
    Ingress = 0,
    Egress = 1,
}

/// Identity of the device that exported the flow.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NodeInfo {
    #[prost(string, tag = "1")]
    pub foreign_source: String,
    #[prost(string, tag = "2")]
    pub foreign_id: String,
    #[prost(int64, tag = "3")]
    pub node_id: i64,
    #[prost(string, tag = "4")]
    pub location: String,
    #[prost(string, repeated, tag = "5")]
    pub categories: Vec<String>,
}

/// A single flow record. Timestamps are absolute epoch milliseconds; the
/// flow's active interval is `[delta_switched, last_switched]`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FlowDocument {
    #[prost(message, optional, tag = "1")]
    pub exporter: Option<NodeInfo>,
    /// Ingress interface index; 0 means unknown.
    #[prost(uint32, tag = "2")]
    pub input_snmp: u32,
    /// Egress interface index; 0 means unknown.
    #[prost(uint32, tag = "3")]
    pub output_snmp: u32,
    #[prost(string, tag = "4")]
    pub src_address: String,
    #[prost(string, tag = "5")]
    pub dst_address: String,
    #[prost(uint32, tag = "6")]
    pub src_port: u32,
    #[prost(uint32, tag = "7")]
    pub dst_port: u32,
    #[prost(uint32, tag = "8")]
    pub protocol: u32,
    #[prost(string, tag = "9")]
    pub application: String,
    #[prost(int64, tag = "10")]
    pub num_bytes: i64,
    #[prost(int64, tag = "11")]
    pub first_switched: i64,
    /// Should always be populated by exporters, but is occasionally missing;
    /// ingest defaults it to `first_switched`.
    #[prost(int64, optional, tag = "12")]
    pub delta_switched: Option<i64>,
    #[prost(int64, tag = "13")]
    pub last_switched: i64,
    #[prost(enumeration = "Direction", tag = "14")]
    pub direction: i32,
}

impl FlowDocument {
    /// Start of the active interval, falling back to `first_switched` when
    /// `delta_switched` was never populated.
    pub fn delta_switched_or_first(&self) -> i64 {
        self.delta_switched.unwrap_or(self.first_switched)
    }

    /// Length of the active interval in milliseconds. Negative values signal
    /// a malformed record.
    pub fn duration_ms(&self) -> i64 {
        self.last_switched - self.delta_switched_or_first()
    }

    /// Application label with the unknown placeholder applied.
    pub fn application_or_unknown(&self) -> &str {
        if self.application.is_empty() {
            UNKNOWN_APPLICATION
        } else {
            &self.application
        }
    }
}
