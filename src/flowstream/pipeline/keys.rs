//! Compound grouping keys.
//!
//! Every aggregate is keyed by one of four key shapes, all sharing an
//! `(exporter, interface)` prefix. The prefix is the "outer" key: the top-K
//! operator partitions by it while the full compound key identifies the
//! individual contributor (application, host or conversation).

use serde::{Deserialize, Serialize};

use crate::flowstream::flow::{Direction, FlowDocument};

/// Tag naming a key shape in sink documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupedBy {
    ExporterInterface,
    ExporterInterfaceApplication,
    ExporterInterfaceHost,
    ExporterInterfaceConversation,
}

impl GroupedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupedBy::ExporterInterface => "EXPORTER_INTERFACE",
            GroupedBy::ExporterInterfaceApplication => "EXPORTER_INTERFACE_APPLICATION",
            GroupedBy::ExporterInterfaceHost => "EXPORTER_INTERFACE_HOST",
            GroupedBy::ExporterInterfaceConversation => "EXPORTER_INTERFACE_CONVERSATION",
        }
    }
}

/// Reference to the exporting device, as carried inside keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExporterRef {
    pub foreign_source: String,
    pub foreign_id: String,
    pub node_id: i64,
}

/// The `(exporter, interface)` prefix shared by all key shapes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExporterInterfaceKey {
    pub exporter: ExporterRef,
    pub if_index: u32,
}

impl ExporterInterfaceKey {
    /// Builds the outer key for a flow, or `None` when the record carries no
    /// exporter identity. The interface is the one the traffic crossed on the
    /// exporting device: ingress flows are attributed to the input interface,
    /// egress flows to the output interface.
    pub fn from_flow(flow: &FlowDocument) -> Option<Self> {
        let node = flow.exporter.as_ref()?;
        let if_index = match flow.direction() {
            Direction::Ingress => flow.input_snmp,
            Direction::Egress => flow.output_snmp,
        };
        Some(ExporterInterfaceKey {
            exporter: ExporterRef {
                foreign_source: node.foreign_source.clone(),
                foreign_id: node.foreign_id.clone(),
                node_id: node.node_id,
            },
            if_index,
        })
    }

    fn encode(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.exporter.foreign_source, self.exporter.foreign_id, self.exporter.node_id, self.if_index
        )
    }
}

/// Canonicalised bidirectional 5-tuple. The two endpoints are ordered
/// lexicographically by address (port breaks the tie) so that both directions
/// of a conversation produce the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConversationKey {
    pub protocol: u32,
    pub smaller_address: String,
    pub larger_address: String,
    pub smaller_port: u32,
    pub larger_port: u32,
    pub application: String,
}

impl ConversationKey {
    pub fn from_flow(flow: &FlowDocument) -> Self {
        let src = (flow.src_address.as_str(), flow.src_port);
        let dst = (flow.dst_address.as_str(), flow.dst_port);
        let (smaller, larger) = if src <= dst { (src, dst) } else { (dst, src) };
        ConversationKey {
            protocol: flow.protocol,
            smaller_address: smaller.0.to_string(),
            larger_address: larger.0.to_string(),
            smaller_port: smaller.1,
            larger_port: larger.1,
            application: flow.application_or_unknown().to_string(),
        }
    }

    pub fn encode(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}:{}",
            self.protocol,
            self.smaller_address,
            self.smaller_port,
            self.larger_address,
            self.larger_port,
            self.application
        )
    }
}

/// One of the four key shapes an aggregate can be grouped under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CompoundKey {
    ExporterInterface(ExporterInterfaceKey),
    ExporterInterfaceApplication {
        outer: ExporterInterfaceKey,
        application: String,
    },
    ExporterInterfaceHost {
        outer: ExporterInterfaceKey,
        host_address: String,
    },
    ExporterInterfaceConversation {
        outer: ExporterInterfaceKey,
        conversation: ConversationKey,
    },
}

impl CompoundKey {
    /// Key for the TOTAL branch.
    pub fn by_exporter_interface(flow: &FlowDocument) -> Option<CompoundKey> {
        ExporterInterfaceKey::from_flow(flow).map(CompoundKey::ExporterInterface)
    }

    /// Key for the per-application breakdown.
    pub fn by_exporter_interface_application(flow: &FlowDocument) -> Option<CompoundKey> {
        let outer = ExporterInterfaceKey::from_flow(flow)?;
        Some(CompoundKey::ExporterInterfaceApplication {
            outer,
            application: flow.application_or_unknown().to_string(),
        })
    }

    /// Keys for the per-host breakdown. A flow is visible under both of its
    /// endpoints, so it contributes one key per distinct address.
    pub fn by_exporter_interface_host(flow: &FlowDocument) -> Vec<CompoundKey> {
        let Some(outer) = ExporterInterfaceKey::from_flow(flow) else {
            return Vec::new();
        };
        let mut keys = vec![CompoundKey::ExporterInterfaceHost {
            outer: outer.clone(),
            host_address: flow.src_address.clone(),
        }];
        if flow.dst_address != flow.src_address {
            keys.push(CompoundKey::ExporterInterfaceHost {
                outer,
                host_address: flow.dst_address.clone(),
            });
        }
        keys
    }

    /// Key for the per-conversation breakdown.
    pub fn by_exporter_interface_conversation(flow: &FlowDocument) -> Option<CompoundKey> {
        let outer = ExporterInterfaceKey::from_flow(flow)?;
        Some(CompoundKey::ExporterInterfaceConversation {
            outer,
            conversation: ConversationKey::from_flow(flow),
        })
    }

    /// The `(exporter, interface)` projection this key belongs to.
    pub fn outer_key(&self) -> ExporterInterfaceKey {
        match self {
            CompoundKey::ExporterInterface(outer) => outer.clone(),
            CompoundKey::ExporterInterfaceApplication { outer, .. } => outer.clone(),
            CompoundKey::ExporterInterfaceHost { outer, .. } => outer.clone(),
            CompoundKey::ExporterInterfaceConversation { outer, .. } => outer.clone(),
        }
    }

    pub fn grouped_by(&self) -> GroupedBy {
        match self {
            CompoundKey::ExporterInterface(_) => GroupedBy::ExporterInterface,
            CompoundKey::ExporterInterfaceApplication { .. } => {
                GroupedBy::ExporterInterfaceApplication
            }
            CompoundKey::ExporterInterfaceHost { .. } => GroupedBy::ExporterInterfaceHost,
            CompoundKey::ExporterInterfaceConversation { .. } => {
                GroupedBy::ExporterInterfaceConversation
            }
        }
    }

    /// Deterministic string encoding of the key's fields, used for sink
    /// document identities. Only ever compared, never parsed.
    pub fn grouped_by_key(&self) -> String {
        match self {
            CompoundKey::ExporterInterface(outer) => outer.encode(),
            CompoundKey::ExporterInterfaceApplication { outer, application } => {
                format!("{}:{}", outer.encode(), application)
            }
            CompoundKey::ExporterInterfaceHost { outer, host_address } => {
                format!("{}:{}", outer.encode(), host_address)
            }
            CompoundKey::ExporterInterfaceConversation { outer, conversation } => {
                format!("{}:{}", outer.encode(), conversation.encode())
            }
        }
    }
}
