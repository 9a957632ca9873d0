#![allow(dead_code)]

use flowstream::flowstream::flow::{Direction, FlowDocument, NodeInfo};

pub fn exporter() -> NodeInfo {
    NodeInfo {
        foreign_source: "SomeFs".to_string(),
        foreign_id: "SomeFid".to_string(),
        node_id: 99,
        location: "Default".to_string(),
        categories: vec!["Routers".to_string()],
    }
}

/// A well-formed ingress flow; tests override the fields they care about.
pub fn base_flow() -> FlowDocument {
    FlowDocument {
        exporter: Some(exporter()),
        input_snmp: 1,
        output_snmp: 2,
        src_address: "10.0.0.1".to_string(),
        dst_address: "10.0.0.2".to_string(),
        src_port: 1000,
        dst_port: 80,
        protocol: 6,
        application: "http".to_string(),
        num_bytes: 100,
        first_switched: 0,
        delta_switched: Some(0),
        last_switched: 0,
        direction: Direction::Ingress as i32,
    }
}

/// Flow active over `[delta, last]` carrying `num_bytes`.
pub fn flow_between(delta: i64, last: i64, num_bytes: i64) -> FlowDocument {
    FlowDocument {
        num_bytes,
        first_switched: delta,
        delta_switched: Some(delta),
        last_switched: last,
        ..base_flow()
    }
}
