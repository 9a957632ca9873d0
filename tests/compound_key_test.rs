mod common;

use common::base_flow;
use flowstream::flowstream::flow::Direction;
use flowstream::flowstream::pipeline::keys::{CompoundKey, GroupedBy};

#[test]
fn reverse_conversations_share_a_key() {
    let forward = base_flow();

    let mut reverse = base_flow();
    reverse.src_address = forward.dst_address.clone();
    reverse.dst_address = forward.src_address.clone();
    reverse.src_port = forward.dst_port;
    reverse.dst_port = forward.src_port;
    // The reverse leg is egress on the same interface.
    reverse.direction = Direction::Egress as i32;
    reverse.output_snmp = forward.input_snmp;

    let a = CompoundKey::by_exporter_interface_conversation(&forward).unwrap();
    let b = CompoundKey::by_exporter_interface_conversation(&reverse).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.grouped_by_key(), b.grouped_by_key());
}

#[test]
fn equal_addresses_order_endpoints_by_port() {
    let mut flow = base_flow();
    flow.src_address = "10.0.0.1".to_string();
    flow.dst_address = "10.0.0.1".to_string();
    flow.src_port = 9_000;
    flow.dst_port = 80;

    let mut reverse = flow.clone();
    reverse.src_port = 80;
    reverse.dst_port = 9_000;

    assert_eq!(
        CompoundKey::by_exporter_interface_conversation(&flow),
        CompoundKey::by_exporter_interface_conversation(&reverse)
    );
}

#[test]
fn all_variants_project_to_the_same_outer_key() {
    let flow = base_flow();
    let total = CompoundKey::by_exporter_interface(&flow).unwrap();
    let app = CompoundKey::by_exporter_interface_application(&flow).unwrap();
    let conversation = CompoundKey::by_exporter_interface_conversation(&flow).unwrap();

    assert_eq!(total.outer_key(), app.outer_key());
    assert_eq!(total.outer_key(), conversation.outer_key());
    for host in CompoundKey::by_exporter_interface_host(&flow) {
        assert_eq!(total.outer_key(), host.outer_key());
    }
}

#[test]
fn host_breakdown_covers_both_endpoints() {
    let flow = base_flow();
    let keys = CompoundKey::by_exporter_interface_host(&flow);
    assert_eq!(keys.len(), 2);
    let addresses: Vec<String> = keys
        .iter()
        .map(|k| match k {
            CompoundKey::ExporterInterfaceHost { host_address, .. } => host_address.clone(),
            other => panic!("unexpected key shape: {:?}", other),
        })
        .collect();
    assert_eq!(addresses, vec!["10.0.0.1".to_string(), "10.0.0.2".to_string()]);

    let mut loopback = base_flow();
    loopback.dst_address = loopback.src_address.clone();
    assert_eq!(CompoundKey::by_exporter_interface_host(&loopback).len(), 1);
}

#[test]
fn interface_follows_flow_direction() {
    let ingress = base_flow();
    let mut egress = base_flow();
    egress.direction = Direction::Egress as i32;

    assert_eq!(
        CompoundKey::by_exporter_interface(&ingress).unwrap().outer_key().if_index,
        ingress.input_snmp
    );
    assert_eq!(
        CompoundKey::by_exporter_interface(&egress).unwrap().outer_key().if_index,
        egress.output_snmp
    );
}

#[test]
fn empty_application_maps_to_the_unknown_bucket() {
    let mut flow = base_flow();
    flow.application = String::new();
    let key = CompoundKey::by_exporter_interface_application(&flow).unwrap();
    match &key {
        CompoundKey::ExporterInterfaceApplication { application, .. } => {
            assert_eq!(application, "__unknown__");
        }
        other => panic!("unexpected key shape: {:?}", other),
    }
    assert!(key.grouped_by_key().ends_with(":__unknown__"));
}

#[test]
fn flows_without_exporter_produce_no_keys() {
    let mut flow = base_flow();
    flow.exporter = None;
    assert!(CompoundKey::by_exporter_interface(&flow).is_none());
    assert!(CompoundKey::by_exporter_interface_application(&flow).is_none());
    assert!(CompoundKey::by_exporter_interface_host(&flow).is_empty());
    assert!(CompoundKey::by_exporter_interface_conversation(&flow).is_none());
}

#[test]
fn grouped_by_tags_name_the_variant() {
    let flow = base_flow();
    assert_eq!(
        CompoundKey::by_exporter_interface(&flow).unwrap().grouped_by(),
        GroupedBy::ExporterInterface
    );
    assert_eq!(GroupedBy::ExporterInterface.as_str(), "EXPORTER_INTERFACE");
    assert_eq!(
        GroupedBy::ExporterInterfaceConversation.as_str(),
        "EXPORTER_INTERFACE_CONVERSATION"
    );
}

#[test]
fn encoded_keys_are_deterministic_and_distinct() {
    let flow = base_flow();
    let total = CompoundKey::by_exporter_interface(&flow).unwrap();
    assert_eq!(total.grouped_by_key(), "SomeFs:SomeFid:99:1");

    let mut encodings: Vec<String> = Vec::new();
    encodings.push(total.grouped_by_key());
    encodings.push(
        CompoundKey::by_exporter_interface_application(&flow)
            .unwrap()
            .grouped_by_key(),
    );
    encodings.extend(
        CompoundKey::by_exporter_interface_host(&flow)
            .iter()
            .map(|k| k.grouped_by_key()),
    );
    encodings.push(
        CompoundKey::by_exporter_interface_conversation(&flow)
            .unwrap()
            .grouped_by_key(),
    );
    let mut deduped = encodings.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), encodings.len());
}
