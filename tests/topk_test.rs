mod common;

use common::{base_flow, exporter};
use flowstream::flowstream::pipeline::bytes::BytesInOut;
use flowstream::flowstream::pipeline::keys::{CompoundKey, ExporterInterfaceKey, ExporterRef};
use flowstream::flowstream::pipeline::topk::TopKAccumulator;
use rand::seq::SliceRandom;
use rand::SeedableRng;

fn outer() -> ExporterInterfaceKey {
    let node = exporter();
    ExporterInterfaceKey {
        exporter: ExporterRef {
            foreign_source: node.foreign_source,
            foreign_id: node.foreign_id,
            node_id: node.node_id,
        },
        if_index: base_flow().input_snmp,
    }
}

fn app_key(application: &str) -> CompoundKey {
    CompoundKey::ExporterInterfaceApplication {
        outer: outer(),
        application: application.to_string(),
    }
}

#[test]
fn keeps_the_k_largest_with_lexicographic_tiebreak() {
    let entries = vec![
        (app_key("app-d"), BytesInOut::new(500, 0)),
        (app_key("app-c"), BytesInOut::new(300, 0)),
        (app_key("app-b"), BytesInOut::new(500, 0)),
        (app_key("app-e"), BytesInOut::new(200, 0)),
        (app_key("app-a"), BytesInOut::new(100, 0)),
    ];

    let mut accumulator = TopKAccumulator::new(2);
    for (key, bytes) in entries {
        accumulator.push(key, bytes);
    }

    let ranked = accumulator.into_ranked();
    assert_eq!(ranked.len(), 2);
    // Both 500-byte contributors win; the smaller encoded key ranks first.
    assert_eq!(ranked[0].key, app_key("app-b"));
    assert_eq!(ranked[1].key, app_key("app-d"));
}

#[test]
fn ingress_bytes_break_total_ties() {
    let mut accumulator = TopKAccumulator::new(1);
    accumulator.push(app_key("mostly-out"), BytesInOut::new(200, 300));
    accumulator.push(app_key("mostly-in"), BytesInOut::new(300, 200));

    let ranked = accumulator.into_ranked();
    assert_eq!(ranked[0].key, app_key("mostly-in"));
}

#[test]
fn selection_is_independent_of_arrival_order() {
    let mut entries: Vec<(CompoundKey, BytesInOut)> = (0..20)
        .map(|i| {
            (
                app_key(&format!("app-{:02}", i)),
                BytesInOut::new((i as u64 % 5) * 100, (i as u64 % 3) * 50),
            )
        })
        .collect();

    let mut reference: Option<Vec<(CompoundKey, BytesInOut)>> = None;
    let mut rng = rand::rngs::StdRng::seed_from_u64(11);
    for _ in 0..20 {
        entries.shuffle(&mut rng);
        let mut accumulator = TopKAccumulator::new(5);
        for (key, bytes) in &entries {
            accumulator.push(key.clone(), *bytes);
        }
        let ranked: Vec<(CompoundKey, BytesInOut)> = accumulator
            .into_ranked()
            .into_iter()
            .map(|e| (e.key, e.bytes))
            .collect();
        match &reference {
            Some(expected) => assert_eq!(&ranked, expected),
            None => reference = Some(ranked),
        }
    }
}

#[test]
fn fewer_entries_than_k_returns_them_all() {
    let mut accumulator = TopKAccumulator::new(10);
    accumulator.push(app_key("only"), BytesInOut::new(42, 0));
    let ranked = accumulator.into_ranked();
    assert_eq!(ranked.len(), 1);
}

#[test]
fn zero_k_selects_nothing() {
    let mut accumulator = TopKAccumulator::new(0);
    accumulator.push(app_key("ignored"), BytesInOut::new(42, 0));
    assert!(accumulator.into_ranked().is_empty());
}
