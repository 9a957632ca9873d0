//! Bounded top-K selection per `(window, outer key)` group.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use super::bytes::BytesInOut;
use super::keys::CompoundKey;

/// A contributor competing for a top-K slot.
///
/// The ranking order is total bytes descending, then ingress bytes
/// descending, then the encoded key ascending. The encoded-key leg makes the
/// order total, so the selected set and its ordering do not depend on
/// arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    pub key: CompoundKey,
    pub bytes: BytesInOut,
    encoded_key: String,
}

impl RankedEntry {
    pub fn new(key: CompoundKey, bytes: BytesInOut) -> Self {
        let encoded_key = key.grouped_by_key();
        RankedEntry {
            key,
            bytes,
            encoded_key,
        }
    }
}

impl Ord for RankedEntry {
    /// `Greater` means "ranks earlier".
    fn cmp(&self, other: &Self) -> Ordering {
        self.bytes
            .total()
            .cmp(&other.bytes.total())
            .then_with(|| self.bytes.bytes_in.cmp(&other.bytes.bytes_in))
            .then_with(|| other.encoded_key.cmp(&self.encoded_key))
    }
}

impl PartialOrd for RankedEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Keeps the K best-ranked entries using a size-bounded min-heap: when a new
/// entry pushes the heap over K, the worst-ranked entry is discarded.
pub struct TopKAccumulator {
    k: usize,
    heap: BinaryHeap<Reverse<RankedEntry>>,
}

impl TopKAccumulator {
    pub fn new(k: usize) -> Self {
        TopKAccumulator {
            k,
            heap: BinaryHeap::with_capacity(k + 1),
        }
    }

    pub fn push(&mut self, key: CompoundKey, bytes: BytesInOut) {
        if self.k == 0 {
            return;
        }
        self.heap.push(Reverse(RankedEntry::new(key, bytes)));
        if self.heap.len() > self.k {
            self.heap.pop();
        }
    }

    /// The selected entries, best-ranked first.
    pub fn into_ranked(self) -> Vec<RankedEntry> {
        let mut entries: Vec<RankedEntry> = self.heap.into_iter().map(|r| r.0).collect();
        entries.sort_by(|a, b| b.cmp(a));
        entries
    }
}
