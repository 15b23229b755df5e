//! Frontier priority queue: a binary min-heap keyed on `f`, one instance
//! per search direction (spec §4.4).
//!
//! `std::collections::BinaryHeap` is a max-heap, so entries are ordered
//! by `Reverse`-style comparison (lowest `f` pops first). Ties are broken
//! by insertion order via a monotonic sequence number, matching spec
//! §5's determinism requirement ("pops are by strictly increasing f with
//! ties broken by insertion order"). Stale entries (superseded by a
//! better `g` already recorded in the visited map) are detected and
//! skipped by the caller on pop, never decreased in place.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use valhalla_graphtile::GraphId;

/// One frontier entry: `f = g + h`, the accumulated cost `g`, the
/// accumulated physical distance (for statistics/termination math), the
/// state it reaches, and enough of its parent to reconstruct the path.
#[derive(Debug, Clone, Copy)]
pub struct FrontierEntry {
    pub f: f64,
    pub g: f64,
    pub dist_m: f64,
    pub state: GraphId,
    pub parent: Option<GraphId>,
    pub parent_edge: Option<GraphId>,
}

#[derive(Debug, Clone, Copy)]
struct HeapEntry {
    entry: FrontierEntry,
    seq: u64,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.entry.f == other.entry.f && self.seq == other.seq
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so `BinaryHeap::pop` returns the lowest `f`; ties go to
        // the earlier-inserted (lower `seq`) entry.
        other
            .entry
            .f
            .total_cmp(&self.entry.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// A single direction's search frontier.
#[derive(Debug, Default)]
pub struct FrontierQueue {
    heap: BinaryHeap<HeapEntry>,
    next_seq: u64,
}

impl FrontierQueue {
    #[must_use]
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Pushes an entry, stamping it with the next insertion sequence
    /// number for tie-breaking.
    pub fn push(&mut self, entry: FrontierEntry) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(HeapEntry { entry, seq });
    }

    /// Pops the minimum-`f` entry.
    pub fn pop(&mut self) -> Option<FrontierEntry> {
        self.heap.pop().map(|h| h.entry)
    }

    /// The `f` of the minimum entry, without removing it.
    #[must_use]
    pub fn peek_f(&self) -> Option<f64> {
        self.heap.peek().map(|h| h.entry.f)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }
}
