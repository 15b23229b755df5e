//! Open-addressed visited-state map, one instance per search direction
//! (spec §4.5).
//!
//! Keyed by `(tile_id, node_id)`, hashed with FNV-1a and folded to the
//! table size by modulus, probed linearly. A fixed probe budget bounds
//! worst-case lookup/insert cost so a pathological collision chain can't
//! stall the search; exhausting it is reported to the caller rather than
//! growing the table (see `SPEC_FULL.md` §10 on this tradeoff).

use valhalla_graphtile::GraphId;

/// Number of slots probed linearly before giving up.
const PROBE_BUDGET: usize = 2_000;

/// Default slot count: a prime near 2×10⁶, per spec's sizing target.
pub const DEFAULT_CAPACITY: usize = 2_000_003;

/// What's recorded for a visited state: the best `g` seen, and enough of
/// its predecessor to reconstruct a path. `predecessor = None` is the
/// "no predecessor" sentinel for a search root.
#[derive(Debug, Clone, Copy)]
pub struct VisitedEntry {
    pub g: f64,
    pub predecessor: Option<GraphId>,
    pub predecessor_edge: Option<GraphId>,
}

/// Returned when an insert can't find a free or matching slot within the
/// probe budget. Maps to `RouteError::AllocationFailure` at the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeBudgetExhausted;

fn fnv1a(tile_id: u64, node_id: u64) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;
    let mut hash = OFFSET_BASIS;
    for byte in tile_id.to_le_bytes().into_iter().chain(node_id.to_le_bytes()) {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// One direction's visited-state table.
pub struct VisitedMap {
    keys: Vec<Option<(u64, u64)>>,
    entries: Vec<Option<VisitedEntry>>,
    capacity: usize,
}

impl VisitedMap {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            keys: vec![None; capacity],
            entries: vec![None; capacity],
            capacity,
        }
    }

    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    fn key_of(state: GraphId) -> (u64, u64) {
        (state.tile_id(), state.index())
    }

    fn probe_start(&self, key: (u64, u64)) -> usize {
        #[expect(clippy::cast_possible_truncation)]
        let start = (fnv1a(key.0, key.1) % self.capacity as u64) as usize;
        start
    }

    /// Looks up the entry for `state`, if present.
    #[must_use]
    pub fn find(&self, state: GraphId) -> Option<&VisitedEntry> {
        let key = Self::key_of(state);
        let start = self.probe_start(key);
        let budget = PROBE_BUDGET.min(self.capacity);
        for offset in 0..budget {
            let idx = (start + offset) % self.capacity;
            match self.keys[idx] {
                Some(k) if k == key => return self.entries[idx].as_ref(),
                Some(_) => continue,
                None => return None,
            }
        }
        None
    }

    /// Inserts a fresh entry, or overwrites the existing one for the same
    /// key. The caller is responsible for the `new_g < existing.g`
    /// relaxation check before calling this (spec §4.5).
    ///
    /// # Errors
    ///
    /// Returns [`ProbeBudgetExhausted`] if no free or matching slot is
    /// found within the probe budget; the map is left unmodified.
    pub fn insert(
        &mut self,
        state: GraphId,
        g: f64,
        predecessor: Option<GraphId>,
        predecessor_edge: Option<GraphId>,
    ) -> Result<(), ProbeBudgetExhausted> {
        let key = Self::key_of(state);
        let start = self.probe_start(key);
        let budget = PROBE_BUDGET.min(self.capacity);
        let entry = VisitedEntry {
            g,
            predecessor,
            predecessor_edge,
        };
        for offset in 0..budget {
            let idx = (start + offset) % self.capacity;
            match self.keys[idx] {
                Some(k) if k == key => {
                    self.entries[idx] = Some(entry);
                    return Ok(());
                }
                None => {
                    self.keys[idx] = Some(key);
                    self.entries[idx] = Some(entry);
                    return Ok(());
                }
                Some(_) => continue,
            }
        }
        Err(ProbeBudgetExhausted)
    }
}

impl Default for VisitedMap {
    fn default() -> Self {
        Self::new()
    }
}
