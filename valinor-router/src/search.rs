//! Bidirectional A* search driver (spec §4.6): two synchronized
//! best-first searches from the origin and destination, meeting in the
//! middle, with path reconstruction and statistics.

use geo::Coord;
use tracing::{debug, info, trace};

use valhalla_graphtile::GraphId;
use valhalla_graphtile::spatial::haversine_distance_meters;
use valhalla_graphtile::tile_provider::GraphTileProvider;
use valinor_sif::{RiderProfile, edge_cost, max_speed_kph};

use crate::error::RouteError;
use crate::graph;
use crate::nearest_node::nearest_node;
use crate::priority_queue::{FrontierEntry, FrontierQueue};
use crate::statistics::{RouteStatistics, compute_statistics};
use crate::visited::VisitedMap;

/// Lower bound on the iteration budget, per spec §4.6.
const MIN_MAX_ITER: f64 = 1_000_000.0;
/// Upper bound on the iteration budget, per spec §4.6.
const MAX_MAX_ITER: f64 = 6_000_000.0;
/// Iteration-count multiplier against the origin-destination distance, in
/// kilometres, per spec §4.6.
const ITER_PER_KM: f64 = 30_000.0;

/// The full outcome of a successful route request: the path as
/// `(lat, lon)` pairs (origin-first), the traffic-exposure distance
/// totals, and the iteration count actually performed (a test/diagnostic
/// hook, per spec §8 scenario 5).
#[derive(Debug, Clone, PartialEq)]
pub struct RouteOutcome {
    pub path: Vec<(f64, f64)>,
    pub statistics: RouteStatistics,
    pub iterations: u64,
}

/// A single query's search state: tile cache access plus the two
/// frontier queues and visited maps, per spec §9's "one context object"
/// design note. Not reused across queries.
pub struct RouteContext<'p, P: GraphTileProvider> {
    provider: &'p P,
    profile: RiderProfile,
    visited_capacity: usize,
    max_iter_override: Option<u64>,
}

impl<'p, P: GraphTileProvider> RouteContext<'p, P> {
    #[must_use]
    pub fn new(provider: &'p P, profile: RiderProfile) -> Self {
        Self {
            provider,
            profile,
            visited_capacity: crate::visited::DEFAULT_CAPACITY,
            max_iter_override: None,
        }
    }

    /// Overrides the per-direction visited-map capacity. Mostly useful
    /// for tests that want a small table without waiting to allocate the
    /// production-sized one.
    #[must_use]
    pub fn with_visited_capacity(mut self, capacity: usize) -> Self {
        self.visited_capacity = capacity;
        self
    }

    /// Overrides the computed iteration budget with a fixed value,
    /// bypassing the distance-scaled formula entirely. Exists so tests
    /// can force budget-termination (spec §8 scenario 5) without
    /// constructing a graph thousands of kilometres wide.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: u64) -> Self {
        self.max_iter_override = Some(max_iter);
        self
    }

    /// Runs a bidirectional A* query from `origin` to `destination`
    /// (both `(lat, lon)`).
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::NoNearbyNode`] if either endpoint has no
    /// usable graph node nearby, [`RouteError::NoPath`] if the search
    /// exhausts its frontier or iteration budget with no meeting point,
    /// and [`RouteError::AllocationFailure`] if a visited-map insert
    /// exhausts its probe budget. Tile load/decode errors at the
    /// endpoints are fatal; mid-search they degrade to "edge unusable"
    /// per spec §7.
    pub fn route(
        &self,
        origin: (f64, f64),
        destination: (f64, f64),
    ) -> Result<RouteOutcome, RouteError> {
        let origin_node = nearest_node(self.provider, origin.0, origin.1)?;
        let dest_node = nearest_node(self.provider, destination.0, destination.1)?;

        let origin_coord = graph::node_coordinate(self.provider, origin_node)?;
        let dest_coord = graph::node_coordinate(self.provider, dest_node)?;
        let distance_km = haversine_distance_meters(origin_coord, dest_coord) / 1000.0;

        #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let max_iter = self.max_iter_override.unwrap_or_else(|| {
            (ITER_PER_KM * distance_km).clamp(MIN_MAX_ITER, MAX_MAX_ITER) as u64
        });

        let mut queue_fwd = FrontierQueue::new();
        let mut queue_bwd = FrontierQueue::new();
        let mut visited_fwd = VisitedMap::with_capacity(self.visited_capacity);
        let mut visited_bwd = VisitedMap::with_capacity(self.visited_capacity);

        let v_max = max_speed_kph(self.profile.bicycle_type);
        let h0_fwd = time_heuristic(origin_coord, dest_coord, v_max);
        let h0_bwd = time_heuristic(dest_coord, origin_coord, v_max);

        visited_fwd
            .insert(origin_node, 0.0, None, None)
            .map_err(|_| RouteError::AllocationFailure)?;
        queue_fwd.push(FrontierEntry {
            f: h0_fwd,
            g: 0.0,
            dist_m: 0.0,
            state: origin_node,
            parent: None,
            parent_edge: None,
        });

        visited_bwd
            .insert(dest_node, 0.0, None, None)
            .map_err(|_| RouteError::AllocationFailure)?;
        queue_bwd.push(FrontierEntry {
            f: h0_bwd,
            g: 0.0,
            dist_m: 0.0,
            state: dest_node,
            parent: None,
            parent_edge: None,
        });

        let mut best_meeting: Option<(GraphId, f64)> = None;
        let mut iterations: u64 = 0;

        info!(
            origin = %origin_node,
            destination = %dest_node,
            max_iter,
            "starting bidirectional search"
        );

        'outer: loop {
            if queue_fwd.is_empty() && queue_bwd.is_empty() {
                break;
            }

            if let Some(entry) = queue_fwd.pop() {
                iterations += 1;
                expand_one(
                    self.provider,
                    &self.profile,
                    v_max,
                    entry,
                    &mut visited_fwd,
                    &visited_bwd,
                    dest_coord,
                    &mut best_meeting,
                    &mut queue_fwd,
                )?;
            }
            if iterations >= max_iter {
                break 'outer;
            }
            if terminated(&queue_fwd, &queue_bwd, best_meeting) {
                break 'outer;
            }

            if let Some(entry) = queue_bwd.pop() {
                iterations += 1;
                expand_one(
                    self.provider,
                    &self.profile,
                    v_max,
                    entry,
                    &mut visited_bwd,
                    &visited_fwd,
                    origin_coord,
                    &mut best_meeting,
                    &mut queue_bwd,
                )?;
            }
            if iterations >= max_iter {
                break 'outer;
            }
            if terminated(&queue_fwd, &queue_bwd, best_meeting) {
                break 'outer;
            }
        }

        let Some((meeting_state, total_cost)) = best_meeting else {
            debug!(iterations, "search exhausted with no meeting point");
            return Err(RouteError::NoPath(iterations));
        };

        debug!(iterations, total_cost, %meeting_state, "search terminated with a meeting point");

        let path_states = reconstruct(&visited_fwd, &visited_bwd, meeting_state)?;
        let mut path = Vec::with_capacity(path_states.len());
        for state in &path_states {
            let coord = graph::node_coordinate(self.provider, *state)?;
            path.push((coord.y, coord.x));
        }
        let statistics = compute_statistics(self.provider, &path_states)?;

        Ok(RouteOutcome {
            path,
            statistics,
            iterations,
        })
    }
}

/// The admissible heuristic: an optimistic travel-time lower bound in
/// seconds, based on twice the rider's nominal cruising speed (spec
/// §4.6).
fn time_heuristic(from: Coord<f64>, to: Coord<f64>, v_max_kph: f64) -> f64 {
    haversine_distance_meters(from, to) * (3.6 / v_max_kph)
}

/// Normal-termination check: both heaps non-empty, a meeting point
/// exists, and the sum of their minimum `f`s has overtaken the best
/// total cost seen so far.
fn terminated(queue_fwd: &FrontierQueue, queue_bwd: &FrontierQueue, best_meeting: Option<(GraphId, f64)>) -> bool {
    let (Some(f_fwd), Some(f_bwd)) = (queue_fwd.peek_f(), queue_bwd.peek_f()) else {
        return false;
    };
    let Some((_, best_cost)) = best_meeting else {
        return false;
    };
    f_fwd + f_bwd >= best_cost
}

/// Pops and expands one frontier entry in one direction. Stale entries
/// (whose `g` is worse than what the visited map now holds) are
/// discarded without expansion. Individually malformed edges or
/// neighbour-tile load failures degrade to "edge unusable" rather than
/// failing the query (spec §7); only a visited-map probe-budget
/// exhaustion propagates as a fatal error.
#[expect(clippy::too_many_arguments)]
fn expand_one<P: GraphTileProvider>(
    provider: &P,
    profile: &RiderProfile,
    v_max_kph: f64,
    entry: FrontierEntry,
    visited_self: &mut VisitedMap,
    visited_other: &VisitedMap,
    other_root_coord: Coord<f64>,
    best_meeting: &mut Option<(GraphId, f64)>,
    queue_self: &mut FrontierQueue,
) -> Result<(), RouteError> {
    let Some(self_entry) = visited_self.find(entry.state) else {
        // Can't happen: every pushed state was inserted into visited_self
        // first. Treat defensively as stale rather than panicking.
        return Ok(());
    };
    if entry.g > self_entry.g {
        trace!(state = %entry.state, "discarding stale frontier entry");
        return Ok(());
    }

    if let Some(other_entry) = visited_other.find(entry.state) {
        let total = entry.g + other_entry.g;
        let improves = best_meeting.is_none_or(|(_, best)| total < best);
        if improves {
            trace!(state = %entry.state, total, "new best meeting point");
            *best_meeting = Some((entry.state, total));
        }
    }

    let edges = graph::outgoing_edges(provider, entry.state).unwrap_or_else(|err| {
        debug!(state = %entry.state, %err, "node's own tile unusable; no expansion");
        Vec::new()
    });

    for (edge_id, edge) in edges {
        if edge.end_node_id().level() != 2 {
            continue;
        }

        let cost = match edge_cost(&edge, profile) {
            Ok(Some(cost)) => cost,
            Ok(None) => continue,
            Err(_) => {
                trace!(edge = %edge_id, "skipping edge with malformed use/class field");
                continue;
            }
        };

        let new_g = entry.g + cost;
        let end_state = edge.end_node_id();

        if let Some(existing) = visited_self.find(end_state) {
            if new_g >= existing.g {
                continue;
            }
        }

        let end_coord = match graph::node_coordinate(provider, end_state) {
            Ok(coord) => coord,
            Err(err) => {
                debug!(state = %end_state, %err, "neighbour tile unusable; edge skipped");
                continue;
            }
        };

        visited_self
            .insert(end_state, new_g, Some(entry.state), Some(edge_id))
            .map_err(|_| RouteError::AllocationFailure)?;

        let h = time_heuristic(end_coord, other_root_coord, v_max_kph);
        queue_self.push(FrontierEntry {
            f: new_g + h,
            g: new_g,
            dist_m: entry.dist_m + f64::from(edge.length()),
            state: end_state,
            parent: Some(entry.state),
            parent_edge: Some(edge_id),
        });
    }

    Ok(())
}

/// Reconstructs the full path from the origin to the destination through
/// a discovered meeting point `m`: walk `visited_fwd`'s predecessor chain
/// from `m` back to the origin and reverse it, then walk
/// `visited_bwd`'s predecessor chain starting at `m`'s backward
/// predecessor forward to the destination (already in the right order),
/// and concatenate.
fn reconstruct(
    visited_fwd: &VisitedMap,
    visited_bwd: &VisitedMap,
    meeting: GraphId,
) -> Result<Vec<GraphId>, RouteError> {
    let mut forward_part = Vec::new();
    let mut cursor = Some(meeting);
    while let Some(state) = cursor {
        forward_part.push(state);
        let entry = visited_fwd.find(state).ok_or(RouteError::PathDiscontinuity)?;
        cursor = entry.predecessor;
    }
    forward_part.reverse();

    let meeting_backward = visited_bwd
        .find(meeting)
        .ok_or(RouteError::PathDiscontinuity)?;
    let mut cursor = meeting_backward.predecessor;
    while let Some(state) = cursor {
        forward_part.push(state);
        let entry = visited_bwd.find(state).ok_or(RouteError::PathDiscontinuity)?;
        cursor = entry.predecessor;
    }

    Ok(forward_part)
}
