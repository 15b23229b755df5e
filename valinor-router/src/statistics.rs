//! Path statistics: partitions a reconstructed path's edges into
//! traffic-exposure buckets (spec §4.8).

use valhalla_graphtile::GraphId;
use valhalla_graphtile::RoadUse;
use valhalla_graphtile::graph_tile::DirectedEdge;
use valhalla_graphtile::tile_provider::GraphTileProvider;

use crate::error::RouteError;
use crate::graph;

/// The four distance totals reported alongside a path, in kilometres.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RouteStatistics {
    pub dist_car_free_km: f64,
    pub dist_separated_km: f64,
    pub dist_with_cars_km: f64,
    pub dist_pushing_km: f64,
}

impl RouteStatistics {
    #[must_use]
    pub fn total_km(&self) -> f64 {
        self.dist_car_free_km + self.dist_separated_km + self.dist_with_cars_km + self.dist_pushing_km
    }
}

enum Bucket {
    Pushing,
    CarFree,
    Separated,
    WithCars,
}

fn classify(edge: &DirectedEdge, use_class: RoadUse) -> Bucket {
    if edge.has_pedestrian_access() && !edge.has_bike_access() {
        return Bucket::Pushing;
    }
    let car_free_by_use = matches!(
        use_class,
        RoadUse::Cycleway | RoadUse::Path | RoadUse::Footway | RoadUse::MountainBike
    ) && !edge.has_car_access();
    let always_car_free =
        matches!(use_class, RoadUse::Track | RoadUse::LivingStreet | RoadUse::ServiceRoad);
    if car_free_by_use || always_car_free {
        return Bucket::CarFree;
    }
    if edge.cycle_lane() >= 2 {
        return Bucket::Separated;
    }
    if edge.has_car_access() {
        return Bucket::WithCars;
    }
    Bucket::CarFree
}

/// Computes the four distance buckets for a path (a sequence of states
/// from origin to destination, inclusive), by re-resolving the edge
/// connecting each consecutive pair.
///
/// # Errors
///
/// Returns [`RouteError::PathDiscontinuity`] if no outgoing edge of
/// `path[i]` reaches `path[i + 1]` — this indicates a bug in path
/// reconstruction, not a property of the input graph. Propagates tile
/// load/decode failures.
pub fn compute_statistics<P: GraphTileProvider>(
    provider: &P,
    path: &[GraphId],
) -> Result<RouteStatistics, RouteError> {
    let mut stats = RouteStatistics::default();

    for pair in path.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let edges = graph::outgoing_edges(provider, from)?;
        let edge = edges
            .iter()
            .find(|(_, edge)| {
                let end = edge.end_node_id();
                end.tile_id() == to.tile_id() && end.index() == to.index()
            })
            .map(|(_, edge)| *edge)
            .ok_or(RouteError::PathDiscontinuity)?;

        let length_km = f64::from(edge.length()) / 1000.0;
        let use_class = edge.edge_use()?;
        match classify(&edge, use_class) {
            Bucket::Pushing => stats.dist_pushing_km += length_km,
            Bucket::CarFree => stats.dist_car_free_km += length_km,
            Bucket::Separated => stats.dist_separated_km += length_km,
            Bucket::WithCars => stats.dist_with_cars_km += length_km,
        }
    }

    Ok(stats)
}
