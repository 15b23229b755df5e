//! Nearest-node resolution (spec §4.7): locates a usable graph node close
//! to a requested coordinate.

use geo::coord;

use valhalla_graphtile::GraphId;
use valhalla_graphtile::spatial::haversine_distance_meters;
use valhalla_graphtile::tile_hierarchy::base_graph_id_for_coordinate;
use valhalla_graphtile::tile_provider::GraphTileProvider;

use crate::error::RouteError;

/// Below this distance, a bike/ped-accessible node is always preferred
/// over a closer-but-inaccessible one.
const PREFER_ACCESSIBLE_THRESHOLD_M: f64 = 500.0;

/// Above the distance threshold, an accessible node is still preferred as
/// long as it's within this multiple of the overall-nearest distance.
const PREFER_ACCESSIBLE_RATIO: f64 = 2.0;

/// Finds the graph node nearest `(lat, lon)` with at least one bike- or
/// pedestrian-accessible outgoing edge, within the tile containing the
/// point.
///
/// Among nodes with at least one outgoing edge, this tracks both the
/// overall-nearest node and the nearest *accessible* one, preferring the
/// accessible node when it's close enough (spec §4.7's 500m/2× rule);
/// otherwise the overall nearest is used (its own edges may still turn
/// out to be unusable for this rider — that surfaces later as `NoPath`,
/// not as a resolution failure).
///
/// # Errors
///
/// Returns [`RouteError::NoNearbyNode`] if no node in the containing tile
/// has any outgoing edge at all. Propagates tile load/decode failures.
pub fn nearest_node<P: GraphTileProvider>(
    provider: &P,
    lat: f64,
    lon: f64,
) -> Result<GraphId, RouteError> {
    let base_id = base_graph_id_for_coordinate(lat, lon)?;
    let tile = provider.get_tile_containing(base_id)?;
    let view = tile.view();
    let target = coord! {x: lon, y: lat};
    let (base_lon, base_lat) = view.header().base_lon_lat();
    let sw = coord! {x: base_lon, y: base_lat};

    let mut overall: Option<(GraphId, f64)> = None;
    let mut accessible: Option<(GraphId, f64)> = None;

    for (index, node) in view.nodes().iter().enumerate() {
        if node.edge_count() == 0 {
            continue;
        }
        #[expect(clippy::cast_possible_truncation)]
        let node_id = base_id.with_index(index as u64)?;
        let dist = haversine_distance_meters(node.coordinate(sw), target);

        if overall.is_none_or(|(_, best)| dist < best) {
            overall = Some((node_id, dist));
        }

        let has_access = view
            .outgoing_edges(node_id, node)
            .iter()
            .any(|(_, edge)| edge.has_bike_access() || edge.has_pedestrian_access());
        if has_access && accessible.is_none_or(|(_, best)| dist < best) {
            accessible = Some((node_id, dist));
        }
    }

    let Some((overall_id, overall_dist)) = overall else {
        return Err(RouteError::NoNearbyNode);
    };

    Ok(match accessible {
        Some((acc_id, acc_dist))
            if acc_dist < PREFER_ACCESSIBLE_THRESHOLD_M
                || acc_dist < overall_dist * PREFER_ACCESSIBLE_RATIO =>
        {
            acc_id
        }
        _ => overall_id,
    })
}
