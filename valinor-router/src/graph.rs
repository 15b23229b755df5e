//! Graph accessor: resolves a node's coordinate and outgoing edges
//! through a [`GraphTileProvider`], triggering tile loads as needed
//! (spec §4.2's "Graph accessor" row).
//!
//! Every function here takes the tile-load hit inline on the calling
//! thread; there's no prefetching or background loading. Edges are
//! returned by value (they're `Copy`) rather than borrowed, so callers
//! don't need to keep the backing tile handle alive.

use geo::{Coord, coord};

use valhalla_graphtile::GraphId;
use valhalla_graphtile::graph_tile::DirectedEdge;
use valhalla_graphtile::tile_provider::GraphTileProvider;

use crate::error::RouteError;

/// The absolute (lat, lon) of a node, as a `geo` coordinate (`x` = lon,
/// `y` = lat).
///
/// # Errors
///
/// Propagates tile load/decode failures and an out-of-range node index
/// within the tile.
pub fn node_coordinate<P: GraphTileProvider>(
    provider: &P,
    node_id: GraphId,
) -> Result<Coord<f64>, RouteError> {
    let tile = provider.get_tile_containing(node_id)?;
    let view = tile.view();
    let node = view.get_node(node_id)?;
    let (lon, lat) = view.header().base_lon_lat();
    Ok(node.coordinate(coord! {x: lon, y: lat}))
}

/// The outgoing directed edges of `node_id`, paired with their own
/// (end-indexed) graph IDs, in on-disk order.
///
/// # Errors
///
/// Propagates tile load/decode failures and an out-of-range node index
/// within the tile. A node whose declared edge span runs past the
/// tile's edge table yields an empty (not erroring) result, per spec
/// §4.1 — that check happens inside `GraphTileView::outgoing_edges`.
pub fn outgoing_edges<P: GraphTileProvider>(
    provider: &P,
    node_id: GraphId,
) -> Result<Vec<(GraphId, DirectedEdge)>, RouteError> {
    let tile = provider.get_tile_containing(node_id)?;
    let view = tile.view();
    let node = view.get_node(node_id)?;
    Ok(view
        .outgoing_edges(node_id, node)
        .into_iter()
        .map(|(id, edge)| (id, *edge))
        .collect())
}
