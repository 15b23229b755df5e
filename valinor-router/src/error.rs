use thiserror::Error;
use valhalla_graphtile::InvalidGraphIdError;
use valhalla_graphtile::graph_tile::{LookupError, TileDecodeError};
use valhalla_graphtile::tile_provider::TileProviderError;

/// One of the five reported failure kinds a route request can end in.
///
/// `TileProvider` I/O errors and decode errors are folded into
/// `TileNotFound`/`MalformedTile` respectively — the caller only ever
/// needs to distinguish "couldn't get the bytes" from "got bytes that
/// don't parse".
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("tile file could not be loaded: {0}")]
    TileNotFound(String),
    #[error("tile data is malformed: {0}")]
    MalformedTile(String),
    #[error("graph lookup failed: {0}")]
    InvalidState(#[from] LookupError),
    #[error("invalid graph id: {0}")]
    InvalidGraphId(#[from] InvalidGraphIdError),
    #[error("no graph node near the requested point has a usable outgoing edge")]
    NoNearbyNode,
    /// Search exhausted or hit its iteration budget with no meeting
    /// point; carries the iteration count actually performed.
    #[error("search exhausted after {0} iterations with no meeting point")]
    NoPath(u64),
    #[error("could not grow the visited map (probe budget exhausted)")]
    AllocationFailure,
    /// A reconstructed path referenced a (tile, node) pair with no
    /// matching visited-map entry. Indicates a bug in the driver, not a
    /// property of the input graph.
    #[error("reconstructed path has a gap between consecutive states")]
    PathDiscontinuity,
}

impl From<TileProviderError> for RouteError {
    fn from(err: TileProviderError) -> Self {
        match err {
            TileProviderError::TileNotFound(id) => Self::TileNotFound(id.to_string()),
            TileProviderError::Io(e) => Self::TileNotFound(e.to_string()),
            TileProviderError::Decode(e) => Self::MalformedTile(e.to_string()),
            TileProviderError::InvalidGraphId(e) => Self::InvalidGraphId(e),
            TileProviderError::PoisonedCacheLock(msg) => Self::MalformedTile(msg),
        }
    }
}

impl From<TileDecodeError> for RouteError {
    fn from(err: TileDecodeError) -> Self {
        Self::MalformedTile(err.to_string())
    }
}
