//! # The fixed level-2 tiling grid
//!
//! This core only ever consults a single tiling level (level 2, 0.25°
//! tiles), unlike a full Valhalla hierarchy with multiple coarser levels
//! for highway/arterial roads. Keeping it to one fixed grid removes a
//! whole axis of generality the bicycle routing core doesn't need.

use super::GraphId;

/// The hierarchy level used throughout this core. No other level is valid.
pub const LEVEL: u8 = 2;

/// Tile edge length, in degrees.
pub const TILE_SIZE_DEGREES: f64 = 0.25;

/// Number of tile columns (360 / `TILE_SIZE_DEGREES`).
pub const N_COLS: u32 = 1440;

/// Number of tile rows (180 / `TILE_SIZE_DEGREES`).
pub const N_ROWS: u32 = 720;

/// Computes `row = floor((lat + 90) / 0.25)`, `col = floor((lon + 180) / 0.25)`,
/// clamped to the grid, and returns `tile_id = row * N_COLS + col`.
#[must_use]
pub fn tile_id_for_coordinate(lat: f64, lon: f64) -> u64 {
    let row = ((lat + 90.0) / TILE_SIZE_DEGREES)
        .floor()
        .clamp(0.0, f64::from(N_ROWS - 1));
    let col = ((lon + 180.0) / TILE_SIZE_DEGREES)
        .floor()
        .clamp(0.0, f64::from(N_COLS - 1));
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (row, col) = (row as u64, col as u64);
    row * u64::from(N_COLS) + col
}

/// Returns the `GraphId` of the base node (index 0) of the tile containing
/// `(lat, lon)`.
///
/// # Errors
///
/// Returns an error only if the computed tile id somehow overflows 22 bits,
/// which cannot happen for any coordinate inside the valid lat/lon range.
pub fn base_graph_id_for_coordinate(
    lat: f64,
    lon: f64,
) -> Result<GraphId, crate::graph_id::InvalidGraphIdError> {
    GraphId::try_from_components(LEVEL, tile_id_for_coordinate(lat, lon), 0)
}

/// Returns the (south-west corner) `(lat, lon)` of the tile with the given id.
#[must_use]
pub fn tile_base_coordinate(tile_id: u64) -> (f64, f64) {
    let row = tile_id / u64::from(N_COLS);
    let col = tile_id % u64::from(N_COLS);
    #[expect(clippy::cast_precision_loss)]
    let (row, col) = (row as f64, col as f64);
    (
        row.mul_add(TILE_SIZE_DEGREES, -90.0),
        col.mul_add(TILE_SIZE_DEGREES, -180.0),
    )
}
