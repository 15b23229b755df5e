use crate::tile_hierarchy::{LEVEL, N_COLS, N_ROWS};
#[cfg(feature = "serde")]
use serde::{Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use thiserror::Error;
use zerocopy::{LE, U64};
use zerocopy_derive::{Immutable, IntoBytes, Unaligned};

/// The max valid hierarchy level.
///
/// There are 3 bits for the hierarchy level.
const MAX_HIERARCHY_LEVEL: u8 = (1 << 3) - 1;

/// The max valid tile ID.
///
/// There are 22 bits for the tile ID.
const MAX_GRAPH_TILE_ID: u64 = (1 << 22) - 1;

/// The max valid tile index.
///
/// There are 21 bits for the index within the tile
const MAX_TILE_INDEX: u64 = (1 << 21) - 1;

/// All 46 bits set to 1
const INVALID_GRAPH_ID: u64 = (1 << 46) - 1;

#[derive(Debug, Error, PartialEq)]
pub enum InvalidGraphIdError {
    #[error("Level is larger than the maximum allowed value.")]
    Level,
    #[error("Tile ID is larger than the maximum allowed value.")]
    GraphTileId,
    #[error("Tile index is larger than the maximum allowed value.")]
    TileIndex,
    #[error("Graph ID is invalid")]
    InvalidGraphId,
}

/// An identifier of a node or an edge within the tiled graph. Packs a
/// hierarchy level, tile ID, and a unique identifier within the tile into a
/// 64-bit integer.
///
/// Only level 2 (the 0.25° grid, see [`crate::tile_hierarchy`]) is ever
/// produced or consumed by this core, but the field itself is 3 bits wide
/// to match the on-disk record layout.
///
/// # Bit field layout
///
/// ```text
///        MSb                                     LSb
///        ▼                                       ▼
/// bit   64         46        25         3        0
///        ┌──────────┬─────────┬─────────┬────────┐
///        │ RESERVED │ id      │ tileid  │ level  │
///        └──────────┴─────────┴─────────┴────────┘
/// size     18         21        22        3
///```
///
/// Note that there are only 46 used bits in the scheme.
#[repr(C)]
#[derive(IntoBytes, Immutable, Unaligned, Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct GraphId(U64<LE>);

impl GraphId {
    /// Tries to construct a Graph ID from the given components.
    ///
    /// # Errors
    ///
    /// This will fail if any argument contains a value greater than the allowed number of field bits.
    /// - `level` - 3 bits
    /// - `tile_id` - 22 bits
    /// - `index` - 21 bits
    #[inline]
    pub const fn try_from_components(
        level: u8,
        tile_id: u64,
        index: u64,
    ) -> Result<Self, InvalidGraphIdError> {
        if level > MAX_HIERARCHY_LEVEL {
            Err(InvalidGraphIdError::Level)
        } else if tile_id > MAX_GRAPH_TILE_ID {
            Err(InvalidGraphIdError::GraphTileId)
        } else if index > MAX_TILE_INDEX {
            Err(InvalidGraphIdError::TileIndex)
        } else {
            Ok(Self(U64::<LE>::new(
                level as u64 | (tile_id << 3) | index << 25,
            )))
        }
    }

    /// Creates a graph ID from the given raw value.
    ///
    /// # Errors
    ///
    /// This function will fail if the graph ID fails to conform to the invariants.
    pub const fn try_from_id(id: u64) -> Result<Self, InvalidGraphIdError> {
        if id == INVALID_GRAPH_ID {
            return Err(InvalidGraphIdError::InvalidGraphId);
        }

        let result = GraphId(U64::<LE>::new(id));
        if result.level() > MAX_HIERARCHY_LEVEL {
            Err(InvalidGraphIdError::Level)
        } else if result.tile_id() > MAX_GRAPH_TILE_ID {
            Err(InvalidGraphIdError::GraphTileId)
        } else if result.index() > MAX_TILE_INDEX {
            Err(InvalidGraphIdError::TileIndex)
        } else {
            Ok(result)
        }
    }

    /// Creates a graph ID from the given raw value without performing any validity checks.
    ///
    /// # Safety
    ///
    /// Invalid values risk things like out-of-bounds level indexes,
    /// which could cause crashes or other unexpected behavior.
    pub const unsafe fn from_id_unchecked(id: U64<LE>) -> Self {
        Self(id)
    }

    /// Creates a new graph ID from the existing one, but with a new tile index.
    /// This is useful for indexing within a tile.
    ///
    /// # Errors
    ///
    /// See [`GraphId::try_from_components`] for a description of errors.
    #[inline]
    pub const fn with_index(&self, tile_index: u64) -> Result<Self, InvalidGraphIdError> {
        Self::try_from_components(self.level(), self.tile_id(), tile_index)
    }

    /// Extracts the raw (packed) graph ID value.
    #[inline]
    pub const fn value(&self) -> u64 {
        self.0.get()
    }

    /// Gets the hierarchy level.
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn level(&self) -> u8 {
        (self.value() & MAX_HIERARCHY_LEVEL as u64) as u8
    }

    /// Gets the graph tile ID.
    #[inline]
    pub const fn tile_id(&self) -> u64 {
        (self.value() & 0x01ff_fff8) >> 3
    }

    /// Gets the unique identifier (index) within the tile and level.
    #[inline]
    pub const fn index(&self) -> u64 {
        (self.value() & 0x3fff_fe00_0000) >> 25
    }

    /// Returns a [`GraphId`] which omits the index within the level.
    /// This is useful primarily for deriving file names.
    #[inline]
    #[must_use]
    pub const fn tile_base_id(&self) -> GraphId {
        GraphId(U64::<LE>::new(self.value() & 0x01ff_ffff))
    }

    /// Constructs the relative tile path `2/<AAA>/<BBB>/<CCC>.<extension>`
    /// per the fixed three-group, zero-padded convention (AAA = tile_id /
    /// 1,000,000, BBB = (tile_id / 1,000) mod 1,000, CCC = tile_id mod
    /// 1,000).
    ///
    /// # Errors
    ///
    /// Fails if this id's level is not [`LEVEL`] or the tile id exceeds the
    /// grid's tile count.
    pub fn file_path(&self, extension: &str) -> Result<PathBuf, InvalidGraphIdError> {
        if self.level() != LEVEL {
            return Err(InvalidGraphIdError::Level);
        }

        let tile_id = self.tile_id();
        let max_id = u64::from(N_COLS) * u64::from(N_ROWS) - 1;
        if tile_id > max_id {
            return Err(InvalidGraphIdError::GraphTileId);
        }

        let aaa = tile_id / 1_000_000;
        let bbb = (tile_id / 1_000) % 1_000;
        let ccc = tile_id % 1_000;

        Ok(PathBuf::from(LEVEL.to_string())
            .join(format!("{aaa:03}"))
            .join(format!("{bbb:03}"))
            .join(format!("{ccc:03}"))
            .with_extension(extension))
    }
}

impl Display for GraphId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "GraphId {}/{}/{}",
            self.level(),
            self.tile_id(),
            self.index()
        ))
    }
}

#[cfg(feature = "serde")]
impl Serialize for GraphId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(self.0.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level() {
        assert_eq!(
            GraphId::try_from_components(MAX_HIERARCHY_LEVEL + 1, 0, 0),
            Err(InvalidGraphIdError::Level)
        );
    }

    #[test]
    fn test_invalid_tile_id() {
        assert_eq!(
            GraphId::try_from_components(0, MAX_GRAPH_TILE_ID + 1, 0),
            Err(InvalidGraphIdError::GraphTileId)
        );
    }

    #[test]
    fn test_invalid_tile_index() {
        assert_eq!(
            GraphId::try_from_components(0, 0, MAX_TILE_INDEX + 1),
            Err(InvalidGraphIdError::TileIndex)
        );
    }

    #[test]
    fn test_min_tile() {
        let Ok(graph_id) = GraphId::try_from_components(0, 0, 0) else {
            panic!("Expected that we would construct a valid graph ID.")
        };

        assert_eq!(graph_id, GraphId(0.into()));
        assert_eq!(graph_id.level(), 0);
        assert_eq!(graph_id.tile_id(), 0);
        assert_eq!(graph_id.index(), 0);
    }

    #[test]
    fn test_max_tile() {
        let Ok(graph_id) =
            GraphId::try_from_components(MAX_HIERARCHY_LEVEL, MAX_GRAPH_TILE_ID, MAX_TILE_INDEX)
        else {
            panic!("Expected that we would construct a valid graph ID.")
        };

        assert_eq!(
            graph_id,
            // Note: only 46 bits actually used
            GraphId(INVALID_GRAPH_ID.into())
        );
        assert_eq!(graph_id.level(), MAX_HIERARCHY_LEVEL);
        assert_eq!(graph_id.tile_id(), MAX_GRAPH_TILE_ID);
        assert_eq!(graph_id.index(), MAX_TILE_INDEX);
    }

    #[test]
    fn test_valid_tile_by_id() {
        let Ok(graph_id) = GraphId::try_from_id(16889572344463360) else {
            panic!("Expected that we would construct a valid graph ID.")
        };

        assert_eq!(graph_id, GraphId(16889572344463360.into()));
        assert_eq!(graph_id.level(), 0);
        assert_eq!(graph_id.tile_id(), 0);
        assert_eq!(graph_id.index(), 32000);
    }

    #[test]
    fn test_invalid_tile_by_id() {
        assert_eq!(
            GraphId::try_from_id(INVALID_GRAPH_ID),
            // Note: only 46 bits actually used
            Err(InvalidGraphIdError::InvalidGraphId)
        );
    }

    #[test]
    fn test_graph_id_file_path() {
        assert_eq!(
            GraphId::try_from_components(2, 2, 0)
                .unwrap()
                .file_path("gph"),
            Ok("2/000/000/002.gph".into())
        );
        assert_eq!(
            GraphId::try_from_components(2, 1_002_345, 0)
                .unwrap()
                .file_path("gph"),
            Ok("2/001/002/345.gph".into())
        );
    }

    #[test]
    fn test_graph_id_file_path_rejects_wrong_level() {
        assert_eq!(
            GraphId::try_from_components(0, 49, 0)
                .unwrap()
                .file_path("gph"),
            Err(InvalidGraphIdError::Level)
        );
    }
}
