//! # Graph tile providers
//!
//! A tile provider resolves a [`GraphId`] to the [`GraphTileView`] of the
//! tile containing it, loading and parsing the tile on first reference.
//! The only implementation this core needs is [`DirectoryTileProvider`],
//! a bounded FIFO cache over gzip-compressed tile files on disk.

mod directory_tile_provider;

use crate::GraphId;
use crate::graph_id::InvalidGraphIdError;
use crate::graph_tile::{GraphTileHandle, TileDecodeError};
use std::sync::Arc;
use thiserror::Error;

pub use directory_tile_provider::DirectoryTileProvider;

/// Errors encountered while resolving or loading a tile.
#[derive(Debug, Error)]
pub enum TileProviderError {
    /// Neither the gzip-compressed nor the uncompressed tile file exists.
    #[error("Tile file for {0} does not exist (checked both .gph.gz and .gph).")]
    TileNotFound(GraphId),
    #[error("I/O error reading tile file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Tile data is malformed: {0}")]
    Decode(#[from] TileDecodeError),
    #[error("Invalid graph ID: {0}")]
    InvalidGraphId(#[from] InvalidGraphIdError),
    #[error("Tile cache lock is poisoned: {0}")]
    PoisonedCacheLock(String),
}

/// Resolves graph IDs to parsed, cached tiles.
pub trait GraphTileProvider {
    /// Gets (loading and parsing on first reference, if necessary) the
    /// tile containing `graph_id`.
    ///
    /// # Errors
    ///
    /// Returns [`TileProviderError::TileNotFound`] if neither the
    /// compressed nor the uncompressed file exists, or a decode/IO error
    /// if the file exists but cannot be parsed.
    fn get_tile_containing(
        &self,
        graph_id: GraphId,
    ) -> Result<Arc<GraphTileHandle>, TileProviderError>;
}
