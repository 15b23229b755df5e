//! Parsing and zero-copy access to a single graph tile.
//!
//! A tile is a gzip-compressed (on disk) binary blob containing a fixed
//! header, a node table, a node-transitions table (unused but sized for
//! offset arithmetic), and a directed-edge table, in that order. Parsing
//! is a single bounds-checked pass over the decompressed bytes; the
//! resulting [`GraphTileView`] borrows directly into that buffer for the
//! lifetime of the tile (see [`GraphTileHandle`] for the owned,
//! self-referential wrapper the tile cache stores).

mod directed_edge;
mod header;
mod node;
mod node_transition;

use self_cell::self_cell;
use thiserror::Error;
use zerocopy::FromBytes;

pub use directed_edge::DirectedEdge;
pub use header::{GraphTileHeader, HEADER_SIZE};
pub use node::NodeInfo;
pub use node_transition::NodeTransition;

use crate::GraphId;

/// Errors encountered while parsing the bytes of a single tile.
///
/// Maps to the spec's `MalformedTile` error kind; a tile is never
/// partially constructed — any of these aborts the whole parse.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TileDecodeError {
    #[error("Tile data ({0} bytes) is shorter than the fixed {HEADER_SIZE}-byte header.")]
    HeaderTooShort(usize),
    #[error("Declared node/edge/transition counts overflow the tile's raw buffer.")]
    CountsOverflow,
    #[error("A record's offset range falls outside the tile's raw buffer.")]
    RecordOutOfBounds,
    #[error("A bit-packed field holds a value with no corresponding enum variant.")]
    InvalidBitPattern,
}

/// Errors looking up a specific node or edge within an already-parsed tile.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("The graph ID's tile-id does not match this tile.")]
    MismatchedBase,
    #[error("The index within this tile is out of range.")]
    InvalidIndex,
}

/// A borrowed, read-only view over one parsed tile's nodes and edges.
#[derive(Debug)]
pub struct GraphTileView<'a> {
    header: &'a GraphTileHeader,
    nodes: &'a [NodeInfo],
    directed_edges: &'a [DirectedEdge],
}

impl<'a> GraphTileView<'a> {
    /// Parses a tile from its raw (already decompressed) bytes.
    ///
    /// # Errors
    ///
    /// Returns [`TileDecodeError`] if the buffer is shorter than the fixed
    /// header, if the declared node/edge/transition counts would read past
    /// the end of the buffer, or if any fixed-size record fails its bounds
    /// check.
    pub fn parse(data: &'a [u8]) -> Result<Self, TileDecodeError> {
        if data.len() < HEADER_SIZE {
            return Err(TileDecodeError::HeaderTooShort(data.len()));
        }

        let (header, _) = GraphTileHeader::ref_from_prefix(data)
            .map_err(|_| TileDecodeError::RecordOutOfBounds)?;

        let node_count = header.node_count() as usize;
        let edge_count = header.directed_edge_count() as usize;
        let transition_count = header.transition_count() as usize;

        let (nodes, after_nodes): (&[NodeInfo], usize) = {
            let node_bytes_len = node_count
                .checked_mul(std::mem::size_of::<NodeInfo>())
                .ok_or(TileDecodeError::CountsOverflow)?;
            let end = HEADER_SIZE
                .checked_add(node_bytes_len)
                .ok_or(TileDecodeError::CountsOverflow)?;
            let slice = data
                .get(HEADER_SIZE..end)
                .ok_or(TileDecodeError::CountsOverflow)?;
            let nodes = <[NodeInfo]>::ref_from_bytes(slice)
                .map_err(|_| TileDecodeError::RecordOutOfBounds)?;
            (nodes, end)
        };

        // The transitions table is skipped entirely: its bytes are never
        // interpreted, only its declared length is needed to find where
        // the directed-edge table begins.
        let after_transitions = after_nodes
            .checked_add(
                transition_count
                    .checked_mul(std::mem::size_of::<NodeTransition>())
                    .ok_or(TileDecodeError::CountsOverflow)?,
            )
            .ok_or(TileDecodeError::CountsOverflow)?;
        if after_transitions > data.len() {
            return Err(TileDecodeError::CountsOverflow);
        }

        let directed_edges = {
            let edge_bytes_len = edge_count
                .checked_mul(std::mem::size_of::<DirectedEdge>())
                .ok_or(TileDecodeError::CountsOverflow)?;
            let end = after_transitions
                .checked_add(edge_bytes_len)
                .ok_or(TileDecodeError::CountsOverflow)?;
            let slice = data
                .get(after_transitions..end)
                .ok_or(TileDecodeError::CountsOverflow)?;
            <[DirectedEdge]>::ref_from_bytes(slice)
                .map_err(|_| TileDecodeError::RecordOutOfBounds)?
        };

        Ok(Self {
            header,
            nodes,
            directed_edges,
        })
    }

    /// The tile's header.
    #[must_use]
    pub const fn header(&self) -> &GraphTileHeader {
        self.header
    }

    /// All nodes in this tile, in on-disk order.
    #[must_use]
    pub const fn nodes(&self) -> &[NodeInfo] {
        self.nodes
    }

    /// All directed edges in this tile, in on-disk order.
    #[must_use]
    pub const fn directed_edges(&self) -> &[DirectedEdge] {
        self.directed_edges
    }

    /// Does the given graph ID's tile-id match this tile?
    #[must_use]
    pub fn may_contain_id(&self, id: GraphId) -> bool {
        id.tile_id() == self.header.graph_id().tile_id()
    }

    /// Looks up a node by its full graph ID.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::MismatchedBase`] if `id`'s tile-id doesn't
    /// match this tile, or [`LookupError::InvalidIndex`] if the node index
    /// is out of range.
    pub fn get_node(&self, id: GraphId) -> Result<&NodeInfo, LookupError> {
        if !self.may_contain_id(id) {
            return Err(LookupError::MismatchedBase);
        }
        self.nodes
            .get(id.index() as usize)
            .ok_or(LookupError::InvalidIndex)
    }

    /// Looks up a directed edge by its full graph ID.
    ///
    /// # Errors
    ///
    /// See [`GraphTileView::get_node`].
    pub fn get_directed_edge(&self, id: GraphId) -> Result<&DirectedEdge, LookupError> {
        if !self.may_contain_id(id) {
            return Err(LookupError::MismatchedBase);
        }
        self.directed_edges
            .get(id.index() as usize)
            .ok_or(LookupError::InvalidIndex)
    }

    /// Returns the outgoing directed edges for a node, paired with their
    /// full graph IDs.
    ///
    /// Per the spec, a node whose declared `(edge_index, edge_count)` span
    /// extends past this tile's edge table contributes no outgoing edges
    /// rather than erroring — a single malformed node must never abort a
    /// query.
    #[must_use]
    pub fn outgoing_edges(
        &self,
        node_id: GraphId,
        node: &NodeInfo,
    ) -> Vec<(GraphId, &DirectedEdge)> {
        let start = node.edge_index() as usize;
        let count = usize::from(node.edge_count());
        let Some(end) = start.checked_add(count) else {
            return Vec::new();
        };
        let Some(slice) = self.directed_edges.get(start..end) else {
            return Vec::new();
        };
        slice
            .iter()
            .enumerate()
            .filter_map(|(i, edge)| {
                let edge_id = node_id.with_index((start + i) as u64).ok()?;
                Some((edge_id, edge))
            })
            .collect()
    }
}

self_cell!(
    /// An owned, parsed tile: bundles the decompressed byte buffer with
    /// borrowed [`GraphTileView`] accessors over it, so the tile cache can
    /// hold tiles by value without exposing a lifetime to its callers.
    pub struct GraphTileHandle {
        owner: Vec<u8>,

        #[covariant]
        dependent: GraphTileView,
    }

    impl {Debug}
);

impl GraphTileHandle {
    /// Parses a new tile from owned, decompressed bytes.
    ///
    /// # Errors
    ///
    /// See [`GraphTileView::parse`].
    pub fn try_new(data: Vec<u8>) -> Result<Self, TileDecodeError> {
        Self::try_new2(data, |bytes| GraphTileView::parse(bytes))
    }

    /// Borrows the parsed view.
    #[must_use]
    pub fn view(&self) -> &GraphTileView<'_> {
        self.borrow_dependent()
    }
}
