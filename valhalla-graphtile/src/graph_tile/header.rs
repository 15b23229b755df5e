use crate::GraphId;
use bitfield_struct::bitfield;
use zerocopy::{F32, LE, U32, U64};
use zerocopy_derive::{FromBytes, Immutable, IntoBytes, Unaligned};

/// Fixed size (in bytes) of a [`GraphTileHeader`] record, per the tile
/// format's layout. Node, transition, and directed-edge tables all begin
/// at offsets derived from this constant.
pub const HEADER_SIZE: usize = 272;

/// Bytes consumed by the fields explicitly laid out in the spec (graph id,
/// base lon/lat, the two packed count words). Everything past this offset
/// up to [`HEADER_SIZE`] is reserved spare space, carried so the header
/// stays a fixed, future-proof 272 bytes without repacking existing
/// fields.
const USED_PREFIX_LEN: usize = 52;

#[bitfield(u64,
    repr = U64<LE>,
    from = bit_twiddling_helpers::conv_u64le::from_inner,
    into = bit_twiddling_helpers::conv_u64le::into_inner
)]
#[derive(FromBytes, IntoBytes, Immutable, Unaligned, PartialEq)]
struct CountsBitfield {
    #[bits(21, from = bit_twiddling_helpers::conv_u32le::from_inner, into = bit_twiddling_helpers::conv_u32le::into_inner)]
    node_count: U32<LE>,
    #[bits(21, from = bit_twiddling_helpers::conv_u32le::from_inner, into = bit_twiddling_helpers::conv_u32le::into_inner)]
    directed_edge_count: U32<LE>,
    #[bits(22)]
    _spare: u32,
}

#[bitfield(u32,
    repr = U32<LE>,
    from = bit_twiddling_helpers::conv_u32le::from_inner,
    into = bit_twiddling_helpers::conv_u32le::into_inner
)]
#[derive(FromBytes, IntoBytes, Immutable, Unaligned, PartialEq)]
struct TransitionCountBitfield {
    #[bits(22, from = bit_twiddling_helpers::conv_u32le::from_inner, into = bit_twiddling_helpers::conv_u32le::into_inner)]
    transition_count: U32<LE>,
    #[bits(10)]
    _spare: u16,
}

/// Summary information at the base of every graph tile.
///
/// Field offsets below are the ones the spec nails down exactly: base
/// longitude at byte 8, base latitude at byte 12, the node/edge counts
/// word at byte 40, and the transition count word at byte 48. The
/// `graph_id` field occupying the first 8 bytes and the trailing reserved
/// span exist to round the record out to the fixed 272-byte header size
/// without requiring every tile to carry a second header for future
/// growth.
#[derive(Clone, FromBytes, IntoBytes, Immutable, Unaligned, Debug, PartialEq)]
#[repr(C)]
pub struct GraphTileHeader {
    /// The full [`GraphId`] (base, index 0) of this tile.
    graph_id: U64<LE>,
    /// Base longitude of the tile's southwest corner, at byte offset 8.
    base_lon: F32<LE>,
    /// Base latitude of the tile's southwest corner, at byte offset 12.
    base_lat: F32<LE>,
    /// Bytes 16..40: dataset/writer metadata, not consulted by the core.
    _reserved_metadata: [U64<LE>; 3],
    /// Packed node-count (bits 0-20) / directed-edge-count (bits 21-41) word
    /// at byte offset 40.
    counts: CountsBitfield,
    /// Packed transition-count word at byte offset 48.
    transitions: TransitionCountBitfield,
    /// Bytes 52..272: reserved for future fields; keeps the header a fixed
    /// 272 bytes so derived offsets never need to special-case a version.
    _reserved_tail: [u8; HEADER_SIZE - USED_PREFIX_LEN],
}

impl GraphTileHeader {
    /// The full Graph ID (base, index 0) of this tile.
    #[inline]
    pub const fn graph_id(&self) -> GraphId {
        // SAFETY: every tile on disk is written with a valid base graph id.
        unsafe { GraphId::from_id_unchecked(self.graph_id) }
    }

    /// The coordinate of the southwest corner of this graph tile.
    #[inline]
    pub fn base_lon_lat(&self) -> (f64, f64) {
        (f64::from(self.base_lon.get()), f64::from(self.base_lat.get()))
    }

    /// The number of nodes in this graph tile.
    #[inline]
    pub const fn node_count(&self) -> u32 {
        self.counts.node_count().get()
    }

    /// The number of directed edges in this graph tile.
    #[inline]
    pub const fn directed_edge_count(&self) -> u32 {
        self.counts.directed_edge_count().get()
    }

    /// The number of node transitions in this graph tile. The transitions
    /// table is unused by this core (it exists in the on-disk format for
    /// the multi-level hierarchy this core doesn't implement) but its
    /// count is still needed to compute the directed-edge table's offset.
    #[inline]
    pub const fn transition_count(&self) -> u32 {
        self.transitions.transition_count().get()
    }
}
