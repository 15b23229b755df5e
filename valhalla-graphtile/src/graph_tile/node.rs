use crate::Access;
use bitfield_struct::bitfield;
use enumset::EnumSet;
use geo::{Coord, coord};
use zerocopy::{LE, U16, U32, U64};
use zerocopy_derive::{FromBytes, Immutable, IntoBytes, Unaligned};

#[bitfield(u64,
    repr = U64<LE>,
    from = bit_twiddling_helpers::conv_u64le::from_inner,
    into = bit_twiddling_helpers::conv_u64le::into_inner
)]
#[derive(FromBytes, IntoBytes, Immutable, Unaligned)]
struct FirstBitfield {
    #[bits(22, from = bit_twiddling_helpers::conv_u32le::from_inner, into = bit_twiddling_helpers::conv_u32le::into_inner)]
    lat_offset: U32<LE>,
    #[bits(4)]
    lat_offset7: u8,
    #[bits(22, from = bit_twiddling_helpers::conv_u32le::from_inner, into = bit_twiddling_helpers::conv_u32le::into_inner)]
    lon_offset: U32<LE>,
    #[bits(4)]
    lon_offset7: u8,
    #[bits(12, from = bit_twiddling_helpers::conv_u16le::from_inner, into = bit_twiddling_helpers::conv_u16le::into_inner)]
    access: U16<LE>,
}

#[bitfield(u64,
    repr = U64<LE>,
    from = bit_twiddling_helpers::conv_u64le::from_inner,
    into = bit_twiddling_helpers::conv_u64le::into_inner
)]
#[derive(FromBytes, IntoBytes, Immutable, Unaligned)]
struct SecondBitfield {
    #[bits(21, from = bit_twiddling_helpers::conv_u32le::from_inner, into = bit_twiddling_helpers::conv_u32le::into_inner)]
    edge_index: U32<LE>,
    #[bits(7)]
    edge_count: u8,
    #[bits(36)]
    _spare: u64,
}

/// Information for a node within the graph.
///
/// The graph uses a forward star structure: nodes point to the first
/// outbound directed edge, and each directed edge points to the other
/// end node of the edge.
#[derive(FromBytes, IntoBytes, Immutable, Unaligned, Debug, Clone)]
#[repr(C)]
pub struct NodeInfo {
    first_bit_field: FirstBitfield,
    second_bit_field: SecondBitfield,
    /// Reserved. Kept so that `NodeInfo` remains exactly 32 bytes, matching
    /// the on-disk record size.
    _reserved: [U64<LE>; 2],
}

impl NodeInfo {
    /// Gets the coordinate of the node.
    /// The data is stored as a relative offset internally,
    /// so a reference coordinate (namely the SW corner of the tile)
    /// is required to compute the absolute position.
    #[inline]
    pub fn coordinate(&self, sw_corner: Coord<f64>) -> Coord<f64> {
        let lat_offset = f64::from(self.first_bit_field.lat_offset().get()) * 1e-6f64
            + f64::from(self.first_bit_field.lat_offset7()) * 1e-7f64;
        let lon_offset = f64::from(self.first_bit_field.lon_offset().get()) * 1e-6f64
            + f64::from(self.first_bit_field.lon_offset7()) * 1e-7f64;
        sw_corner + coord! {x: lon_offset, y: lat_offset}
    }

    /// The access mask for this node.
    #[inline]
    pub fn access(&self) -> EnumSet<Access> {
        // Safety: the access bits are 12 bits wide, so every representable
        // value is a valid `EnumSet<Access>` bit pattern.
        unsafe { EnumSet::from_repr_unchecked(self.first_bit_field.access().get()) }
    }

    /// The index within the node's tile of its first outbound directed edge.
    #[inline]
    pub const fn edge_index(&self) -> u32 {
        self.second_bit_field.edge_index().get()
    }

    /// The number of outbound edges.
    #[inline]
    pub const fn edge_count(&self) -> u8 {
        self.second_bit_field.edge_count()
    }

    /// Builds a `NodeInfo` record directly from its logical fields, for
    /// use in hand-built tile fixtures in other modules' and other
    /// crates' tests.
    #[cfg(any(test, feature = "test-util"))]
    #[must_use]
    pub fn test_instance(
        lat_off: u32,
        lat_off7: u8,
        lon_off: u32,
        lon_off7: u8,
        edge_index: u32,
        edge_count: u8,
    ) -> Self {
        use zerocopy::{FromBytes, IntoBytes};

        let first = FirstBitfield::new()
            .with_lat_offset(U32::<LE>::new(lat_off))
            .with_lat_offset7(lat_off7)
            .with_lon_offset(U32::<LE>::new(lon_off))
            .with_lon_offset7(lon_off7)
            .with_access(U16::<LE>::new(0xfff));
        let second = SecondBitfield::new()
            .with_edge_index(U32::<LE>::new(edge_index))
            .with_edge_count(edge_count);
        let bytes: Vec<u8> = [first.as_bytes(), second.as_bytes(), &[0u8; 16]].concat();
        Self::read_from_bytes(&bytes).unwrap()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use geo::coord;

    fn sample_node(
        lat_off: u32,
        lat_off7: u8,
        lon_off: u32,
        lon_off7: u8,
        edge_index: u32,
        edge_count: u8,
    ) -> NodeInfo {
        NodeInfo::test_instance(lat_off, lat_off7, lon_off, lon_off7, edge_index, edge_count)
    }

    #[test]
    fn test_coordinate_reconstruction() {
        let node = sample_node(500_000, 3, 250_000, 7, 10, 4);
        let sw = coord! {x: 9.0, y: 45.0};
        let decoded = node.coordinate(sw);
        let expected_lat = 45.0 + 500_000.0 * 1e-6 + 3.0 * 1e-7;
        let expected_lon = 9.0 + 250_000.0 * 1e-6 + 7.0 * 1e-7;
        assert!((decoded.y - expected_lat).abs() < 1e-9);
        assert!((decoded.x - expected_lon).abs() < 1e-9);
    }

    #[test]
    fn test_edge_span_round_trip() {
        let node = sample_node(0, 0, 0, 0, 12345, 42);
        assert_eq!(node.edge_index(), 12345);
        assert_eq!(node.edge_count(), 42);
    }

    #[test]
    fn test_node_info_size_is_32_bytes() {
        assert_eq!(std::mem::size_of::<NodeInfo>(), 32);
    }
}
