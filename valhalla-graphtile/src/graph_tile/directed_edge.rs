use crate::graph_tile::TileDecodeError;
use crate::{Access, GraphId, RoadClass, RoadUse, Surface};
use bitfield_struct::bitfield;
use enumset::EnumSet;
use zerocopy::try_transmute;
use zerocopy_derive::{FromBytes, Immutable, IntoBytes, Unaligned};

/// Default speed substituted for a zero-valued `speed` field.
const DEFAULT_SPEED_KPH: u8 = 15;

/// Default lane count substituted for a zero-valued `lane_count` field.
const DEFAULT_LANE_COUNT: u8 = 1;

/// Weighted grade index meaning "flat", substituted for a zero-valued
/// `weighted_grade` field (0 would otherwise mean "steepest descent").
const DEFAULT_WEIGHTED_GRADE: u8 = 7;

/// End-node identity plus the directional access masks, packed into the
/// first 64-bit word of the record: 46 bits of [`GraphId`] (level 3 +
/// tile-id 22 + node-id 21) and a 12-bit forward access mask, with 6
/// spare bits rounding the word out.
#[bitfield(u64,
    repr = U64<LE>,
    from = bit_twiddling_helpers::conv_u64le::from_inner,
    into = bit_twiddling_helpers::conv_u64le::into_inner
)]
#[derive(FromBytes, IntoBytes, Immutable, Unaligned, PartialEq)]
struct EndDescriptorWord {
    #[bits(46, from = bit_twiddling_helpers::conv_u64le::from_inner, into = bit_twiddling_helpers::conv_u64le::into_inner)]
    end_graph_id: U64<LE>,
    #[bits(12, from = bit_twiddling_helpers::conv_u16le::from_inner, into = bit_twiddling_helpers::conv_u16le::into_inner)]
    forward_access: U16<LE>,
    #[bits(6)]
    _spare: u8,
}

/// Reverse access mask plus the first three attribute fields (length,
/// speed, use class), packed into the second 64-bit word.
#[bitfield(u64,
    repr = U64<LE>,
    from = bit_twiddling_helpers::conv_u64le::from_inner,
    into = bit_twiddling_helpers::conv_u64le::into_inner
)]
#[derive(FromBytes, IntoBytes, Immutable, Unaligned, PartialEq)]
struct ReverseAccessAndLengthWord {
    #[bits(12, from = bit_twiddling_helpers::conv_u16le::from_inner, into = bit_twiddling_helpers::conv_u16le::into_inner)]
    reverse_access: U16<LE>,
    #[bits(24, from = bit_twiddling_helpers::conv_u32le::from_inner, into = bit_twiddling_helpers::conv_u32le::into_inner)]
    length: U32<LE>,
    #[bits(8)]
    speed: u8,
    #[bits(6)]
    edge_use: u8,
    #[bits(14)]
    _spare: u16,
}

/// The remaining attribute fields: classification, surface, lane count,
/// cycle-lane, bike-network/sidepath/dismount/shoulder flags, and
/// weighted grade.
#[bitfield(u64,
    repr = U64<LE>,
    from = bit_twiddling_helpers::conv_u64le::from_inner,
    into = bit_twiddling_helpers::conv_u64le::into_inner
)]
#[derive(FromBytes, IntoBytes, Immutable, Unaligned, PartialEq)]
struct AttributesWord {
    #[bits(3)]
    classification: u8,
    #[bits(3)]
    surface: u8,
    #[bits(4)]
    lane_count: u8,
    #[bits(2)]
    cycle_lane: u8,
    #[bits(1)]
    bike_network: u8,
    #[bits(1)]
    use_sidepath: u8,
    #[bits(1)]
    dismount: u8,
    #[bits(1)]
    shoulder: u8,
    #[bits(4)]
    weighted_grade: u8,
    #[bits(44)]
    _spare: u64,
}

use zerocopy::{LE, U16, U32, U64};

/// A directed edge within the routing graph: the adjacency from one node
/// to another, plus the geometric and attribute fields the cost model
/// needs.
///
/// The 48-byte on-disk record is read through two logical views sharing
/// the same bytes — an *end descriptor* (end node identity + access
/// masks, word 0/1) and an *attribute descriptor* (length, speed, use,
/// classification, surface, lanes, cycleway flags, grade — word 1/2) —
/// rather than duplicating parsed copies of the same bits.
#[derive(FromBytes, Immutable, Unaligned, Debug, Clone, Copy)]
#[repr(C)]
pub struct DirectedEdge {
    end_descriptor: EndDescriptorWord,
    reverse_access_and_length: ReverseAccessAndLengthWord,
    attributes: AttributesWord,
    /// Reserved; rounds the record out to the fixed 48-byte size.
    _reserved: [U64<LE>; 3],
}

impl DirectedEdge {
    /// The `GraphId` of the node this edge terminates at.
    #[inline]
    pub fn end_node_id(&self) -> GraphId {
        // SAFETY: the field is 46 bits wide, matching GraphId's packed width.
        unsafe { GraphId::from_id_unchecked(self.end_descriptor.end_graph_id()) }
    }

    /// The forward access mask (travel modes allowed in this edge's direction).
    #[inline]
    pub fn forward_access(&self) -> EnumSet<Access> {
        // SAFETY: the field is 12 bits wide; every bit pattern is a valid EnumSet<Access>.
        unsafe { EnumSet::from_repr_unchecked(self.end_descriptor.forward_access().get()) }
    }

    /// The reverse access mask (travel modes allowed against this edge's direction).
    #[inline]
    pub fn reverse_access(&self) -> EnumSet<Access> {
        // SAFETY: see `forward_access`.
        unsafe {
            EnumSet::from_repr_unchecked(self.reverse_access_and_length.reverse_access().get())
        }
    }

    /// Does either direction of this edge admit bicycle travel?
    #[inline]
    pub fn has_bike_access(&self) -> bool {
        (self.forward_access() | self.reverse_access()).contains(Access::Bicycle)
    }

    /// Does either direction of this edge admit pedestrian travel?
    #[inline]
    pub fn has_pedestrian_access(&self) -> bool {
        (self.forward_access() | self.reverse_access()).contains(Access::Pedestrian)
    }

    /// Does either direction of this edge admit car (`Auto`) travel?
    #[inline]
    pub fn has_car_access(&self) -> bool {
        (self.forward_access() | self.reverse_access()).contains(Access::Auto)
    }

    /// Edge length in meters.
    #[inline]
    pub fn length(&self) -> u32 {
        self.reverse_access_and_length.length().get()
    }

    /// Default/posted speed in km/h. A zero value in the raw record means
    /// "unknown", and is reported here as 15 km/h per the tile format's
    /// convention.
    #[inline]
    pub fn default_speed_kph(&self) -> u8 {
        match self.reverse_access_and_length.speed() {
            0 => DEFAULT_SPEED_KPH,
            speed => speed,
        }
    }

    /// The categorical use of this edge (cycleway, track, steps, ferry, ...).
    ///
    /// # Errors
    ///
    /// Returns [`TileDecodeError::InvalidBitPattern`] if the 6-bit field
    /// does not correspond to a known [`RoadUse`] discriminant.
    #[inline]
    pub fn edge_use(&self) -> Result<RoadUse, TileDecodeError> {
        try_transmute!(self.reverse_access_and_length.edge_use())
            .map_err(|_| TileDecodeError::InvalidBitPattern)
    }

    /// Road classification (motorway down to service/other).
    ///
    /// # Errors
    ///
    /// Returns [`TileDecodeError::InvalidBitPattern`] if the 3-bit field
    /// does not correspond to a known [`RoadClass`] discriminant (cannot
    /// happen, since every 3-bit value maps to a variant).
    #[inline]
    pub fn road_class(&self) -> Result<RoadClass, TileDecodeError> {
        try_transmute!(self.attributes.classification())
            .map_err(|_| TileDecodeError::InvalidBitPattern)
    }

    /// Surface class (0 paved-smooth through 7 impassable).
    #[inline]
    pub fn surface(&self) -> Surface {
        // Every 3-bit value maps to a Surface variant.
        try_transmute!(self.attributes.surface()).unwrap_or(Surface::Impassable)
    }

    /// Number of travel lanes, with a zero-valued field treated as 1.
    #[inline]
    pub fn lane_count(&self) -> u8 {
        match self.attributes.lane_count() {
            0 => DEFAULT_LANE_COUNT,
            count => count,
        }
    }

    /// Cycle-lane rating: 0 = none, 1 = shared, 2 = dedicated lane, 3 = separated.
    #[inline]
    pub fn cycle_lane(&self) -> u8 {
        self.attributes.cycle_lane()
    }

    /// Is this edge part of a signed bicycle network?
    #[inline]
    pub fn is_bike_network(&self) -> bool {
        self.attributes.bike_network() != 0
    }

    /// Does this edge require using an adjacent sidepath rather than the road itself?
    #[inline]
    pub fn use_sidepath(&self) -> bool {
        self.attributes.use_sidepath() != 0
    }

    /// Must a cyclist dismount to traverse this edge?
    #[inline]
    pub fn is_dismount(&self) -> bool {
        self.attributes.dismount() != 0
    }

    /// Does this edge have a paved shoulder?
    #[inline]
    pub fn has_shoulder(&self) -> bool {
        self.attributes.shoulder() != 0
    }

    /// Weighted longitudinal grade, 0 (steepest descent) to 15 (steepest
    /// ascent); a zero-valued raw field is treated as 7 (flat).
    #[inline]
    pub fn weighted_grade(&self) -> u8 {
        match self.attributes.weighted_grade() {
            0 => DEFAULT_WEIGHTED_GRADE,
            grade => grade,
        }
    }

    /// Builds a `DirectedEdge` directly from its logical fields, for use
    /// in other crates' cost-model and search-driver test fixtures. The
    /// same `access` mask is applied to both the forward and reverse
    /// directions, which is all the bicycle profile ever distinguishes.
    #[cfg(any(test, feature = "test-util"))]
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn test_instance(
        end_graph_id: u64,
        use_class: u8,
        surface: u8,
        weighted_grade: u8,
        length: u32,
        classification: u8,
        lane_count: u8,
        cycle_lane: u8,
        bike_network: bool,
        dismount: bool,
        access: u16,
    ) -> Self {
        use zerocopy::{FromBytes, IntoBytes};

        let word0 = EndDescriptorWord::new()
            .with_end_graph_id(U64::<LE>::new(end_graph_id))
            .with_forward_access(U16::<LE>::new(access));
        let word1 = ReverseAccessAndLengthWord::new()
            .with_reverse_access(U16::<LE>::new(access))
            .with_length(U32::<LE>::new(length))
            .with_speed(0)
            .with_edge_use(use_class);
        let word2 = AttributesWord::new()
            .with_classification(classification)
            .with_surface(surface)
            .with_lane_count(lane_count)
            .with_cycle_lane(cycle_lane)
            .with_bike_network(u8::from(bike_network))
            .with_dismount(u8::from(dismount))
            .with_weighted_grade(weighted_grade);
        let bytes: Vec<u8> = [word0.as_bytes(), word1.as_bytes(), word2.as_bytes(), &[0u8; 24]]
            .concat();
        Self::read_from_bytes(&bytes).unwrap()
    }
}
