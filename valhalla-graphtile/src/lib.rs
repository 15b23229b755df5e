//! Binary tile format and accessors for the level-2 (0.25°) bicycle
//! routing graph: `GraphId`, the gzip-compressed tile layout, a bounded
//! FIFO tile cache, and the haversine-based spatial helpers the search
//! driver needs for its heuristic and nearest-node resolution.

mod graph_id;
pub mod graph_tile;
pub mod spatial;
pub mod tile_hierarchy;
pub mod tile_provider;

use enumset::{EnumSet, EnumSetType};
use zerocopy_derive::TryFromBytes;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// Pub use for re-export without too many levels of hierarchy.
// The implementations are sufficiently complex that we want to have lots of files,
// but many of those only have one or two useful definitions to re-export,
// so this flattens things for better ergonomics.
pub use graph_id::{GraphId, InvalidGraphIdError};

/// Road class; broad hierarchies of relative (and sometimes locally specific) importance.
///
/// Bicycle costing consults this as the `classification` field of a
/// directed edge (0 = motorway ... 7 = service/other) for the
/// `avoid_cars` stress heuristic.
#[repr(u8)]
#[derive(TryFromBytes, Debug, Eq, PartialEq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum RoadClass {
    Motorway,
    Trunk,
    Primary,
    Secondary,
    Tertiary,
    Unclassified,
    Residential,
    ServiceOther,
}

impl RoadClass {
    const fn into_bits(self) -> u8 {
        self as _
    }
    const fn from_bits(value: u8) -> Self {
        match value {
            0 => Self::Motorway,
            1 => Self::Trunk,
            2 => Self::Primary,
            3 => Self::Secondary,
            4 => Self::Tertiary,
            5 => Self::Unclassified,
            6 => Self::Residential,
            _ => Self::ServiceOther,
        }
    }
}

/// Generalized surface type, ordered from best (0) to worst (7, impassable).
///
/// The bicycle cost model rejects edges whose surface exceeds
/// `kWorstAllowedSurface` for the rider's bicycle type.
#[repr(u8)]
#[derive(TryFromBytes, Debug, Eq, PartialEq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum Surface {
    PavedSmooth,
    Paved,
    PavedRough,
    Compacted,
    Dirt,
    Gravel,
    Path,
    Impassable,
}

impl Surface {
    const fn into_bits(self) -> u8 {
        self as _
    }
    const fn from_bits(value: u8) -> Self {
        match value {
            0 => Self::PavedSmooth,
            1 => Self::Paved,
            2 => Self::PavedRough,
            3 => Self::Compacted,
            4 => Self::Dirt,
            5 => Self::Gravel,
            6 => Self::Path,
            _ => Self::Impassable,
        }
    }

    /// The raw 0-7 ordinal, used for comparisons against `kWorstAllowedSurface`.
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }
}

/// Sub-categorization of roads/paths based on specialized usage.
///
/// The discriminants below are load-bearing: the bicycle cost model's
/// preference multipliers and the statistics bucketer match on these
/// exact numeric codes (spec's "use class").
#[derive(TryFromBytes, Debug, Eq, PartialEq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[repr(u8)]
pub enum RoadUse {
    /// Standard road (the default).
    Road = 0,
    /// Entrance or exit ramp.
    Ramp = 1,
    /// Turn lane.
    TurnChannel = 2,
    /// Agricultural use, forest tracks, and some unspecified rough roads.
    Track = 3,
    /// Driveway or private service road.
    Driveway = 4,
    /// Service road with limited routing use.
    Alley = 5,
    /// Access roads in parking areas.
    ParkingAisle = 6,
    /// Emergency vehicles only.
    EmergencyAccess = 7,
    /// Commercial drive-thru.
    DriveThru = 8,
    /// A cul-de-sac.
    CulDeSac = 9,
    /// Streets with preference towards bicyclists and pedestrians.
    LivingStreet = 10,
    /// A generic service road.
    ServiceRoad = 11,
    /// A dedicated bicycle path.
    Cycleway = 20,
    /// A mountain bike trail.
    MountainBike = 21,
    /// A sidewalk along another road.
    Sidewalk = 24,
    /// A type of road with pedestrian priority; bicycles may be granted access in some cases.
    Footway = 25,
    /// A stairway/steps.
    Steps = 26,
    Path = 27,
    Pedestrian = 28,
    Bridleway = 29,
    RestArea = 30,
    ServiceArea = 31,
    PedestrianCrossing = 32,
    /// Other, currently unspecified service road.
    Other = 40,
    /// Ferry crossing.
    Ferry = 41,
    RailFerry = 42,
    /// Roads currently under construction.
    Construction = 43,
    // WARNING: This is a 6-bit field, so never add a value higher than 63!
}

impl RoadUse {
    const fn into_bits(self) -> u8 {
        self as _
    }
    const fn from_bits(value: u8) -> Self {
        match value {
            0 => RoadUse::Road,
            1 => RoadUse::Ramp,
            2 => RoadUse::TurnChannel,
            3 => RoadUse::Track,
            4 => RoadUse::Driveway,
            5 => RoadUse::Alley,
            6 => RoadUse::ParkingAisle,
            7 => RoadUse::EmergencyAccess,
            8 => RoadUse::DriveThru,
            9 => RoadUse::CulDeSac,
            10 => RoadUse::LivingStreet,
            11 => RoadUse::ServiceRoad,
            20 => RoadUse::Cycleway,
            21 => RoadUse::MountainBike,
            24 => RoadUse::Sidewalk,
            25 => RoadUse::Footway,
            26 => RoadUse::Steps,
            27 => RoadUse::Path,
            28 => RoadUse::Pedestrian,
            29 => RoadUse::Bridleway,
            30 => RoadUse::RestArea,
            31 => RoadUse::ServiceArea,
            32 => RoadUse::PedestrianCrossing,
            41 => RoadUse::Ferry,
            42 => RoadUse::RailFerry,
            43 => RoadUse::Construction,
            _ => RoadUse::Other,
        }
    }
}

/// Access permission by travel type.
///
/// Stored internally as a bit field. While it is represented as a 16-bit
/// integer here, only twelve bits are ever persisted in a directed edge
/// record.
#[derive(Debug, EnumSetType)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[enumset(repr = "u16")]
pub enum Access {
    Auto,
    Pedestrian,
    Bicycle,
    Truck,
    Emergency,
    Taxi,
    Bus,
    HOV,
    Wheelchair,
    Moped,
    Motorcycle,
    GolfCart,
    // NOTE: Only 12 bits are allowed to be used, so this enum cannot contain any more variants!
}
