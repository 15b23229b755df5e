//! Bicycle cost model.
//!
//! A deterministic, side-effect-free mapping from (directed edge, rider
//! profile) to a time cost in seconds, plus the speed/grade/surface
//! tables it's built on. Nothing here touches the tile cache or the
//! graph — `valinor-router` calls [`edge_cost`] once per candidate edge
//! during expansion.

use thiserror::Error;
use valhalla_graphtile::RoadClass;
use valhalla_graphtile::RoadUse;
use valhalla_graphtile::graph_tile::{DirectedEdge, TileDecodeError};

/// The four bicycle types the cost tables are indexed by.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BicycleType {
    Road = 0,
    Cross = 1,
    Hybrid = 2,
    Mountain = 3,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("bicycle type must be 0..=3, got {0}")]
pub struct InvalidBicycleType(pub u8);

impl TryFrom<u8> for BicycleType {
    type Error = InvalidBicycleType;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Road),
            1 => Ok(Self::Cross),
            2 => Ok(Self::Hybrid),
            3 => Ok(Self::Mountain),
            other => Err(InvalidBicycleType(other)),
        }
    }
}

/// Rider preferences consulted by the cost model.
#[derive(Debug, Clone, Copy)]
pub struct RiderProfile {
    pub bicycle_type: BicycleType,
    /// Blends road-preference factors, in `[0, 1]`.
    pub use_roads: f64,
    /// Scales the grade-based speed penalty, in `[0, 1]`.
    pub use_hills: f64,
    /// Multiplies pedestrian-only edges by 5 instead of 2.
    pub avoid_pushing: bool,
    /// Adds a stress-derived multiplier on car-accessible edges.
    pub avoid_cars: bool,
}

impl Default for RiderProfile {
    fn default() -> Self {
        Self {
            bicycle_type: BicycleType::Mountain,
            use_roads: 0.25,
            use_hills: 0.25,
            avoid_pushing: false,
            avoid_cars: false,
        }
    }
}

const MIN_SPEED_KPH: f64 = 4.0;
const MAX_SPEED_KPH: f64 = 40.0;
const DISMOUNT_SPEED_KPH: f64 = 5.1;

const BASE_SPEED_KPH: [f64; 4] = [25.0, 20.0, 18.0, 16.0];

const GRADE_SPEED_FACTOR: [f64; 16] = [
    2.2, 2.0, 1.9, 1.7, 1.4, 1.2, 1.0, 0.95, 0.85, 0.75, 0.65, 0.55, 0.5, 0.45, 0.4, 0.3,
];

const SURFACE_SPEED_FACTOR: [[f64; 8]; 4] = [
    [1.0, 1.0, 0.9, 0.6, 0.5, 0.3, 0.2, 0.0],
    [1.0, 1.0, 1.0, 0.8, 0.7, 0.5, 0.4, 0.0],
    [1.0, 1.0, 1.0, 0.8, 0.6, 0.4, 0.25, 0.0],
    [1.0, 1.0, 1.0, 1.0, 0.9, 0.75, 0.55, 0.0],
];

/// Worst surface ordinal still tolerated, indexed by [`BicycleType`].
/// Edges with a worse surface than this are inadmissible and never costed.
const WORST_ALLOWED_SURFACE: [u8; 4] = [2, 3, 4, 6];

/// Scales `GRADE_SPEED_FACTOR[grade]` toward 1.0 (neutral) as `use_hills`
/// falls toward zero; at `use_hills = 1.0` the table applies unscaled.
fn grade_speed_factor(grade: u8, use_hills: f64) -> f64 {
    let table_value = GRADE_SPEED_FACTOR[usize::from(grade).min(15)];
    1.0 + (table_value - 1.0) * use_hills
}

/// Derives an edge's travel speed in km/h for the given profile, per the
/// base/surface/grade tables, clamped to `[4, 40]` and overridden to
/// 5.1 for dismount edges.
#[must_use]
pub fn speed_kph(edge: &DirectedEdge, profile: &RiderProfile) -> f64 {
    if edge.is_dismount() {
        return DISMOUNT_SPEED_KPH;
    }
    let b = profile.bicycle_type as usize;
    let surface_idx = usize::from(edge.surface().ordinal()).min(7);
    let speed = BASE_SPEED_KPH[b]
        * SURFACE_SPEED_FACTOR[b][surface_idx]
        * grade_speed_factor(edge.weighted_grade(), profile.use_hills);
    speed.clamp(MIN_SPEED_KPH, MAX_SPEED_KPH)
}

/// Does this bicycle type tolerate this edge's surface at all?
#[must_use]
pub fn surface_allowed(edge: &DirectedEdge, profile: &RiderProfile) -> bool {
    edge.surface().ordinal() <= WORST_ALLOWED_SURFACE[profile.bicycle_type as usize]
}

/// Twice a bicycle type's nominal cruising speed: the optimistic upper
/// bound a search heuristic converts straight-line distance against.
#[must_use]
pub fn max_speed_kph(bicycle_type: BicycleType) -> f64 {
    2.0 * BASE_SPEED_KPH[bicycle_type as usize]
}

/// The time cost of traversing one edge, in seconds, including all
/// preference and stress multipliers. `Ok(None)` means the edge is
/// inadmissible for this rider (no bike/pedestrian access, or a surface
/// worse than tolerated) rather than an error.
///
/// # Errors
///
/// Returns [`TileDecodeError`] if the edge's use-class or road
/// classification bit pattern doesn't correspond to a known variant —
/// the caller should treat this the same as a malformed edge and skip
/// it rather than fail the whole query.
pub fn edge_cost(
    edge: &DirectedEdge,
    profile: &RiderProfile,
) -> Result<Option<f64>, TileDecodeError> {
    if !edge.has_bike_access() && !edge.has_pedestrian_access() {
        return Ok(None);
    }
    if !surface_allowed(edge, profile) {
        return Ok(None);
    }

    let use_class = edge.edge_use()?;
    let speed = speed_kph(edge, profile);
    let length = f64::from(edge.length());

    if use_class == RoadUse::Steps {
        return Ok(Some(length * (3.6 / 4.0) * 3.0));
    }
    if use_class == RoadUse::Ferry {
        return Ok(Some(length * (3.6 / speed) * 1.2));
    }

    let base_time = length / (speed / 3.6);
    let mut multiplier = preference_multiplier(edge, use_class, profile)?;

    if edge.is_bike_network() {
        multiplier *= 0.95;
    }
    if edge.has_pedestrian_access() && !edge.has_bike_access() {
        multiplier *= if profile.avoid_pushing { 5.0 } else { 2.0 };
    }
    if profile.avoid_cars && edge.has_car_access() {
        multiplier *= car_stress_multiplier(edge, use_class, speed)?;
    }

    Ok(Some(base_time * multiplier))
}

fn preference_multiplier(
    edge: &DirectedEdge,
    use_class: RoadUse,
    profile: &RiderProfile,
) -> Result<f64, TileDecodeError> {
    Ok(match use_class {
        RoadUse::Cycleway => 0.90,
        RoadUse::Track => 0.90,
        RoadUse::MountainBike => {
            if profile.bicycle_type == BicycleType::Mountain {
                0.85
            } else {
                1.0
            }
        }
        RoadUse::Path | RoadUse::Footway => 0.95,
        RoadUse::LivingStreet => 0.95,
        RoadUse::Road => {
            let mut m = 1.0 + (1.0 - profile.use_roads) * 0.15;
            if edge.cycle_lane() >= 2 {
                m -= 0.10;
            }
            m
        }
        _ => 1.0,
    })
}

/// The `avoid_cars` stress multiplier for an edge that admits car
/// traffic. Roads designed around non-motorized use get a flat, small
/// penalty; everything else is scored by a stress heuristic built from
/// speed, classification, lane count, and cycle-lane rating.
fn car_stress_multiplier(
    edge: &DirectedEdge,
    use_class: RoadUse,
    speed_kph: f64,
) -> Result<f64, TileDecodeError> {
    if matches!(
        use_class,
        RoadUse::Track | RoadUse::LivingStreet | RoadUse::ServiceRoad
    ) {
        return Ok(1.05);
    }

    let mut stress = 0.2;
    if speed_kph > 50.0 {
        stress += 0.3;
    }
    if speed_kph > 70.0 {
        stress += 0.3;
    }
    if edge.road_class()? as u8 <= RoadClass::Primary as u8 {
        stress += 0.2;
    }
    if edge.lane_count() >= 2 {
        stress += 0.1;
    }
    if edge.cycle_lane() >= 2 {
        stress -= 0.3;
    }
    let stress = stress.clamp(0.1, 1.0);
    Ok(1.0 + stress * 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use valhalla_graphtile::graph_tile::DirectedEdge;

    fn edge(
        use_class: u8,
        surface: u8,
        grade: u8,
        length: u32,
        classification: u8,
        lane_count: u8,
        cycle_lane: u8,
        bike_network: bool,
        dismount: bool,
        access: u16,
    ) -> DirectedEdge {
        DirectedEdge::test_instance(
            0,
            use_class,
            surface,
            grade,
            length,
            classification,
            lane_count,
            cycle_lane,
            bike_network,
            dismount,
            access,
        )
    }

    const BIKE_AND_PED: u16 = 0b0000_0000_0110;

    #[test]
    fn test_flat_cycleway_is_deterministic() {
        let e = edge(20, 0, 6, 1000, 5, 1, 0, false, false, BIKE_AND_PED);
        let profile = RiderProfile {
            bicycle_type: BicycleType::Hybrid,
            use_roads: 0.25,
            use_hills: 0.25,
            avoid_pushing: false,
            avoid_cars: false,
        };
        let first = edge_cost(&e, &profile).unwrap();
        let second = edge_cost(&e, &profile).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_flat_cycleway_matches_hand_computed_cost() {
        // grade 6 is the table's true neutral entry (factor 1.0).
        let e = edge(20, 0, 6, 1000, 5, 1, 0, false, false, BIKE_AND_PED);
        let profile = RiderProfile {
            bicycle_type: BicycleType::Hybrid,
            use_roads: 0.25,
            use_hills: 0.25,
            avoid_pushing: false,
            avoid_cars: false,
        };
        let cost = edge_cost(&e, &profile).unwrap().unwrap();
        // speed = 18 * 1.0 * 1.0 = 18 km/h; time = 1000 / 5.0 = 200s; * 0.90
        assert!((cost - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_worst_surface_rejects_edge() {
        let e = edge(0, 6, 7, 500, 5, 1, 0, false, false, BIKE_AND_PED);
        let profile = RiderProfile {
            bicycle_type: BicycleType::Road,
            ..RiderProfile::default()
        };
        assert_eq!(edge_cost(&e, &profile).unwrap(), None);
    }

    #[test]
    fn test_pedestrian_only_multiplier_applies_once() {
        let ped_only: u16 = 0b0000_0000_0010;
        let e = edge(27, 0, 6, 100, 5, 1, 0, false, false, ped_only);
        let profile = RiderProfile::default();
        let cost = edge_cost(&e, &profile).unwrap().unwrap();
        // 100m @ 16 km/h (mountain) surface 1.0 grade 1.0 -> base time
        // 22.5s, *0.95 (PATH) *2.0 (pedestrian-only) = 42.75s.
        assert!((cost - 42.75).abs() < 1e-6);
    }

    #[test]
    fn test_avoid_pushing_quintuples_pedestrian_multiplier() {
        let ped_only: u16 = 0b0000_0000_0010;
        let e = edge(27, 0, 6, 100, 5, 1, 0, false, false, ped_only);
        let with_pushing = RiderProfile {
            avoid_pushing: true,
            ..RiderProfile::default()
        };
        let without_pushing = RiderProfile {
            avoid_pushing: false,
            ..RiderProfile::default()
        };
        let cost_with = edge_cost(&e, &with_pushing).unwrap().unwrap();
        let cost_without = edge_cost(&e, &without_pushing).unwrap().unwrap();
        assert!((cost_with - cost_without * 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_steps_override_ignores_speed_table() {
        let e = edge(26, 6, 15, 10, 5, 1, 0, false, false, BIKE_AND_PED);
        let profile = RiderProfile::default();
        let cost = edge_cost(&e, &profile).unwrap().unwrap();
        assert!((cost - 10.0 * (3.6 / 4.0) * 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_dismount_overrides_speed() {
        let e = edge(0, 0, 6, 100, 5, 1, 0, false, true, BIKE_AND_PED);
        let profile = RiderProfile::default();
        assert!((speed_kph(&e, &profile) - DISMOUNT_SPEED_KPH).abs() < 1e-9);
    }

    #[test]
    fn test_avoid_cars_applies_flat_penalty_on_living_street() {
        let car_and_bike: u16 = 0b0000_0000_0101;
        let e = edge(10, 0, 6, 100, 6, 1, 0, false, false, car_and_bike);
        let mut profile = RiderProfile::default();
        profile.avoid_cars = false;
        let baseline = edge_cost(&e, &profile).unwrap().unwrap();
        profile.avoid_cars = true;
        let penalized = edge_cost(&e, &profile).unwrap().unwrap();
        assert!((penalized - baseline * 1.05).abs() < 1e-6);
    }
}
