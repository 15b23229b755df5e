//! # Spatial utilities useful for routing

use geo::{Coord, Distance, Haversine};

/// Returns the great-circle distance between two points, in meters.
#[must_use]
pub fn haversine_distance_meters(a: Coord<f64>, b: Coord<f64>) -> f64 {
    Haversine.distance(a.into(), b.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;
    use proptest::{prop_assert, proptest};

    proptest! {
        #[test]
        fn haversine_distance_is_symmetric(lat in -90.0f64..90.0, lon in -180.0f64..180.0,
            dlat in -0.1f64..0.1, dlon in -0.1f64..0.1) {
            let a = coord! {x: lon, y: lat};
            let b = coord! {x: lon + dlon, y: lat + dlat};
            prop_assert!((haversine_distance_meters(a, b) - haversine_distance_meters(b, a)).abs() < 1e-6);
        }

        #[test]
        fn haversine_distance_to_self_is_zero(lat in -90.0f64..90.0, lon in -180.0f64..180.0) {
            let a = coord! {x: lon, y: lat};
            prop_assert!(haversine_distance_meters(a, a).abs() < 1e-6);
        }
    }
}
