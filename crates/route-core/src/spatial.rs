//! Spatial math for distance calculations.

use crate::models::Waypoint;

/// Mean earth radius in nautical miles.
const EARTH_RADIUS_NM: f64 = 3440.065;

/// Great-circle distance between two points in nautical miles (Haversine formula).
pub fn distance_nm(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_NM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Position of the candidate closest to `reference`. Ties keep the earliest.
pub fn closest_to<'a, I>(candidates: I, reference: &Waypoint) -> Option<usize>
where
    I: IntoIterator<Item = &'a Waypoint>,
{
    let mut best: Option<(usize, f64)> = None;
    for (pos, candidate) in candidates.into_iter().enumerate() {
        let dist = candidate.distance_to(reference);
        match best {
            Some((_, best_dist)) if best_dist <= dist => {}
            _ => best = Some((pos, dist)),
        }
    }
    best.map(|(pos, _)| pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_one_degree_latitude() {
        // One degree of latitude is ~60 nm
        let dist = distance_nm(0.0, 0.0, 1.0, 0.0);
        assert!((dist - 60.04).abs() < 0.1, "got {}", dist);
    }

    #[test]
    fn test_distance_same_point() {
        assert!(distance_nm(33.9, -118.4, 33.9, -118.4) < 1e-9);
    }

    #[test]
    fn test_closest_prefers_nearest_then_first() {
        let reference = Waypoint::new("REF", 0.0, 0.0);
        let far = Waypoint::new("X", 10.0, 0.0);
        let near = Waypoint::new("X", 1.0, 0.0);
        let near_twin = Waypoint::new("X", -1.0, 0.0);
        let list = [far, near, near_twin];
        assert_eq!(closest_to(list.iter(), &reference), Some(1));
        assert_eq!(closest_to(std::iter::empty(), &reference), None);
    }
}
