//! Great-circle distance and nearest-marking selection.
//!
//! All distances are meters. The scan is linear over the tenant's markings,
//! which stays cheap at the expected counts (tens per tenant).

use crate::model::geo_marking::GeoMarking;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance in meters between two (lat, lon) points in degrees.
pub fn haversine_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let p1 = lat1.to_radians();
    let p2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + p1.cos() * p2.cos() * (delta_lambda / 2.0).sin().powi(2);

    2.0 * a.sqrt().atan2((1.0 - a).sqrt()) * EARTH_RADIUS_M
}

/// Nearest marking to the reference point, with its distance in meters.
///
/// Returns `None` for an empty candidate set; callers must record that as
/// "no marking resolved", not as a match at distance zero.
pub fn find_nearest(markings: &[GeoMarking], lat: f64, lon: f64) -> Option<(&GeoMarking, f64)> {
    let mut nearest: Option<(&GeoMarking, f64)> = None;

    for marking in markings {
        let dist = haversine_distance_m(lat, lon, marking.latitude, marking.longitude);
        match nearest {
            Some((_, best)) if best <= dist => {}
            _ => nearest = Some((marking, dist)),
        }
    }

    nearest
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn marking(id: u64, lat: f64, lon: f64) -> GeoMarking {
        GeoMarking {
            id,
            tenant_id: 1,
            name: format!("site-{id}"),
            latitude: lat,
            longitude: lon,
            radius_meters: 2000.0,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn distance_is_zero_for_identical_points() {
        let d = haversine_distance_m(12.9716, 77.5946, 12.9716, 77.5946);
        assert!(d.abs() < 1e-6);
    }

    #[test]
    fn distance_matches_known_small_offset() {
        // ~0.001 deg of latitude is ~111 m on the chosen sphere.
        let d = haversine_distance_m(0.0, 0.0, 0.001, 0.0);
        assert!((d - 111.2).abs() < 1.0, "got {d}");
    }

    #[test]
    fn picks_the_closer_of_two_markings() {
        let markings = vec![marking(1, 0.0, 0.0), marking(2, 10.0, 10.0)];
        let (nearest, dist) = find_nearest(&markings, 0.001, 0.001).unwrap();
        assert_eq!(nearest.id, 1);
        assert!(dist < 200.0, "got {dist}");
    }

    #[test]
    fn empty_candidate_set_resolves_to_none() {
        assert!(find_nearest(&[], 0.0, 0.0).is_none());
    }

    #[test]
    fn first_of_equidistant_markings_wins() {
        let markings = vec![marking(1, 1.0, 0.0), marking(2, -1.0, 0.0)];
        let (nearest, _) = find_nearest(&markings, 0.0, 0.0).unwrap();
        assert_eq!(nearest.id, 1);
    }
}
