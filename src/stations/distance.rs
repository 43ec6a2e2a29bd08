//! Distance metrics between two coordinates, in kilometres.

use crate::types::coordinates::LatLon;
use haversine::{distance, Location as HaversineLocation, Units};

// WGS-84 ellipsoid
const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;
const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);

const VINCENTY_MAX_ITERATIONS: usize = 200;
const VINCENTY_TOLERANCE: f64 = 1e-12;

/// Which distance formula the nearest-candidate search uses.
///
/// `GreatCircle` treats the Earth as a sphere and is cheap; `Geodesic` solves
/// the inverse problem on the WGS-84 ellipsoid and is accurate to well under a
/// metre at the cost of an iterative solve per candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceMetric {
    #[default]
    GreatCircle,
    Geodesic,
}

impl DistanceMetric {
    pub fn from_high_precision(high_precision: bool) -> Self {
        if high_precision {
            DistanceMetric::Geodesic
        } else {
            DistanceMetric::GreatCircle
        }
    }

    pub fn distance_km(&self, from: LatLon, to: LatLon) -> f64 {
        match self {
            DistanceMetric::GreatCircle => great_circle_km(from, to),
            DistanceMetric::Geodesic => geodesic_km(from, to),
        }
    }
}

pub fn great_circle_km(from: LatLon, to: LatLon) -> f64 {
    distance(
        HaversineLocation {
            latitude: from.0,
            longitude: from.1,
        },
        HaversineLocation {
            latitude: to.0,
            longitude: to.1,
        },
        Units::Kilometers,
    )
}

/// Ellipsoidal distance (Vincenty's inverse formula). Nearly antipodal points,
/// where the iteration does not converge, fall back to the great circle.
pub fn geodesic_km(from: LatLon, to: LatLon) -> f64 {
    geodesic_or_great_circle_km(from, to, VINCENTY_MAX_ITERATIONS)
}

fn geodesic_or_great_circle_km(from: LatLon, to: LatLon, max_iterations: usize) -> f64 {
    vincenty_km(from, to, max_iterations).unwrap_or_else(|| great_circle_km(from, to))
}

// `None` when lambda has not settled within `max_iterations`.
fn vincenty_km(from: LatLon, to: LatLon, max_iterations: usize) -> Option<f64> {
    let l = (to.1 - from.1).to_radians();
    let u1 = ((1.0 - WGS84_F) * from.0.to_radians().tan()).atan();
    let u2 = ((1.0 - WGS84_F) * to.0.to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    for _ in 0..max_iterations {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        let sin_sigma = ((cos_u2 * sin_lambda).powi(2)
            + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
        .sqrt();
        if sin_sigma == 0.0 {
            // coincident points
            return Some(0.0);
        }
        let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        let sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        // equatorial line: cos_sq_alpha == 0
        let cos_2sigma_m = if cos_sq_alpha != 0.0 {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        } else {
            0.0
        };
        let c = WGS84_F / 16.0 * cos_sq_alpha * (4.0 + WGS84_F * (4.0 - 3.0 * cos_sq_alpha));

        let lambda_prev = lambda;
        lambda = l
            + (1.0 - c)
                * WGS84_F
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))));

        // diverging, only happens for nearly antipodal points
        if (lambda - l).abs() > std::f64::consts::PI {
            return None;
        }
        if (lambda - lambda_prev).abs() < VINCENTY_TOLERANCE {
            let u_sq = cos_sq_alpha * (WGS84_A.powi(2) - WGS84_B.powi(2)) / WGS84_B.powi(2);
            let big_a =
                1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
            let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
            let delta_sigma = big_b
                * sin_sigma
                * (cos_2sigma_m
                    + big_b / 4.0
                        * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))
                            - big_b / 6.0
                                * cos_2sigma_m
                                * (-3.0 + 4.0 * sin_sigma.powi(2))
                                * (-3.0 + 4.0 * cos_2sigma_m.powi(2))));
            return Some(WGS84_B * big_a * (sigma - delta_sigma) / 1000.0);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_degree_of_latitude_at_the_equator() {
        let d = geodesic_km(LatLon(0.0, 0.0), LatLon(1.0, 0.0));
        assert!((d - 110.574).abs() < 0.01, "got {d}");
        let d = great_circle_km(LatLon(0.0, 0.0), LatLon(1.0, 0.0));
        assert!((d - 111.19).abs() < 0.05, "got {d}");
    }

    #[test]
    fn one_degree_of_longitude_along_the_equator() {
        let d = geodesic_km(LatLon(0.0, 0.0), LatLon(0.0, 1.0));
        assert!((d - 111.319).abs() < 0.01, "got {d}");
    }

    #[test]
    fn metrics_agree_to_within_half_a_percent() {
        let madrid = LatLon(40.4168, -3.7038);
        let barcelona = LatLon(41.3874, 2.1686);
        let fast = DistanceMetric::GreatCircle.distance_km(madrid, barcelona);
        let precise = DistanceMetric::Geodesic.distance_km(madrid, barcelona);
        assert!((fast - 505.0).abs() < 5.0, "got {fast}");
        assert!((fast - precise).abs() / precise < 0.005);
    }

    #[test]
    fn coincident_points_are_zero() {
        let p = LatLon(28.4636, -16.2518);
        assert_eq!(geodesic_km(p, p), 0.0);
        assert_eq!(great_circle_km(p, p), 0.0);
    }

    #[test]
    fn unsettled_iteration_falls_back_to_great_circle() {
        let madrid = LatLon(40.4168, -3.7038);
        let barcelona = LatLon(41.3874, 2.1686);
        assert!(vincenty_km(madrid, barcelona, 1).is_none());
        assert_eq!(
            geodesic_or_great_circle_km(madrid, barcelona, 1),
            great_circle_km(madrid, barcelona)
        );
        assert!(vincenty_km(madrid, barcelona, VINCENTY_MAX_ITERATIONS).is_some());
    }

    #[test]
    fn nearly_antipodal_points_stay_finite() {
        for to in [LatLon(0.5, 179.5), LatLon(0.5, 179.7), LatLon(-0.3, -179.8)] {
            let d = geodesic_km(LatLon(0.0, 0.0), to);
            let sphere = great_circle_km(LatLon(0.0, 0.0), to);
            assert!(d.is_finite(), "{to:?}");
            assert!((d - sphere).abs() / sphere < 0.01, "{to:?}: {d} vs {sphere}");
        }
    }
}
