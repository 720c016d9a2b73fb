//! Great-circle distance and the speed-based travel time estimate.
//!
//! Used directly as the distance cost metric, and as the fallback when a
//! travel-time lookup is unavailable or returns no usable duration.

use crate::coordinate::Coordinate;
use crate::traits::{CostMatrix, CostMatrixProvider};

/// Conservative urban driving speed used for fallback estimates.
pub const DEFAULT_FALLBACK_SPEED_KMH: f64 = 35.0;

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Haversine distance between two points in kilometers.
pub fn distance_km(from: Coordinate, to: Coordinate) -> f64 {
    let lat1_rad = from.lat.to_radians();
    let lat2_rad = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lng = (to.lng - from.lng).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).max(0.0).sqrt());

    EARTH_RADIUS_KM * c
}

/// Estimated travel time in whole seconds at `speed_kmh`.
///
/// Zero only for identical points; any two distinct points are at least one
/// second apart.
pub fn fallback_seconds(from: Coordinate, to: Coordinate, speed_kmh: f64) -> i64 {
    let km = distance_km(from, to);
    if km <= 0.0 {
        return 0;
    }
    let hours = km / speed_kmh.max(1e-6);
    ((hours * 3600.0).round() as i64).max(1)
}

/// Total length of the polyline through `points`, in kilometers.
pub fn path_length_km(points: &[Coordinate]) -> f64 {
    points
        .windows(2)
        .map(|leg| distance_km(leg[0], leg[1]))
        .sum()
}

/// Length of a planned route. With a depot, the legs depot → first stop and
/// last stop → depot are included.
pub fn route_length_km(stops: &[Coordinate], depot: Option<Coordinate>) -> f64 {
    let Some(depot) = depot else {
        return path_length_km(stops);
    };
    if stops.is_empty() {
        return 0.0;
    }
    let mut points = Vec::with_capacity(stops.len() + 2);
    points.push(depot);
    points.extend_from_slice(stops);
    points.push(depot);
    path_length_km(&points)
}

/// Pure-distance cost provider. Costs are kilometers.
#[derive(Debug, Clone, Default)]
pub struct HaversineMatrix;

impl HaversineMatrix {
    pub fn new() -> Self {
        Self
    }
}

impl CostMatrixProvider for HaversineMatrix {
    fn matrix_for(&mut self, points: &[Coordinate]) -> CostMatrix {
        let n = points.len();
        let mut matrix = vec![vec![0.0; n]; n];

        for (i, from) in points.iter().enumerate() {
            for (j, to) in points.iter().enumerate() {
                if i != j {
                    matrix[i][j] = distance_km(*from, *to);
                }
            }
        }

        matrix
    }
}
