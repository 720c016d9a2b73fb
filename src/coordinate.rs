//! WGS84 coordinate value type.

use serde::{Deserialize, Serialize};

/// A (latitude, longitude) pair in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Key used by the cost cache: both components rounded to `precision`
    /// decimals, rendered as `"lat,lng"`.
    pub fn cache_key(&self, precision: u32) -> String {
        let p = precision as usize;
        format!(
            "{:.*},{:.*}",
            p,
            round_to(self.lat, precision),
            p,
            round_to(self.lng, precision)
        )
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self { lat, lng }
    }
}

fn round_to(value: f64, precision: u32) -> f64 {
    let scale = 10f64.powi(precision as i32);
    let rounded = (value * scale).round() / scale;
    // -0.0 and 0.0 must share a key
    if rounded == 0.0 { 0.0 } else { rounded }
}
