//! Coordinate model and gridpoint key formatting

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point on the route in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Coordinate {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Build from a GeoJSON `[lon, lat]` position
    #[must_use]
    pub fn from_lon_lat(position: [f64; 2]) -> Self {
        Self::new(position[1], position[0])
    }

    /// GeoJSON `[lon, lat]` position
    #[must_use]
    pub fn to_lon_lat(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }

    /// Gridpoint key: both axes in fixed 3-decimal text.
    ///
    /// Two coordinates that format identically share a forecast endpoint,
    /// so `44.950` and `44.9500001` produce the same key.
    #[must_use]
    pub fn gridpoint_key(&self) -> (String, String) {
        (
            format!("{:.3}", self.latitude),
            format!("{:.3}", self.longitude),
        )
    }

    /// L1 (Manhattan) distance in degrees
    #[must_use]
    pub fn manhattan_distance(&self, other: &Coordinate) -> f64 {
        (self.longitude - other.longitude).abs() + (self.latitude - other.latitude).abs()
    }

    /// Round coordinates to the given number of decimals
    #[must_use]
    pub fn rounded(&self, precision: u32) -> Coordinate {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(3));
        Coordinate {
            latitude: (self.latitude * multiplier).round() / multiplier,
            longitude: (self.longitude * multiplier).round() / multiplier,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}
