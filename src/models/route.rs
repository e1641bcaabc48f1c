//! Route geometry and sampled checkpoints

use serde::{Deserialize, Serialize};

use super::{Coordinate, HourlyForecast, Locality};

/// Driving route returned by the directions provider
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Route {
    /// Path geometry, first point is the departure, last the destination
    pub points: Vec<Coordinate>,
    /// Total travel time in seconds
    pub duration_seconds: f64,
    /// Total distance in meters
    pub distance_meters: f64,
}

impl Route {
    #[must_use]
    pub fn new(points: Vec<Coordinate>, duration_seconds: f64, distance_meters: f64) -> Self {
        Self {
            points,
            duration_seconds,
            distance_meters,
        }
    }
}

/// A sampled point on the route, filled in by the enricher
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Checkpoint {
    pub coordinate: Coordinate,
    /// Hourly forecast endpoint URL for this point's gridpoint
    pub endpoint: Option<String>,
    pub forecast: Option<HourlyForecast>,
    pub locality: Option<Locality>,
    pub error: bool,
    pub error_message: Option<String>,
}

impl Checkpoint {
    #[must_use]
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            endpoint: None,
            forecast: None,
            locality: None,
            error: false,
            error_message: None,
        }
    }

    /// Record a per-checkpoint failure
    pub fn fail(&mut self, message: impl Into<String>) {
        self.error = true;
        self.error_message = Some(message.into());
    }

    /// Whether the checkpoint carries both an endpoint and a forecast
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.error && self.endpoint.is_some() && self.forecast.is_some()
    }

    /// City name for display, empty when unresolved
    #[must_use]
    pub fn city(&self) -> &str {
        self.locality.as_ref().map_or("", |l| l.city.as_str())
    }
}
