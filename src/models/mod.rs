//! Data models for route weather
//!
//! - Location: coordinates and gridpoint keys
//! - Route: route geometry and sampled checkpoints
//! - Forecast: hourly forecast periods

pub mod forecast;
pub mod location;
pub mod route;

pub use forecast::{FORECAST_HORIZON_HOURS, ForecastPeriod, HourlyForecast};
pub use location::Coordinate;
pub use route::{Checkpoint, Route};

pub use crate::locality::Locality;
