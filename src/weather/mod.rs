//! Weather service access
//!
//! Two seams separate the enricher from the weather service: resolving the
//! hourly forecast endpoint for a coordinate, and fetching the forecast
//! behind such an endpoint. `NwsClient` implements both against
//! api.weather.gov.

use crate::Result;
use crate::models::{Coordinate, HourlyForecast};

pub mod nws;
pub mod retry;

pub use nws::NwsClient;
pub use retry::{AttemptError, RetryPolicy, with_retry};

/// Finds the hourly forecast endpoint covering a coordinate
pub trait EndpointResolver {
    async fn resolve_endpoint(&self, coordinate: &Coordinate) -> Result<String>;
}

/// Fetches the hourly forecast published at an endpoint
pub trait ForecastSource {
    async fn fetch_forecast(&self, endpoint: &str) -> Result<HourlyForecast>;
}
