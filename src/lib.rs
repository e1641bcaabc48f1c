//! `route-weather` - hour-by-hour weather along a driving route
//!
//! Fetches a driving route, samples it into roughly hourly checkpoints and
//! attaches the National Weather Service hourly forecast for the place and
//! time each checkpoint is reached.

pub mod cache;
pub mod config;
pub mod enricher;
pub mod error;
pub mod icons;
pub mod locality;
pub mod logging;
pub mod models;
pub mod routing;
pub mod sampler;
pub mod weather;

// Re-export core types for public API
pub use cache::{GridpointCache, GridpointEntry, SharedGridpointCache};
pub use config::RouteWeatherConfig;
pub use enricher::{CheckpointReport, ForecastEnricher, RouteWeather, report};
pub use error::RouteWeatherError;
pub use icons::{Descriptor, IconKey, describe};
pub use locality::{Locality, LocationRecord, LocationTable};
pub use models::{Checkpoint, Coordinate, ForecastPeriod, HourlyForecast, Route};
pub use routing::{DirectionsSource, OrsClient};
pub use weather::{EndpointResolver, ForecastSource, NwsClient, RetryPolicy};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, RouteWeatherError>;
