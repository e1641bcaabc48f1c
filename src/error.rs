//! Error types and handling for the route weather pipeline

use thiserror::Error;

/// Main error type for route weather enrichment
#[derive(Error, Debug)]
pub enum RouteWeatherError {
    /// The route cannot be sampled (too short, degenerate geometry)
    #[error("Invalid route: {message}")]
    InvalidRoute { message: String },

    /// The directions provider failed or returned an error payload
    #[error("Routing error: {message}")]
    Routing { message: String },

    /// The weather endpoint for a coordinate could not be resolved
    #[error("Endpoint resolution error: {message}")]
    EndpointResolution { message: String },

    /// No valid forecast after the retry budget was spent
    #[error("Forecast unavailable: {message}")]
    ForecastUnavailable { message: String },

    /// The forecast icon carries a condition code with no display mapping
    #[error("Unknown condition code: {code}")]
    UnknownConditionCode { code: String },

    /// Requested hour lies beyond the forecast horizon
    #[error("Hour {hour} is beyond the forecast horizon of {horizon} hours")]
    HorizonExceeded { hour: usize, horizon: usize },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Gridpoint cache persistence errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// Location reference table errors
    #[error("Location data error: {message}")]
    LocationData { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl RouteWeatherError {
    pub fn invalid_route<S: Into<String>>(message: S) -> Self {
        Self::InvalidRoute {
            message: message.into(),
        }
    }

    pub fn routing<S: Into<String>>(message: S) -> Self {
        Self::Routing {
            message: message.into(),
        }
    }

    pub fn endpoint_resolution<S: Into<String>>(message: S) -> Self {
        Self::EndpointResolution {
            message: message.into(),
        }
    }

    pub fn forecast_unavailable<S: Into<String>>(message: S) -> Self {
        Self::ForecastUnavailable {
            message: message.into(),
        }
    }

    pub fn unknown_condition<S: Into<String>>(code: S) -> Self {
        Self::UnknownConditionCode { code: code.into() }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn location_data<S: Into<String>>(message: S) -> Self {
        Self::LocationData {
            message: message.into(),
        }
    }

    /// Errors that abort a whole request instead of a single checkpoint
    #[must_use]
    pub fn is_route_level(&self) -> bool {
        matches!(self, Self::InvalidRoute { .. } | Self::Routing { .. })
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidRoute { message } => {
                format!("Route is too short or degenerate to sample: {message}")
            }
            Self::Routing { message } => format!("Unable to plan the route: {message}"),
            Self::EndpointResolution { .. } => {
                "No weather service coverage for this location.".to_string()
            }
            Self::ForecastUnavailable { .. } => {
                "Forecast currently unavailable for this location.".to_string()
            }
            Self::UnknownConditionCode { code } => {
                format!("Unrecognized weather condition '{code}'.")
            }
            Self::HorizonExceeded { .. } => {
                "Forecast is not available that far ahead.".to_string()
            }
            Self::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            Self::Cache { .. } => {
                "Gridpoint cache operation failed. You may need to reset the cache.".to_string()
            }
            Self::LocationData { message } => format!("Location data problem: {message}"),
            Self::Io { .. } => "File operation failed. Please check file permissions.".to_string(),
        }
    }
}
