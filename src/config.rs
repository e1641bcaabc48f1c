//! Configuration management for route weather
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::RouteWeatherError;
use crate::weather::retry::{
    DEFAULT_MAX_RETRIES, DEFAULT_PACING_DELAY_MS, DEFAULT_RETRY_DELAY_SECS, RetryPolicy,
};
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteWeatherConfig {
    /// Directions provider configuration
    #[serde(default)]
    pub directions: DirectionsConfig,
    /// Weather service configuration
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Gridpoint cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Location reference table
    #[serde(default)]
    pub locations: LocationsConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Default request settings
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// OpenRouteService settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectionsConfig {
    /// OpenRouteService API key
    pub api_key: Option<String>,
    #[serde(default = "default_directions_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
}

/// National Weather Service API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Sent as the User-Agent header, required by the weather service
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Contact address sent in the From header
    pub contact: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Pause before each forecast request in milliseconds
    #[serde(default = "default_pacing_delay")]
    pub pacing_delay_ms: u64,
    /// Forecast retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Pause between forecast attempts in seconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
}

/// Gridpoint cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Gridpoint cache file
    #[serde(default = "default_cache_location")]
    pub location: String,
}

/// Location reference table settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationsConfig {
    /// JSON file with `{latitude, longitude, city, state, zip}` records
    #[serde(default = "default_locations_path")]
    pub path: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Default request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Seconds of driving between checkpoints
    #[serde(default = "default_interval")]
    pub interval_seconds: u32,
    /// Hours between now and departure
    #[serde(default)]
    pub departure_delay_hours: u32,
}

fn default_directions_base_url() -> String {
    "https://api.openrouteservice.org".to_string()
}

fn default_weather_base_url() -> String {
    "https://api.weather.gov".to_string()
}

fn default_user_agent() -> String {
    format!("route-weather/{}", crate::VERSION)
}

fn default_timeout() -> u32 {
    30
}

fn default_pacing_delay() -> u64 {
    DEFAULT_PACING_DELAY_MS
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_retry_delay() -> u64 {
    DEFAULT_RETRY_DELAY_SECS
}

fn default_cache_location() -> String {
    dirs::cache_dir()
        .map(|dir| dir.join("route-weather").join("gridpoints.bin"))
        .unwrap_or_else(|| PathBuf::from("weather_data/gridpoints.bin"))
        .to_string_lossy()
        .into_owned()
}

fn default_locations_path() -> String {
    "weather_data/zip_locs.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_interval() -> u32 {
    3600
}

impl Default for DirectionsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_directions_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            user_agent: default_user_agent(),
            contact: None,
            timeout_seconds: default_timeout(),
            pacing_delay_ms: default_pacing_delay(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            location: default_cache_location(),
        }
    }
}

impl Default for LocationsConfig {
    fn default() -> Self {
        Self {
            path: default_locations_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval(),
            departure_delay_hours: 0,
        }
    }
}

impl Default for RouteWeatherConfig {
    fn default() -> Self {
        Self {
            directions: DirectionsConfig::default(),
            weather: WeatherConfig::default(),
            cache: CacheConfig::default(),
            locations: LocationsConfig::default(),
            logging: LoggingConfig::default(),
            defaults: DefaultsConfig::default(),
        }
    }
}

impl WeatherConfig {
    /// Forecast retry policy described by this configuration
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            Duration::from_millis(self.pacing_delay_ms),
            self.max_retries,
            Duration::from_secs(self.retry_delay_secs),
        )
    }
}

impl RouteWeatherConfig {
    /// Load configuration from a file and `ROUTE_WEATHER__*` environment
    /// variables. Without a path the user config directory is used.
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // ROUTE_WEATHER__DIRECTIONS__API_KEY -> directions.api_key
        builder = builder.add_source(
            Environment::with_prefix("ROUTE_WEATHER")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: RouteWeatherConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("route-weather").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.directions.base_url.is_empty() {
            self.directions.base_url = default_directions_base_url();
        }
        if self.directions.timeout_seconds == 0 {
            self.directions.timeout_seconds = default_timeout();
        }
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.user_agent.is_empty() {
            self.weather.user_agent = default_user_agent();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_timeout();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.locations.path.is_empty() {
            self.locations.path = default_locations_path();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.defaults.interval_seconds == 0 {
            self.defaults.interval_seconds = default_interval();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        if let Some(api_key) = &self.directions.api_key {
            if api_key.is_empty() {
                return Err(RouteWeatherError::config(
                    "Directions API key cannot be empty if provided. Either remove it or provide a valid key.",
                )
                .into());
            }

            if api_key.len() < 8 {
                return Err(RouteWeatherError::config(
                    "Directions API key appears to be invalid (too short). Please check your API key.",
                )
                .into());
            }
        }

        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.directions.timeout_seconds > 300 || self.weather.timeout_seconds > 300 {
            return Err(RouteWeatherError::config("Request timeout cannot exceed 300 seconds").into());
        }

        if self.weather.max_retries > 10 {
            return Err(RouteWeatherError::config("Forecast max retries cannot exceed 10").into());
        }

        if self.weather.retry_delay_secs > 300 {
            return Err(
                RouteWeatherError::config("Forecast retry delay cannot exceed 300 seconds").into(),
            );
        }

        if self.weather.pacing_delay_ms > 60_000 {
            return Err(
                RouteWeatherError::config("Forecast pacing delay cannot exceed 60000 ms").into(),
            );
        }

        if self.defaults.interval_seconds < 60 {
            return Err(
                RouteWeatherError::config("Checkpoint interval must be at least 60 seconds").into(),
            );
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(RouteWeatherError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(RouteWeatherError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("Directions", &self.directions.base_url),
            ("Weather", &self.weather.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(RouteWeatherError::config(format!(
                    "{name} API base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}
