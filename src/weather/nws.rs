//! National Weather Service API client
//!
//! Resolves `points/{lat},{lon}` to the hourly forecast endpoint of the
//! covering gridpoint and fetches that forecast. The forecast endpoint is
//! known to answer with a non-`Feature` payload under load, so forecast
//! fetches run under the configured `RetryPolicy`.

use reqwest::Client;
use reqwest::header::{FROM, HeaderMap, HeaderValue};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument};

use super::retry::{AttemptError, RetryPolicy, with_retry};
use super::{EndpointResolver, ForecastSource};
use crate::config::WeatherConfig;
use crate::models::{Coordinate, ForecastPeriod, HourlyForecast};
use crate::{Result, RouteWeatherError};

/// Payload type of a usable forecast
const FEATURE_TYPE: &str = "Feature";

#[derive(Debug, Deserialize)]
struct PointsResponse {
    properties: Option<PointsProperties>,
    title: Option<String>,
    detail: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PointsProperties {
    forecast_hourly: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(rename = "type")]
    kind: Option<String>,
    properties: Option<ForecastProperties>,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastProperties {
    updated: Option<String>,
    #[serde(default)]
    periods: Vec<PeriodPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PeriodPayload {
    number: u32,
    start_time: chrono::DateTime<chrono::FixedOffset>,
    #[serde(default)]
    short_forecast: String,
    temperature: i32,
    #[serde(default)]
    temperature_unit: String,
    #[serde(default)]
    wind_speed: String,
    #[serde(default)]
    icon: String,
    is_daytime: bool,
}

impl From<PeriodPayload> for ForecastPeriod {
    fn from(p: PeriodPayload) -> Self {
        Self {
            number: p.number,
            start_time: p.start_time,
            short_forecast: p.short_forecast,
            temperature: p.temperature,
            temperature_unit: p.temperature_unit,
            wind_speed: p.wind_speed,
            icon: p.icon,
            is_daytime: p.is_daytime,
        }
    }
}

/// Client for api.weather.gov
#[derive(Debug, Clone)]
pub struct NwsClient {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl NwsClient {
    /// Build a client from configuration.
    ///
    /// The weather service rejects requests without a `User-Agent`; the
    /// optional contact address is sent as `From`.
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(contact) = &config.contact {
            let value = HeaderValue::from_str(contact).map_err(|e| {
                RouteWeatherError::config(format!("invalid weather contact '{contact}': {e}"))
            })?;
            headers.insert(FROM, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(u64::from(config.timeout_seconds)))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| RouteWeatherError::config(format!("cannot build weather client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry: config.retry_policy(),
        })
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// One forecast request, classified for the retry loop
    async fn attempt_forecast(
        &self,
        endpoint: &str,
    ) -> std::result::Result<HourlyForecast, AttemptError> {
        let response = self
            .client
            .get(endpoint)
            .send()
            .await
            .map_err(|e| {
                if e.is_builder() {
                    AttemptError::Fatal(RouteWeatherError::forecast_unavailable(format!(
                        "invalid forecast request for '{endpoint}': {e}"
                    )))
                } else {
                    AttemptError::Retryable(format!("request failed: {e}"))
                }
            })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AttemptError::Retryable(format!("cannot read body: {e}")))?;

        let payload: ForecastResponse = serde_json::from_str(&body).map_err(|e| {
            AttemptError::Retryable(format!("unparsable forecast (HTTP {status}): {e}"))
        })?;

        let kind = payload.kind.unwrap_or_default();
        if kind != FEATURE_TYPE {
            let title = payload.title.unwrap_or_else(|| "no title".to_string());
            return Err(AttemptError::Retryable(format!(
                "HTTP {status}, type '{kind}': {title}"
            )));
        }

        let properties = payload
            .properties
            .ok_or_else(|| AttemptError::Retryable("forecast without properties".to_string()))?;

        Ok(HourlyForecast {
            periods: properties.periods.into_iter().map(Into::into).collect(),
            updated: properties.updated,
        })
    }
}

impl EndpointResolver for NwsClient {
    #[instrument(skip(self, coordinate), fields(coordinate = %coordinate))]
    async fn resolve_endpoint(&self, coordinate: &Coordinate) -> Result<String> {
        let (lat, lon) = coordinate.gridpoint_key();
        let url = format!("{}/points/{lat},{lon}", self.base_url);
        debug!("Resolving gridpoint via {url}");

        let response = self.client.get(&url).send().await.map_err(|e| {
            RouteWeatherError::endpoint_resolution(format!("request to {url} failed: {e}"))
        })?;
        let status = response.status();
        let payload: PointsResponse = response.json().await.map_err(|e| {
            RouteWeatherError::endpoint_resolution(format!(
                "unparsable points response (HTTP {status}): {e}"
            ))
        })?;

        match payload.properties.and_then(|p| p.forecast_hourly) {
            Some(endpoint) => {
                info!("Gridpoint {lat},{lon} resolved to {endpoint}");
                Ok(endpoint)
            }
            None => {
                let title = payload.title.unwrap_or_else(|| format!("HTTP {status}"));
                let message = match payload.detail {
                    Some(detail) => format!("{title}: {detail}"),
                    None => title,
                };
                Err(RouteWeatherError::endpoint_resolution(message))
            }
        }
    }
}

impl ForecastSource for NwsClient {
    #[instrument(skip(self))]
    async fn fetch_forecast(&self, endpoint: &str) -> Result<HourlyForecast> {
        let forecast = with_retry(&self.retry, |_| self.attempt_forecast(endpoint)).await?;
        info!("Fetched {} forecast periods", forecast.periods.len());
        Ok(forecast)
    }
}
