//! Driving directions from OpenRouteService
//!
//! Fetches the GeoJSON driving route between two coordinates. Failures are
//! request-level: without a route there is nothing to sample.

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

use crate::config::DirectionsConfig;
use crate::models::{Coordinate, Route};
use crate::{Result, RouteWeatherError};

const DIRECTIONS_PATH: &str = "/v2/directions/driving-car/geojson";

/// Source of driving routes
pub trait DirectionsSource {
    async fn fetch_route(&self, depart: &Coordinate, destination: &Coordinate) -> Result<Route>;
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    features: Vec<RouteFeature>,
    error: Option<UpstreamError>,
}

/// ORS reports errors either as `{code, message}` or as a bare string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UpstreamError {
    Detailed { code: Option<i64>, message: String },
    Plain(String),
}

impl UpstreamError {
    fn describe(&self) -> String {
        match self {
            Self::Detailed {
                code: Some(code),
                message,
            } => format!("{message} (code {code})"),
            Self::Detailed { code: None, message } => message.clone(),
            Self::Plain(message) => message.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RouteFeature {
    properties: FeatureProperties,
    geometry: LineString,
}

#[derive(Debug, Deserialize)]
struct FeatureProperties {
    #[serde(default)]
    summary: RouteSummary,
}

#[derive(Debug, Default, Deserialize)]
struct RouteSummary {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct LineString {
    coordinates: Vec<Vec<f64>>,
}

impl RouteFeature {
    fn into_route(self) -> Result<Route> {
        let points = self
            .geometry
            .coordinates
            .iter()
            .map(|pair| match pair.as_slice() {
                [lon, lat, ..] => Ok(Coordinate::from_lon_lat([*lon, *lat])),
                _ => Err(RouteWeatherError::routing(format!(
                    "ORS Routing Error: malformed coordinate {pair:?}"
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Route::new(
            points,
            self.properties.summary.duration,
            self.properties.summary.distance,
        ))
    }
}

/// OpenRouteService directions client
#[derive(Debug, Clone)]
pub struct OrsClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OrsClient {
    pub fn new(config: &DirectionsConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            RouteWeatherError::config(
                "Directions API key missing. Set directions.api_key or ROUTE_WEATHER__DIRECTIONS__API_KEY.",
            )
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(u64::from(config.timeout_seconds)))
            .user_agent(format!("route-weather/{}", crate::VERSION))
            .build()
            .map_err(|e| {
                RouteWeatherError::config(format!("cannot build directions client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

impl DirectionsSource for OrsClient {
    #[instrument(skip(self, depart, destination), fields(depart = %depart, destination = %destination))]
    async fn fetch_route(&self, depart: &Coordinate, destination: &Coordinate) -> Result<Route> {
        let url = format!("{}{DIRECTIONS_PATH}", self.base_url);
        let body = json!({
            "coordinates": [depart.to_lon_lat(), destination.to_lon_lat()],
            "radiuses": [-1, -1],
        });
        debug!("Requesting directions from {url}");

        let response = self
            .client
            .post(&url)
            .header("Authorization", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RouteWeatherError::routing(format!("ORS Routing Error: {e}")))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RouteWeatherError::routing(format!("ORS Routing Error: {e}")))?;

        let payload: DirectionsResponse = serde_json::from_str(&text).map_err(|e| {
            error!("Failed to parse directions response (HTTP {status}): {e}. Body: {text}");
            RouteWeatherError::routing(format!(
                "ORS Routing Error: unparsable response (HTTP {status})"
            ))
        })?;

        if let Some(upstream) = payload.error {
            return Err(RouteWeatherError::routing(upstream.describe()));
        }

        let feature = payload.features.into_iter().next().ok_or_else(|| {
            RouteWeatherError::routing(format!("No route found (HTTP {status})"))
        })?;
        let route = feature.into_route()?;

        info!(
            "Route with {} points, {:.0} s, {:.0} m",
            route.points.len(),
            route.duration_seconds,
            route.distance_meters
        );
        Ok(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OrsClient {
        OrsClient::new(&DirectionsConfig {
            api_key: Some("test-ors-key".to_string()),
            base_url: server.uri(),
            timeout_seconds: 5,
        })
        .unwrap()
    }

    fn minneapolis() -> Coordinate {
        Coordinate::new(44.9537, -93.09)
    }

    fn sioux_falls() -> Coordinate {
        Coordinate::new(43.5446, -96.7311)
    }

    #[tokio::test]
    async fn test_fetch_route_parses_geojson() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(DIRECTIONS_PATH))
            .and(header("Authorization", "test-ors-key"))
            .and(body_json(json!({
                "coordinates": [[-93.09, 44.9537], [-96.7311, 43.5446]],
                "radiuses": [-1, -1]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "properties": {"summary": {"distance": 385_000.0, "duration": 14_400.0}},
                    "geometry": {
                        "type": "LineString",
                        "coordinates": [[-93.09, 44.9537], [-94.5, 44.2], [-96.7311, 43.5446]]
                    }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let route = client_for(&server)
            .fetch_route(&minneapolis(), &sioux_falls())
            .await
            .unwrap();

        assert_eq!(route.points.len(), 3);
        assert_eq!(route.points[1], Coordinate::new(44.2, -94.5));
        assert_eq!(route.duration_seconds, 14_400.0);
        assert_eq!(route.distance_meters, 385_000.0);
    }

    #[tokio::test]
    async fn test_upstream_error_object_is_routing_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"code": 2010, "message": "Could not find routable point within a radius"}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_route(&minneapolis(), &sioux_falls())
            .await
            .unwrap_err();
        assert!(err.is_route_level());
        assert!(err.to_string().contains("Could not find routable point"));
        assert!(err.to_string().contains("2010"));
    }

    #[tokio::test]
    async fn test_plain_string_error_is_routing_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": "Access to this API has been disallowed"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_route(&minneapolis(), &sioux_falls())
            .await
            .unwrap_err();
        assert!(matches!(err, RouteWeatherError::Routing { .. }));
        assert!(err.to_string().contains("disallowed"));
    }

    #[tokio::test]
    async fn test_unparsable_body_is_ors_routing_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_route(&minneapolis(), &sioux_falls())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ORS Routing Error"));
    }

    #[tokio::test]
    async fn test_empty_feature_collection_is_routing_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"type": "FeatureCollection", "features": []})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_route(&minneapolis(), &sioux_falls())
            .await
            .unwrap_err();
        assert!(matches!(err, RouteWeatherError::Routing { .. }));
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let err = OrsClient::new(&DirectionsConfig::default()).unwrap_err();
        assert!(matches!(err, RouteWeatherError::Config { .. }));
    }
}
