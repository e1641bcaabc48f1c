//! Forecast enrichment of a route
//!
//! Owns the request sequence: fetch the route, sample it into checkpoints,
//! then for every checkpoint in order resolve its forecast endpoint through
//! the gridpoint cache, fetch the hourly forecast and attach the nearest
//! locality. A failing checkpoint is marked and the sequence moves on; only
//! route-level failures abort the request.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::cache::SharedGridpointCache;
use crate::icons::{self, IconKey};
use crate::locality::{Locality, LocationTable};
use crate::models::{Checkpoint, Coordinate, FORECAST_HORIZON_HOURS, Route};
use crate::routing::DirectionsSource;
use crate::sampler;
use crate::weather::{EndpointResolver, ForecastSource};
use crate::{Result, RouteWeatherError};

/// Default spacing between checkpoints, one hour of driving
pub const DEFAULT_INTERVAL_SECONDS: f64 = 3600.0;

/// A planned route with its enriched checkpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteWeather {
    pub route: Route,
    pub checkpoints: Vec<Checkpoint>,
    /// Point for centering a map on the route
    pub center: Coordinate,
}

impl RouteWeather {
    #[must_use]
    pub fn report(&self, delay_hours: usize) -> Vec<CheckpointReport> {
        report(&self.checkpoints, delay_hours)
    }
}

/// Display line for one checkpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointReport {
    pub coordinate: Coordinate,
    /// Forecast hour shown for this checkpoint
    pub hour: usize,
    pub locality: Locality,
    /// `None` when no forecast could be shown
    pub icon: Option<IconKey>,
    pub summary: String,
    pub error: bool,
}

pub struct ForecastEnricher<D, W> {
    directions: D,
    weather: W,
    cache: SharedGridpointCache,
    locations: LocationTable,
    interval_seconds: f64,
}

impl<D, W> ForecastEnricher<D, W>
where
    D: DirectionsSource,
    W: EndpointResolver + ForecastSource,
{
    #[must_use]
    pub fn new(
        directions: D,
        weather: W,
        cache: SharedGridpointCache,
        locations: LocationTable,
    ) -> Self {
        Self {
            directions,
            weather,
            cache,
            locations,
            interval_seconds: DEFAULT_INTERVAL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_interval(mut self, interval_seconds: f64) -> Self {
        self.interval_seconds = interval_seconds;
        self
    }

    #[must_use]
    pub fn cache(&self) -> &SharedGridpointCache {
        &self.cache
    }

    /// Fetch the route between two points and enrich it
    #[instrument(skip(self, depart, destination), fields(depart = %depart, destination = %destination))]
    pub async fn plan(&self, depart: &Coordinate, destination: &Coordinate) -> Result<RouteWeather> {
        let route = self.directions.fetch_route(depart, destination).await?;
        let checkpoints = self.enrich(&route, self.interval_seconds).await?;
        let center = sampler::midpoint(&route)?;
        Ok(RouteWeather {
            route,
            checkpoints,
            center,
        })
    }

    /// Sample `route` and attach a forecast and locality to each checkpoint
    #[instrument(skip(self, route), fields(points = route.points.len()))]
    pub async fn enrich(&self, route: &Route, interval_seconds: f64) -> Result<Vec<Checkpoint>> {
        let mut checkpoints = sampler::sample(route, interval_seconds)?;

        for (index, checkpoint) in checkpoints.iter_mut().enumerate() {
            if let Err(e) = self.enrich_checkpoint(checkpoint).await {
                if e.is_route_level() {
                    return Err(e);
                }
                warn!("Checkpoint {index} at {} failed: {e}", checkpoint.coordinate);
                checkpoint.fail(e.user_message());
            }
            checkpoint.locality = Some(self.locations.nearest(&checkpoint.coordinate));
        }

        let failed = checkpoints.iter().filter(|c| c.error).count();
        info!(
            "Enriched {} checkpoints, {failed} without forecast",
            checkpoints.len()
        );
        Ok(checkpoints)
    }

    async fn enrich_checkpoint(&self, checkpoint: &mut Checkpoint) -> Result<()> {
        let endpoint = self
            .cache
            .resolve_endpoint(&checkpoint.coordinate, &self.weather)
            .await?;
        let forecast = self.weather.fetch_forecast(&endpoint).await;
        checkpoint.endpoint = Some(endpoint);
        checkpoint.forecast = Some(forecast?);
        Ok(())
    }
}

/// One display line per checkpoint.
///
/// Checkpoint `i` shows forecast hour `i + delay_hours`. Hours past the
/// forecast horizon, failed checkpoints and unmappable conditions produce
/// an error line instead of a forecast.
#[must_use]
pub fn report(checkpoints: &[Checkpoint], delay_hours: usize) -> Vec<CheckpointReport> {
    checkpoints
        .iter()
        .enumerate()
        .map(|(index, checkpoint)| {
            let hour = index + delay_hours;
            let locality = checkpoint.locality.clone().unwrap_or_default();
            let line = |icon: Option<IconKey>, summary: String, error: bool| CheckpointReport {
                coordinate: checkpoint.coordinate,
                hour,
                locality: locality.clone(),
                icon,
                summary,
                error,
            };

            if hour >= FORECAST_HORIZON_HOURS {
                let err = RouteWeatherError::HorizonExceeded {
                    hour,
                    horizon: FORECAST_HORIZON_HOURS,
                };
                return line(None, error_summary(checkpoint, &err.user_message()), true);
            }

            let forecast = match (&checkpoint.forecast, checkpoint.error) {
                (Some(forecast), false) => forecast,
                _ => {
                    let message = checkpoint
                        .error_message
                        .as_deref()
                        .unwrap_or("Forecast currently unavailable for this location.");
                    return line(None, error_summary(checkpoint, message), true);
                }
            };

            match icons::describe(forecast, hour, checkpoint.city()) {
                Ok(descriptor) => line(Some(descriptor.icon), descriptor.summary, false),
                Err(e) => {
                    warn!("No descriptor for checkpoint {index}: {e}");
                    line(None, error_summary(checkpoint, &e.user_message()), true)
                }
            }
        })
        .collect()
}

fn error_summary(checkpoint: &Checkpoint, message: &str) -> String {
    format!("{} - {message}", checkpoint.city())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::GridpointCache;
    use crate::locality::LocationRecord;
    use crate::models::HourlyForecast;
    use crate::models::forecast::fixtures::period;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct FakeDirections {
        route: Option<Route>,
    }

    impl DirectionsSource for FakeDirections {
        async fn fetch_route(&self, _: &Coordinate, _: &Coordinate) -> Result<Route> {
            self.route
                .clone()
                .ok_or_else(|| RouteWeatherError::routing("Could not find routable point"))
        }
    }

    /// Weather fake keyed by gridpoint latitude
    #[derive(Default)]
    struct FakeWeather {
        unresolvable: HashSet<String>,
        no_forecast: HashSet<String>,
        forecast_calls: AtomicUsize,
    }

    impl EndpointResolver for FakeWeather {
        async fn resolve_endpoint(&self, coordinate: &Coordinate) -> Result<String> {
            let (lat, lon) = coordinate.gridpoint_key();
            if self.unresolvable.contains(&lat) {
                return Err(RouteWeatherError::endpoint_resolution("Invalid Parameter"));
            }
            Ok(format!("https://nws.test/{lat}/{lon}/forecast/hourly"))
        }
    }

    impl ForecastSource for FakeWeather {
        async fn fetch_forecast(&self, endpoint: &str) -> Result<HourlyForecast> {
            self.forecast_calls.fetch_add(1, Ordering::SeqCst);
            if self.no_forecast.iter().any(|lat| endpoint.contains(lat.as_str())) {
                return Err(RouteWeatherError::forecast_unavailable(
                    "no valid forecast after 4 attempts",
                ));
            }
            Ok(HourlyForecast::new(vec![
                period(
                    "2021-05-21T09:00:00-05:00",
                    "https://api.weather.gov/icons/land/day/skc?size=small",
                    true,
                ),
                period(
                    "2021-05-21T10:00:00-05:00",
                    "https://api.weather.gov/icons/land/day/ovc?size=small",
                    true,
                ),
                period(
                    "2021-05-21T11:00:00-05:00",
                    "https://api.weather.gov/icons/land/day/rain?size=small",
                    true,
                ),
            ]))
        }
    }

    fn three_point_route() -> Route {
        Route::new(
            vec![
                Coordinate::new(0.0, 0.0),
                Coordinate::new(0.5, 0.5),
                Coordinate::new(1.0, 1.0),
            ],
            7200.0,
            150_000.0,
        )
    }

    fn locations() -> LocationTable {
        LocationTable::new(vec![
            LocationRecord {
                latitude: 0.0,
                longitude: 0.0,
                city: "Origin".into(),
                state: "NA".into(),
                zip: "00001".into(),
            },
            LocationRecord {
                latitude: 1.0,
                longitude: 1.0,
                city: "Terminus".into(),
                state: "NA".into(),
                zip: "00002".into(),
            },
        ])
    }

    fn enricher(
        dir: &TempDir,
        route: Option<Route>,
        weather: FakeWeather,
    ) -> ForecastEnricher<FakeDirections, FakeWeather> {
        let cache = GridpointCache::load(dir.path().join("gridpoints.bin")).unwrap();
        ForecastEnricher::new(
            FakeDirections { route },
            weather,
            SharedGridpointCache::new(cache),
            locations(),
        )
    }

    #[tokio::test]
    async fn test_enrich_fills_every_checkpoint() {
        let dir = TempDir::new().unwrap();
        let enricher = enricher(&dir, None, FakeWeather::default());

        let checkpoints = enricher.enrich(&three_point_route(), 3600.0).await.unwrap();

        assert_eq!(checkpoints.len(), 2);
        assert!(checkpoints.iter().all(Checkpoint::is_complete));
        assert_eq!(checkpoints[0].city(), "Origin");
        assert_eq!(checkpoints[1].city(), "Terminus");
        assert_eq!(enricher.cache().len().await, 2);
    }

    #[tokio::test]
    async fn test_forecast_failure_marks_only_that_checkpoint() {
        let dir = TempDir::new().unwrap();
        let weather = FakeWeather {
            no_forecast: HashSet::from(["1.000".to_string()]),
            ..FakeWeather::default()
        };
        let enricher = enricher(&dir, None, weather);

        let checkpoints = enricher.enrich(&three_point_route(), 3600.0).await.unwrap();

        assert!(checkpoints[0].is_complete());
        let failed = &checkpoints[1];
        assert!(failed.error);
        assert!(failed.endpoint.is_some());
        assert!(failed.forecast.is_none());
        assert_eq!(
            failed.error_message.as_deref(),
            Some("Forecast currently unavailable for this location.")
        );
        assert_eq!(failed.city(), "Terminus");
    }

    #[tokio::test]
    async fn test_endpoint_failure_skips_forecast() {
        let dir = TempDir::new().unwrap();
        let weather = FakeWeather {
            unresolvable: HashSet::from(["0.000".to_string()]),
            ..FakeWeather::default()
        };
        let enricher = enricher(&dir, None, weather);

        let checkpoints = enricher.enrich(&three_point_route(), 3600.0).await.unwrap();

        assert!(checkpoints[0].error);
        assert!(checkpoints[0].endpoint.is_none());
        assert_eq!(
            checkpoints[0].error_message.as_deref(),
            Some("No weather service coverage for this location.")
        );
        assert!(checkpoints[1].is_complete());
        assert_eq!(enricher.weather.forecast_calls.load(Ordering::SeqCst), 1);
        assert_eq!(enricher.cache().len().await, 1);
    }

    #[tokio::test]
    async fn test_short_route_aborts_request() {
        let dir = TempDir::new().unwrap();
        let enricher = enricher(&dir, None, FakeWeather::default());
        let mut route = three_point_route();
        route.duration_seconds = 1800.0;

        let err = enricher.enrich(&route, 3600.0).await.unwrap_err();
        assert!(matches!(err, RouteWeatherError::InvalidRoute { .. }));
        assert_eq!(enricher.weather.forecast_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_plan_routing_failure_aborts() {
        let dir = TempDir::new().unwrap();
        let enricher = enricher(&dir, None, FakeWeather::default());

        let err = enricher
            .plan(&Coordinate::new(0.0, 0.0), &Coordinate::new(1.0, 1.0))
            .await
            .unwrap_err();
        assert!(err.is_route_level());
    }

    #[tokio::test]
    async fn test_plan_returns_route_checkpoints_and_center() {
        let dir = TempDir::new().unwrap();
        let enricher = enricher(&dir, Some(three_point_route()), FakeWeather::default());

        let planned = enricher
            .plan(&Coordinate::new(0.0, 0.0), &Coordinate::new(1.0, 1.0))
            .await
            .unwrap();

        assert_eq!(planned.route.points.len(), 3);
        assert_eq!(planned.checkpoints.len(), 2);
        assert_eq!(planned.center, Coordinate::new(0.5, 0.5));
    }

    #[tokio::test]
    async fn test_report_lines() {
        let dir = TempDir::new().unwrap();
        let weather = FakeWeather {
            no_forecast: HashSet::from(["1.000".to_string()]),
            ..FakeWeather::default()
        };
        let enricher = enricher(&dir, None, weather);
        let checkpoints = enricher.enrich(&three_point_route(), 3600.0).await.unwrap();

        let lines = report(&checkpoints, 0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].icon, Some(IconKey::ClearDay));
        assert_eq!(lines[0].summary, "09:00 - Origin - Sunny 72F Wind: 10 mph");
        assert!(!lines[0].error);
        assert!(lines[1].error);
        assert!(lines[1].icon.is_none());
        assert_eq!(
            lines[1].summary,
            "Terminus - Forecast currently unavailable for this location."
        );
    }

    #[tokio::test]
    async fn test_report_with_delay_uses_later_hours() {
        let dir = TempDir::new().unwrap();
        let enricher = enricher(&dir, None, FakeWeather::default());
        let checkpoints = enricher.enrich(&three_point_route(), 3600.0).await.unwrap();

        let lines = report(&checkpoints, 1);
        assert_eq!(lines[0].hour, 1);
        assert_eq!(lines[0].icon, Some(IconKey::Cloudy));
        assert_eq!(lines[1].hour, 2);
        assert_eq!(lines[1].icon, Some(IconKey::Rain));
    }

    #[tokio::test]
    async fn test_report_beyond_horizon() {
        let dir = TempDir::new().unwrap();
        let enricher = enricher(&dir, None, FakeWeather::default());
        let checkpoints = enricher.enrich(&three_point_route(), 3600.0).await.unwrap();

        let lines = report(&checkpoints, FORECAST_HORIZON_HOURS);
        assert!(lines.iter().all(|l| l.error && l.icon.is_none()));
        assert!(lines[0].summary.contains("not available that far ahead"));

        // Within the horizon but past the fetched periods
        let lines = report(&checkpoints, 10);
        assert!(lines.iter().all(|l| l.error));
    }
}
