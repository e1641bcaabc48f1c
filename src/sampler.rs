//! Route sampling
//!
//! Splits a route into checkpoints roughly one `interval` of driving apart.
//! Spacing is calibrated on the L1 displacement between the route's two
//! endpoints while the walk follows the real path, so on curved routes the
//! checkpoints are not evenly spaced in distance or time.

use tracing::debug;

use crate::models::{Checkpoint, Coordinate, Route};
use crate::{Result, RouteWeatherError};

/// Checkpoint count used by midpoint mode
const MIDPOINT_CHECKPOINTS: u32 = 2;

/// Sample `route` into ordered checkpoints, one per `interval_seconds`.
///
/// The departure is always checkpoint 0 and the final checkpoint is always
/// the exact destination. The destination is never produced by the walk
/// itself: it replaces the last walked checkpoint, or is appended when the
/// walk produced none.
pub fn sample(route: &Route, interval_seconds: f64) -> Result<Vec<Checkpoint>> {
    if !interval_seconds.is_finite() || interval_seconds <= 0.0 {
        return Err(RouteWeatherError::invalid_route(format!(
            "interval must be a positive number of seconds, got {interval_seconds}"
        )));
    }
    if !route.duration_seconds.is_finite() || route.duration_seconds < 0.0 {
        return Err(RouteWeatherError::invalid_route(format!(
            "route duration {} is not a valid number of seconds",
            route.duration_seconds
        )));
    }

    let count = (route.duration_seconds / interval_seconds).floor();
    if count < 1.0 {
        return Err(RouteWeatherError::invalid_route(format!(
            "route duration {:.0}s is shorter than the {interval_seconds:.0}s interval",
            route.duration_seconds
        )));
    }

    // Truncation is fine, a route would need ~4e9 intervals to overflow
    let count = count.min(f64::from(u32::MAX)) as u32;
    let (first, last, step) = spacing(route, count)?;

    let interior = &route.points[..route.points.len() - 1];
    let mut checkpoints = vec![Checkpoint::new(first)];
    checkpoints.extend(Walk::new(interior, step).map(Checkpoint::new));

    if checkpoints.len() > 1 {
        if let Some(final_checkpoint) = checkpoints.last_mut() {
            *final_checkpoint = Checkpoint::new(last);
        }
    } else {
        checkpoints.push(Checkpoint::new(last));
    }

    debug!(
        "Sampled {} checkpoints from {} route points (count {count}, step {step:.5})",
        checkpoints.len(),
        route.points.len()
    );
    Ok(checkpoints)
}

/// Representative point for centering a display on the route.
///
/// Runs the walk with a fixed count of two and returns its first emission.
/// Neither the departure nor the destination override applies here.
pub fn midpoint(route: &Route) -> Result<Coordinate> {
    let (_, _, step) = spacing(route, MIDPOINT_CHECKPOINTS)?;
    Walk::new(&route.points, step)
        .next()
        .ok_or_else(|| RouteWeatherError::invalid_route("route walk produced no midpoint"))
}

/// Endpoints and per-checkpoint L1 step for `count` checkpoints
fn spacing(route: &Route, count: u32) -> Result<(Coordinate, Coordinate, f64)> {
    let (first, last) = match route.points.as_slice() {
        [first, .., last] => (*first, *last),
        _ => {
            return Err(RouteWeatherError::invalid_route(format!(
                "route needs at least two points, got {}",
                route.points.len()
            )));
        }
    };

    let span = first.manhattan_distance(&last);
    if !span.is_finite() || span <= 0.0 {
        return Err(RouteWeatherError::invalid_route(
            "departure and destination coincide, cannot space checkpoints",
        ));
    }

    Ok((first, last, span / f64::from(count)))
}

/// Emits path points each time the accumulated L1 distance reaches the
/// next multiple of `step`. The first point only seeds the walk.
struct Walk<'a> {
    points: &'a [Coordinate],
    index: usize,
    travelled: f64,
    target: f64,
    step: f64,
}

impl<'a> Walk<'a> {
    fn new(points: &'a [Coordinate], step: f64) -> Self {
        Self {
            points,
            index: 1,
            travelled: 0.0,
            target: step,
            step,
        }
    }
}

impl Iterator for Walk<'_> {
    type Item = Coordinate;

    fn next(&mut self) -> Option<Coordinate> {
        while self.index < self.points.len() {
            let previous = self.points[self.index - 1];
            let current = self.points[self.index];
            self.index += 1;

            self.travelled += current.manhattan_distance(&previous);
            if self.travelled >= self.target {
                self.target += self.step;
                return Some(current);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn route(points: &[(f64, f64)], duration: f64) -> Route {
        Route::new(
            points
                .iter()
                .map(|&(lat, lon)| Coordinate::new(lat, lon))
                .collect(),
            duration,
            100_000.0,
        )
    }

    fn coords(checkpoints: &[Checkpoint]) -> Vec<(f64, f64)> {
        checkpoints
            .iter()
            .map(|c| (c.coordinate.latitude, c.coordinate.longitude))
            .collect()
    }

    #[test]
    fn test_three_point_scenario_forces_destination() {
        let r = route(&[(0.0, 0.0), (0.5, 0.5), (1.0, 1.0)], 7200.0);
        let checkpoints = sample(&r, 3600.0).unwrap();
        assert_eq!(coords(&checkpoints), vec![(0.0, 0.0), (1.0, 1.0)]);
    }

    #[test]
    fn test_two_point_route_emits_start_and_destination() {
        let r = route(&[(44.9, -93.2), (43.5, -96.7)], 3600.0);
        let checkpoints = sample(&r, 3600.0).unwrap();
        assert_eq!(coords(&checkpoints), vec![(44.9, -93.2), (43.5, -96.7)]);
    }

    #[rstest]
    #[case(3599.0, 3600.0)]
    #[case(0.0, 3600.0)]
    #[case(7200.0, 0.0)]
    #[case(7200.0, -1.0)]
    #[case(7200.0, f64::NAN)]
    fn test_short_or_bad_interval_is_invalid(#[case] duration: f64, #[case] interval: f64) {
        let r = route(&[(0.0, 0.0), (1.0, 1.0)], duration);
        let err = sample(&r, interval).unwrap_err();
        assert!(matches!(err, RouteWeatherError::InvalidRoute { .. }));
    }

    #[test]
    fn test_loop_route_is_invalid() {
        let r = route(&[(0.0, 0.0), (1.0, 1.0), (0.0, 0.0)], 7200.0);
        let err = sample(&r, 3600.0).unwrap_err();
        assert!(matches!(err, RouteWeatherError::InvalidRoute { .. }));
    }

    #[test]
    fn test_single_point_route_is_invalid() {
        let r = route(&[(0.0, 0.0)], 7200.0);
        assert!(sample(&r, 3600.0).is_err());
        assert!(midpoint(&r).is_err());
    }

    #[rstest]
    #[case(3600.0)]
    #[case(7200.0)]
    #[case(18_000.0)]
    #[case(36_500.0)]
    fn test_last_checkpoint_is_exact_destination(#[case] duration: f64) {
        // Curved path with a backtrack
        let r = route(
            &[
                (44.95, -93.09),
                (44.80, -93.30),
                (44.60, -93.60),
                (44.70, -93.90),
                (44.20, -94.40),
                (43.90, -95.10),
                (43.70, -96.00),
                (43.54, -96.73),
            ],
            duration,
        );
        let checkpoints = sample(&r, 3600.0).unwrap();
        assert!(!checkpoints.is_empty());
        assert_eq!(checkpoints[0].coordinate, r.points[0]);
        assert_eq!(
            checkpoints.last().unwrap().coordinate,
            *r.points.last().unwrap()
        );
    }

    #[test]
    fn test_dense_straight_route_spacing() {
        // 11 evenly spaced points from (0,0) to (1,1), four hours
        let points: Vec<(f64, f64)> = (0..=10)
            .map(|i| (f64::from(i) * 0.1, f64::from(i) * 0.1))
            .collect();
        let r = route(&points, 4.0 * 3600.0);
        let checkpoints = sample(&r, 3600.0).unwrap();

        // start, walked points near each quarter, destination replacing the last walked
        assert_eq!(checkpoints.len(), 4);
        assert_eq!(checkpoints[0].coordinate, Coordinate::new(0.0, 0.0));
        assert_eq!(checkpoints[3].coordinate, Coordinate::new(1.0, 1.0));
        let lats: Vec<f64> = checkpoints.iter().map(|c| c.coordinate.latitude).collect();
        assert!(lats.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_checkpoints_start_unenriched() {
        let r = route(&[(0.0, 0.0), (0.5, 0.5), (1.0, 1.0)], 7200.0);
        for cp in sample(&r, 3600.0).unwrap() {
            assert!(cp.endpoint.is_none());
            assert!(cp.forecast.is_none());
            assert!(!cp.error);
        }
    }

    #[test]
    fn test_midpoint_returns_first_emission() {
        let r = route(&[(0.0, 0.0), (0.25, 0.25), (0.5, 0.5), (1.0, 1.0)], 60.0);
        assert_eq!(midpoint(&r).unwrap(), Coordinate::new(0.5, 0.5));
    }

    #[test]
    fn test_midpoint_of_two_point_route_is_destination() {
        let r = route(&[(0.0, 0.0), (1.0, 1.0)], 60.0);
        assert_eq!(midpoint(&r).unwrap(), Coordinate::new(1.0, 1.0));
    }
}
