//! Paced, bounded retry for forecast requests.
//!
//! Every forecast fetch waits a short pacing delay before its first attempt
//! so a whole route's worth of requests stays under the upstream rate limit.
//! Failed attempts are retried a fixed number of times with a fixed delay.
//! Time comes from `tokio::time`, so tests can run on a paused clock.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::{Result, RouteWeatherError};

pub const DEFAULT_PACING_DELAY_MS: u64 = 500;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 10;

/// Retry configuration for forecast fetches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Wait before the first attempt
    pub pacing_delay: Duration,
    /// Attempts allowed after the first one
    pub max_retries: u32,
    /// Wait before each retry
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            pacing_delay: Duration::from_millis(DEFAULT_PACING_DELAY_MS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_secs(DEFAULT_RETRY_DELAY_SECS),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(pacing_delay: Duration, max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            pacing_delay,
            max_retries,
            retry_delay,
        }
    }

    /// Same attempt budget without any waiting
    #[must_use]
    pub fn immediate(max_retries: u32) -> Self {
        Self::new(Duration::ZERO, max_retries, Duration::ZERO)
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

/// Outcome of a single failed attempt
#[derive(Debug)]
pub enum AttemptError {
    /// Worth another try (bad payload, throttling, transport hiccup)
    Retryable(String),
    /// Retrying cannot help
    Fatal(RouteWeatherError),
}

/// Run `operation` under `policy`.
///
/// The operation receives the zero-based attempt number. The first success
/// is returned immediately; once the budget is spent the result is
/// `ForecastUnavailable` carrying the last failure reason.
pub async fn with_retry<F, Fut, T>(policy: &RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = std::result::Result<T, AttemptError>>,
{
    if !policy.pacing_delay.is_zero() {
        sleep(policy.pacing_delay).await;
    }

    let mut last_reason = String::from("no attempt made");
    for attempt in 0..policy.max_attempts() {
        if attempt > 0 {
            warn!(
                "Retry attempt {} of {}, waiting {:?}",
                attempt, policy.max_retries, policy.retry_delay
            );
            sleep(policy.retry_delay).await;
        }

        match operation(attempt).await {
            Ok(value) => {
                if attempt > 0 {
                    info!("Request succeeded after {} retries", attempt);
                }
                return Ok(value);
            }
            Err(AttemptError::Retryable(reason)) => {
                warn!(
                    "Attempt {} of {} failed: {}",
                    attempt + 1,
                    policy.max_attempts(),
                    reason
                );
                last_reason = reason;
            }
            Err(AttemptError::Fatal(err)) => return Err(err),
        }
    }

    error!("All {} attempts exhausted", policy.max_attempts());
    Err(RouteWeatherError::forecast_unavailable(format!(
        "no valid forecast after {} attempts: {last_reason}",
        policy.max_attempts()
    )))
}
