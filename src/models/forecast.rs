//! Hourly forecast model

use chrono::{DateTime, FixedOffset, Timelike};
use serde::{Deserialize, Serialize};

/// Number of hourly periods the weather service publishes per gridpoint
pub const FORECAST_HORIZON_HOURS: usize = 155;

/// Hourly forecast for one gridpoint
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HourlyForecast {
    /// Hour-indexed periods, index 0 is the current hour
    pub periods: Vec<ForecastPeriod>,
    /// When the upstream last refreshed this forecast
    pub updated: Option<String>,
}

/// One hour of forecast data
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ForecastPeriod {
    pub number: u32,
    /// Local start time of the period, with the gridpoint's UTC offset
    pub start_time: DateTime<FixedOffset>,
    pub short_forecast: String,
    pub temperature: i32,
    pub temperature_unit: String,
    /// Free-text wind speed such as "10 mph" or "5 to 10 mph"
    pub wind_speed: String,
    /// Condition icon URL
    pub icon: String,
    pub is_daytime: bool,
}

impl HourlyForecast {
    #[must_use]
    pub fn new(periods: Vec<ForecastPeriod>) -> Self {
        Self {
            periods,
            updated: None,
        }
    }

    #[must_use]
    pub fn period(&self, hour_index: usize) -> Option<&ForecastPeriod> {
        self.periods.get(hour_index)
    }
}

impl ForecastPeriod {
    /// Start time as a 12-hour clock string without AM/PM.
    ///
    /// Hours after noon drop 12 and lose their zero padding ("15:00" becomes
    /// "3:00"); morning hours and noon keep the "HH:MM" form.
    #[must_use]
    pub fn display_time(&self) -> String {
        let hour = self.start_time.hour();
        let minute = self.start_time.minute();
        if hour > 12 {
            format!("{}:{minute:02}", hour - 12)
        } else {
            format!("{hour:02}:{minute:02}")
        }
    }
}
