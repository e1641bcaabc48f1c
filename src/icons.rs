//! Display descriptors for forecast hours
//!
//! Maps a forecast period to an icon key and a one-line summary. Condition
//! codes come from the weather service icon URL, e.g.
//! `https://api.weather.gov/icons/land/day/skc,0?size=medium` carries `skc`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{ForecastPeriod, HourlyForecast};
use crate::{Result, RouteWeatherError};

/// Position of the condition code in a `/`-split icon URL
const CONDITION_SEGMENT: usize = 6;

/// Codes whose icon depends on whether the period is daytime
const TIME_SENSITIVE_CODES: [&str; 8] = [
    "skc", "few", "sct", "bkn", "wind_skc", "wind_few", "wind_sct", "wind_bkn",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IconKey {
    ClearDay,
    ClearNight,
    PartlyCloudyDay,
    PartlyCloudyNight,
    Cloudy,
    Rain,
    Snow,
    Sleet,
    Storm,
    Haze,
    Dust,
    Warning,
}

impl IconKey {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClearDay => "clear-day",
            Self::ClearNight => "clear-night",
            Self::PartlyCloudyDay => "partly-cloudy-day",
            Self::PartlyCloudyNight => "partly-cloudy-night",
            Self::Cloudy => "cloudy",
            Self::Rain => "rain",
            Self::Snow => "snow",
            Self::Sleet => "sleet",
            Self::Storm => "storm",
            Self::Haze => "haze",
            Self::Dust => "dust",
            Self::Warning => "warning",
        }
    }

    /// Icon for a day/night-qualified condition code
    #[must_use]
    pub fn for_condition(code: &str) -> Option<Self> {
        let key = match code {
            "skc-day" | "wind_skc-day" | "wind_few-day" => Self::ClearDay,
            "skc-night" | "wind_skc-night" | "wind_few-night" => Self::ClearNight,
            "few-day" | "sct-day" | "bkn-day" | "wind_sct-day" | "wind_bkn-day" => {
                Self::PartlyCloudyDay
            }
            "few-night" | "sct-night" | "bkn-night" | "wind_sct-night" | "wind_bkn-night" => {
                Self::PartlyCloudyNight
            }
            "ovc" | "wind_ovc" => Self::Cloudy,
            "rain" | "rain_showers" | "rain_showers_hi" => Self::Rain,
            "snow" => Self::Snow,
            "rain_snow" | "rain_sleet" | "snow_sleet" | "fzra" | "rain_fzra" | "snow_fzra"
            | "sleet" => Self::Sleet,
            "tsra" | "tsra_sct" | "tsra_hi" => Self::Storm,
            "haze" | "fog" => Self::Haze,
            "dust" | "smoke" => Self::Dust,
            "tornado" | "hurricane" | "tropical_storm" | "hot" | "cold" | "blizzard" => {
                Self::Warning
            }
            _ => return None,
        };
        Some(key)
    }
}

impl fmt::Display for IconKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to show for one checkpoint hour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    pub icon: IconKey,
    pub summary: String,
}

/// Bare condition code of an icon URL, without probability or query
pub fn condition_code(icon_url: &str) -> Result<&str> {
    let segment = icon_url
        .split('/')
        .nth(CONDITION_SEGMENT)
        .ok_or_else(|| RouteWeatherError::unknown_condition(icon_url))?;
    let code = segment
        .split('?')
        .next()
        .and_then(|s| s.split(',').next())
        .unwrap_or_default();
    if code.is_empty() {
        return Err(RouteWeatherError::unknown_condition(icon_url));
    }
    Ok(code)
}

/// Condition code with `-day`/`-night` appended where the icon depends on it
#[must_use]
pub fn qualified_code(code: &str, is_daytime: bool) -> String {
    if TIME_SENSITIVE_CODES.contains(&code) {
        let suffix = if is_daytime { "day" } else { "night" };
        format!("{code}-{suffix}")
    } else {
        code.to_string()
    }
}

/// Icon key for a forecast period
pub fn icon_for(period: &ForecastPeriod) -> Result<IconKey> {
    let code = condition_code(&period.icon)?;
    let qualified = qualified_code(code, period.is_daytime);
    IconKey::for_condition(&qualified).ok_or_else(|| RouteWeatherError::unknown_condition(qualified))
}

/// `"{time} - {city} - {shortForecast} {temp}{unit} Wind: {windSpeed}"`
#[must_use]
pub fn summary(period: &ForecastPeriod, locality: &str) -> String {
    format!(
        "{} - {} - {} {}{} Wind: {}",
        period.display_time(),
        locality,
        period.short_forecast,
        period.temperature,
        period.temperature_unit,
        period.wind_speed
    )
}

/// Descriptor for hour `hour_index` of `forecast`
pub fn describe(forecast: &HourlyForecast, hour_index: usize, locality: &str) -> Result<Descriptor> {
    let period = forecast
        .period(hour_index)
        .ok_or(RouteWeatherError::HorizonExceeded {
            hour: hour_index,
            horizon: forecast.periods.len(),
        })?;

    Ok(Descriptor {
        icon: icon_for(period)?,
        summary: summary(period, locality),
    })
}
