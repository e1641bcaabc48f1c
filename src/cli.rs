use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

use route_weather::Coordinate;

#[derive(Debug, Parser)]
#[command(about = "Hour-by-hour weather along a driving route.", version)]
pub struct Cli {
    /// Configuration file, defaults to the user config directory
    #[arg(env = "ROUTE_WEATHER_CONFIG", short, long)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Plan a route and print the forecast at each checkpoint
    Route(RouteArgs),
    /// Forget every resolved gridpoint
    ResetCache,
    /// Show the gridpoint cache location and contents
    CacheInfo,
}

#[derive(Debug, Args)]
pub struct RouteArgs {
    /// Departure as `lat,lon` or a zip code
    #[arg(long)]
    pub from: Place,
    /// Destination as `lat,lon` or a zip code
    #[arg(long)]
    pub to: Place,
    /// Seconds of driving between checkpoints
    #[arg(long)]
    pub interval: Option<u32>,
    /// Hours until departure
    #[arg(long)]
    pub delay: Option<u32>,
    /// Print the full result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Route endpoint given on the command line
#[derive(Debug, Clone, PartialEq)]
pub enum Place {
    Coordinate(Coordinate),
    Zip(String),
}

impl FromStr for Place {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((lat, lon)) = s.split_once(',') {
            let lat: f64 = lat
                .trim()
                .parse()
                .map_err(|e| format!("invalid latitude '{lat}': {e}"))?;
            let lon: f64 = lon
                .trim()
                .parse()
                .map_err(|e| format!("invalid longitude '{lon}': {e}"))?;
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                return Err(format!("coordinate out of range: {lat},{lon}"));
            }
            return Ok(Self::Coordinate(Coordinate::new(lat, lon)));
        }

        if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
            return Ok(Self::Zip(s.to_string()));
        }
        Err(format!("expected 'lat,lon' or a zip code, got '{s}'"))
    }
}
