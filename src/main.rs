use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::{info, warn};

use route_weather::{
    Coordinate, ForecastEnricher, GridpointCache, LocationTable, NwsClient, OrsClient,
    RouteWeatherConfig, SharedGridpointCache, logging,
};

mod cli;

use cli::{Cli, Command, Place, RouteArgs};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = RouteWeatherConfig::load_from_path(cli.config)?;
    logging::init(&config.logging)?;

    match cli.cmd {
        Command::Route(args) => run_route(&config, args).await,
        Command::ResetCache => {
            let cache = SharedGridpointCache::new(GridpointCache::load(&config.cache.location)?);
            let dropped = cache.reset().await?;
            println!(
                "Gridpoint cache at {} cleared ({dropped} entries)",
                config.cache.location
            );
            Ok(())
        }
        Command::CacheInfo => {
            let cache = GridpointCache::load(&config.cache.location)?;
            println!("{}: {} gridpoints", cache.path().display(), cache.len());
            for entry in cache.entries() {
                println!("  {},{} -> {}", entry.lat, entry.lon, entry.hourly_forecast_url);
            }
            Ok(())
        }
    }
}

async fn run_route(config: &RouteWeatherConfig, args: RouteArgs) -> Result<()> {
    let locations = match LocationTable::load(&config.locations.path) {
        Ok(table) => table,
        Err(e) => {
            warn!("{e}; city names and zip codes unavailable");
            LocationTable::default()
        }
    };

    let depart = resolve_place(&args.from, &locations)?;
    let destination = resolve_place(&args.to, &locations)?;
    let interval = args.interval.unwrap_or(config.defaults.interval_seconds);
    let delay = args.delay.unwrap_or(config.defaults.departure_delay_hours);
    info!("Planning {depart} -> {destination}, every {interval}s, departing in {delay}h");

    let cache = SharedGridpointCache::new(GridpointCache::load(&config.cache.location)?);
    let enricher = ForecastEnricher::new(
        OrsClient::new(&config.directions)?,
        NwsClient::new(&config.weather)?,
        cache,
        locations,
    )
    .with_interval(f64::from(interval));

    let planned = enricher
        .plan(&depart, &destination)
        .await
        .map_err(|e| {
            let message = e.user_message();
            anyhow::Error::new(e).context(message)
        })?;
    let lines = planned.report(usize::try_from(delay).context("Departure delay too large")?);

    if args.json {
        let output = serde_json::json!({
            "center": planned.center,
            "distance_meters": planned.route.distance_meters,
            "duration_seconds": planned.route.duration_seconds,
            "checkpoints": lines,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{:.0} km, {:.1} h, centered on {}",
        planned.route.distance_meters / 1000.0,
        planned.route.duration_seconds / 3600.0,
        planned.center
    );
    for line in &lines {
        let icon = line.icon.map_or("-", |icon| icon.as_str());
        println!("[{}] {:<20} {}", line.coordinate, icon, line.summary);
    }
    Ok(())
}

fn resolve_place(place: &Place, locations: &LocationTable) -> Result<Coordinate> {
    match place {
        Place::Coordinate(coordinate) => Ok(*coordinate),
        Place::Zip(zip) => locations
            .zip_to_coords(zip)
            .ok_or_else(|| anyhow!("Unknown zip code {zip}")),
    }
}
