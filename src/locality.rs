//! Location reference table
//!
//! Resolves checkpoint coordinates into city/state context and zip codes
//! into coordinates using a static table of US zip code locations.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::models::Coordinate;
use crate::{Result, RouteWeatherError};

/// Decimal places used when matching checkpoints against table entries
const MATCH_PRECISION: u32 = 1;

/// One row of the location reference table
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LocationRecord {
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl LocationRecord {
    fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Display context attached to a checkpoint
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Locality {
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl From<&LocationRecord> for Locality {
    fn from(record: &LocationRecord) -> Self {
        Self {
            city: record.city.clone(),
            state: record.state.clone(),
            zip: record.zip.clone(),
        }
    }
}

/// Ordered collection of reference locations
#[derive(Debug, Clone, Default)]
pub struct LocationTable {
    records: Vec<LocationRecord>,
}

impl LocationTable {
    #[must_use]
    pub fn new(records: Vec<LocationRecord>) -> Self {
        Self { records }
    }

    /// Load the table from a JSON array of records
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|e| {
            RouteWeatherError::location_data(format!(
                "cannot read location table {}: {e}",
                path.display()
            ))
        })?;
        let records: Vec<LocationRecord> = serde_json::from_str(&data).map_err(|e| {
            RouteWeatherError::location_data(format!(
                "malformed location table {}: {e}",
                path.display()
            ))
        })?;
        info!("Loaded {} reference locations from {}", records.len(), path.display());
        Ok(Self::new(records))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Nearest reference location for a coordinate.
    ///
    /// Both sides are rounded to one decimal. An entry with identical rounded
    /// coordinates wins outright; otherwise the entry with the smallest L1
    /// distance is used (first one on ties). An empty table yields the
    /// default, empty locality.
    #[must_use]
    pub fn nearest(&self, coordinate: &Coordinate) -> Locality {
        let target = coordinate.rounded(MATCH_PRECISION);

        if let Some(exact) = self
            .records
            .iter()
            .find(|r| r.coordinate().rounded(MATCH_PRECISION) == target)
        {
            return Locality::from(exact);
        }

        let mut best: Option<(&LocationRecord, f64)> = None;
        for record in &self.records {
            let distance = record
                .coordinate()
                .rounded(MATCH_PRECISION)
                .manhattan_distance(&target);
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((record, distance));
            }
        }

        match best {
            Some((record, distance)) => {
                debug!(
                    "No exact locality for {coordinate}, nearest is {} ({distance:.1} away)",
                    record.city
                );
                Locality::from(record)
            }
            None => Locality::default(),
        }
    }

    /// Coordinate of a zip code, `None` when the zip is not in the table
    #[must_use]
    pub fn zip_to_coords(&self, zip: &str) -> Option<Coordinate> {
        let zip = zip.trim();
        self.records
            .iter()
            .find(|r| r.zip == zip)
            .map(LocationRecord::coordinate)
    }
}
