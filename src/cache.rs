//! Gridpoint cache
//!
//! Maps 3-decimal coordinate keys to the hourly forecast endpoint the weather
//! service assigned to that location. The cache is loaded once, consulted
//! before every endpoint lookup, and rewritten wholesale on each addition.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::models::Coordinate;
use crate::weather::EndpointResolver;
use crate::{Result, RouteWeatherError};

/// Persisted cache row
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct GridpointEntry {
    /// Latitude formatted to 3 decimals
    pub lat: String,
    /// Longitude formatted to 3 decimals
    pub lon: String,
    pub hourly_forecast_url: String,
}

impl GridpointEntry {
    fn key(&self) -> (String, String) {
        (self.lat.clone(), self.lon.clone())
    }
}

/// Append-only collection of resolved gridpoints backed by a file
#[derive(Debug)]
pub struct GridpointCache {
    path: PathBuf,
    entries: Vec<GridpointEntry>,
    index: HashMap<(String, String), usize>,
}

impl GridpointCache {
    /// Load the cache from `path`. A missing file is an empty cache.
    #[tracing::instrument(name = "load_gridpoints", level = "debug")]
    pub fn load(path: impl AsRef<Path> + std::fmt::Debug) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let stored: Vec<GridpointEntry> = if path.exists() {
            let bytes = fs::read(&path)?;
            postcard::from_bytes(&bytes).map_err(|e| {
                RouteWeatherError::cache(format!(
                    "cannot decode gridpoint cache {}: {e}",
                    path.display()
                ))
            })?
        } else {
            debug!("No gridpoint cache at {}, starting empty", path.display());
            Vec::new()
        };

        let mut cache = Self {
            path,
            entries: Vec::with_capacity(stored.len()),
            index: HashMap::with_capacity(stored.len()),
        };
        for entry in stored {
            if cache.index.contains_key(&entry.key()) {
                warn!(
                    "Dropping duplicate gridpoint entry {},{}",
                    entry.lat, entry.lon
                );
                continue;
            }
            cache.push(entry);
        }

        info!(
            "Loaded {} gridpoints from {}",
            cache.entries.len(),
            cache.path.display()
        );
        Ok(cache)
    }

    fn push(&mut self, entry: GridpointEntry) {
        self.index.insert(entry.key(), self.entries.len());
        self.entries.push(entry);
    }

    /// Cached endpoint for a coordinate, if its gridpoint key is known
    #[must_use]
    pub fn lookup(&self, coordinate: &Coordinate) -> Option<&str> {
        self.index
            .get(&coordinate.gridpoint_key())
            .map(|&i| self.entries[i].hourly_forecast_url.as_str())
    }

    /// Endpoint for a coordinate, asking `resolver` only on a cache miss.
    ///
    /// A new endpoint is appended and the whole collection is persisted
    /// before returning. A failed write is logged and the endpoint is still
    /// returned; the entry stays in memory for the next flush.
    pub async fn resolve_endpoint<R: EndpointResolver>(
        &mut self,
        coordinate: &Coordinate,
        resolver: &R,
    ) -> Result<String> {
        if let Some(url) = self.lookup(coordinate) {
            debug!("Known gridpoint {coordinate} -> {url}");
            return Ok(url.to_string());
        }

        let url = resolver.resolve_endpoint(coordinate).await?;
        let (lat, lon) = coordinate.gridpoint_key();
        info!("New gridpoint {lat},{lon} -> {url}");
        self.push(GridpointEntry {
            lat,
            lon,
            hourly_forecast_url: url.clone(),
        });

        if let Err(e) = self.flush() {
            warn!("Gridpoint cache not persisted: {e}");
        }
        Ok(url)
    }

    /// Rewrite the cache file with the full collection
    pub fn flush(&self) -> Result<()> {
        let bytes = postcard::to_stdvec(&self.entries)
            .map_err(|e| RouteWeatherError::cache(format!("cannot encode gridpoints: {e}")))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;
        debug!("Persisted {} gridpoints", self.entries.len());
        Ok(())
    }

    /// Drop every entry and persist the empty collection.
    ///
    /// Forces re-resolution of every gridpoint, e.g. after the weather
    /// service changes its endpoint scheme.
    pub fn reset(&mut self) -> Result<()> {
        info!("Resetting gridpoint cache ({} entries)", self.entries.len());
        self.entries.clear();
        self.index.clear();
        self.flush()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn entries(&self) -> &[GridpointEntry] {
        &self.entries
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Process-wide handle serializing the load-check-fetch-append-persist cycle
#[derive(Debug, Clone)]
pub struct SharedGridpointCache {
    inner: Arc<Mutex<GridpointCache>>,
}

impl SharedGridpointCache {
    #[must_use]
    pub fn new(cache: GridpointCache) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    /// Resolve under the writer lock; a concurrent miss for the same key
    /// finds the entry on its re-check instead of fetching again.
    pub async fn resolve_endpoint<R: EndpointResolver>(
        &self,
        coordinate: &Coordinate,
        resolver: &R,
    ) -> Result<String> {
        let mut cache = self.inner.lock().await;
        cache.resolve_endpoint(coordinate, resolver).await
    }

    /// Clear the cache under the writer lock, returning the dropped entry count
    pub async fn reset(&self) -> Result<usize> {
        let mut cache = self.inner.lock().await;
        let dropped = cache.len();
        cache.reset()?;
        Ok(dropped)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}
