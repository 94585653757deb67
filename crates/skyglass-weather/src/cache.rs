//! Single-slot cache holding the last fetched snapshot.

use crate::error::WeatherError;
use crate::store::KeyValueStore;
use crate::types::WeatherSnapshot;

/// Fixed key the snapshot is stored under.
pub const SNAPSHOT_KEY: &str = "forecast.snapshot";

/// Typed view over a `KeyValueStore` holding at most one snapshot.
#[derive(Debug)]
pub struct SnapshotCache<K> {
    store: K,
}

impl<K: KeyValueStore> SnapshotCache<K> {
    pub fn new(store: K) -> Self {
        Self { store }
    }

    /// Read the cached snapshot.
    ///
    /// An unreadable entry is dropped from the store and reported as absent
    /// so the next cycle fetches a fresh one.
    pub fn load(&self) -> Result<Option<WeatherSnapshot>, WeatherError> {
        let Some(text) = self.store.get(SNAPSHOT_KEY).map_err(cache_error)? else {
            return Ok(None);
        };

        match serde_json::from_str(&text) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                tracing::warn!("Discarding unreadable cached snapshot: {}", e);
                self.clear()?;
                Ok(None)
            }
        }
    }

    /// Replace the cached snapshot.
    pub fn save(&self, snapshot: &WeatherSnapshot) -> Result<(), WeatherError> {
        let text =
            serde_json::to_string(snapshot).map_err(|e| WeatherError::Cache(e.to_string()))?;
        self.store.set(SNAPSHOT_KEY, &text).map_err(cache_error)
    }

    pub fn clear(&self) -> Result<(), WeatherError> {
        self.store.delete(SNAPSHOT_KEY).map_err(cache_error)
    }

    pub fn store(&self) -> &K {
        &self.store
    }
}

fn cache_error(e: anyhow::Error) -> WeatherError {
    WeatherError::Cache(format!("{:#}", e))
}
