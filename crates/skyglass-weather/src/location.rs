//! One-shot location lookup used when no coordinates are configured.

use std::future::Future;
use std::time::Duration;

use crate::error::LocationError;
use crate::types::Location;

pub trait Geolocator: Send + Sync {
    fn locate(&self) -> impl Future<Output = Result<Location, LocationError>> + Send;
}

/// Always answers with the same coordinates.
#[derive(Debug, Clone)]
pub struct FixedLocation(pub Location);

impl Geolocator for FixedLocation {
    async fn locate(&self) -> Result<Location, LocationError> {
        Ok(self.0.clone())
    }
}

/// No platform location service; every lookup fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

impl Geolocator for Unavailable {
    async fn locate(&self) -> Result<Location, LocationError> {
        Err(LocationError::ServiceUnavailable)
    }
}

/// Run one lookup, failing with `Timeout` once `timeout` elapses.
pub async fn locate_within<G: Geolocator>(
    geolocator: &G,
    timeout: Duration,
) -> Result<Location, LocationError> {
    match tokio::time::timeout(timeout, geolocator.locate()).await {
        Ok(result) => result,
        Err(_) => Err(LocationError::Timeout),
    }
}
