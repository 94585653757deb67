//! Freshness gate: decides whether a cached snapshot can be reused.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::types::WeatherSnapshot;

/// Why a cached snapshot was or was not trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Nothing cached
    Missing,
    /// Cached for a different latitude than the one configured
    LocationChanged,
    /// Older than the update interval; `age_ms` may be negative for
    /// snapshots stamped in the future
    Expired { age_ms: i64 },
    Fresh { age_ms: i64 },
}

impl Freshness {
    pub fn should_fetch(&self) -> bool {
        !matches!(self, Self::Fresh { .. })
    }
}

/// Classify a cached snapshot against the current time and location.
pub fn assess(
    cached: Option<&WeatherSnapshot>,
    now: DateTime<Utc>,
    configured_latitude: f64,
    update_interval: Duration,
) -> Freshness {
    let Some(cached) = cached else {
        return Freshness::Missing;
    };

    if cached.latitude != configured_latitude {
        return Freshness::LocationChanged;
    }

    let age_ms = now
        .timestamp_millis()
        .saturating_sub(cached.currently.time.saturating_mul(1000));
    let interval_ms = i64::try_from(update_interval.as_millis()).unwrap_or(i64::MAX);

    if age_ms >= interval_ms {
        Freshness::Expired { age_ms }
    } else {
        Freshness::Fresh { age_ms }
    }
}

/// True when a new fetch must be issued instead of serving `cached`.
pub fn should_fetch(
    cached: Option<&WeatherSnapshot>,
    now: DateTime<Utc>,
    configured_latitude: f64,
    update_interval: Duration,
) -> bool {
    assess(cached, now, configured_latitude, update_interval).should_fetch()
}
