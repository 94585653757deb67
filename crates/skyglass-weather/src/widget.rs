//! The forecast widget: owns the displayed snapshot and drives one update
//! cycle at a time through the freshness gate, the source and the cache.

use anyhow::Result;
use chrono::{DateTime, FixedOffset, Local, Utc};
use skyglass_core::{AppError, ForecastConfig, HostModule, ModuleContext, Node, Notification};

use crate::cache::SnapshotCache;
use crate::error::{LocationError, WeatherError};
use crate::gate;
use crate::provider::WeatherSource;
use crate::store::KeyValueStore;
use crate::types::{Location, WeatherSnapshot};
use crate::view::WeatherView;

const MODULE_ID: &str = "forecast";
const MODULE_NAME: &str = "Forecast";
const MESSAGE_CLASS: &str = "dimmed light small";

/// Where the widget's coordinates come from.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationState {
    /// Waiting for the one-shot geolocation lookup
    Pending,
    Known(Location),
    /// Lookup failed; automatic updates stop for the session
    Failed(LocationError),
}

/// Result of one update cycle, used to pick the next delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// New snapshot fetched and cached
    Fetched,
    /// Cached snapshot was fresh and is now displayed
    ServedCache,
    /// Fetch failed; cache cleared, previous snapshot still displayed
    Failed,
    /// Coordinates not known yet
    AwaitingLocation,
    /// Configuration or location error; no further cycles are useful
    Halted,
}

pub struct ForecastWidget<S, K> {
    config: ForecastConfig,
    source: Option<S>,
    cache: SnapshotCache<K>,
    location: LocationState,
    config_error: Option<String>,
    snapshot: Option<WeatherSnapshot>,
    room_temperature: Option<f64>,
    last_error: Option<AppError>,
    utc_offset: FixedOffset,
}

impl<S: WeatherSource, K: KeyValueStore> ForecastWidget<S, K> {
    /// `source` is `None` when it could not be built from the configuration;
    /// the widget then reports a configuration error once started.
    pub fn new(source: Option<S>, store: K) -> Self {
        Self {
            config: ForecastConfig::default(),
            source,
            cache: SnapshotCache::new(store),
            location: LocationState::Pending,
            config_error: None,
            snapshot: None,
            room_temperature: None,
            last_error: None,
            utc_offset: *Local::now().offset(),
        }
    }

    /// Show clock times in `offset` instead of the local zone.
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn location(&self) -> &LocationState {
        &self.location
    }

    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn config_error(&self) -> Option<&str> {
        self.config_error.as_deref()
    }

    /// Why the most recent fetch failed; cleared by the next success.
    pub fn last_error(&self) -> Option<&AppError> {
        self.last_error.as_ref()
    }

    pub fn needs_location(&self) -> bool {
        matches!(self.location, LocationState::Pending) && self.config_error.is_none()
    }

    /// Record the outcome of the geolocation lookup. Ignored once the
    /// location is settled.
    pub fn set_location(&mut self, result: Result<Location, LocationError>) {
        if !matches!(self.location, LocationState::Pending) {
            return;
        }
        match result {
            Ok(location) => {
                tracing::info!(
                    latitude = location.latitude,
                    longitude = location.longitude,
                    "Location resolved"
                );
                self.location = LocationState::Known(location);
            }
            Err(e) => {
                tracing::error!("Location lookup failed: {}", e);
                self.location = LocationState::Failed(e.clone());
                self.last_error = Some(WeatherError::Location(e).into());
            }
        }
    }

    /// Run one update: serve the cached snapshot when the freshness gate
    /// allows it, otherwise fetch, cache and display a new one.
    pub async fn update_cycle(&mut self, now: DateTime<Utc>) -> CycleOutcome {
        if self.config_error.is_some() {
            return CycleOutcome::Halted;
        }
        let location = match &self.location {
            LocationState::Pending => return CycleOutcome::AwaitingLocation,
            LocationState::Failed(_) => return CycleOutcome::Halted,
            LocationState::Known(location) => location.clone(),
        };
        let Some(source) = &self.source else {
            return CycleOutcome::Halted;
        };

        let cached = self.cache.load().unwrap_or_else(|e| {
            tracing::warn!("Failed to read cached forecast: {}", e);
            None
        });
        let freshness = gate::assess(
            cached.as_ref(),
            now,
            location.latitude,
            self.config.update_interval(),
        );
        tracing::debug!(?freshness, "Checked cached forecast");

        if !freshness.should_fetch() {
            if let Some(snapshot) = cached {
                self.snapshot = Some(snapshot);
                return CycleOutcome::ServedCache;
            }
        }

        match source.fetch(&location).await {
            Ok(snapshot) => {
                if let Err(e) = self.cache.save(&snapshot) {
                    tracing::warn!("Failed to cache forecast: {}", e);
                }
                self.snapshot = Some(snapshot);
                self.last_error = None;
                CycleOutcome::Fetched
            }
            Err(e) => {
                tracing::error!("Forecast update failed: {}", e);
                if let Err(e) = self.cache.clear() {
                    tracing::warn!("Failed to clear cached forecast: {}", e);
                }
                let error = AppError::from(e);
                if !error.is_transient() {
                    tracing::warn!("{}", error.user_message());
                }
                self.last_error = Some(error);
                CycleOutcome::Failed
            }
        }
    }

    fn message(text: impl Into<String>) -> Node {
        Node::text(MESSAGE_CLASS, text)
    }
}

impl<S: WeatherSource, K: KeyValueStore> HostModule for ForecastWidget<S, K> {
    fn id(&self) -> &str {
        MODULE_ID
    }

    fn name(&self) -> &str {
        MODULE_NAME
    }

    fn on_start(&mut self, ctx: &ModuleContext) -> Result<()> {
        self.config = ctx.config.forecast.clone();
        self.config_error = None;

        if !self.config.has_api_key() && self.config.data_file.is_none() {
            tracing::error!("No forecast API key configured");
            self.config_error = Some(format!(
                "Please set the forecast api_key in the config for module: {}.",
                MODULE_NAME
            ));
        } else if self.source.is_none() {
            self.config_error = Some(format!(
                "The forecast source could not be set up; check api_base and data_file for module: {}.",
                MODULE_NAME
            ));
        }

        self.location = match (self.config.latitude, self.config.longitude) {
            _ if self.config.needs_geolocation() => LocationState::Pending,
            (Some(latitude), Some(longitude)) => {
                LocationState::Known(Location::new(latitude, longitude))
            }
            _ => {
                self.config_error.get_or_insert_with(|| {
                    format!(
                        "Please set both latitude and longitude in the config for module: {}.",
                        MODULE_NAME
                    )
                });
                LocationState::Pending
            }
        };

        tracing::info!(
            needs_location = self.needs_location(),
            update_interval_ms = self.config.update_interval_ms,
            "Forecast widget started"
        );
        Ok(())
    }

    fn on_render(&self) -> Node {
        if let Some(message) = &self.config_error {
            return Self::message(message.as_str());
        }
        if matches!(self.location, LocationState::Failed(_)) {
            return Self::message(format!(
                "Location lookup failed, please set latitude and longitude in the config for module: {}.",
                MODULE_NAME
            ));
        }
        let Some(snapshot) = &self.snapshot else {
            return Self::message("Loading…");
        };

        let view = WeatherView::build(
            snapshot,
            &self.config,
            self.room_temperature,
            self.utc_offset,
        );
        if self.config.show_warning_only {
            view.warning_node()
        } else {
            view.to_node(&self.config)
        }
    }

    fn on_notify(&mut self, notification: &Notification) {
        match notification {
            Notification::IndoorTemperature(value) if self.config.show_indoor_temperature => {
                tracing::debug!(value, "Indoor temperature updated");
                self.room_temperature = Some(*value);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::cache::SNAPSHOT_KEY;
    use crate::store::MemoryStore;
    use crate::types::Currently;
    use skyglass_core::{Config, ForecastError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const NOW_SECS: i64 = 1_700_000_000;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(NOW_SECS, 0).unwrap()
    }

    fn snapshot(latitude: f64, time: i64, temperature: f64) -> WeatherSnapshot {
        WeatherSnapshot {
            latitude,
            longitude: -74.0,
            timezone: None,
            currently: Currently {
                time,
                temperature,
                ..Default::default()
            },
            hourly: Default::default(),
            daily: Default::default(),
            minutely: Default::default(),
            alerts: Vec::new(),
        }
    }

    /// Counts fetches and answers with a canned result.
    struct FakeSource {
        calls: AtomicUsize,
        reply: Option<WeatherSnapshot>,
    }

    impl FakeSource {
        fn ok(snapshot: WeatherSnapshot) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                reply: Some(snapshot),
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                reply: None,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl WeatherSource for FakeSource {
        async fn fetch(&self, _location: &Location) -> Result<WeatherSnapshot, WeatherError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().ok_or(WeatherError::Api {
                status: 503,
                message: "unavailable".into(),
            })
        }
    }

    fn config() -> ForecastConfig {
        ForecastConfig {
            api_key: "key".into(),
            latitude: Some(40.0),
            longitude: Some(-74.0),
            ..Default::default()
        }
    }

    fn started(
        source: FakeSource,
        store: Arc<MemoryStore>,
        forecast: ForecastConfig,
    ) -> ForecastWidget<FakeSource, Arc<MemoryStore>> {
        let mut widget =
            ForecastWidget::new(Some(source), store).with_utc_offset(FixedOffset::east_opt(0).unwrap());
        let ctx = ModuleContext::new(Arc::new(Config {
            forecast,
            ..Default::default()
        }));
        widget.on_start(&ctx).unwrap();
        widget
    }

    fn cache_with(store: &Arc<MemoryStore>, snapshot: &WeatherSnapshot) {
        SnapshotCache::new(store.clone()).save(snapshot).unwrap();
    }

    #[tokio::test]
    async fn test_empty_cache_fetches_and_stores() {
        let store = Arc::new(MemoryStore::new());
        let mut widget = started(
            FakeSource::ok(snapshot(40.0, NOW_SECS, 18.0)),
            store.clone(),
            config(),
        );

        assert_eq!(widget.update_cycle(now()).await, CycleOutcome::Fetched);
        assert_eq!(widget.source.as_ref().unwrap().calls(), 1);
        assert!(store.get(SNAPSHOT_KEY).unwrap().is_some());
        assert!(widget.on_render().text_content().contains("18°"));
    }

    #[tokio::test]
    async fn test_fresh_cache_is_rendered_without_fetching() {
        let store = Arc::new(MemoryStore::new());
        cache_with(&store, &snapshot(40.0, NOW_SECS - 60, 11.0));
        let mut widget = started(
            FakeSource::ok(snapshot(40.0, NOW_SECS, 25.0)),
            store,
            config(),
        );

        assert_eq!(widget.update_cycle(now()).await, CycleOutcome::ServedCache);
        assert_eq!(widget.source.as_ref().unwrap().calls(), 0);
        assert_eq!(widget.snapshot().unwrap().currently.temperature, 11.0);
        assert!(widget.on_render().text_content().contains("11°"));
    }

    #[tokio::test]
    async fn test_stale_or_moved_cache_refetches() {
        let store = Arc::new(MemoryStore::new());
        cache_with(&store, &snapshot(40.0, NOW_SECS - 600, 11.0));
        let mut widget = started(
            FakeSource::ok(snapshot(40.0, NOW_SECS, 25.0)),
            store.clone(),
            config(),
        );
        assert_eq!(widget.update_cycle(now()).await, CycleOutcome::Fetched);

        cache_with(&store, &snapshot(12.0, NOW_SECS, 11.0));
        assert_eq!(widget.update_cycle(now()).await, CycleOutcome::Fetched);
        assert_eq!(widget.source.as_ref().unwrap().calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_clears_cache_and_keeps_display() {
        let store = Arc::new(MemoryStore::new());
        let mut widget = started(FakeSource::failing(), store.clone(), config());
        widget.snapshot = Some(snapshot(40.0, NOW_SECS - 3_600, 9.0));
        cache_with(&store, &snapshot(40.0, NOW_SECS - 3_600, 9.0));

        assert_eq!(widget.update_cycle(now()).await, CycleOutcome::Failed);
        assert!(store.is_empty());
        assert!(widget.last_error().unwrap().is_transient());
        assert!(widget.on_render().text_content().contains("9°"));
    }

    #[tokio::test]
    async fn test_missing_api_key_halts() {
        let mut cfg = config();
        cfg.api_key = String::new();
        let mut widget = started(
            FakeSource::ok(snapshot(40.0, NOW_SECS, 1.0)),
            Arc::new(MemoryStore::new()),
            cfg,
        );

        assert_eq!(widget.update_cycle(now()).await, CycleOutcome::Halted);
        assert_eq!(widget.source.as_ref().unwrap().calls(), 0);
        assert!(widget.on_render().text_content().contains("api_key"));
    }

    #[tokio::test]
    async fn test_geolocation_flow() {
        let mut cfg = config();
        cfg.latitude = None;
        cfg.longitude = None;
        let mut widget = started(
            FakeSource::ok(snapshot(47.6, NOW_SECS, 7.0)),
            Arc::new(MemoryStore::new()),
            cfg,
        );

        assert!(widget.needs_location());
        assert_eq!(widget.update_cycle(now()).await, CycleOutcome::AwaitingLocation);
        assert_eq!(widget.on_render().text_content(), "Loading…");

        widget.set_location(Ok(Location::new(47.6, -122.3)));
        assert_eq!(widget.update_cycle(now()).await, CycleOutcome::Fetched);

        // Settled locations are not replaced
        widget.set_location(Err(LocationError::Timeout));
        assert!(matches!(widget.location(), LocationState::Known(_)));
    }

    #[tokio::test]
    async fn test_geolocation_failure_halts() {
        let mut cfg = config();
        cfg.latitude = None;
        cfg.longitude = None;
        let mut widget = started(
            FakeSource::ok(snapshot(47.6, NOW_SECS, 7.0)),
            Arc::new(MemoryStore::new()),
            cfg,
        );

        widget.set_location(Err(LocationError::PermissionDenied));
        assert_eq!(widget.update_cycle(now()).await, CycleOutcome::Halted);
        assert!(widget.on_render().text_content().contains("latitude and longitude"));

        let err = widget.last_error().unwrap();
        assert!(matches!(
            err,
            AppError::Forecast(ForecastError::LocationUnavailable(_))
        ));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_half_configured_coordinates_halt() {
        let mut cfg = config();
        cfg.longitude = None;
        let mut widget = started(
            FakeSource::ok(snapshot(47.6, NOW_SECS, 7.0)),
            Arc::new(MemoryStore::new()),
            cfg,
        );

        assert!(!widget.needs_location());
        assert_eq!(widget.update_cycle(now()).await, CycleOutcome::Halted);
        assert!(widget
            .on_render()
            .text_content()
            .contains("set both latitude and longitude"));
    }

    #[tokio::test]
    async fn test_indoor_temperature_notification() {
        let mut cfg = config();
        cfg.show_indoor_temperature = true;
        let mut widget = started(
            FakeSource::ok(snapshot(40.0, NOW_SECS, 18.0)),
            Arc::new(MemoryStore::new()),
            cfg,
        );
        widget.update_cycle(now()).await;

        widget.on_notify(&Notification::IndoorTemperature(22.4));
        widget.on_notify(&Notification::DomObjectsCreated);
        assert!(widget.on_render().text_content().contains("Indoor: 22°"));
    }

    #[tokio::test]
    async fn test_warning_only_renders_banner() {
        let mut cfg = config();
        cfg.show_warning_only = true;
        let mut snap = snapshot(40.0, NOW_SECS, 18.0);
        snap.alerts.push(crate::types::Alert {
            title: "Heat Advisory".into(),
            time: NOW_SECS,
            ..Default::default()
        });
        let mut widget = started(FakeSource::ok(snap), Arc::new(MemoryStore::new()), cfg);
        widget.update_cycle(now()).await;

        let node = widget.on_render();
        assert!(node.text_content().contains("Heat Advisory"));
        assert!(!node.text_content().contains("18°"));
    }
}
