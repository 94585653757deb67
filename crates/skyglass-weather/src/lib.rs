//! Forecast widget for Skyglass
//!
//! Fetches forecast snapshots over HTTP, reuses cached ones while they are
//! fresh, and renders current conditions, a precipitation sparkline and a
//! daily forecast as a host-agnostic render tree.

pub mod cache;
pub mod error;
pub mod format;
pub mod gate;
pub mod location;
pub mod provider;
pub mod scheduler;
pub mod sparkline;
pub mod store;
pub mod types;
pub mod view;
pub mod widget;

pub use cache::SnapshotCache;
pub use error::{LocationError, WeatherError};
pub use format::{degree_to_cardinal, is_any_precipitation, round_temp};
pub use gate::{should_fetch, Freshness};
pub use location::{FixedLocation, Geolocator, Unavailable};
pub use provider::{ForecastSource, StaticSource, WeatherProvider, WeatherSource};
pub use scheduler::{run_updates, Schedule, ScheduleError};
pub use sparkline::{render_precipitation, Sparkline};
pub use store::{KeyValueStore, MemoryStore, SqliteStore};
pub use types::*;
pub use view::WeatherView;
pub use widget::{CycleOutcome, ForecastWidget, LocationState};
