use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Prefix for environment overrides, e.g. `SKYGLASS__FORECAST__API_KEY`.
const ENV_PREFIX: &str = "SKYGLASS";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application configuration directory (also holds the snapshot cache)
    pub config_dir: PathBuf,

    /// Forecast widget settings
    pub forecast: ForecastConfig,
}

/// Measurement system requested from the forecast API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Let the API pick units from the location
    #[default]
    Default,
    Metric,
    Imperial,
}

impl Units {
    /// Value of the `units` query parameter.
    pub fn api_code(&self) -> &'static str {
        match self {
            Self::Default => "auto",
            Self::Metric => "si",
            Self::Imperial => "us",
        }
    }

    /// Label shown next to wind speeds.
    pub fn wind_speed_unit(&self) -> &'static str {
        match self {
            Self::Metric => "m/s",
            Self::Default | Self::Imperial => "mph",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Forecast API key; the widget refuses to fetch without one
    pub api_key: String,
    pub api_base: String,
    pub units: Units,
    pub language: String,

    /// Minimum age of the cached snapshot before it is refetched, and the
    /// delay between update cycles
    pub update_interval_ms: u64,
    /// Accepted for compatibility with existing configs; failures are
    /// retried on the normal update interval
    pub retry_delay_ms: u64,
    /// Delay before the first update cycle
    pub initial_load_delay_ms: u64,
    pub temp_decimal_places: u32,

    pub show_forecast: bool,
    pub max_days_forecast: usize,
    pub show_wind: bool,
    pub show_sunrise_sunset: bool,
    #[serde(alias = "show_precipitation_graph")]
    pub enable_precipitation_graph: bool,
    pub always_show_precipitation_graph: bool,
    pub show_daily_precipitation_chance: bool,
    pub show_warning_only: bool,
    pub show_indoor_temperature: bool,

    pub precipitation_graph_width: u32,
    pub precipitation_fill_color: String,
    pub precipitation_probability_threshold: f64,
    pub precipitation_intensity_scale_top: f64,

    /// Leave both unset to look the location up once at startup
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub geolocation_timeout_ms: u64,

    /// Serve this snapshot file instead of calling the API
    pub data_file: Option<PathBuf>,
    pub debug: bool,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: "https://api.darksky.net/forecast".to_string(),
            units: Units::Default,
            language: "en".to_string(),
            update_interval_ms: 10 * 60 * 1000,
            retry_delay_ms: 2500,
            initial_load_delay_ms: 0,
            temp_decimal_places: 0,
            show_forecast: true,
            max_days_forecast: 7,
            show_wind: true,
            show_sunrise_sunset: true,
            enable_precipitation_graph: false,
            always_show_precipitation_graph: false,
            show_daily_precipitation_chance: true,
            show_warning_only: false,
            show_indoor_temperature: false,
            precipitation_graph_width: 400,
            precipitation_fill_color: "white".to_string(),
            precipitation_probability_threshold: 0.1,
            precipitation_intensity_scale_top: 0.2,
            latitude: None,
            longitude: None,
            geolocation_timeout_ms: 5000,
            data_file: None,
            debug: false,
        }
    }
}

impl ForecastConfig {
    /// True when no coordinates are configured and they must be looked up.
    pub fn needs_geolocation(&self) -> bool {
        self.latitude.is_none() && self.longitude.is_none()
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }

    pub fn initial_load_delay(&self) -> Duration {
        Duration::from_millis(self.initial_load_delay_ms)
    }

    pub fn geolocation_timeout(&self) -> Duration {
        Duration::from_millis(self.geolocation_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("skyglass");

        Self {
            config_dir,
            forecast: ForecastConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist.
    ///
    /// Environment variables prefixed with `SKYGLASS__` override file values.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::default().save_to(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit file, layered with environment overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.to_path_buf()).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read config file")?;

        settings
            .try_deserialize()
            .context("Failed to parse config file")
    }

    /// Load configuration and validate it
    ///
    /// Returns an error if validation fails with critical errors. Warnings
    /// are handed back for the caller to log once logging is initialized.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        Ok((config, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();
        let forecast = &self.forecast;

        // A missing key is shown by the widget itself, so it only warns here
        if !forecast.has_api_key() && forecast.data_file.is_none() {
            result.add_warning("forecast.api_key", "No API key set - forecasts cannot be fetched");
        }

        self.validate_url(&forecast.api_base, "forecast.api_base", &mut result);

        if forecast.update_interval_ms == 0 {
            result.add_error(
                "forecast.update_interval_ms",
                "Update interval must be greater than 0",
            );
        } else if forecast.update_interval_ms > 24 * 60 * 60 * 1000 {
            result.add_warning(
                "forecast.update_interval_ms",
                "Update interval is more than 24 hours",
            );
        }

        if forecast.temp_decimal_places > 8 {
            result.add_error(
                "forecast.temp_decimal_places",
                "At most 8 decimal places are supported",
            );
        }

        if forecast.precipitation_graph_width == 0 {
            result.add_error(
                "forecast.precipitation_graph_width",
                "Graph width must be greater than 0",
            );
        } else if forecast.precipitation_graph_width > 4000 {
            result.add_warning(
                "forecast.precipitation_graph_width",
                "Graph width is unusually large (>4000)",
            );
        }

        if !(0.0..=1.0).contains(&forecast.precipitation_probability_threshold) {
            result.add_error(
                "forecast.precipitation_probability_threshold",
                "Probability threshold must be between 0 and 1",
            );
        }

        if !forecast.precipitation_intensity_scale_top.is_finite()
            || forecast.precipitation_intensity_scale_top < 0.0
        {
            result.add_error(
                "forecast.precipitation_intensity_scale_top",
                "Intensity scale top must be a non-negative number",
            );
        }

        if forecast.show_forecast && forecast.max_days_forecast == 0 {
            result.add_warning(
                "forecast.max_days_forecast",
                "Forecast is enabled but shows 0 days",
            );
        }

        match (forecast.latitude, forecast.longitude) {
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) {
                    result.add_error("forecast.latitude", "Latitude must be between -90 and 90");
                }
                if !(-180.0..=180.0).contains(&lon) {
                    result.add_error(
                        "forecast.longitude",
                        "Longitude must be between -180 and 180",
                    );
                }
            }
            (Some(_), None) | (None, Some(_)) => {
                result.add_error(
                    "forecast.latitude",
                    "Set both latitude and longitude, or neither to use geolocation",
                );
            }
            (None, None) => {}
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Path of the SQLite file holding the cached snapshot
    pub fn cache_path(&self) -> PathBuf {
        self.config_dir.join("cache.db")
    }

    fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("skyglass");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    fn configured() -> Config {
        let mut config = Config::default();
        config.forecast.api_key = "secret".to_string();
        config.forecast.latitude = Some(40.71);
        config.forecast.longitude = Some(-74.0);
        config
    }

    #[test]
    fn test_valid_default_config() {
        let result = Config::default().validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
    }

    #[test]
    fn test_missing_api_key_is_warning() {
        let result = Config::default().validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "forecast.api_key"));
        assert!(!configured().validate().warnings.iter().any(|w| w.field == "forecast.api_key"));
    }

    #[test]
    fn test_invalid_api_base() {
        let mut config = configured();
        config.forecast.api_base = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "forecast.api_base"));

        config.forecast.api_base = "ftp://example.com/forecast".to_string();
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_zero_update_interval() {
        let mut config = configured();
        config.forecast.update_interval_ms = 0;
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "forecast.update_interval_ms"));
    }

    #[test]
    fn test_half_configured_coordinates() {
        let mut config = configured();
        config.forecast.longitude = None;
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "forecast.latitude"));
        assert!(!config.forecast.needs_geolocation());
    }

    #[test]
    fn test_out_of_range_values() {
        let mut config = configured();
        config.forecast.latitude = Some(91.0);
        config.forecast.precipitation_probability_threshold = 1.5;
        config.forecast.precipitation_graph_width = 0;
        let result = config.validate();
        assert_eq!(result.errors.len(), 3, "{:?}", result.errors);
    }

    #[test]
    fn test_units_api_codes() {
        assert_eq!(Units::Default.api_code(), "auto");
        assert_eq!(Units::Metric.api_code(), "si");
        assert_eq!(Units::Imperial.api_code(), "us");
        assert_eq!(Units::Metric.wind_speed_unit(), "m/s");
        assert_eq!(Units::Imperial.wind_speed_unit(), "mph");
    }

    #[test]
    fn test_load_from_file_with_legacy_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            [forecast]
            api_key = "abc"
            units = "metric"
            latitude = 52.37
            longitude = 4.89
            show_precipitation_graph = true
            update_interval_ms = 300000
            "#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.forecast.api_key, "abc");
        assert_eq!(config.forecast.units, Units::Metric);
        assert_eq!(config.forecast.latitude, Some(52.37));
        assert!(config.forecast.enable_precipitation_graph);
        assert_eq!(config.forecast.update_interval(), Duration::from_secs(300));
        // Unspecified values fall back to defaults
        assert_eq!(config.forecast.max_days_forecast, 7);
        assert_eq!(config.forecast.precipitation_fill_color, "white");
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }
}
