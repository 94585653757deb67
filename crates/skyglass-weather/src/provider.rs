//! Forecast sources: the HTTP forecast API and a fixed snapshot for offline use.

use reqwest::{Client, StatusCode};
use skyglass_core::{ForecastConfig, Units};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;
use url::Url;

use crate::error::WeatherError;
use crate::types::{Location, WeatherSnapshot};

const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("skyglass/", env!("CARGO_PKG_VERSION"));
/// Longest error body echoed into an error message
const MAX_ERROR_BODY: usize = 200;

/// Anything that can produce a snapshot for a location.
pub trait WeatherSource: Send + Sync {
    fn fetch(
        &self,
        location: &Location,
    ) -> impl Future<Output = Result<WeatherSnapshot, WeatherError>> + Send;
}

/// Client for `{api_base}/{api_key}/{lat},{lon}?units=..&lang=..`.
#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    api_base: Url,
    api_key: String,
    units: Units,
    language: String,
}

impl WeatherProvider {
    pub fn new(config: &ForecastConfig) -> Result<Self, WeatherError> {
        if !config.has_api_key() {
            return Err(WeatherError::MissingApiKey);
        }

        let api_base = Url::parse(&config.api_base)
            .map_err(|e| WeatherError::InvalidBaseUrl(format!("{}: {}", config.api_base, e)))?;
        if api_base.cannot_be_a_base() {
            return Err(WeatherError::InvalidBaseUrl(config.api_base.clone()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            api_base,
            api_key: config.api_key.trim().to_string(),
            units: config.units,
            language: config.language.clone(),
        })
    }

    /// Full request URL for `location`. Contains the API key; do not log it.
    pub fn forecast_url(&self, location: &Location) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push(&self.api_key)
                .push(&format!("{},{}", location.latitude, location.longitude));
        }
        url.query_pairs_mut()
            .clear()
            .append_pair("units", self.units.api_code())
            .append_pair("lang", &self.language);
        url
    }
}

impl WeatherSource for WeatherProvider {
    #[instrument(skip(self), level = "debug")]
    async fn fetch(&self, location: &Location) -> Result<WeatherSnapshot, WeatherError> {
        tracing::debug!(units = self.units.api_code(), "Requesting forecast");

        let response = self
            .client
            .get(self.forecast_url(location))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(WeatherError::InvalidApiKey);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message: String = body.trim().chars().take(MAX_ERROR_BODY).collect();
            return Err(WeatherError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let snapshot: WeatherSnapshot =
            serde_json::from_str(&body).map_err(|e| WeatherError::Parse(e.to_string()))?;

        tracing::info!(
            "Fetched forecast observed at {}",
            snapshot.currently.time
        );
        Ok(snapshot)
    }
}

/// Serves one snapshot loaded up front, for running without network access.
#[derive(Debug, Clone)]
pub struct StaticSource {
    snapshot: WeatherSnapshot,
}

impl StaticSource {
    pub fn new(snapshot: WeatherSnapshot) -> Self {
        Self { snapshot }
    }

    pub fn from_file(path: &Path) -> Result<Self, WeatherError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| WeatherError::Parse(format!("{}: {}", path.display(), e)))?;
        let snapshot =
            serde_json::from_str(&text).map_err(|e| WeatherError::Parse(e.to_string()))?;
        Ok(Self::new(snapshot))
    }
}

impl WeatherSource for StaticSource {
    async fn fetch(&self, _location: &Location) -> Result<WeatherSnapshot, WeatherError> {
        tracing::debug!("Serving static forecast snapshot");
        Ok(self.snapshot.clone())
    }
}

/// Source selected from configuration at startup.
#[derive(Debug, Clone)]
pub enum ForecastSource {
    Http(WeatherProvider),
    Static(StaticSource),
}

impl ForecastSource {
    /// A configured `data_file` wins over the HTTP API.
    pub fn from_config(config: &ForecastConfig) -> Result<Self, WeatherError> {
        match &config.data_file {
            Some(path) => Ok(Self::Static(StaticSource::from_file(path)?)),
            None => Ok(Self::Http(WeatherProvider::new(config)?)),
        }
    }
}

impl WeatherSource for ForecastSource {
    async fn fetch(&self, location: &Location) -> Result<WeatherSnapshot, WeatherError> {
        match self {
            Self::Http(provider) => provider.fetch(location).await,
            Self::Static(source) => source.fetch(location).await,
        }
    }
}
