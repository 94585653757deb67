//! Weather-specific error types and their mapping into the core hierarchy.

use skyglass_core::error::ReqwestErrorExt;
use skyglass_core::{AppError, ConfigError, ForecastError, NetworkError, StorageError};
use thiserror::Error;

/// Location service errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location request timed out")]
    Timeout,
}

/// Weather provider errors
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Forecast API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Invalid API key")]
    InvalidApiKey,
    #[error("No API key configured")]
    MissingApiKey,
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("Location error: {0}")]
    Location(#[from] LocationError),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Cache error: {0}")]
    Cache(String),
}

impl From<WeatherError> for AppError {
    fn from(e: WeatherError) -> Self {
        match e {
            WeatherError::Network(err) => AppError::Network(err.into_network_error()),
            WeatherError::Api { status, message } if status >= 500 => {
                AppError::Network(NetworkError::ServerError { status, message })
            }
            WeatherError::Api { status, message } => {
                AppError::Forecast(ForecastError::Rejected(format!("{status}: {message}")))
            }
            WeatherError::InvalidApiKey => AppError::Forecast(ForecastError::InvalidApiKey),
            WeatherError::MissingApiKey => {
                AppError::Config(ConfigError::MissingSetting("forecast.api_key".to_string()))
            }
            WeatherError::InvalidBaseUrl(msg) => AppError::Config(ConfigError::Invalid(msg)),
            WeatherError::Location(err) => {
                AppError::Forecast(ForecastError::LocationUnavailable(err.to_string()))
            }
            WeatherError::Parse(msg) => AppError::Network(NetworkError::InvalidResponse(msg)),
            WeatherError::Cache(msg) => AppError::Storage(StorageError::OperationFailed(msg)),
        }
    }
}
