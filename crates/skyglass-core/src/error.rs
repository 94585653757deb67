//! Error hierarchy shared by the host and its modules.
//!
//! Module crates keep their own detailed error enums and convert into
//! `AppError`, whose `user_message()` is short enough to put on the dashboard.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Forecast error: {0}")]
    Forecast(#[from] ForecastError),
}

impl AppError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Storage(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Forecast(e) => e.user_message(),
        }
    }

    /// True when the next scheduled attempt may succeed without user action.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Network(NetworkError::ServerError { status, .. }) => *status >= 500,
            AppError::Network(_) | AppError::Storage(_) => true,
            AppError::Config(_) | AppError::Forecast(_) => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server returned {status}: {message}")]
    ServerError { status: u16, message: String },

    #[error("Unexpected response body: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => "Forecast service unreachable. Will try again.",
            NetworkError::Timeout => "Forecast request timed out. Will try again.",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "Forecast service is down. Will try again."
            }
            NetworkError::ServerError { .. } => "Forecast request was refused.",
            NetworkError::InvalidResponse(_) => "Forecast service sent an unreadable reply.",
        }
    }
}

/// Snapshot cache errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    #[error("Cache operation failed: {0}")]
    OperationFailed(String),

    #[error("Cache is corrupt: {0}")]
    Corruption(String),
}

impl StorageError {
    pub fn user_message(&self) -> &'static str {
        match self {
            StorageError::Unavailable(_) => "Forecast cache is unavailable.",
            StorageError::OperationFailed(_) => "Forecast cache could not be updated.",
            StorageError::Corruption(_) => "Cached forecast was unreadable and was discarded.",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid setting: {0}")]
    Invalid(String),

    #[error("Missing setting: {0}")]
    MissingSetting(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "A setting is invalid. Check the config file.",
            ConfigError::MissingSetting(_) => "A required setting is missing. Check the config file.",
        }
    }
}

/// Failures reported by the forecast provider itself.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("API key rejected")]
    InvalidApiKey,
}

impl ForecastError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ForecastError::LocationUnavailable(_) => {
                "Location lookup failed. Set latitude and longitude in the config."
            }
            ForecastError::Rejected(_) => "Forecast request was refused.",
            ForecastError::InvalidApiKey => "Forecast API key was rejected. Check the config file.",
        }
    }
}

/// Classify a `reqwest` failure.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if self.is_decode() {
            NetworkError::InvalidResponse(self.to_string())
        } else if let Some(status) = self.status() {
            NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}

/// Classify a `rusqlite` failure.
pub trait RusqliteErrorExt {
    fn into_storage_error(self) -> StorageError;
}

impl RusqliteErrorExt for rusqlite::Error {
    fn into_storage_error(self) -> StorageError {
        match &self {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::DatabaseCorrupt
                    || err.code == rusqlite::ErrorCode::NotADatabase =>
            {
                StorageError::Corruption(self.to_string())
            }
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::CannotOpen =>
            {
                StorageError::Unavailable(self.to_string())
            }
            _ => StorageError::OperationFailed(self.to_string()),
        }
    }
}
