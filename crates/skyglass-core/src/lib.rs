pub mod config;
pub mod error;
pub mod module;
pub mod render;

pub use config::{Config, ForecastConfig, Units, ValidationResult};
pub use error::{AppError, ConfigError, ForecastError, NetworkError, StorageError};
pub use module::{HostModule, ModuleContext, Notification};
pub use render::Node;

use anyhow::Result;

/// Initialize logging.
///
/// `RUST_LOG` wins when set; otherwise `debug` turns on debug-level output.
pub fn init(debug: bool) -> Result<()> {
    let default_level = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    tracing::info!("Skyglass core initialized");
    Ok(())
}
