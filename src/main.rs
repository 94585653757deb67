use anyhow::Result;
use skyglass_core::{Config, HostModule, ModuleContext, Notification};
use skyglass_weather::{run_updates, ForecastSource, ForecastWidget, SqliteStore, Unavailable};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    let (config, validation) = Config::load_validated()?;
    skyglass_core::init(config.forecast.debug)?;
    for warning in &validation.warnings {
        tracing::warn!("Config warning: {}", warning);
    }

    let store = SqliteStore::new(config.cache_path())?;
    let source = match ForecastSource::from_config(&config.forecast) {
        Ok(source) => Some(source),
        Err(e) => {
            tracing::error!("Forecast source unavailable: {}", e);
            None
        }
    };

    let mut widget = ForecastWidget::new(source, store);
    widget.on_start(&ModuleContext::new(Arc::new(config)))?;

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        tracing::info!("Shutting down");
        shutdown.cancel();
    });

    // Host notifications arrive on stdin, one per line
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match Notification::parse(&line) {
                Some(notification) => {
                    if tx.send(notification).await.is_err() {
                        break;
                    }
                }
                None => tracing::debug!(line = %line, "Ignoring unrecognized input"),
            }
        }
    });

    tracing::info!("Skyglass started");

    let mut last_frame = String::new();
    run_updates(&mut widget, &Unavailable, rx, cancel, |node| {
        let frame = node.to_string();
        if frame != last_frame {
            println!("{}", frame);
            last_frame = frame;
        }
    })
    .await;

    Ok(())
}
