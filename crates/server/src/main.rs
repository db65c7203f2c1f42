mod bootstrap;
mod health;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use punchclock_core::config::{AppConfig, LoadOptions};
use tracing_subscriber::EnvFilter;

fn init_logging(config: &AppConfig) {
    use punchclock_core::config::LogFormat::*;

    // `RUST_LOG` wins over the configured level when set.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    health::spawn(
        &app.config.server.bind_address,
        app.config.server.health_check_port,
        app.ledger.store(),
    )
    .await?;

    app.panels.post_all(&app.config.attendance.worker_channels).await;

    let runner = Arc::clone(&app.slack_runner);
    let socket_task = tokio::spawn(async move { runner.start().await });

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        worker_channels = app.config.attendance.worker_channels.len(),
        ranking_channel = %app.config.ranking.channel_id,
        "punchclock-server started"
    );

    tokio::select! {
        result = socket_task => {
            match result {
                Ok(Ok(())) => tracing::warn!(
                    event_name = "system.server.socket_stopped",
                    correlation_id = "runtime",
                    "socket mode runner stopped; no more interactions will be received"
                ),
                Ok(Err(error)) => return Err(error),
                Err(join_error) => return Err(join_error.into()),
            }
            wait_for_shutdown().await?;
        }
        signal = wait_for_shutdown() => signal?,
    }

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "punchclock-server stopping"
    );

    // Taking the ledger lock waits for an in-flight write to land on disk.
    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    if tokio::time::timeout(grace, app.ledger.open_sessions()).await.is_err() {
        tracing::warn!(
            event_name = "system.server.shutdown_timeout",
            correlation_id = "shutdown",
            grace_secs = grace.as_secs(),
            "ledger still busy after grace period; exiting anyway"
        );
    }

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
