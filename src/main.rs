//! Quality Backend - repository quality metadata over HTTP
//!
//! Serves a cached data set that is refreshed in the background, with
//! graceful shutdown on SIGINT/SIGTERM.

use std::sync::Arc;

use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quality_backend::rotation::{FileRotationStrategy, RotationStrategy, StaticRotationStrategy};
use quality_backend::{CacheStore, Server, ServerConfig};

/// Main entry point for the quality backend.
///
/// # Startup Sequence
/// 1. Load configuration from environment variables
/// 2. Initialize tracing subscriber for logging
/// 3. Pick the rotation strategy (file-backed when `QUALITY_DATA_FILE` is set)
/// 4. Create the cache store with configured parameters
/// 5. Run the server until SIGINT/SIGTERM, then drain and exit
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env();

    // RUST_LOG overrides LOG_LEVEL
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "quality_backend={level},tower_http={level}",
                    level = config.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Quality Backend");
    info!(
        "Configuration loaded: addr={}, h2c={}, max_cost={}, rotation_interval={}s",
        config.addr(),
        config.h2c,
        config.cache.max_cost,
        config.rotation_interval.as_secs()
    );

    let strategy: Arc<dyn RotationStrategy> = match &config.data_file {
        Some(path) => Arc::new(FileRotationStrategy::new(path, config.rotation_interval)),
        None => Arc::new(StaticRotationStrategy::builtin(config.rotation_interval)?),
    };
    info!("Using {} rotation strategy", strategy.name());

    let cache = Arc::new(CacheStore::new(&config.cache));
    info!("Cache store initialized");

    Server::new(Arc::new(config), cache, strategy)
        .listen_and_serve(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
