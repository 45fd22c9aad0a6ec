use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use waddles_server::{
    config::Config, create_routes, directory::RoomDirectory, websocket::ConnectionManager,
};
use waddles_types::GameSettings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Waddles server...");

    let config = Config::from_env().context("failed to read configuration")?;
    let connection_manager = Arc::new(ConnectionManager::new());
    let directory = Arc::new(RoomDirectory::new(
        GameSettings::default(),
        config.default_max_players,
    ));

    let routes = create_routes(connection_manager, directory, config.rate_limit());

    info!("Server starting on {}", config.socket_addr());

    let (addr, server) = warp::serve(routes)
        .try_bind_with_graceful_shutdown(config.socket_addr(), shutdown_signal())
        .with_context(|| format!("failed to bind {}", config.socket_addr()))?;

    info!(
        "Server started successfully on {}. Press Ctrl+C to stop.",
        addr
    );
    server.await;
    info!("Server shutdown complete.");
    Ok(())
}

/// Resolves on SIGINT (Ctrl+C) or SIGTERM
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use signal::unix::{SignalKind, signal as unix_signal};

        match (
            unix_signal(SignalKind::interrupt()),
            unix_signal(SignalKind::terminate()),
        ) {
            (Ok(mut sigint), Ok(mut sigterm)) => {
                tokio::select! {
                    _ = sigint.recv() => {
                        info!("Received SIGINT, shutting down gracefully...");
                    }
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down gracefully...");
                    }
                }
                return;
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!("Could not install signal handlers ({}), using Ctrl+C only", e);
            }
        }
    }

    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down gracefully...");
}
