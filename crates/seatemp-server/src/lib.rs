//! HTTP front end for seatemp: serves the dashboard and `/api/temperature`.

pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use seatemp_core::{AppError, ServerConfig};
use seatemp_weather::RefreshCache;

pub use routes::{routes, temperature, ErrorBody};

/// Resolve the configured host and port to a socket address
pub async fn resolve_addr(config: &ServerConfig) -> Result<SocketAddr, AppError> {
    let addr = config.listen_addr();
    let mut candidates = tokio::net::lookup_host(addr.clone())
        .await
        .map_err(|e| AppError::Bind {
            addr: addr.clone(),
            message: e.to_string(),
        })?;

    candidates.next().ok_or_else(|| AppError::Bind {
        addr,
        message: "host resolved to no addresses".to_string(),
    })
}

/// Run the server until Ctrl-C.
pub async fn serve(config: &ServerConfig, cache: Arc<RefreshCache>) -> Result<(), AppError> {
    let addr = resolve_addr(config).await?;

    if !config.static_dir.is_dir() {
        tracing::warn!(
            "Static directory {} not found; only the API will respond",
            config.static_dir.display()
        );
    }

    let filter = routes(cache, config.static_dir.clone());

    let (bound, server) = warp::serve(filter)
        .try_bind_with_graceful_shutdown(addr, shutdown_signal())
        .map_err(|e| AppError::Bind {
            addr: addr.to_string(),
            message: e.to_string(),
        })?;

    tracing::info!("Server running on {}", bound);
    server.await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
