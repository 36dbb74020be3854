//! Read-only HTTP API over the cache file.

pub mod handlers;
pub mod state;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::config::ServerConfig;

pub use state::{ApiState, load_state};

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/api/buildings", get(handlers::list_buildings))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve `state` until Ctrl+C.
pub async fn serve(config: &ServerConfig, state: Arc<ApiState>) -> std::io::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        "Serving {} buildings on http://{}/api/buildings",
        state.buildings().len(),
        listener.local_addr()?
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
