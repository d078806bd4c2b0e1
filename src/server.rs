//! Liveness endpoints for hosting-platform probes.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

pub fn health_router() -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Bind the listener eagerly, then serve in the background. Binding before
/// the Gateway connects keeps the port visible to uptime probes during the
/// (slower) Discord startup.
pub async fn bind_health_server(host: &str, port: u16) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind((host, port)).await?;
    info!("health server listening on {}", listener.local_addr()?);
    Ok(listener)
}

pub async fn serve_health(listener: TcpListener) -> std::io::Result<()> {
    axum::serve(listener, health_router()).await
}
