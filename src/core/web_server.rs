//! Keep-alive HTTP server.
//!
//! Liveness responder for hosting platforms that ping the process. Runs on
//! KEEP_ALIVE_PORT (default 8080) on its own task and shares no state with
//! the bot dispatchers.

use axum::{response::Json, routing::get, Router};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;

#[derive(Debug, Serialize)]
struct LivenessResponse {
    status: &'static str,
    message: &'static str,
    timestamp: i64,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Start the keep-alive server.
pub async fn start_keep_alive_server(port: u16) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router();

    log::info!("Starting keep-alive server on http://{}", addr);
    log::info!("  /        - Liveness (JSON)");
    log::info!("  /health  - Health check");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router() -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route("/health", get(health_handler))
}

/// GET /: liveness status with a timestamp.
async fn home_handler() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive",
        message: "Bot is running!",
        timestamp: chrono::Utc::now().timestamp(),
    })
}

/// GET /health: simple health check.
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}
