//! Health check HTTP server.
//!
//! Three endpoints, suitable as Kubernetes probes:
//!
//! - `GET /health`: 200 `{"status":"UP"}` while the gateway is ready,
//!   503 `{"status":"DOWN"}` otherwise.
//! - `GET /health/live`: liveness, always 200 while the process runs.
//! - `GET /health/ready`: readiness, 200 once the consumer is subscribed.

use std::net::SocketAddr;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::{GatewayError, Result};
use crate::lifecycle::ReadinessGate;

pub fn router(gate: ReadinessGate) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/health/live", get(handle_live))
        .route("/health/ready", get(handle_ready))
        .with_state(gate)
}

/// Serve the health endpoints until the shutdown token fires.
pub async fn serve_health(port: u16, gate: ReadinessGate, shutdown: CancellationToken) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| GatewayError::Health(format!("failed to bind {addr}: {e}")))?;

    info!(port, "health server started");

    axum::serve(listener, router(gate))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| GatewayError::Health(e.to_string()))?;

    info!("health server stopped");
    Ok(())
}

async fn handle_health(State(gate): State<ReadinessGate>) -> impl IntoResponse {
    if gate.is_ready() {
        (StatusCode::OK, Json(json!({"status": "UP"})))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"status": "DOWN"})))
    }
}

async fn handle_live() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ALIVE"})))
}

async fn handle_ready(State(gate): State<ReadinessGate>) -> impl IntoResponse {
    if gate.is_ready() {
        (StatusCode::OK, Json(json!({"status": "READY"})))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"status": "NOT_READY"})),
        )
    }
}
