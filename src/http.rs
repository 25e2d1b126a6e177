//! HTTP server for the Prometheus metrics and health endpoints.
//!
//! Runs on a separate tokio task:
//! - `GET /metrics` - Prometheus text format
//! - `GET /health` - `{"status":"ok","server":...,"sessions":N,"online_users":M}`

use crate::state::Hub;
use axum::extract::State;
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;

/// Handler for GET /metrics - returns Prometheus metrics in text format.
async fn metrics_handler() -> String {
    crate::metrics::gather_metrics()
}

/// Handler for GET /health - liveness plus a presence summary.
async fn health_handler(State(hub): State<Arc<Hub>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "server": hub.server_name(),
        "sessions": hub.session_count(),
        "online_users": hub.online_users(),
    }))
}

/// Build the side router.
pub fn router(hub: Arc<Hub>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(hub)
}

/// Run the HTTP server for Prometheus metrics.
///
/// Binds to `0.0.0.0:port` and serves until the Hub signals shutdown.
/// This is a long-running task that should be spawned in the background.
pub async fn run_http_server(port: u16, hub: Arc<Hub>) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Prometheus HTTP server listening on {}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind HTTP server on {}: {}", addr, e);
            return;
        }
    };

    let mut shutdown = hub.lifecycle().subscribe();
    let stopping = Arc::clone(&hub);
    let app = router(hub);
    let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
        if !stopping.lifecycle().is_shutting_down() {
            let _ = shutdown.recv().await;
        }
    });
    if let Err(e) = serve.await {
        tracing::error!("HTTP server error: {}", e);
    }
}
