//! Demo business endpoints.

use crate::metrics::MetricsRecorder;
use crate::state::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

#[derive(Serialize)]
pub struct HelloResponse {
    pub message: &'static str,
}

/// Registers the demo API routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/hello", get(hello))
}

/// Greets the caller and publishes a simulated active user count (0..100).
async fn hello(State(state): State<AppState>) -> Json<HelloResponse> {
    let active_users = (Uuid::new_v4().as_u128() % 100) as f64;
    if let Err(e) = state.metrics.set_active_users(active_users) {
        warn!(error = %e, "Failed to update active users");
    }

    Json(HelloResponse {
        message: "Hello, JMet",
    })
}
