//! HTTP route definitions and handlers.
//!
//! This module organizes all HTTP endpoints into logical groups: the demo
//! API, the metrics scrape endpoint and health checks. Every route, and the
//! fallback, is wrapped by the request metrics middleware.

mod api_routes;
mod health_routes;
mod metrics_routes;

use crate::middleware::instrument;
use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;
use axum::http::StatusCode;
use axum::Router;

/// Creates the application router with all configured routes.
///
/// Combines all route modules into a single router, instruments it and
/// attaches the application state for access in handlers.
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        .merge(api_routes::routes())
        .merge(metrics_routes::routes(&state.config.metrics.path))
        .merge(health_routes::routes())
        .fallback(not_found);

    instrument(router, state.metrics.clone()).with_state(state)
}

async fn not_found() -> HTTPError {
    HTTPError::new(StatusCode::NOT_FOUND, "Not found")
}
