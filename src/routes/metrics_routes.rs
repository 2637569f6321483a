//! Metrics exposition endpoint.

use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use tracing::error;

/// Creates the scrape route at `path`.
pub fn routes(path: &str) -> Router<AppState> {
    Router::new().route(path, get(metrics_handler))
}

/// Handler for the scrape endpoint.
///
/// Returns all collected metrics in the text exposition format. A snapshot
/// that cannot be encoded yields a 500 and no partial body.
async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse, HTTPError> {
    let (body, content_type) = state.metrics.render().map_err(|e| {
        error!(error = %e, "Failed to encode metrics");
        HTTPError::internal(e.to_string())
    })?;

    Ok((StatusCode::OK, [(header::CONTENT_TYPE, content_type)], body))
}
