//! Application startup and server initialization.
//!
//! This module handles the creation and configuration of the HTTP server:
//! building the metrics registry, the shared state and the instrumented router.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ConfigV1;
use crate::metrics::Metrics;
use crate::routes;
use crate::state::AppState;

/// Builds the application state: one metrics registry for the whole process.
pub fn build_state(config: Arc<ConfigV1>) -> Result<AppState, crate::metrics::MetricsError> {
    let metrics = Metrics::new(&config.metrics)?;
    Ok(AppState { config, metrics })
}

/// Initializes and runs the application server.
///
/// Binds to the configured address and serves requests until Ctrl+C.
///
/// # Errors
///
/// Returns an error if the metrics cannot be registered, the server fails to
/// bind to the specified address or encounters a runtime error.
pub async fn run(config: Arc<ConfigV1>) -> Result<(), Box<dyn std::error::Error>> {
    let state = build_state(config.clone())?;
    let app = routes::create_router(state);

    let address = config.listen_address();
    let listener = TcpListener::bind(&address).await?;
    info!(
        address = %address,
        metrics_path = %config.metrics.path,
        "Server running"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
