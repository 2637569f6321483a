//! Shared application state.
//!
//! Contains the state that is shared across all request handlers: the
//! configuration and the metrics set.

use crate::config::ConfigV1;
use crate::metrics::Metrics;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// This state is cloned for each request handler; both members are cheap
/// reference-counted handles.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded at startup.
    pub config: Arc<ConfigV1>,
    /// Metrics registry and the handles the service records into.
    pub metrics: Metrics,
}
