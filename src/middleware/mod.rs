//! HTTP middleware.

mod request_metrics;

pub use request_metrics::{instrument, track_http_metrics, CompletionGuard, Instrumentation};
