#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, Response};
use axum::Router;
use figment::{
    providers::{Format, Yaml},
    Figment,
};
use jmet::config::{extract_config, ConfigV1};
use jmet::metrics::Metrics;
use jmet::middleware;
use jmet::routes::create_router;
use jmet::startup::build_state;

pub const TEST_CONFIG: &str = r#"
version: "1.0.0"
logging:
  level: "debug"
  format: "json"
metrics:
  path: /metrics
  duration_buckets: [0.1, 0.3, 0.5, 1, 1.5, 2, 5]
  default_metrics:
    enabled: true
    prefix: "node_"
bind_address: 127.0.0.1:8081
"#;

pub fn load_test_config() -> ConfigV1 {
    extract_config(Figment::new().merge(Yaml::string(TEST_CONFIG)))
        .expect("Failed to parse test config YAML")
}

/// The real application router plus a handle on its metrics.
pub fn build_app(config: ConfigV1) -> (Router, Metrics) {
    let state = build_state(Arc::new(config)).expect("metrics should register");
    let metrics = state.metrics.clone();
    (create_router(state), metrics)
}

/// Wraps an arbitrary router with the request metrics middleware.
pub fn instrument(router: Router, metrics: &Metrics) -> Router {
    middleware::instrument(router, metrics.clone())
}

pub fn test_metrics() -> Metrics {
    Metrics::new(&load_test_config().metrics).expect("metrics should register")
}

pub fn request(path: &str, method: Method) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .body(Body::empty())
        .expect("failed to build request")
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    String::from_utf8(bytes.to_vec()).expect("body should be UTF-8")
}

pub fn request_labels<'a>(
    method: &'a str,
    route: &'a str,
    status: &'a str,
) -> [(&'static str, &'a str); 3] {
    [("method", method), ("route", route), ("status_code", status)]
}
