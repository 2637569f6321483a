//! The HTTP metric set of the service and its recording seam.

use std::sync::Arc;

use super::counter::Counter;
use super::encoder::encode;
use super::error::Result;
use super::gauge::Gauge;
use super::histogram::Histogram;
use super::process::ProcessCollector;
use super::registry::Registry;
use crate::config::MetricsConfig;

/// Label schema shared by every per-request metric.
pub const REQUEST_LABELS: [&str; 3] = ["method", "route", "status_code"];

/// Trait for recording application metrics.
pub trait MetricsRecorder: Clone + Send + Sync + 'static {
    /// Records one finished request: counts it, counts it again as an error
    /// when `status >= 400`, and observes its duration.
    fn record_request(&self, method: &str, route: &str, status: u16, duration_secs: f64)
        -> Result<()>;

    /// Sets the current number of active users.
    fn set_active_users(&self, value: f64) -> Result<()>;
}

/// Registry-backed metrics of the service.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,

    // Request metrics
    http_requests_total: Arc<Counter>,
    http_errors_total: Arc<Counter>,
    http_request_duration_seconds: Arc<Histogram>,

    // Application metrics
    app_active_users: Arc<Gauge>,
}

impl Metrics {
    /// Builds a fresh registry holding the default process metrics (when
    /// enabled) followed by the HTTP metrics.
    pub fn new(config: &MetricsConfig) -> Result<Self> {
        let mut registry = Registry::new();

        if config.default_metrics.enabled {
            registry.register(Arc::new(ProcessCollector::new(
                &config.default_metrics.prefix,
            )?))?;
        }

        Self::with_registry(registry, &config.duration_buckets)
    }

    /// Adds the HTTP metrics to a registry that may already hold metrics from
    /// other collectors, then freezes it.
    pub fn with_registry(mut registry: Registry, duration_buckets: &[f64]) -> Result<Self> {
        let http_requests_total = registry.register_counter(
            "http_requests_total",
            "Total number of HTTP requests",
            &REQUEST_LABELS,
        )?;

        let http_errors_total = registry.register_counter(
            "http_errors_total",
            "Total number of HTTP errors",
            &REQUEST_LABELS,
        )?;

        let http_request_duration_seconds = registry.register_histogram(
            "http_request_duration_seconds",
            "Duration of HTTP requests in seconds",
            &REQUEST_LABELS,
            duration_buckets,
        )?;

        let app_active_users =
            registry.register_gauge("app_active_users", "Number of active users in the app", &[])?;

        Ok(Metrics {
            registry: Arc::new(registry),
            http_requests_total,
            http_errors_total,
            http_request_duration_seconds,
            app_active_users,
        })
    }

    /// Renders all metrics in the text exposition format, with its content type.
    pub fn render(&self) -> Result<(Vec<u8>, &'static str)> {
        encode(&self.registry.collect_all())
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn http_requests_total(&self) -> &Counter {
        &self.http_requests_total
    }

    pub fn http_errors_total(&self) -> &Counter {
        &self.http_errors_total
    }

    pub fn http_request_duration_seconds(&self) -> &Histogram {
        &self.http_request_duration_seconds
    }

    pub fn app_active_users(&self) -> &Gauge {
        &self.app_active_users
    }
}

impl MetricsRecorder for Metrics {
    fn record_request(
        &self,
        method: &str,
        route: &str,
        status: u16,
        duration_secs: f64,
    ) -> Result<()> {
        let status_code = status.to_string();
        let labels = [
            ("method", method),
            ("route", route),
            ("status_code", status_code.as_str()),
        ];

        self.http_requests_total.inc(&labels)?;
        if status >= 400 {
            self.http_errors_total.inc(&labels)?;
        }
        self.http_request_duration_seconds
            .observe(&labels, duration_secs)
    }

    fn set_active_users(&self, value: f64) -> Result<()> {
        self.app_active_users.set(&[], value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricsError;

    fn labels<'a>(route: &'a str, status: &'a str) -> [(&'static str, &'a str); 3] {
        [("method", "GET"), ("route", route), ("status_code", status)]
    }

    #[test]
    fn success_counts_request_but_not_error() {
        let metrics = Metrics::new(&MetricsConfig::default()).unwrap();
        metrics.record_request("GET", "/api/hello", 200, 0.01).unwrap();

        let l = labels("/api/hello", "200");
        assert_eq!(metrics.http_requests_total().get(&l).unwrap(), Some(1.0));
        assert_eq!(metrics.http_errors_total().get(&l).unwrap(), None);

        let state = metrics.http_request_duration_seconds().get(&l).unwrap().unwrap();
        assert_eq!(state.count, 1);
        assert_eq!(state.buckets[0], 1);
    }

    #[test]
    fn error_status_counts_in_both_counters() {
        let metrics = Metrics::new(&MetricsConfig::default()).unwrap();
        metrics.record_request("GET", "/missing", 404, 0.002).unwrap();
        metrics.record_request("GET", "/missing", 404, 0.002).unwrap();

        let l = labels("/missing", "404");
        assert_eq!(metrics.http_requests_total().get(&l).unwrap(), Some(2.0));
        assert_eq!(metrics.http_errors_total().get(&l).unwrap(), Some(2.0));
    }

    #[test]
    fn default_metrics_are_registered_first() {
        let metrics = Metrics::new(&MetricsConfig::default()).unwrap();
        let names: Vec<String> = metrics
            .registry()
            .collect_all()
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "node_process_start_time_seconds",
                "node_process_uptime_seconds",
                "http_requests_total",
                "http_errors_total",
                "http_request_duration_seconds",
                "app_active_users",
            ]
        );
    }

    #[test]
    fn conflicting_pre_registered_metric_fails_setup() {
        let mut registry = Registry::new();
        registry
            .register_gauge("app_active_users", "external", &[])
            .unwrap();
        let err = match Metrics::with_registry(registry, &[0.1]) {
            Err(e) => e,
            Ok(_) => panic!("expected duplicate name"),
        };
        assert_eq!(err, MetricsError::DuplicateName("app_active_users".into()));
    }

    #[test]
    fn invalid_buckets_fail_setup() {
        let config = MetricsConfig {
            duration_buckets: vec![1.0, 0.5],
            ..MetricsConfig::default()
        };
        assert!(matches!(
            Metrics::new(&config),
            Err(MetricsError::InvalidDescriptor { .. })
        ));
    }
}
