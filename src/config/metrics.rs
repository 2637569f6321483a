use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Buckets of `http_request_duration_seconds`, in seconds.
pub const DEFAULT_DURATION_BUCKETS: [f64; 7] = [0.1, 0.3, 0.5, 1.0, 1.5, 2.0, 5.0];

/// Scrape endpoint and HTTP metric settings.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(default)]
pub struct MetricsConfig {
    /// Path the scrape endpoint is mounted on.
    pub path: String,
    pub duration_buckets: Vec<f64>,
    pub default_metrics: DefaultMetricsConfig,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        MetricsConfig {
            path: "/metrics".to_string(),
            duration_buckets: DEFAULT_DURATION_BUCKETS.to_vec(),
            default_metrics: DefaultMetricsConfig::default(),
        }
    }
}

/// Process metrics registered next to the HTTP metrics.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(default)]
pub struct DefaultMetricsConfig {
    pub enabled: bool,
    /// Prepended to every process metric name.
    pub prefix: String,
}

impl Default for DefaultMetricsConfig {
    fn default() -> Self {
        DefaultMetricsConfig {
            enabled: true,
            prefix: "node_".to_string(),
        }
    }
}
