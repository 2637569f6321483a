use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::logging::LoggingConfig;
use super::metrics::MetricsConfig;

/// Default location of the configuration file, overridable with `JMET_CONFIG`.
pub const DEFAULT_CONFIG_PATH: &str = "./config.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("error loading configuration: {0}")]
    Load(#[from] figment::Error),
    #[error("invalid logging.level '{0}'. Valid values: trace, debug, info, warn, error")]
    InvalidLogLevel(String),
    #[error("invalid metrics.path '{0}': {1}")]
    InvalidMetricsPath(String, &'static str),
}

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ConfigV1 {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Overrides the port of `bind_address` (the `PORT` environment variable).
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Default for ConfigV1 {
    fn default() -> Self {
        ConfigV1 {
            bind_address: default_bind_address(),
            port: None,
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl ConfigV1 {
    /// The address to listen on, with `port` applied over `bind_address`.
    pub fn listen_address(&self) -> String {
        match self.port {
            Some(port) => {
                let host = self
                    .bind_address
                    .rsplit_once(':')
                    .map(|(host, _)| host)
                    .unwrap_or(&self.bind_address);
                format!("{}:{}", host, port)
            }
            None => self.bind_address.clone(),
        }
    }
}

/// Paths served by fixed routes, unavailable to the scrape endpoint.
const RESERVED_PATHS: [&str; 2] = ["/api/hello", "/health"];

fn validate(config: &ConfigV1) -> Result<(), ConfigError> {
    let path = &config.metrics.path;
    if !path.starts_with('/') {
        return Err(ConfigError::InvalidMetricsPath(
            path.clone(),
            "must start with '/'",
        ));
    }
    // axum reads these as captures or wildcards, not literal segments.
    if path.contains(['*', ':', '{', '}']) {
        return Err(ConfigError::InvalidMetricsPath(
            path.clone(),
            "must be a literal path without route parameters or wildcards",
        ));
    }
    if RESERVED_PATHS.contains(&path.as_str()) {
        return Err(ConfigError::InvalidMetricsPath(
            path.clone(),
            "already used by another route",
        ));
    }
    Ok(())
}

fn default_bind_address() -> String {
    "0.0.0.0:3000".to_string()
}

/// Load config from the YAML file, then `JMET_*` and `PORT` environment variables.
///
/// A missing file is not an error: every section has defaults.
pub fn load_config() -> Result<ConfigV1, ConfigError> {
    let path = std::env::var("JMET_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let figment = Figment::new()
        .merge(Yaml::file(path))
        .merge(Env::prefixed("JMET_").ignore(&["CONFIG"]).split("__"))
        .merge(Env::raw().only(&["PORT"]));
    extract_config(figment)
}

/// Extracts a versioned config from any figment; `version` defaults to the latest.
pub fn extract_config(figment: Figment) -> Result<ConfigV1, ConfigError> {
    let figment = Figment::from(Serialized::default("version", "1.0.0")).merge(figment);
    let config = match figment.extract::<Config>()? {
        Config::ConfigV1(c) => c,
    };
    // handle configuration migration between versions here when necessary
    validate(&config)?;
    Ok(config)
}

/// The JSON schema of the configuration, pretty printed.
pub fn schema_json() -> serde_json::Result<String> {
    let schema = schema_for!(Config);
    serde_json::to_string_pretty(&schema)
}
