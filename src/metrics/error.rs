//! Error taxonomy for the metrics engine.
//!
//! Every variant describes a programming error: none of them are transient and
//! none should be retried.

use thiserror::Error;

/// Result alias used throughout the metrics module.
pub type Result<T> = std::result::Result<T, MetricsError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricsError {
    /// The supplied label names do not match the metric's declared schema.
    #[error("label schema mismatch for '{metric}': expected [{}], got [{}]", expected.join(", "), got.join(", "))]
    SchemaMismatch {
        metric: String,
        expected: Vec<String>,
        got: Vec<String>,
    },

    /// A value that the metric kind cannot accept (negative counter increment, NaN).
    #[error("invalid value {value} for '{metric}': {reason}")]
    InvalidValue {
        metric: String,
        value: f64,
        reason: &'static str,
    },

    /// A metric with this name is already registered.
    #[error("metric '{0}' is already registered")]
    DuplicateName(String),

    /// Bad metric name, label name or bucket layout at construction time.
    #[error("invalid descriptor for '{metric}': {reason}")]
    InvalidDescriptor { metric: String, reason: String },

    /// Internal inconsistency found while rendering a snapshot.
    #[error("encoding invariant violated for '{metric}': {reason}")]
    EncodingInvariantViolation { metric: String, reason: String },
}

impl MetricsError {
    /// Short stable key for the variant, used for log throttling.
    pub fn kind(&self) -> &'static str {
        match self {
            MetricsError::SchemaMismatch { .. } => "schema_mismatch",
            MetricsError::InvalidValue { .. } => "invalid_value",
            MetricsError::DuplicateName(_) => "duplicate_name",
            MetricsError::InvalidDescriptor { .. } => "invalid_descriptor",
            MetricsError::EncodingInvariantViolation { .. } => "encoding_invariant_violation",
        }
    }
}
