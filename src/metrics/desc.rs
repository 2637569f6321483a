//! Metric descriptors and label schema resolution.

use std::fmt;

use super::error::{MetricsError, Result};

/// The kind of a metric, as written on its `# TYPE` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label values in declared schema order. This is the key of every series.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelValues(Vec<String>);

impl LabelValues {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Name, help text and label schema of a metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    name: String,
    help: String,
    label_names: Vec<String>,
}

impl Descriptor {
    /// Builds a descriptor after validating the metric and label names.
    pub fn new(name: &str, help: &str, label_names: &[&str]) -> Result<Self> {
        if !is_valid_metric_name(name) {
            return Err(invalid(name, format!("'{}' is not a valid metric name", name)));
        }

        let mut names: Vec<String> = Vec::with_capacity(label_names.len());
        for label in label_names {
            if !is_valid_label_name(label) {
                return Err(invalid(name, format!("'{}' is not a valid label name", label)));
            }
            if names.iter().any(|n| n == label) {
                return Err(invalid(name, format!("label '{}' is declared twice", label)));
            }
            names.push(label.to_string());
        }

        Ok(Descriptor {
            name: name.to_string(),
            help: help.to_string(),
            label_names: names,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }

    /// Resolves `(name, value)` pairs, given in any order, into schema order.
    ///
    /// Every declared name must appear exactly once and nothing else may appear.
    pub fn resolve(&self, labels: &[(&str, &str)]) -> Result<LabelValues> {
        if labels.len() != self.label_names.len() {
            return Err(self.mismatch(labels));
        }

        let mut values = Vec::with_capacity(self.label_names.len());
        for declared in &self.label_names {
            let mut found = labels.iter().filter(|(k, _)| *k == declared.as_str());
            match (found.next(), found.next()) {
                (Some((_, v)), None) => values.push((*v).to_string()),
                _ => return Err(self.mismatch(labels)),
            }
        }

        Ok(LabelValues(values))
    }

    fn mismatch(&self, labels: &[(&str, &str)]) -> MetricsError {
        MetricsError::SchemaMismatch {
            metric: self.name.clone(),
            expected: self.label_names.clone(),
            got: labels.iter().map(|(k, _)| k.to_string()).collect(),
        }
    }
}

pub(crate) fn invalid(metric: &str, reason: String) -> MetricsError {
    MetricsError::InvalidDescriptor {
        metric: metric.to_string(),
        reason,
    }
}

fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

fn is_valid_label_name(name: &str) -> bool {
    if name.starts_with("__") {
        return false;
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
