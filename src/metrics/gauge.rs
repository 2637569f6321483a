//! Gauges: values that can be set to anything at any time.

use super::desc::{Descriptor, LabelValues, MetricKind};
use super::error::{MetricsError, Result};
use super::registry::Collector;
use super::series::SeriesMap;
use super::snapshot::{MetricSnapshot, Samples};

/// A settable value per label set.
///
/// A gauge without labels holds a single series that exists from creation
/// with value `0`, so it is always rendered.
#[derive(Debug)]
pub struct Gauge {
    desc: Descriptor,
    series: SeriesMap<f64>,
}

impl Gauge {
    pub fn new(name: &str, help: &str, label_names: &[&str]) -> Result<Self> {
        let desc = Descriptor::new(name, help, label_names)?;
        let series = SeriesMap::new();
        if desc.label_names().is_empty() {
            series.update(LabelValues::default(), || 0.0, |_| {});
        }
        Ok(Gauge { desc, series })
    }

    /// Replaces the value for `labels` unconditionally.
    pub fn set(&self, labels: &[(&str, &str)], value: f64) -> Result<()> {
        self.check(value)?;
        let key = self.desc.resolve(labels)?;
        self.series.update(key, || value, |current| *current = value);
        Ok(())
    }

    /// Adds `delta` (which may be negative) to the value for `labels`.
    pub fn add(&self, labels: &[(&str, &str)], delta: f64) -> Result<()> {
        self.check(delta)?;
        let key = self.desc.resolve(labels)?;
        self.series.update(key, || 0.0, |current| *current += delta);
        Ok(())
    }

    pub fn get(&self, labels: &[(&str, &str)]) -> Result<Option<f64>> {
        let key = self.desc.resolve(labels)?;
        Ok(self.series.get(&key))
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.desc
    }

    pub fn snapshot(&self) -> MetricSnapshot {
        MetricSnapshot {
            descriptor: self.desc.clone(),
            samples: Samples::Gauge(self.series.sorted()),
        }
    }

    fn check(&self, value: f64) -> Result<()> {
        if value.is_nan() {
            return Err(MetricsError::InvalidValue {
                metric: self.desc.name().to_string(),
                value,
                reason: "gauge values must be numbers",
            });
        }
        Ok(())
    }
}

impl Collector for Gauge {
    fn descriptors(&self) -> Vec<(&Descriptor, MetricKind)> {
        vec![(&self.desc, MetricKind::Gauge)]
    }

    fn collect(&self) -> Vec<MetricSnapshot> {
        vec![self.snapshot()]
    }
}
