//! Immutable views of metric state handed from the registry to the encoder.

use super::desc::{Descriptor, LabelValues, MetricKind};

/// Accumulated state of one histogram series.
///
/// `buckets[i]` is the cumulative number of observations `<= bounds[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramState {
    pub buckets: Vec<u64>,
    pub sum: f64,
    pub count: u64,
}

impl HistogramState {
    pub(crate) fn empty(bucket_count: usize) -> Self {
        HistogramState {
            buckets: vec![0; bucket_count],
            sum: 0.0,
            count: 0,
        }
    }
}

/// Series of a single metric, sorted by label values.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    Counter(Vec<(LabelValues, f64)>),
    Gauge(Vec<(LabelValues, f64)>),
    Histogram {
        bounds: Vec<f64>,
        series: Vec<(LabelValues, HistogramState)>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricSnapshot {
    pub descriptor: Descriptor,
    pub samples: Samples,
}

impl MetricSnapshot {
    pub fn kind(&self) -> MetricKind {
        match self.samples {
            Samples::Counter(_) => MetricKind::Counter,
            Samples::Gauge(_) => MetricKind::Gauge,
            Samples::Histogram { .. } => MetricKind::Histogram,
        }
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }
}
