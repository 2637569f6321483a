//! Cumulative histograms with fixed bucket boundaries.

use std::time::Instant;

use super::desc::{invalid, Descriptor, MetricKind};
use super::error::{MetricsError, Result};
use super::registry::Collector;
use super::series::SeriesMap;
use super::snapshot::{HistogramState, MetricSnapshot, Samples};

/// Default boundaries, in seconds.
pub const DEFAULT_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// `count` boundaries starting at `start`, each `width` apart.
pub fn linear_buckets(start: f64, width: f64, count: usize) -> Vec<f64> {
    (0..count).map(|i| start + width * i as f64).collect()
}

/// `count` boundaries starting at `start`, each `factor` times the previous.
pub fn exponential_buckets(start: f64, factor: f64, count: usize) -> Vec<f64> {
    std::iter::successors(Some(start), |b| Some(b * factor))
        .take(count)
        .collect()
}

/// Distribution of observed values per label set.
///
/// The whole state of a series (buckets, sum, count) changes in one step while
/// the series' lock is held, so a scrape never sees a torn series.
#[derive(Debug)]
pub struct Histogram {
    desc: Descriptor,
    bounds: Vec<f64>,
    series: SeriesMap<HistogramState>,
}

impl Histogram {
    /// Creates a histogram. `buckets` must be finite and strictly ascending; a
    /// trailing `+Inf` is accepted and dropped since it is always implied.
    pub fn new(name: &str, help: &str, label_names: &[&str], buckets: &[f64]) -> Result<Self> {
        if label_names.contains(&"le") {
            return Err(invalid(name, "label 'le' is reserved for histograms".into()));
        }
        let desc = Descriptor::new(name, help, label_names)?;

        let mut bounds = buckets.to_vec();
        if bounds.last() == Some(&f64::INFINITY) {
            bounds.pop();
        }
        if bounds.is_empty() {
            return Err(invalid(name, "at least one bucket is required".into()));
        }
        if bounds.iter().any(|b| !b.is_finite()) {
            return Err(invalid(name, "bucket boundaries must be finite".into()));
        }
        if bounds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(invalid(name, "bucket boundaries must be strictly ascending".into()));
        }

        Ok(Histogram {
            desc,
            bounds,
            series: SeriesMap::new(),
        })
    }

    /// Records one observation of `value` under `labels`.
    pub fn observe(&self, labels: &[(&str, &str)], value: f64) -> Result<()> {
        if value.is_nan() {
            return Err(MetricsError::InvalidValue {
                metric: self.desc.name().to_string(),
                value,
                reason: "histogram observations must be numbers",
            });
        }
        let key = self.desc.resolve(labels)?;

        let bounds = &self.bounds;
        self.series.update(
            key,
            || HistogramState::empty(bounds.len()),
            |state| {
                for (count, bound) in state.buckets.iter_mut().zip(bounds) {
                    if value <= *bound {
                        *count += 1;
                    }
                }
                state.sum += value;
                state.count += 1;
            },
        );
        Ok(())
    }

    /// Starts a timer; the elapsed seconds are observed when it is stopped.
    pub fn start_timer(&self) -> HistogramTimer<'_> {
        HistogramTimer {
            histogram: self,
            start: Instant::now(),
        }
    }

    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }

    pub fn get(&self, labels: &[(&str, &str)]) -> Result<Option<HistogramState>> {
        let key = self.desc.resolve(labels)?;
        Ok(self.series.get(&key))
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.desc
    }

    pub fn snapshot(&self) -> MetricSnapshot {
        MetricSnapshot {
            descriptor: self.desc.clone(),
            samples: Samples::Histogram {
                bounds: self.bounds.clone(),
                series: self.series.sorted(),
            },
        }
    }
}

impl Collector for Histogram {
    fn descriptors(&self) -> Vec<(&Descriptor, MetricKind)> {
        vec![(&self.desc, MetricKind::Histogram)]
    }

    fn collect(&self) -> Vec<MetricSnapshot> {
        vec![self.snapshot()]
    }
}

/// Measures wall time from `start_timer` until `observe_duration`.
#[must_use = "the duration is only recorded by observe_duration"]
pub struct HistogramTimer<'a> {
    histogram: &'a Histogram,
    start: Instant,
}

impl HistogramTimer<'_> {
    /// Records the elapsed time in seconds and returns it.
    pub fn observe_duration(self, labels: &[(&str, &str)]) -> Result<f64> {
        let elapsed = self.start.elapsed().as_secs_f64();
        self.histogram.observe(labels, elapsed)?;
        Ok(elapsed)
    }
}
