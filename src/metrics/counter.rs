//! Monotonic counters keyed by label values.

use super::desc::{Descriptor, MetricKind};
use super::error::{MetricsError, Result};
use super::registry::Collector;
use super::series::SeriesMap;
use super::snapshot::{MetricSnapshot, Samples};

/// A counter that only goes up, one total per label set.
///
/// A series is created at zero on its first increment. Each increment is a
/// single read-modify-write under the series' lock, so concurrent
/// increments on the same label set are never lost.
#[derive(Debug)]
pub struct Counter {
    desc: Descriptor,
    series: SeriesMap<f64>,
}

impl Counter {
    pub fn new(name: &str, help: &str, label_names: &[&str]) -> Result<Self> {
        Ok(Counter {
            desc: Descriptor::new(name, help, label_names)?,
            series: SeriesMap::new(),
        })
    }

    /// Increments the series for `labels` by one.
    pub fn inc(&self, labels: &[(&str, &str)]) -> Result<()> {
        self.inc_by(labels, 1.0)
    }

    /// Increments the series for `labels` by `value`, which must be finite and `>= 0`.
    pub fn inc_by(&self, labels: &[(&str, &str)], value: f64) -> Result<()> {
        if !value.is_finite() || value < 0.0 {
            return Err(MetricsError::InvalidValue {
                metric: self.desc.name().to_string(),
                value,
                reason: "counter increments must be finite and non-negative",
            });
        }
        let key = self.desc.resolve(labels)?;
        self.series.update(key, || 0.0, |total| *total += value);
        Ok(())
    }

    /// Current total for `labels`, `None` if the series was never incremented.
    pub fn get(&self, labels: &[(&str, &str)]) -> Result<Option<f64>> {
        let key = self.desc.resolve(labels)?;
        Ok(self.series.get(&key))
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.desc
    }

    /// Copies out every series, sorted by label values.
    pub fn snapshot(&self) -> MetricSnapshot {
        MetricSnapshot {
            descriptor: self.desc.clone(),
            samples: Samples::Counter(self.series.sorted()),
        }
    }
}

impl Collector for Counter {
    fn descriptors(&self) -> Vec<(&Descriptor, MetricKind)> {
        vec![(&self.desc, MetricKind::Counter)]
    }

    fn collect(&self) -> Vec<MetricSnapshot> {
        vec![self.snapshot()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    const GET_OK: [(&str, &str); 2] = [("method", "GET"), ("code", "200")];

    fn counter() -> Counter {
        Counter::new("requests_total", "Requests", &["method", "code"]).unwrap()
    }

    #[test]
    fn total_is_sum_of_increments() {
        let c = counter();
        let mut expected = 0.0;
        let mut last = 0.0;
        for v in [1.0, 0.0, 2.5, 4.0, 0.5] {
            c.inc_by(&GET_OK, v).unwrap();
            expected += v;
            let now = c.get(&GET_OK).unwrap().unwrap();
            assert!(now >= last);
            last = now;
        }
        assert_eq!(c.get(&GET_OK).unwrap(), Some(expected));
    }

    #[test]
    fn unobserved_series_is_absent() {
        let c = counter();
        assert_eq!(c.get(&GET_OK).unwrap(), None);
        match c.snapshot().samples {
            Samples::Counter(series) => assert!(series.is_empty()),
            other => panic!("unexpected samples {:?}", other),
        }
    }

    #[test]
    fn negative_and_nan_increments_are_rejected() {
        let c = counter();
        c.inc(&GET_OK).unwrap();
        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            let err = c.inc_by(&GET_OK, bad).unwrap_err();
            assert!(matches!(err, MetricsError::InvalidValue { .. }));
        }
        assert_eq!(c.get(&GET_OK).unwrap(), Some(1.0));
    }

    #[test]
    fn schema_mismatch_leaves_state_untouched() {
        let c = counter();
        c.inc(&GET_OK).unwrap();
        let err = c.inc(&[("method", "GET")]).unwrap_err();
        assert!(matches!(err, MetricsError::SchemaMismatch { .. }));
        match c.snapshot().samples {
            Samples::Counter(series) => {
                assert_eq!(series.len(), 1);
                assert_eq!(series[0].1, 1.0);
            }
            other => panic!("unexpected samples {:?}", other),
        }
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let c = Arc::new(counter());
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let c = c.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        c.inc(&GET_OK).unwrap();
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(c.get(&GET_OK).unwrap(), Some(8000.0));
    }
}
