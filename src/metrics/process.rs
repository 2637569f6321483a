//! Default process metrics, evaluated at scrape time.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use super::desc::{Descriptor, LabelValues, MetricKind};
use super::error::Result;
use super::registry::Collector;
use super::snapshot::{MetricSnapshot, Samples};

/// Reports process start time and uptime under a configurable name prefix.
pub struct ProcessCollector {
    start_time: Descriptor,
    uptime: Descriptor,
    started_at_unix: f64,
    started: Instant,
}

impl ProcessCollector {
    pub fn new(prefix: &str) -> Result<Self> {
        let started_at_unix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();

        Ok(ProcessCollector {
            start_time: Descriptor::new(
                &format!("{}process_start_time_seconds", prefix),
                "Start time of the process since unix epoch in seconds.",
                &[],
            )?,
            uptime: Descriptor::new(
                &format!("{}process_uptime_seconds", prefix),
                "Time elapsed since the process started in seconds.",
                &[],
            )?,
            started_at_unix,
            started: Instant::now(),
        })
    }

    fn gauge(desc: &Descriptor, value: f64) -> MetricSnapshot {
        MetricSnapshot {
            descriptor: desc.clone(),
            samples: Samples::Gauge(vec![(LabelValues::default(), value)]),
        }
    }
}

impl Collector for ProcessCollector {
    fn descriptors(&self) -> Vec<(&Descriptor, MetricKind)> {
        vec![
            (&self.start_time, MetricKind::Gauge),
            (&self.uptime, MetricKind::Gauge),
        ]
    }

    fn collect(&self) -> Vec<MetricSnapshot> {
        vec![
            Self::gauge(&self.start_time, self.started_at_unix.floor()),
            Self::gauge(&self.uptime, self.started.elapsed().as_secs_f64()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MetricsError, Registry};
    use std::sync::Arc;

    #[test]
    fn prefixed_gauges_are_collected() {
        let collector = ProcessCollector::new("node_").unwrap();
        let snapshots = collector.collect();
        assert_eq!(snapshots[0].name(), "node_process_start_time_seconds");
        assert_eq!(snapshots[1].name(), "node_process_uptime_seconds");
        match &snapshots[0].samples {
            Samples::Gauge(series) => assert!(series[0].1 > 0.0),
            other => panic!("unexpected samples {:?}", other),
        }
    }

    #[test]
    fn conflicting_names_are_rejected() {
        let mut registry = Registry::new();
        registry
            .register_gauge("process_uptime_seconds", "taken", &[])
            .unwrap();
        let err = registry
            .register(Arc::new(ProcessCollector::new("").unwrap()))
            .unwrap_err();
        assert_eq!(
            err,
            MetricsError::DuplicateName("process_uptime_seconds".into())
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn invalid_prefix_is_rejected() {
        assert!(ProcessCollector::new("bad-prefix_").is_err());
    }
}
