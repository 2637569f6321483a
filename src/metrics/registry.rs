//! The registry owning every metric of the process.

use std::collections::HashSet;
use std::sync::Arc;

use super::counter::Counter;
use super::desc::{Descriptor, MetricKind};
use super::error::{MetricsError, Result};
use super::gauge::Gauge;
use super::histogram::Histogram;
use super::snapshot::MetricSnapshot;

/// Anything that can contribute metrics to a scrape.
pub trait Collector: Send + Sync {
    /// Descriptors and kinds of every metric this collector produces.
    fn descriptors(&self) -> Vec<(&Descriptor, MetricKind)>;

    /// Current state, one snapshot per descriptor, in the same order.
    fn collect(&self) -> Vec<MetricSnapshot>;
}

/// A set of uniquely named metrics.
///
/// Uniqueness covers every sample name a metric puts on the wire, so a
/// histogram `x` also claims `x_bucket`, `x_sum` and `x_count`.
///
/// The registry is filled once during startup (`register` takes `&mut self`)
/// and then shared read-only behind an `Arc`; metrics are never removed.
#[derive(Default)]
pub struct Registry {
    collectors: Vec<Arc<dyn Collector>>,
    names: HashSet<String>,
    metric_count: usize,
}

/// Every sample name the encoder emits for a metric.
fn sample_names(desc: &Descriptor, kind: MetricKind) -> Vec<String> {
    let name = desc.name();
    match kind {
        MetricKind::Histogram => vec![
            name.to_string(),
            format!("{}_bucket", name),
            format!("{}_sum", name),
            format!("{}_count", name),
        ],
        MetricKind::Counter | MetricKind::Gauge => vec![name.to_string()],
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a collector. Fails without side effects if any sample name it
    /// would expose is already taken.
    pub fn register(&mut self, collector: Arc<dyn Collector>) -> Result<()> {
        let descriptors = collector.descriptors();
        let mut incoming: HashSet<String> = HashSet::new();
        for (desc, kind) in &descriptors {
            for name in sample_names(desc, *kind) {
                if self.names.contains(&name) || incoming.contains(&name) {
                    return Err(MetricsError::DuplicateName(name));
                }
                incoming.insert(name);
            }
        }

        self.metric_count += descriptors.len();
        self.names.extend(incoming);
        self.collectors.push(collector);
        Ok(())
    }

    pub fn register_counter(
        &mut self,
        name: &str,
        help: &str,
        label_names: &[&str],
    ) -> Result<Arc<Counter>> {
        let counter = Arc::new(Counter::new(name, help, label_names)?);
        self.register(counter.clone())?;
        Ok(counter)
    }

    pub fn register_gauge(
        &mut self,
        name: &str,
        help: &str,
        label_names: &[&str],
    ) -> Result<Arc<Gauge>> {
        let gauge = Arc::new(Gauge::new(name, help, label_names)?);
        self.register(gauge.clone())?;
        Ok(gauge)
    }

    pub fn register_histogram(
        &mut self,
        name: &str,
        help: &str,
        label_names: &[&str],
        buckets: &[f64],
    ) -> Result<Arc<Histogram>> {
        let histogram = Arc::new(Histogram::new(name, help, label_names, buckets)?);
        self.register(histogram.clone())?;
        Ok(histogram)
    }

    /// Snapshots of every registered metric, in registration order.
    pub fn collect_all(&self) -> Vec<MetricSnapshot> {
        self.collectors.iter().flat_map(|c| c.collect()).collect()
    }

    /// Number of registered metrics.
    pub fn len(&self) -> usize {
        self.metric_count
    }

    pub fn is_empty(&self) -> bool {
        self.metric_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_in_registration_order() {
        let mut registry = Registry::new();
        registry.register_gauge("zeta", "z", &[]).unwrap();
        registry.register_counter("alpha_total", "a", &["x"]).unwrap();
        registry
            .register_histogram("mid_seconds", "m", &[], &[1.0])
            .unwrap();

        let names: Vec<String> = registry
            .collect_all()
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(names, vec!["zeta", "alpha_total", "mid_seconds"]);
    }

    #[test]
    fn duplicate_name_is_rejected_and_first_metric_survives() {
        let mut registry = Registry::new();
        let first = registry
            .register_counter("requests_total", "first", &["method"])
            .unwrap();
        first.inc(&[("method", "GET")]).unwrap();

        let err = match registry.register_gauge("requests_total", "second", &[]) {
            Err(e) => e,
            Ok(_) => panic!("duplicate registration should fail"),
        };
        assert_eq!(err, MetricsError::DuplicateName("requests_total".into()));

        let snapshots = registry.collect_all();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].descriptor.help(), "first");
        assert_eq!(first.get(&[("method", "GET")]).unwrap(), Some(1.0));
    }

    #[test]
    fn histogram_claims_its_suffixed_names() {
        let mut registry = Registry::new();
        registry
            .register_histogram("latency_seconds", "l", &[], &[1.0])
            .unwrap();

        for taken in [
            "latency_seconds_bucket",
            "latency_seconds_sum",
            "latency_seconds_count",
        ] {
            let err = match registry.register_gauge(taken, "clash", &[]) {
                Err(e) => e,
                Ok(_) => panic!("{} should collide with the histogram", taken),
            };
            assert_eq!(err, MetricsError::DuplicateName(taken.into()));
        }
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn histogram_cannot_shadow_existing_samples() {
        let mut registry = Registry::new();
        registry.register_gauge("h_sum", "existing", &[]).unwrap();

        let err = match registry.register_histogram("h", "h", &[], &[1.0]) {
            Err(e) => e,
            Ok(_) => panic!("histogram h should collide with h_sum"),
        };
        assert_eq!(err, MetricsError::DuplicateName("h_sum".into()));

        // The failed registration reserved nothing.
        registry.register_counter("h", "plain", &[]).unwrap();
        registry.register_counter("h_count", "plain", &[]).unwrap();
        assert_eq!(registry.len(), 3);
        let text = String::from_utf8(
            crate::metrics::encode(&registry.collect_all()).unwrap().0,
        )
        .unwrap();
        assert_eq!(text.matches("# TYPE h_sum ").count(), 1);
    }

    #[test]
    fn handles_stay_connected_to_registry() {
        let mut registry = Registry::new();
        let counter = registry.register_counter("c_total", "c", &[]).unwrap();
        counter.inc_by(&[], 3.0).unwrap();

        let snapshot = &registry.collect_all()[0];
        assert_eq!(
            snapshot.samples,
            crate::metrics::Samples::Counter(vec![(Default::default(), 3.0)])
        );
    }
}
