//! Metrics collection and exposition.
//!
//! Typed, labeled metrics (counters, gauges, histograms) owned by a
//! [`Registry`], rendered for scrapers by the text [`encoder`].

mod counter;
mod desc;
pub mod encoder;
mod error;
mod gauge;
mod histogram;
mod process;
mod recorder;
mod registry;
mod series;
mod snapshot;

pub use counter::Counter;
pub use desc::{Descriptor, LabelValues, MetricKind};
pub use encoder::{encode, TextEncoder, TEXT_FORMAT};
pub use error::{MetricsError, Result};
pub use gauge::Gauge;
pub use histogram::{exponential_buckets, linear_buckets, Histogram, HistogramTimer, DEFAULT_BUCKETS};
pub use process::ProcessCollector;
pub use recorder::{Metrics, MetricsRecorder, REQUEST_LABELS};
pub use registry::{Collector, Registry};
pub use snapshot::{HistogramState, MetricSnapshot, Samples};
