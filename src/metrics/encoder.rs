//! Text exposition format (version 0.0.4).

use std::fmt::Write;

use super::desc::{Descriptor, LabelValues};
use super::error::{MetricsError, Result};
use super::snapshot::{HistogramState, MetricSnapshot, Samples};

/// Content type of the text exposition format.
pub const TEXT_FORMAT: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Renders snapshots into the line-oriented text format.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextEncoder;

impl TextEncoder {
    pub fn new() -> Self {
        TextEncoder
    }

    pub fn format_type(&self) -> &'static str {
        TEXT_FORMAT
    }

    /// Appends the rendering of `metrics` to `buf`. Nothing is appended when an
    /// invariant violation is found.
    pub fn encode(&self, metrics: &[MetricSnapshot], buf: &mut Vec<u8>) -> Result<()> {
        let mut out = String::new();
        for metric in metrics {
            encode_metric(metric, &mut out)?;
        }
        buf.extend_from_slice(out.as_bytes());
        Ok(())
    }
}

/// Renders `metrics`, returning the body together with its content type.
pub fn encode(metrics: &[MetricSnapshot]) -> Result<(Vec<u8>, &'static str)> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(metrics, &mut buffer)?;
    Ok((buffer, encoder.format_type()))
}

fn encode_metric(metric: &MetricSnapshot, out: &mut String) -> Result<()> {
    let desc = &metric.descriptor;
    let name = desc.name();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "# HELP {} {}", name, escape_help(desc.help()));
    let _ = writeln!(out, "# TYPE {} {}", name, metric.kind());

    match &metric.samples {
        Samples::Counter(series) | Samples::Gauge(series) => {
            for (values, value) in series {
                let labels = render_labels(desc, values, None)?;
                let _ = writeln!(out, "{}{} {}", name, labels, format_value(*value));
            }
        }
        Samples::Histogram { bounds, series } => {
            for (values, state) in series {
                check_histogram(name, bounds, state)?;
                for (bound, count) in bounds.iter().zip(&state.buckets) {
                    let le = format_value(*bound);
                    let labels = render_labels(desc, values, Some(&le))?;
                    let _ = writeln!(out, "{}_bucket{} {}", name, labels, count);
                }
                let labels = render_labels(desc, values, Some("+Inf"))?;
                let _ = writeln!(out, "{}_bucket{} {}", name, labels, state.count);

                let labels = render_labels(desc, values, None)?;
                let _ = writeln!(out, "{}_sum{} {}", name, labels, format_value(state.sum));
                let _ = writeln!(out, "{}_count{} {}", name, labels, state.count);
            }
        }
    }
    Ok(())
}

fn check_histogram(name: &str, bounds: &[f64], state: &HistogramState) -> Result<()> {
    let violation = |reason: &str| MetricsError::EncodingInvariantViolation {
        metric: name.to_string(),
        reason: reason.to_string(),
    };

    if state.buckets.len() != bounds.len() {
        return Err(violation("bucket count does not match boundaries"));
    }
    if state.buckets.windows(2).any(|w| w[0] > w[1]) {
        return Err(violation("bucket counts are not cumulative"));
    }
    if state.buckets.last().is_some_and(|last| *last > state.count) {
        return Err(violation("bucket count exceeds total count"));
    }
    Ok(())
}

/// `{a="x",b="y"}` in schema order, with an optional trailing `le`. Empty
/// string when there is nothing to render.
fn render_labels(desc: &Descriptor, values: &LabelValues, le: Option<&str>) -> Result<String> {
    let names = desc.label_names();
    if names.len() != values.len() {
        return Err(MetricsError::EncodingInvariantViolation {
            metric: desc.name().to_string(),
            reason: format!(
                "series has {} label values for {} label names",
                values.len(),
                names.len()
            ),
        });
    }

    let mut pairs: Vec<String> = names
        .iter()
        .zip(values.as_slice())
        .map(|(n, v)| format!("{}=\"{}\"", n, escape_label_value(v)))
        .collect();
    if let Some(le) = le {
        pairs.push(format!("le=\"{}\"", le));
    }

    if pairs.is_empty() {
        Ok(String::new())
    } else {
        Ok(format!("{{{}}}", pairs.join(",")))
    }
}

fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v == f64::INFINITY {
        "+Inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        v.to_string()
    }
}

fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

fn escape_label_value(v: &str) -> String {
    v.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
