//! Metric extraction from a drain line's message field.
//!
//! The message is a space separated list of `key=value` tokens:
//!
//! ```text
//! source=web.1 dyno=heroku.155370883.259625dd-... sample#memory_total=99.74MB sample#memory_rss=97.91MB
//! at=info method=GET path="/" dyno=web.1 connect=0ms service=1ms status=404 bytes=146 protocol=https
//! ```
//!
//! Keys are classified by prefix (`counter#`, `cumulative#`, `sample#`,
//! `gauge#`, `sfxdimension#`) or by membership in the router vocabulary.
//! Everything else is ignored. After raw extraction, the process type of the
//! emitting dyno decides how names and dimensions are post-processed.

use regex::Regex;

use crate::error::{DrainError, Result};
use crate::protocol::line::LogLine;
use crate::protocol::units::ValueParser;
use crate::series::{Dimensions, MetricKind};

pub const COUNTER_PREFIX: &str = "counter#";
pub const CUMULATIVE_PREFIX: &str = "cumulative#";
pub const SAMPLE_PREFIX: &str = "sample#";
pub const GAUGE_PREFIX: &str = "gauge#";
pub const DIMENSION_PREFIX: &str = "sfxdimension#";

/// Name prepended to `sample#` metrics so platform metrics are easy to find.
pub const SAMPLE_NAMESPACE: &str = "heroku.";

/// Process id of the Heroku router.
pub const ROUTER_PROCESS: &str = "router";

/// Unprefixed router fields kept as dimensions.
pub const ROUTER_DIMENSION_KEYS: [&str; 6] = ["status", "method", "dyno", "protocol", "host", "code"];

/// Unprefixed router fields kept as metrics.
pub const ROUTER_METRIC_KEYS: [&str; 3] = ["connect", "service", "bytes"];

// Heroku object id, e.g. 259625dd-a9c7-4987-9c86-08de28dd4f72
const OBJECT_ID_PATTERN: &str =
    r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$";

/// One typed value extracted from a message. Consumed immediately by the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub name: String,
    pub kind: MetricKind,
    pub value: f64,
}

/// What a message key means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyClass {
    Metric { name: String, kind: MetricKind },
    Dimension(String),
    Ignored,
}

/// Classify a raw message key by prefix or vocabulary.
pub fn classify_key(key: &str) -> KeyClass {
    if let Some(name) = key.strip_prefix(COUNTER_PREFIX) {
        return metric(name.to_string(), MetricKind::ResettableCounter);
    }
    if let Some(name) = key.strip_prefix(CUMULATIVE_PREFIX) {
        return metric(name.to_string(), MetricKind::CumulativeCounter);
    }
    if let Some(name) = key.strip_prefix(SAMPLE_PREFIX) {
        return metric(format!("{SAMPLE_NAMESPACE}{name}"), MetricKind::Gauge);
    }
    if let Some(name) = key.strip_prefix(GAUGE_PREFIX) {
        return metric(name.to_string(), MetricKind::Gauge);
    }
    if ROUTER_METRIC_KEYS.contains(&key) {
        return metric(key.to_string(), MetricKind::Gauge);
    }
    if let Some(name) = key.strip_prefix(DIMENSION_PREFIX) {
        return KeyClass::Dimension(name.to_string());
    }
    if ROUTER_DIMENSION_KEYS.contains(&key) {
        return KeyClass::Dimension(key.to_string());
    }
    KeyClass::Ignored
}

fn metric(name: String, kind: MetricKind) -> KeyClass {
    KeyClass::Metric { name, kind }
}

/// Friendlier names for router timing/size fields. Router lines only.
pub fn router_metric_name(key: &str) -> Option<&'static str> {
    match key {
        "connect" => Some("heroku.router_request_connect_time_millis"),
        "service" => Some("heroku.router_request_service_time_millis"),
        "bytes" => Some("heroku.router_response_bytes"),
        _ => None,
    }
}

/// Dyno names look like `web.45`, `run.9123`, `worker.2`; the prefix is the
/// process type. `router` has no suffix and is its own process type.
pub fn process_type(proc_id: &str) -> &str {
    proc_id.split('.').next().unwrap_or(proc_id)
}

/// Turns `LogLine`s into samples plus a dimension map.
#[derive(Debug, Clone)]
pub struct MetricExtractor {
    values: ValueParser,
    object_id: Regex,
}

impl MetricExtractor {
    pub fn new() -> Result<Self> {
        let object_id = Regex::new(OBJECT_ID_PATTERN)
            .map_err(|e| DrainError::Internal(format!("object id pattern failed to compile: {e}")))?;
        Ok(Self {
            values: ValueParser::new()?,
            object_id,
        })
    }

    /// Extract samples and dimensions. `external` (request parameters) wins
    /// over anything derived from the line.
    pub fn extract(&self, line: &LogLine, external: &Dimensions) -> (Vec<MetricSample>, Dimensions) {
        let (mut samples, mut dims) = self.evaluate_pairs(line);

        let ptype = process_type(&line.proc_id);
        if ptype == ROUTER_PROCESS {
            for s in &mut samples {
                if let Some(refined) = router_metric_name(&s.name) {
                    s.name = refined.to_string();
                }
            }
        } else {
            self.fix_up_dyno_dimensions(&mut dims, ptype);
        }

        dims.overlay(external);
        (samples, dims)
    }

    fn evaluate_pairs(&self, line: &LogLine) -> (Vec<MetricSample>, Dimensions) {
        let mut samples = Vec::new();
        let mut dims = Dimensions::new();
        dims.insert("source", line.proc_id.as_str());

        for token in line.message.split(' ') {
            let mut parts = token.split('=');
            let (Some(key), Some(raw), None) = (parts.next(), parts.next(), parts.next()) else {
                continue;
            };

            match classify_key(key) {
                KeyClass::Metric { name, kind } => match self.values.parse(raw) {
                    Ok(value) => samples.push(MetricSample { name, kind, value }),
                    Err(e) => {
                        tracing::debug!(pair = %token, error = %e, "dropping sample with unsupported value");
                    }
                },
                KeyClass::Dimension(k) => {
                    dims.insert(k, raw);
                }
                KeyClass::Ignored => {}
            }
        }

        (samples, dims)
    }

    /// Non-router lines: add `process_type`, derive `dyno_id` from the raw
    /// `<app>.<release>.<uuid>` dyno field, then make `dyno` the dyno name so
    /// router and dyno series share one `dyno` dimension.
    fn fix_up_dyno_dimensions(&self, dims: &mut Dimensions, ptype: &str) {
        dims.insert("process_type", ptype);

        if let Some(raw) = dims.remove("dyno") {
            let parts: Vec<&str> = raw.split('.').collect();
            if let [_, _, id] = parts.as_slice() {
                if self.object_id.is_match(id) {
                    dims.insert("dyno_id", *id);
                }
            }
        }

        if let Some(source) = dims.get("source").map(str::to_string) {
            dims.insert("dyno", source);
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn prefixes_select_kind_and_name() {
        assert_eq!(
            classify_key("counter#requests"),
            metric("requests".into(), MetricKind::ResettableCounter)
        );
        assert_eq!(
            classify_key("cumulative#bytes_out"),
            metric("bytes_out".into(), MetricKind::CumulativeCounter)
        );
        assert_eq!(
            classify_key("sample#memory_rss"),
            metric("heroku.memory_rss".into(), MetricKind::Gauge)
        );
        assert_eq!(classify_key("gauge#queue"), metric("queue".into(), MetricKind::Gauge));
        assert_eq!(classify_key("connect"), metric("connect".into(), MetricKind::Gauge));
        assert_eq!(classify_key("sfxdimension#region"), KeyClass::Dimension("region".into()));
        assert_eq!(classify_key("status"), KeyClass::Dimension("status".into()));
        assert_eq!(classify_key("path"), KeyClass::Ignored);
        assert_eq!(classify_key("at"), KeyClass::Ignored);
    }

    #[test]
    fn process_type_is_prefix_before_dot() {
        assert_eq!(process_type("web.1"), "web");
        assert_eq!(process_type("run.9123"), "run");
        assert_eq!(process_type("router"), "router");
    }
}
