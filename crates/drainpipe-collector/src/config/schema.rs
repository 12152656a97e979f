use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;
use drainpipe_core::error::{Result, DrainError};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectorConfig {
    pub version: u32,

    #[serde(default)]
    pub collector: CollectorSection,

    #[serde(default)]
    pub filter: FilterSection,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            version: 1,
            collector: CollectorSection::default(),
            filter: FilterSection::default(),
        }
    }
}

impl CollectorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(DrainError::UnsupportedVersion);
        }

        self.collector.validate()?;
        self.filter.compile_dimension_pairs()?;

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectorSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_expiry_ms")]
    pub expiry_ms: u64,

    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,

    #[serde(default = "default_internal_metrics")]
    pub internal_metrics: bool,
}

impl Default for CollectorSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            interval_ms: default_interval_ms(),
            expiry_ms: default_expiry_ms(),
            max_line_bytes: default_max_line_bytes(),
            internal_metrics: default_internal_metrics(),
        }
    }
}

impl CollectorSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if !(1000..=3_600_000).contains(&self.interval_ms) {
            return Err(DrainError::BadRequest(
                "collector.interval_ms must be between 1000 and 3600000".into(),
            ));
        }
        if self.expiry_ms <= self.interval_ms {
            return Err(DrainError::BadRequest(
                "collector.expiry_ms must be greater than interval_ms".into(),
            ));
        }
        if !(1024..=1024 * 1024).contains(&self.max_line_bytes) {
            return Err(DrainError::BadRequest(
                "collector.max_line_bytes must be between 1024 and 1048576".into(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            DrainError::BadRequest(format!("collector.listen must be a valid SocketAddr: {e}"))
        })
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn expiry(&self) -> Duration {
        Duration::from_millis(self.expiry_ms)
    }
}

fn default_listen() -> String {
    "0.0.0.0:8000".into()
}
fn default_interval_ms() -> u64 {
    10_000
}
fn default_expiry_ms() -> u64 {
    300_000
}
fn default_max_line_bytes() -> usize {
    64 * 1024
}
fn default_internal_metrics() -> bool {
    true
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct FilterSection {
    /// Metric names never dispatched.
    #[serde(default)]
    pub exclude_metrics: Vec<String>,

    /// `key=value` entries; a datapoint carrying any of them is not dispatched.
    #[serde(default)]
    pub exclude_dimension_pairs: Vec<String>,
}

impl FilterSection {
    pub fn metric_set(&self) -> HashSet<String> {
        self.exclude_metrics
            .iter()
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn compile_dimension_pairs(&self) -> Result<HashSet<(String, String)>> {
        let mut out = HashSet::with_capacity(self.exclude_dimension_pairs.len());
        for s in &self.exclude_dimension_pairs {
            // format: "key=value"
            let (k, v) = s.trim().split_once('=').ok_or_else(|| {
                DrainError::BadRequest(format!(
                    "invalid exclude_dimension_pairs entry: {s} (expected key=value)"
                ))
            })?;
            if k.is_empty() {
                return Err(DrainError::BadRequest(format!(
                    "invalid exclude_dimension_pairs entry: {s} (empty key)"
                )));
            }
            out.insert((k.to_string(), v.to_string()));
        }
        Ok(out)
    }
}
