//! Collector config loader (strict YAML parsing + environment overrides).
//!
//! Precedence: built-in defaults < YAML file < environment. The file is
//! optional; a deployment configured purely through the environment (the usual
//! Heroku setup) never needs one.

pub mod schema;

use std::fs;
use std::path::Path;

use drainpipe_core::error::{Result, DrainError};

pub use schema::{CollectorConfig, CollectorSection, FilterSection};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "DRAINPIPE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "drainpipe.yaml";

/// Load from `$DRAINPIPE_CONFIG` (or `drainpipe.yaml`) if present, then apply
/// the process environment.
pub fn load() -> Result<CollectorConfig> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut cfg = if Path::new(&path).exists() {
        load_from_file(&path)?
    } else {
        tracing::info!(%path, "config file not found, using defaults");
        CollectorConfig::default()
    };
    apply_env(&mut cfg, |k| std::env::var(k).ok())?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_from_file(path: &str) -> Result<CollectorConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| DrainError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<CollectorConfig> {
    let cfg: CollectorConfig = serde_yaml::from_str(s)
        .map_err(|e| DrainError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Apply environment overrides through `lookup` (the process environment in
/// production, a map in tests). Malformed values are errors.
pub fn apply_env(cfg: &mut CollectorConfig, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
    if let Some(port) = lookup("PORT") {
        let port: u16 = parse_env("PORT", &port)?;
        cfg.collector.listen = format!("0.0.0.0:{port}");
    }
    if let Some(v) = lookup("DRAINPIPE_INTERVAL_MS") {
        cfg.collector.interval_ms = parse_env("DRAINPIPE_INTERVAL_MS", &v)?;
    }
    if let Some(v) = lookup("DRAINPIPE_EXPIRY_MS") {
        cfg.collector.expiry_ms = parse_env("DRAINPIPE_EXPIRY_MS", &v)?;
    }
    if let Some(v) = lookup("DRAINPIPE_INTERNAL_METRICS") {
        cfg.collector.internal_metrics = parse_env("DRAINPIPE_INTERNAL_METRICS", &v)?;
    }
    if let Some(v) = lookup("DRAINPIPE_METRICS_TO_EXCLUDE") {
        cfg.filter.exclude_metrics = split_list(&v);
    }
    if let Some(v) = lookup("DRAINPIPE_DIMENSION_PAIRS_TO_EXCLUDE") {
        cfg.filter.exclude_dimension_pairs = split_list(&v);
    }
    Ok(())
}

fn parse_env<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| DrainError::BadRequest(format!("invalid {key}={raw:?}: {e}")))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
