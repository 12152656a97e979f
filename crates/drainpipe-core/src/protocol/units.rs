//! Metric value parsing with unit suffixes.
//!
//! Attempts, first success wins:
//! 1. byte size with a unit (`99.74MB`, `512kb`, `3GiB`, `12B`), binary multiples
//! 2. duration with a unit (`30000ms`, `2s`), reported in milliseconds
//! 3. page counts (`355603pages`)
//! 4. plain float
//!
//! A bare number never takes the byte-size path, so fractional gauges such as
//! `load_avg_1m=0.75` keep their precision.

use regex::Regex;

use crate::error::{DrainError, Result};

const BYTE_SIZE_PATTERN: &str = r"^(\d+(?:\.\d+)?) ?(?:([kKmMgGtTpP])[iI]?[bB]?|[bB])$";

/// Compiled unit grammar.
#[derive(Debug, Clone)]
pub struct ValueParser {
    byte_size: Regex,
}

impl ValueParser {
    pub fn new() -> Result<Self> {
        let byte_size = Regex::new(BYTE_SIZE_PATTERN)
            .map_err(|e| DrainError::Internal(format!("unit grammar failed to compile: {e}")))?;
        Ok(Self { byte_size })
    }

    pub fn parse(&self, raw: &str) -> Result<f64> {
        if let Some(bytes) = self.parse_byte_size(raw) {
            return Ok(bytes);
        }
        if let Some(millis) = parse_duration_millis(raw) {
            return Ok(millis);
        }
        if let Some(pages) = raw.strip_suffix("pages").and_then(parse_finite) {
            return Ok(pages);
        }
        parse_finite(raw).ok_or_else(|| DrainError::UnsupportedUnit(raw.to_string()))
    }

    fn parse_byte_size(&self, raw: &str) -> Option<f64> {
        let caps = self.byte_size.captures(raw)?;
        let n: f64 = caps.get(1)?.as_str().parse().ok()?;
        let exp = match caps.get(2).map(|m| m.as_str().to_ascii_lowercase()) {
            None => 0,
            Some(u) => match u.as_str() {
                "k" => 1,
                "m" => 2,
                "g" => 3,
                "t" => 4,
                "p" => 5,
                _ => return None,
            },
        };
        Some((n * 1024f64.powi(exp)).trunc())
    }
}

fn parse_finite(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Signed duration in milliseconds; humantime itself only takes unsigned input.
fn parse_duration_millis(raw: &str) -> Option<f64> {
    let (sign, unsigned) = match raw.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let d = humantime::parse_duration(unsigned).ok()?;
    Some(sign * d.as_secs_f64() * 1000.0)
}
