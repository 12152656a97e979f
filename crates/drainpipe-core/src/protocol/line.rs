//! Drain line grammar (syslog-style framing as emitted by Heroku log drains).
//!
//! ```text
//! 277 <45>1 2019-12-11T22:29:21.372436+00:00 host heroku web.1 - source=web.1 sample#load_avg_1m=0.00
//!     ^pri ^v ^timestamp                     ^host ^app  ^procid ^msgid ^message
//! ```
//!
//! The octet-count prefix in front of `<pri>` is not part of the grammar and is
//! skipped by the unanchored match. Parsing is three-way:
//! - `Ok(None)`: the line does not fit the grammar (not an error),
//! - `Ok(Some(line))`: all seven fields decoded,
//! - `Err(DrainError::Decode)`: the grammar matched but a field is invalid.

use chrono::{DateTime, FixedOffset};
use regex::Regex;

use crate::error::{DrainError, Result};

/// Highest PRI value a syslog header may carry (facility 23, severity 7).
pub const MAX_PRIORITY: u8 = 191;

const LINE_PATTERN: &str = concat!(
    r"<(?P<pri>\d+)>",
    r"(?P<version>1) ",
    r"(?P<timestamp>\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d{1,9})?(?:[+-]\d{2}:\d{2}|Z)) ",
    r"(?P<hostname>[a-z0-9._-]+) ",
    r"(?P<appname>[a-z0-9.-]+) ",
    r"(?P<procid>[a-z0-9._-]+) ",
    r"- ",
    r"(?P<message>.*)$",
);

/// One decoded drain line. Immutable once parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    pub priority: u8,
    pub version: u8,
    pub timestamp: DateTime<FixedOffset>,
    pub hostname: String,
    pub app_name: String,
    /// Dyno or component name, e.g. `web.1` or `router`.
    pub proc_id: String,
    pub message: String,
}

/// Compiled line grammar. Build once and share.
#[derive(Debug, Clone)]
pub struct LineParser {
    re: Regex,
}

impl LineParser {
    pub fn new() -> Result<Self> {
        let re = Regex::new(LINE_PATTERN)
            .map_err(|e| DrainError::Internal(format!("line grammar failed to compile: {e}")))?;
        Ok(Self { re })
    }

    pub fn parse(&self, line: &str) -> Result<Option<LogLine>> {
        let Some(caps) = self.re.captures(line) else {
            return Ok(None);
        };

        // Every group is mandatory in the pattern; a miss here means the
        // pattern and this function disagree.
        let field = |name: &str| -> Result<&str> {
            caps.name(name)
                .map(|m| m.as_str())
                .ok_or_else(|| DrainError::Internal(format!("line grammar missing group {name}")))
        };

        let pri_s = field("pri")?;
        let priority = pri_s
            .parse::<u8>()
            .ok()
            .filter(|p| *p <= MAX_PRIORITY)
            .ok_or_else(|| DrainError::Decode(format!("priority out of range: {pri_s}")))?;

        let version_s = field("version")?;
        let version = version_s
            .parse::<u8>()
            .map_err(|e| DrainError::Decode(format!("version {version_s}: {e}")))?;

        let ts_s = field("timestamp")?;
        let timestamp = DateTime::parse_from_rfc3339(ts_s)
            .map_err(|e| DrainError::Decode(format!("timestamp {ts_s}: {e}")))?;

        Ok(Some(LogLine {
            priority,
            version,
            timestamp,
            hostname: field("hostname")?.to_string(),
            app_name: field("appname")?.to_string(),
            proc_id: field("procid")?.to_string(),
            message: field("message")?.to_string(),
        }))
    }
}
