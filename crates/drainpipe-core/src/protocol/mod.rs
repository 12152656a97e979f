//! Drain protocol modules (syslog framing + metric key/value conventions).
//!
//! - `line`: fixed-grammar match of one drain line into a `LogLine`.
//! - `metric`: key classification, unit parsing and dimension derivation that
//!   turn a `LogLine` message into typed samples.
//! - `params`: request query parameters as dimensions.
//!
//! All parsers are panic-free: a line that does not fit the grammar is
//! reported as "not applicable", and anything that fits but fails to decode is
//! a `DrainError`, so a single bad line never aborts the rest of a stream.

pub mod line;
pub mod metric;
pub mod params;
pub mod units;

pub use line::{LineParser, LogLine};
pub use metric::{KeyClass, MetricExtractor, MetricSample};
pub use params::{dimensions_from_params, APP_NAME_PARAM};
pub use units::ValueParser;
