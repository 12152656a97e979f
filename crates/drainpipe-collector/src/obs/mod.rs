//! In-process self-observability.
//!
//! Counters live in `DashMap`s of atomics and are rendered as Prometheus text
//! by the `/metrics` handler; the scheduler also reads them to build the
//! internal datapoints it appends to each snapshot.

pub mod metrics;

pub use metrics::{CollectorMetrics, CounterVec, HistogramVec};
