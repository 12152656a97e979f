//! Per-series aggregation state. Each aggregator carries its own lock so value
//! updates to distinct series never serialize on the registry lock.

use parking_lot::Mutex;

use drainpipe_core::series::MetricKind;
use drainpipe_core::{Datapoint, Dimensions};

/// Latest value wins.
#[derive(Debug)]
pub struct GaugeAggregator {
    name: String,
    dimensions: Dimensions,
    latest: Mutex<f64>,
}

impl GaugeAggregator {
    pub fn new(name: String, dimensions: Dimensions) -> Self {
        Self { name, dimensions, latest: Mutex::new(0.0) }
    }

    pub fn set(&self, v: f64) {
        *self.latest.lock() = v;
    }

    pub fn datapoint(&self) -> Datapoint {
        let value = *self.latest.lock();
        datapoint(&self.name, &self.dimensions, MetricKind::Gauge, value)
    }
}

/// Delta accumulated between collections. Reading it resets it.
#[derive(Debug)]
pub struct ResettableCounterAggregator {
    name: String,
    dimensions: Dimensions,
    count: Mutex<f64>,
}

impl ResettableCounterAggregator {
    pub fn new(name: String, dimensions: Dimensions) -> Self {
        Self { name, dimensions, count: Mutex::new(0.0) }
    }

    pub fn add(&self, delta: f64) {
        *self.count.lock() += delta;
    }

    /// Take the accumulated delta and zero the accumulator.
    pub fn take_datapoint(&self) -> Datapoint {
        let value = std::mem::replace(&mut *self.count.lock(), 0.0);
        datapoint(&self.name, &self.dimensions, MetricKind::ResettableCounter, value)
    }
}

/// Monotonic running total.
#[derive(Debug)]
pub struct CumulativeCounterAggregator {
    name: String,
    dimensions: Dimensions,
    total: Mutex<f64>,
}

impl CumulativeCounterAggregator {
    pub fn new(name: String, dimensions: Dimensions) -> Self {
        Self { name, dimensions, total: Mutex::new(0.0) }
    }

    pub fn add(&self, delta: f64) {
        *self.total.lock() += delta;
    }

    pub fn datapoint(&self) -> Datapoint {
        let value = *self.total.lock();
        datapoint(&self.name, &self.dimensions, MetricKind::CumulativeCounter, value)
    }
}

fn datapoint(name: &str, dims: &Dimensions, kind: MetricKind, value: f64) -> Datapoint {
    Datapoint {
        name: name.to_string(),
        dimensions: dims.clone(),
        kind,
        value,
    }
}
