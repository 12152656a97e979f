//! Metric registry: aggregation state for every live series, with idle expiry.
//!
//! Locking:
//! - one coarse lock (`state`) guards series creation/removal and the access
//!   ordering; it is held only for lookup, creation and the O(1) recency touch,
//!   and for the expiry sweep;
//! - each aggregator has its own lock, taken after the coarse lock is released,
//!   so value updates to different series do not contend with each other.
//!
//! A series' kind is fixed when it is created. A later sample with the same
//! name and dimensions but another kind is dropped with a warning.

mod access;
mod aggregator;
mod clock;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use drainpipe_core::protocol::MetricSample;
use drainpipe_core::series::MetricKind;
use drainpipe_core::{Datapoint, Dimensions, SeriesId};

pub use access::{AccessList, AccessRecord};
pub use aggregator::{CumulativeCounterAggregator, GaugeAggregator, ResettableCounterAggregator};
pub use clock::{Clock, ManualClock, SystemClock};

/// Live series counts per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackedSeries {
    pub gauges: usize,
    pub counters: usize,
    pub cumulative_counters: usize,
}

impl TrackedSeries {
    pub fn get(&self, kind: MetricKind) -> usize {
        match kind {
            MetricKind::Gauge => self.gauges,
            MetricKind::ResettableCounter => self.counters,
            MetricKind::CumulativeCounter => self.cumulative_counters,
        }
    }

    pub fn total(&self) -> usize {
        self.gauges + self.counters + self.cumulative_counters
    }
}

/// Aggregator reference taken under the coarse lock and used after it.
enum Handle {
    Gauge(Arc<GaugeAggregator>),
    Counter(Arc<ResettableCounterAggregator>),
    Cumulative(Arc<CumulativeCounterAggregator>),
}

impl Handle {
    fn apply(&self, value: f64) {
        match self {
            Handle::Gauge(g) => g.set(value),
            Handle::Counter(c) => c.add(value),
            Handle::Cumulative(c) => c.add(value),
        }
    }

    fn read(&self) -> Datapoint {
        match self {
            Handle::Gauge(g) => g.datapoint(),
            Handle::Counter(c) => c.take_datapoint(),
            Handle::Cumulative(c) => c.datapoint(),
        }
    }
}

#[derive(Default)]
struct RegistryState {
    gauges: HashMap<SeriesId, Arc<GaugeAggregator>>,
    counters: HashMap<SeriesId, Arc<ResettableCounterAggregator>>,
    cumulative: HashMap<SeriesId, Arc<CumulativeCounterAggregator>>,
    access: AccessList,
}

impl RegistryState {
    fn handle_for(&mut self, id: &SeriesId, sample: &MetricSample, dims: &Dimensions) -> Handle {
        let name = || sample.name.clone();
        match sample.kind {
            MetricKind::Gauge => Handle::Gauge(Arc::clone(
                self.gauges
                    .entry(id.clone())
                    .or_insert_with(|| Arc::new(GaugeAggregator::new(name(), dims.clone()))),
            )),
            MetricKind::ResettableCounter => Handle::Counter(Arc::clone(
                self.counters
                    .entry(id.clone())
                    .or_insert_with(|| Arc::new(ResettableCounterAggregator::new(name(), dims.clone()))),
            )),
            MetricKind::CumulativeCounter => Handle::Cumulative(Arc::clone(
                self.cumulative
                    .entry(id.clone())
                    .or_insert_with(|| Arc::new(CumulativeCounterAggregator::new(name(), dims.clone()))),
            )),
        }
    }

    /// Drop every series idle for longer than `expiry`, oldest first, stopping
    /// at the first one still live.
    fn sweep(&mut self, now: Instant, expiry: Duration) -> usize {
        let mut evicted = 0;
        while let Some(oldest) = self.access.peek_oldest() {
            if now.saturating_duration_since(oldest.last_access) <= expiry {
                break;
            }
            let id = oldest.id.clone();
            let Some(rec) = self.access.remove(&id) else {
                break;
            };
            let removed = match rec.kind {
                MetricKind::Gauge => self.gauges.remove(&rec.id).is_some(),
                MetricKind::ResettableCounter => self.counters.remove(&rec.id).is_some(),
                MetricKind::CumulativeCounter => self.cumulative.remove(&rec.id).is_some(),
            };
            debug_assert!(removed, "access record without aggregator: {}", rec.id);
            evicted += 1;
        }
        evicted
    }

    fn handles(&self) -> Vec<Handle> {
        let mut out = Vec::with_capacity(self.access.len());
        out.extend(self.gauges.values().cloned().map(Handle::Gauge));
        out.extend(self.cumulative.values().cloned().map(Handle::Cumulative));
        out.extend(self.counters.values().cloned().map(Handle::Counter));
        out
    }

    fn tracked(&self) -> TrackedSeries {
        TrackedSeries {
            gauges: self.gauges.len(),
            counters: self.counters.len(),
            cumulative_counters: self.cumulative.len(),
        }
    }
}

/// Concurrent-safe aggregation of samples by (name, dimensions).
pub struct MetricRegistry {
    state: Mutex<RegistryState>,
    expiry: Duration,
    clock: Arc<dyn Clock>,
}

impl MetricRegistry {
    pub fn new(expiry: Duration) -> Self {
        Self::with_clock(expiry, Arc::new(SystemClock))
    }

    pub fn with_clock(expiry: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            expiry,
            clock,
        }
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    /// Apply one sample. Never fails; conflicting kinds are logged and dropped.
    ///
    /// Returns whether the sample was applied.
    pub fn update(&self, sample: &MetricSample, dims: &Dimensions) -> bool {
        let id = SeriesId::new(&sample.name, dims);

        let handle = {
            let mut st = self.state.lock();
            if let Some(rec) = st.access.get(&id) {
                if rec.kind != sample.kind {
                    tracing::warn!(
                        series = %id,
                        existing = %rec.kind,
                        incoming = %sample.kind,
                        "metric kind conflicts with live series, dropping sample"
                    );
                    return false;
                }
            }
            let handle = st.handle_for(&id, sample, dims);
            let now = self.clock.now();
            if st.access.touch(&id, sample.kind, now) {
                // a new series must not be observable before its first value
                handle.apply(sample.value);
                tracing::trace!(series = %id, kind = %sample.kind, "series created");
                return true;
            }
            handle
        };

        handle.apply(sample.value);
        true
    }

    /// Evict idle series, then read one datapoint per live series.
    ///
    /// Resettable counters report the delta since the previous collect and
    /// restart from zero; gauges and cumulative counters are read unchanged.
    pub fn collect(&self) -> Vec<Datapoint> {
        let handles = {
            let mut st = self.state.lock();
            let now = self.clock.now();
            let evicted = st.sweep(now, self.expiry);
            if evicted > 0 {
                tracing::debug!(evicted, live = st.access.len(), "evicted idle series");
            }
            st.handles()
        };

        handles.iter().map(Handle::read).collect()
    }

    pub fn tracked(&self) -> TrackedSeries {
        self.state.lock().tracked()
    }

    pub fn len(&self) -> usize {
        self.state.lock().access.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
