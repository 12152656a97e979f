//! Single-flight collection loop.
//!
//! One task owns the interval, so at most one collect -> filter -> sink cycle
//! runs at a time. A cycle that overruns its interval makes the scheduler skip
//! the missed ticks rather than burst to catch up.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use drainpipe_core::series::MetricKind;
use drainpipe_core::{Datapoint, Dimensions};

use crate::dispatch::{ExclusionFilter, Sink};
use crate::obs::CollectorMetrics;
use crate::registry::{MetricRegistry, TrackedSeries};

/// `source` dimension carried by every self-observability datapoint.
pub const INTERNAL_SOURCE: &str = "drainpipe-collector";
pub const TOTAL_DRAIN_REQUESTS: &str = "drainpipe.total_drain_requests";
pub const TRACKED_SERIES: &str = "drainpipe.tracked_series";

/// Self-observability datapoints appended to a snapshot.
pub fn internal_datapoints(total_drain_requests: u64, tracked: TrackedSeries) -> Vec<Datapoint> {
    let source = || Dimensions::from_iter([("source", INTERNAL_SOURCE)]);

    let mut out = Vec::with_capacity(1 + MetricKind::ALL.len());
    out.push(Datapoint {
        name: TOTAL_DRAIN_REQUESTS.to_string(),
        dimensions: source(),
        kind: MetricKind::CumulativeCounter,
        value: total_drain_requests as f64,
    });
    for kind in MetricKind::ALL {
        let mut dimensions = source();
        dimensions.insert("type", kind.as_str());
        out.push(Datapoint {
            name: TRACKED_SERIES.to_string(),
            dimensions,
            kind: MetricKind::Gauge,
            value: tracked.get(kind) as f64,
        });
    }
    out
}

pub struct CollectScheduler {
    registry: Arc<MetricRegistry>,
    filter: ExclusionFilter,
    sink: Arc<dyn Sink>,
    metrics: Arc<CollectorMetrics>,
    interval: Duration,
    internal_metrics: bool,
}

impl CollectScheduler {
    pub fn new(
        registry: Arc<MetricRegistry>,
        filter: ExclusionFilter,
        sink: Arc<dyn Sink>,
        metrics: Arc<CollectorMetrics>,
        interval: Duration,
    ) -> Self {
        Self {
            registry,
            filter,
            sink,
            metrics,
            interval,
            internal_metrics: true,
        }
    }

    pub fn with_internal_metrics(mut self, enabled: bool) -> Self {
        self.internal_metrics = enabled;
        self
    }

    /// Run one cycle. Returns the number of datapoints handed to the sink.
    pub async fn flush(&self) -> usize {
        let started = Instant::now();

        let mut batch = self.registry.collect();
        if self.internal_metrics {
            batch.extend(internal_datapoints(
                self.metrics.drain_requests.sum(),
                self.registry.tracked(),
            ));
        }

        let batch = self.filter.apply(batch, |dp, why| {
            tracing::trace!(metric = %dp.name, reason = why.as_str(), "datapoint excluded");
            self.metrics.excluded.inc(&[("reason", why.as_str())]);
        });
        let dispatched = batch.len();

        let outcome = match self.sink.send(batch).await {
            Ok(()) => "ok",
            Err(e) => {
                tracing::warn!(sink = self.sink.name(), error = %e, dispatched, "sink rejected batch");
                "error"
            }
        };
        self.metrics.flushes.inc(&[("outcome", outcome)]);
        self.metrics
            .flush_duration
            .observe(&[("sink", self.sink.name())], started.elapsed());

        dispatched
    }

    /// Tick until `shutdown` turns true (or its sender is dropped), then flush
    /// once more so nothing aggregated since the last tick is lost.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // the first tick completes immediately
        ticker.tick().await;

        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            sink = self.sink.name(),
            "collect scheduler started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.flush().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        let dispatched = self.flush().await;
        tracing::info!(dispatched, "collect scheduler stopped after final flush");
    }
}
