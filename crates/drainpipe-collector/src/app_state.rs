//! Shared application state for the drain collector.
//!
//! Everything a request handler or the scheduler needs: validated config,
//! the compiled line/metric parsers, the registry and the self-metrics.
//! Construction compiles every regex and filter up front, so a bad pattern
//! or filter entry fails at boot instead of per request.

use std::sync::Arc;

use drainpipe_core::error::Result;
use drainpipe_core::protocol::{LineParser, MetricExtractor};

use crate::config::CollectorConfig;
use crate::dispatch::{CollectScheduler, ExclusionFilter, Sink};
use crate::obs::CollectorMetrics;
use crate::registry::{Clock, MetricRegistry, SystemClock};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    registry: Arc<MetricRegistry>,
    metrics: Arc<CollectorMetrics>,
}

struct AppStateInner {
    cfg: CollectorConfig,
    line_parser: LineParser,
    extractor: MetricExtractor,
    filter: ExclusionFilter,
}

impl AppState {
    pub fn new(cfg: CollectorConfig) -> Result<Self> {
        Self::with_clock(cfg, Arc::new(SystemClock))
    }

    /// Same as `new`, with the registry's idea of "now" injected.
    pub fn with_clock(cfg: CollectorConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let filter = ExclusionFilter::from_config(&cfg.filter)?;
        let registry = Arc::new(MetricRegistry::with_clock(cfg.collector.expiry(), clock));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                line_parser: LineParser::new()?,
                extractor: MetricExtractor::new()?,
                filter,
                cfg,
            }),
            registry,
            metrics: Arc::new(CollectorMetrics::default()),
        })
    }

    pub fn cfg(&self) -> &CollectorConfig {
        &self.inner.cfg
    }

    pub fn line_parser(&self) -> &LineParser {
        &self.inner.line_parser
    }

    pub fn extractor(&self) -> &MetricExtractor {
        &self.inner.extractor
    }

    pub fn registry(&self) -> Arc<MetricRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn metrics(&self) -> Arc<CollectorMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Scheduler wired to this state's registry, filter and self-metrics.
    pub fn scheduler(&self, sink: Arc<dyn Sink>) -> CollectScheduler {
        let c = &self.inner.cfg.collector;
        CollectScheduler::new(
            self.registry(),
            self.inner.filter.clone(),
            sink,
            self.metrics(),
            c.interval(),
        )
        .with_internal_metrics(c.internal_metrics)
    }

    pub fn set_draining(&self) {
        self.metrics.set_draining();
    }

    pub fn is_draining(&self) -> bool {
        self.metrics.is_draining()
    }

    /// Extra `/metrics` lines derived from live registry state.
    pub fn metrics_extra(&self) -> Vec<(String, u64)> {
        let tracked = self.registry.tracked();
        drainpipe_core::series::MetricKind::ALL
            .iter()
            .map(|k| {
                (
                    format!("drainpipe_tracked_series{{type=\"{}\"}}", k.as_str()),
                    tracked.get(*k) as u64,
                )
            })
            .collect()
    }
}
