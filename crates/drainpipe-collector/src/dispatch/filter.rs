//! Dispatch-time exclusion of metric names and dimension pairs.
//!
//! Exclusion happens after collection, so excluded series still aggregate
//! (and expire) normally; they are only kept out of the outgoing batch.

use std::collections::HashSet;

use drainpipe_core::error::Result;
use drainpipe_core::Datapoint;

use crate::config::FilterSection;

/// Why a datapoint was kept out of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    Metric,
    Dimension,
}

impl Exclusion {
    pub fn as_str(self) -> &'static str {
        match self {
            Exclusion::Metric => "metric",
            Exclusion::Dimension => "dimension",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExclusionFilter {
    metrics: HashSet<String>,
    pairs: HashSet<(String, String)>,
}

impl ExclusionFilter {
    pub fn new(metrics: HashSet<String>, pairs: HashSet<(String, String)>) -> Self {
        Self { metrics, pairs }
    }

    pub fn from_config(cfg: &FilterSection) -> Result<Self> {
        Ok(Self::new(cfg.metric_set(), cfg.compile_dimension_pairs()?))
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty() && self.pairs.is_empty()
    }

    /// `None` if the datapoint should be dispatched.
    pub fn check(&self, dp: &Datapoint) -> Option<Exclusion> {
        if self.metrics.contains(&dp.name) {
            return Some(Exclusion::Metric);
        }
        let hit = dp
            .dimensions
            .iter()
            .any(|(k, v)| self.pairs.contains(&(k.clone(), v.clone())));
        hit.then_some(Exclusion::Dimension)
    }

    /// Keep dispatchable datapoints; `on_excluded` sees each one dropped.
    pub fn apply(
        &self,
        batch: Vec<Datapoint>,
        mut on_excluded: impl FnMut(&Datapoint, Exclusion),
    ) -> Vec<Datapoint> {
        if self.is_empty() {
            return batch;
        }
        batch
            .into_iter()
            .filter(|dp| match self.check(dp) {
                Some(why) => {
                    on_excluded(dp, why);
                    false
                }
                None => true,
            })
            .collect()
    }
}
