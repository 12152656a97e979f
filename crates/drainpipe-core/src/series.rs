//! Series identity: dimension sets, canonical series ids, and the datapoints a
//! collection cycle hands downstream.
//!
//! `Dimensions` is backed by a `BTreeMap`, so two sets built in different
//! insertion orders compare, hash, and iterate identically. `SeriesId` is
//! derived from that sorted iteration and is therefore canonical as well.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Semantic type of a metric, fixed per series at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Latest value wins.
    Gauge,
    /// Delta accumulated since the last collection, zeroed when read.
    ResettableCounter,
    /// Monotonic running total, never reset.
    CumulativeCounter,
}

impl MetricKind {
    pub const ALL: [MetricKind; 3] = [
        MetricKind::Gauge,
        MetricKind::ResettableCounter,
        MetricKind::CumulativeCounter,
    ];

    /// Short name used in logs and in the `type` dimension of internal metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Gauge => "gauge",
            MetricKind::ResettableCounter => "counter",
            MetricKind::CumulativeCounter => "cumulative_counter",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// String -> string dimension map with order-independent equality and hashing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Dimensions(BTreeMap<String, String>);

impl Dimensions {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Insert or replace a dimension. Returns the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.0.iter()
    }

    /// Overlay `other` on top of `self`; `other` wins on key collision.
    pub fn overlay(&mut self, other: &Dimensions) {
        for (k, v) in other.iter() {
            self.0.insert(k.clone(), v.clone());
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Dimensions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<'a> IntoIterator for &'a Dimensions {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Canonical key of one aggregation series: `name|k1:v1|k2:v2|` with keys sorted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesId(String);

impl SeriesId {
    pub fn new(name: &str, dims: &Dimensions) -> Self {
        let cap = name.len() + 1 + dims.iter().map(|(k, v)| k.len() + v.len() + 2).sum::<usize>();
        let mut id = String::with_capacity(cap);
        id.push_str(name);
        id.push('|');
        for (k, v) in dims {
            id.push_str(k);
            id.push(':');
            id.push_str(v);
            id.push('|');
        }
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One collected value handed to the dispatch sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Datapoint {
    pub name: String,
    pub dimensions: Dimensions,
    pub kind: MetricKind,
    pub value: f64,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of<T: Hash>(t: &T) -> u64 {
        let mut h = DefaultHasher::new();
        t.hash(&mut h);
        h.finish()
    }

    #[test]
    fn construction_order_does_not_change_identity() {
        let mut a = Dimensions::new();
        a.insert("source", "web.1");
        a.insert("app_name", "shop");
        a.insert("dyno", "web.1");

        let b: Dimensions = [("dyno", "web.1"), ("source", "web.1"), ("app_name", "shop")]
            .into_iter()
            .collect();

        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_eq!(SeriesId::new("heroku.load_avg_1m", &a), SeriesId::new("heroku.load_avg_1m", &b));
    }

    #[test]
    fn series_id_layout() {
        let dims: Dimensions = [("b", "2"), ("a", "1")].into_iter().collect();
        assert_eq!(SeriesId::new("m", &dims).as_str(), "m|a:1|b:2|");
        assert_eq!(SeriesId::new("m", &Dimensions::new()).as_str(), "m|");
    }

    #[test]
    fn different_values_give_different_ids() {
        let a: Dimensions = [("a", "1")].into_iter().collect();
        let b: Dimensions = [("a", "2")].into_iter().collect();
        assert_ne!(SeriesId::new("m", &a), SeriesId::new("m", &b));
    }

    #[test]
    fn overlay_prefers_other() {
        let mut base: Dimensions = [("dyno", "web.1"), ("status", "200")].into_iter().collect();
        let params: Dimensions = [("dyno", "override"), ("app_name", "shop")].into_iter().collect();
        base.overlay(&params);
        assert_eq!(base.get("dyno"), Some("override"));
        assert_eq!(base.get("status"), Some("200"));
        assert_eq!(base.get("app_name"), Some("shop"));
    }
}
