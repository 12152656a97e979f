//! Registry aggregation and idle-expiry behaviour, driven by a manual clock.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use drainpipe_collector::registry::{ManualClock, MetricRegistry};
use drainpipe_core::protocol::MetricSample;
use drainpipe_core::series::MetricKind;
use drainpipe_core::{Datapoint, Dimensions};

const TTL: Duration = Duration::from_secs(300);
const EPS: Duration = Duration::from_millis(1);

fn registry() -> (MetricRegistry, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    (MetricRegistry::with_clock(TTL, clock.clone()), clock)
}

fn sample(name: &str, kind: MetricKind, value: f64) -> MetricSample {
    MetricSample { name: name.to_string(), kind, value }
}

fn dims(pairs: &[(&str, &str)]) -> Dimensions {
    pairs.iter().copied().collect()
}

fn find<'a>(dps: &'a [Datapoint], name: &str) -> Option<&'a Datapoint> {
    dps.iter().find(|d| d.name == name)
}

#[test]
fn gauge_keeps_latest_and_reads_are_idempotent() {
    let (reg, _) = registry();
    let d = dims(&[("source", "web.1")]);
    reg.update(&sample("heroku.load_avg_1m", MetricKind::Gauge, 0.5), &d);
    reg.update(&sample("heroku.load_avg_1m", MetricKind::Gauge, 0.75), &d);

    for _ in 0..2 {
        let dps = reg.collect();
        assert_eq!(dps.len(), 1);
        assert_eq!(dps[0].value, 0.75);
        assert_eq!(dps[0].kind, MetricKind::Gauge);
        assert_eq!(dps[0].dimensions, d);
    }
}

#[test]
fn resettable_counter_reports_delta_then_zero() {
    let (reg, _) = registry();
    let d = dims(&[("source", "web.1")]);
    reg.update(&sample("requests", MetricKind::ResettableCounter, 3.0), &d);
    reg.update(&sample("requests", MetricKind::ResettableCounter, 4.0), &d);

    assert_eq!(reg.collect()[0].value, 7.0);
    // the series is still live, just zeroed
    let again = reg.collect();
    assert_eq!(again.len(), 1);
    assert_eq!(again[0].value, 0.0);
}

#[test]
fn cumulative_counter_never_resets() {
    let (reg, _) = registry();
    let d = dims(&[]);
    reg.update(&sample("bytes", MetricKind::CumulativeCounter, 10.0), &d);
    assert_eq!(reg.collect()[0].value, 10.0);
    reg.update(&sample("bytes", MetricKind::CumulativeCounter, 5.0), &d);
    assert_eq!(reg.collect()[0].value, 15.0);
    assert_eq!(reg.collect()[0].value, 15.0);
}

#[test]
fn series_identity_ignores_dimension_order() {
    let (reg, _) = registry();
    let a: Dimensions = [("a", "1"), ("b", "2")].into_iter().collect();
    let b: Dimensions = [("b", "2"), ("a", "1")].into_iter().collect();
    reg.update(&sample("m", MetricKind::CumulativeCounter, 1.0), &a);
    reg.update(&sample("m", MetricKind::CumulativeCounter, 1.0), &b);

    assert_eq!(reg.len(), 1);
    assert_eq!(reg.collect()[0].value, 2.0);
}

#[test]
fn distinct_dimensions_are_distinct_series() {
    let (reg, _) = registry();
    reg.update(&sample("m", MetricKind::Gauge, 1.0), &dims(&[("source", "web.1")]));
    reg.update(&sample("m", MetricKind::Gauge, 2.0), &dims(&[("source", "web.2")]));
    reg.update(&sample("m", MetricKind::Gauge, 3.0), &dims(&[]));
    assert_eq!(reg.len(), 3);
}

#[test]
fn kind_conflict_keeps_first_kind() {
    let (reg, _) = registry();
    let d = dims(&[("source", "web.1")]);
    assert!(reg.update(&sample("m", MetricKind::Gauge, 1.0), &d));
    assert!(!reg.update(&sample("m", MetricKind::CumulativeCounter, 100.0), &d));

    let dps = reg.collect();
    assert_eq!(dps.len(), 1);
    assert_eq!(dps[0].kind, MetricKind::Gauge);
    assert_eq!(dps[0].value, 1.0);

    let t = reg.tracked();
    assert_eq!((t.gauges, t.counters, t.cumulative_counters), (1, 0, 0));
}

#[test]
fn series_survive_just_under_ttl_and_expire_just_over() {
    let (reg, clock) = registry();
    let d = dims(&[("source", "web.1")]);
    reg.update(&sample("m", MetricKind::Gauge, 1.0), &d);

    clock.advance(TTL - EPS);
    assert!(find(&reg.collect(), "m").is_some());

    // exactly TTL idle is still live
    clock.advance(EPS);
    assert!(find(&reg.collect(), "m").is_some());

    clock.advance(EPS);
    assert!(reg.collect().is_empty());
    assert!(reg.is_empty());
}

#[test]
fn collect_does_not_refresh_access() {
    let (reg, clock) = registry();
    reg.update(&sample("m", MetricKind::Gauge, 1.0), &dims(&[]));
    for _ in 0..3 {
        clock.advance(TTL / 3);
        reg.collect();
    }
    clock.advance(EPS);
    assert!(reg.collect().is_empty());
}

#[test]
fn updates_refresh_only_their_own_series() {
    let (reg, clock) = registry();
    let hot = dims(&[("source", "web.1")]);
    let cold = dims(&[("source", "web.2")]);
    reg.update(&sample("m", MetricKind::Gauge, 1.0), &cold);
    reg.update(&sample("m", MetricKind::Gauge, 1.0), &hot);

    clock.advance(TTL / 2);
    reg.update(&sample("m", MetricKind::Gauge, 2.0), &hot);
    clock.advance(TTL / 2 + EPS);

    let dps = reg.collect();
    assert_eq!(dps.len(), 1);
    assert_eq!(dps[0].dimensions.get("source"), Some("web.1"));
    assert_eq!(dps[0].value, 2.0);
}

#[test]
fn evicted_series_restart_from_scratch() {
    let (reg, clock) = registry();
    let d = dims(&[]);
    reg.update(&sample("total", MetricKind::CumulativeCounter, 40.0), &d);
    reg.update(&sample("delta", MetricKind::ResettableCounter, 5.0), &d);

    clock.advance(TTL + EPS);
    assert!(reg.collect().is_empty());

    // a new sample creates a fresh series: no resurrected totals
    reg.update(&sample("total", MetricKind::CumulativeCounter, 1.0), &d);
    reg.update(&sample("delta", MetricKind::ResettableCounter, 1.0), &d);
    let dps = reg.collect();
    assert_eq!(find(&dps, "total").unwrap().value, 1.0);
    assert_eq!(find(&dps, "delta").unwrap().value, 1.0);
}

#[test]
fn eviction_frees_the_kind_for_reuse() {
    let (reg, clock) = registry();
    let d = dims(&[]);
    reg.update(&sample("m", MetricKind::Gauge, 1.0), &d);
    clock.advance(TTL + EPS);
    reg.collect();

    reg.update(&sample("m", MetricKind::CumulativeCounter, 9.0), &d);
    let dps = reg.collect();
    assert_eq!(dps[0].kind, MetricKind::CumulativeCounter);
    assert_eq!(dps[0].value, 9.0);
}

#[test]
fn tracked_counts_by_kind() {
    let (reg, _) = registry();
    let d = dims(&[]);
    reg.update(&sample("g1", MetricKind::Gauge, 1.0), &d);
    reg.update(&sample("g2", MetricKind::Gauge, 1.0), &d);
    reg.update(&sample("c", MetricKind::ResettableCounter, 1.0), &d);
    reg.update(&sample("cc", MetricKind::CumulativeCounter, 1.0), &d);

    let t = reg.tracked();
    assert_eq!(t.get(MetricKind::Gauge), 2);
    assert_eq!(t.get(MetricKind::ResettableCounter), 1);
    assert_eq!(t.get(MetricKind::CumulativeCounter), 1);
    assert_eq!(t.total(), reg.len());
}

#[test]
fn concurrent_updates_and_collects_lose_nothing() {
    let (reg, _) = registry();
    let reg = Arc::new(reg);
    let threads = 8;
    let per_thread = 1_000;

    let collected = Arc::new(parking_lot::Mutex::new(0.0f64));
    let mut handles = Vec::new();
    for t in 0..threads {
        let reg = Arc::clone(&reg);
        handles.push(thread::spawn(move || {
            let worker = t.to_string();
            let own = dims(&[("worker", worker.as_str())]);
            let shared = dims(&[]);
            for _ in 0..per_thread {
                reg.update(&sample("shared", MetricKind::ResettableCounter, 1.0), &shared);
                reg.update(&sample("own", MetricKind::CumulativeCounter, 1.0), &own);
            }
        }));
    }
    for _ in 0..2 {
        let reg = Arc::clone(&reg);
        let collected = Arc::clone(&collected);
        handles.push(thread::spawn(move || {
            for _ in 0..50 {
                let dps = reg.collect();
                if let Some(d) = find(&dps, "shared") {
                    *collected.lock() += d.value;
                }
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    let dps = reg.collect();
    let tail = find(&dps, "shared").map(|d| d.value).unwrap_or(0.0);
    assert_eq!(*collected.lock() + tail, (threads * per_thread) as f64);

    let owns: Vec<_> = dps.iter().filter(|d| d.name == "own").collect();
    assert_eq!(owns.len(), threads);
    assert!(owns.iter().all(|d| d.value == per_thread as f64));
}

#[test]
fn new_series_are_never_collected_before_their_first_value() {
    let (reg, _) = registry();
    let reg = Arc::new(reg);
    let series = 20_000;
    let done = Arc::new(std::sync::atomic::AtomicBool::new(false));

    let writer = {
        let reg = Arc::clone(&reg);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let d = dims(&[("source", "web.1")]);
            for i in 0..series {
                reg.update(&sample(&format!("g{i}"), MetricKind::Gauge, 42.0), &d);
                reg.update(&sample(&format!("c{i}"), MetricKind::CumulativeCounter, 42.0), &d);
            }
            done.store(true, std::sync::atomic::Ordering::Release);
        })
    };

    let mut zeros = 0;
    loop {
        let finished = done.load(std::sync::atomic::Ordering::Acquire);
        zeros += reg.collect().iter().filter(|d| d.value == 0.0).count();
        if finished {
            break;
        }
    }
    writer.join().unwrap();

    assert_eq!(zeros, 0, "collect observed series without their first value");
    assert_eq!(reg.len(), 2 * series);
}
