//! Bounded rolling state carried between worker runs.
//!
//! Pruning and lookup are separate operations: callers decide
//! whether a lookup sees the log before or after it is pruned.

use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// A single `(price, timestamp)` observation. Timestamps are epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub price: f64,
    pub timestamp: i64,
}

/// Time-ordered price log. Always sorted ascending by timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceLog {
    samples: Vec<PriceSample>,
}

impl PriceLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a log from arbitrary samples, restoring time order.
    pub fn from_samples(mut samples: Vec<PriceSample>) -> Self {
        samples.sort_by_key(|s| s.timestamp);
        Self { samples }
    }

    pub fn samples(&self) -> &[PriceSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Inserts a sample at its ordered position.
    pub fn push(&mut self, price: f64, timestamp: i64) {
        let idx = self.samples.partition_point(|s| s.timestamp <= timestamp);
        self.samples.insert(idx, PriceSample { price, timestamp });
    }

    /// Drops every sample older than `now_ms - window_ms`.
    pub fn prune(&mut self, now_ms: i64, window_ms: i64) {
        let cutoff = now_ms - window_ms;
        let first_kept = self.samples.partition_point(|s| s.timestamp < cutoff);
        self.samples.drain(..first_kept);
    }

    /// Latest sample with `timestamp <= target_ms`, if any.
    pub fn at_or_before(&self, target_ms: i64) -> Option<&PriceSample> {
        let idx = self.samples.partition_point(|s| s.timestamp <= target_ms);
        idx.checked_sub(1).map(|i| &self.samples[i])
    }

    /// Looks up the sample closest to `window_ms` ago, accepting it only if its
    /// age does not exceed `window_ms * tolerance`.
    pub fn lookback(&self, now_ms: i64, window_ms: i64, tolerance: f64) -> Option<&PriceSample> {
        let sample = self.at_or_before(now_ms - window_ms)?;
        let max_age = (window_ms as f64 * tolerance) as i64;
        (now_ms - sample.timestamp <= max_age).then_some(sample)
    }

    /// Samples with `timestamp >= since_ms`.
    pub fn since(&self, since_ms: i64) -> &[PriceSample] {
        let start = self.samples.partition_point(|s| s.timestamp < since_ms);
        &self.samples[start..]
    }
}

/// Percentage change from `from` to `to`.
pub fn percent_change(from: f64, to: f64) -> Option<f64> {
    (from != 0.0).then(|| (to - from) / from * 100.0)
}

/// Insertion-ordered set of headline titles with a fixed capacity.
///
/// Once the capacity is exceeded the oldest titles are evicted first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct SeenTitles {
    order: VecDeque<String>,
    index: HashSet<String>,
    capacity: usize,
}

pub const SEEN_TITLES_CAPACITY: usize = 200;

impl SeenTitles {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            order: VecDeque::new(),
            index: HashSet::new(),
            capacity,
        }
    }

    pub fn contains(&self, title: &str) -> bool {
        self.index.contains(title)
    }

    /// Records a title. Returns `false` if it was already present.
    pub fn insert(&mut self, title: &str) -> bool {
        if self.index.contains(title) {
            return false;
        }
        self.order.push_back(title.to_string());
        self.index.insert(title.to_string());
        self.evict();
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn evict(&mut self) {
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.index.remove(&oldest);
            }
        }
    }
}

impl Default for SeenTitles {
    fn default() -> Self {
        Self::with_capacity(SEEN_TITLES_CAPACITY)
    }
}

impl From<Vec<String>> for SeenTitles {
    fn from(titles: Vec<String>) -> Self {
        let mut seen = SeenTitles::with_capacity(SEEN_TITLES_CAPACITY);
        for title in titles {
            seen.insert(&title);
        }
        seen
    }
}

impl From<SeenTitles> for Vec<String> {
    fn from(seen: SeenTitles) -> Self {
        seen.order.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: i64 = 60_000;

    #[test]
    fn test_push_keeps_time_order() {
        let mut log = PriceLog::new();
        log.push(3.0, 30);
        log.push(1.0, 10);
        log.push(2.0, 20);
        let ts: Vec<i64> = log.samples().iter().map(|s| s.timestamp).collect();
        assert_eq!(ts, vec![10, 20, 30]);
    }

    #[test]
    fn test_prune_drops_samples_outside_window() {
        let now = 100 * MIN;
        let mut log = PriceLog::from_samples(vec![
            PriceSample { price: 1.0, timestamp: now - 45 * MIN },
            PriceSample { price: 2.0, timestamp: now - 31 * MIN },
            PriceSample { price: 3.0, timestamp: now - 30 * MIN },
            PriceSample { price: 4.0, timestamp: now },
        ]);
        log.prune(now, 30 * MIN);
        assert_eq!(log.len(), 2);
        assert!(log.samples().iter().all(|s| s.timestamp >= now - 30 * MIN));
    }

    #[test]
    fn test_at_or_before_picks_latest_eligible() {
        let log = PriceLog::from_samples(vec![
            PriceSample { price: 1.0, timestamp: 10 },
            PriceSample { price: 2.0, timestamp: 20 },
            PriceSample { price: 3.0, timestamp: 30 },
        ]);
        assert_eq!(log.at_or_before(25).map(|s| s.price), Some(2.0));
        assert_eq!(log.at_or_before(20).map(|s| s.price), Some(2.0));
        assert!(log.at_or_before(5).is_none());
    }

    #[test]
    fn test_lookback_respects_tolerance() {
        let now = 600 * MIN;
        let log = PriceLog::from_samples(vec![
            PriceSample { price: 90.0, timestamp: now - 80 * MIN },
            PriceSample { price: 95.0, timestamp: now - 10 * MIN },
        ]);
        // 1h lookback: sample is 80 minutes old, beyond 75 minute tolerance
        assert!(log.lookback(now, 60 * MIN, 1.25).is_none());
        // 70 minutes old is accepted
        let log = PriceLog::from_samples(vec![PriceSample { price: 90.0, timestamp: now - 70 * MIN }]);
        assert_eq!(log.lookback(now, 60 * MIN, 1.25).map(|s| s.price), Some(90.0));
    }

    #[test]
    fn test_since_returns_recent_slice() {
        let log = PriceLog::from_samples(vec![
            PriceSample { price: 1.0, timestamp: 10 },
            PriceSample { price: 2.0, timestamp: 20 },
            PriceSample { price: 3.0, timestamp: 30 },
        ]);
        assert_eq!(log.since(20).len(), 2);
        assert_eq!(log.since(31).len(), 0);
    }

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(100.0, 96.0), Some(-4.0));
        assert_eq!(percent_change(0.0, 1.0), None);
    }

    #[test]
    fn test_seen_titles_evicts_oldest() {
        let mut seen = SeenTitles::with_capacity(3);
        for t in ["a", "b", "c", "d"] {
            assert!(seen.insert(t));
        }
        assert_eq!(seen.len(), 3);
        assert!(!seen.contains("a"));
        assert!(seen.contains("d"));
        assert!(!seen.insert("d"));
    }

    #[test]
    fn test_seen_titles_serializes_in_insertion_order() {
        let mut seen = SeenTitles::with_capacity(SEEN_TITLES_CAPACITY);
        seen.insert("first");
        seen.insert("second");
        let json = serde_json::to_string(&seen).unwrap();
        assert_eq!(json, r#"["first","second"]"#);

        let restored: SeenTitles = serde_json::from_str(&json).unwrap();
        assert!(restored.contains("first"));
        assert_eq!(restored.len(), 2);
    }

    #[test]
    fn test_seen_titles_loaded_over_capacity_is_trimmed() {
        let titles: Vec<String> = (0..250).map(|i| format!("title {}", i)).collect();
        let seen = SeenTitles::from(titles);
        assert_eq!(seen.len(), SEEN_TITLES_CAPACITY);
        assert!(!seen.contains("title 0"));
        assert!(seen.contains("title 249"));
    }
}
