//! Cache Metrics Module
//!
//! Counters and gauges over engine events. Pure bookkeeping: recording never
//! fails and never influences control flow.

use serde::{Deserialize, Serialize};

// == Metrics Recorder ==
/// Sink for engine events.
///
/// Gauges (`update_*`) set absolute values and raise the matching peak;
/// counters only grow until [`MetricsRecorder::reset`].
pub trait MetricsRecorder: Send + std::fmt::Debug {
    fn record_set(&mut self);
    fn record_get(&mut self);
    fn record_hit(&mut self);
    fn record_miss(&mut self);
    fn record_failed_op(&mut self);
    fn record_eviction(&mut self);
    fn record_expired_removal(&mut self);
    fn record_manual_deletion(&mut self) {
        self.record_manual_deletions(1);
    }
    fn record_manual_deletions(&mut self, count: u64);

    /// Sets the physical key count gauge.
    fn update_total_keys(&mut self, count: usize);
    /// Sets the valid key count gauge.
    fn update_valid_keys(&mut self, count: usize);
    /// Adjusts the valid key gauge by `delta`, clamped at zero.
    fn update_valid_keys_by_delta(&mut self, delta: i64);

    /// Point-in-time copy of every counter, gauge and derived ratio.
    fn snapshot(&self) -> MetricsSnapshot;
    /// Zeroes everything, peaks included.
    fn reset(&mut self);
}

// == Metrics Snapshot ==
/// Immutable copy of the metrics with derived ratios computed at capture time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub gets: u64,
    pub failed_ops: u64,
    pub evictions: u64,
    pub expired_removals: u64,
    pub manual_deletions: u64,
    pub current_valid_keys: usize,
    pub peak_valid_keys: usize,
    pub current_total_keys: usize,
    pub peak_total_keys: usize,
    /// hits / gets
    pub hit_ratio: f64,
    /// misses / gets
    pub miss_ratio: f64,
    /// gets / sets
    pub get_set_ratio: f64,
    /// evictions / sets
    pub eviction_rate: f64,
    /// Physical keys that are no longer valid
    pub expired_bloat: usize,
    /// expired_bloat as a percentage of physical keys
    pub waste_percentage: f64,
}

// == Cache Metrics ==
/// In-memory metrics recorder.
#[derive(Debug, Clone, Default)]
pub struct CacheMetrics {
    hits: u64,
    misses: u64,
    sets: u64,
    gets: u64,
    failed_ops: u64,
    evictions: u64,
    expired_removals: u64,
    manual_deletions: u64,
    current_valid_keys: usize,
    peak_valid_keys: usize,
    current_total_keys: usize,
    peak_total_keys: usize,
}

impl CacheMetrics {
    // == Constructor ==
    /// Creates a new CacheMetrics with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Ratio ==
    /// Returns hits / gets, or 0.0 if no gets have been made.
    pub fn hit_ratio(&self) -> f64 {
        ratio(self.hits, self.gets)
    }

    pub fn miss_ratio(&self) -> f64 {
        ratio(self.misses, self.gets)
    }

    pub fn get_set_ratio(&self) -> f64 {
        ratio(self.gets, self.sets)
    }

    pub fn eviction_rate(&self) -> f64 {
        ratio(self.evictions, self.sets)
    }

    pub fn expired_bloat(&self) -> usize {
        self.current_total_keys
            .saturating_sub(self.current_valid_keys)
    }

    // == Waste Percentage ==
    /// Share of physical keys that are expired, in percent.
    pub fn waste_percentage(&self) -> f64 {
        if self.current_total_keys == 0 {
            0.0
        } else {
            self.expired_bloat() as f64 / self.current_total_keys as f64 * 100.0
        }
    }

    fn set_valid_keys(&mut self, count: usize) {
        self.current_valid_keys = count;
        self.peak_valid_keys = self.peak_valid_keys.max(count);
    }
}

impl MetricsRecorder for CacheMetrics {
    fn record_set(&mut self) {
        self.sets += 1;
    }

    fn record_get(&mut self) {
        self.gets += 1;
    }

    fn record_hit(&mut self) {
        self.hits += 1;
    }

    fn record_miss(&mut self) {
        self.misses += 1;
    }

    fn record_failed_op(&mut self) {
        self.failed_ops += 1;
    }

    fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    fn record_expired_removal(&mut self) {
        self.expired_removals += 1;
    }

    fn record_manual_deletions(&mut self, count: u64) {
        self.manual_deletions += count;
    }

    fn update_total_keys(&mut self, count: usize) {
        self.current_total_keys = count;
        self.peak_total_keys = self.peak_total_keys.max(count);
    }

    fn update_valid_keys(&mut self, count: usize) {
        self.set_valid_keys(count);
    }

    fn update_valid_keys_by_delta(&mut self, delta: i64) {
        let current = self.current_valid_keys as i64;
        let updated = current.saturating_add(delta).max(0);
        self.set_valid_keys(updated as usize);
    }

    fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            hits: self.hits,
            misses: self.misses,
            sets: self.sets,
            gets: self.gets,
            failed_ops: self.failed_ops,
            evictions: self.evictions,
            expired_removals: self.expired_removals,
            manual_deletions: self.manual_deletions,
            current_valid_keys: self.current_valid_keys,
            peak_valid_keys: self.peak_valid_keys,
            current_total_keys: self.current_total_keys,
            peak_total_keys: self.peak_total_keys,
            hit_ratio: self.hit_ratio(),
            miss_ratio: self.miss_ratio(),
            get_set_ratio: self.get_set_ratio(),
            eviction_rate: self.eviction_rate(),
            expired_bloat: self.expired_bloat(),
            waste_percentage: self.waste_percentage(),
        }
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

// == No-Op Metrics ==
/// Recorder used when metrics are disabled. Snapshots are all zeros.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetrics;

impl MetricsRecorder for NoOpMetrics {
    fn record_set(&mut self) {}
    fn record_get(&mut self) {}
    fn record_hit(&mut self) {}
    fn record_miss(&mut self) {}
    fn record_failed_op(&mut self) {}
    fn record_eviction(&mut self) {}
    fn record_expired_removal(&mut self) {}
    fn record_manual_deletions(&mut self, _count: u64) {}
    fn update_total_keys(&mut self, _count: usize) {}
    fn update_valid_keys(&mut self, _count: usize) {}
    fn update_valid_keys_by_delta(&mut self, _delta: i64) {}

    fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot::default()
    }

    fn reset(&mut self) {}
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
