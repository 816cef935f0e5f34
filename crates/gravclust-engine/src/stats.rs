//! Engine statistics.

use std::time::{Duration, Instant};

use crate::cache::CacheStats;

/// Counters for one clustering run.
///
/// # Example
///
/// ```
/// use gravclust_engine::EngineStats;
///
/// let mut stats = EngineStats::default();
/// stats.start();
/// stats.record_merge();
/// stats.record_rescans(3);
///
/// assert_eq!(stats.merges, 1);
/// assert_eq!(stats.rescans, 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineStats {
    start_time: Option<Instant>,
    end_time: Option<Instant>,
    /// Merges performed.
    pub merges: u64,
    /// Pair values computed by the provider.
    pub pair_evaluations: u64,
    /// Pair values answered from the cache.
    pub cache_hits: u64,
    /// Cache entries dropped because an endpoint retired.
    pub invalidated: u64,
    /// Composites whose member detail was released.
    pub evictions: u64,
    /// Regions whose best partner was recomputed from scratch.
    pub rescans: u64,
    /// Composite sweeps that ran on the thread pool.
    pub parallel_sweeps: u64,
}

impl EngineStats {
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
        self.end_time = None;
    }

    pub fn finish(&mut self) {
        if self.start_time.is_some() && self.end_time.is_none() {
            self.end_time = Some(Instant::now());
        }
    }

    /// Time since [`start`](Self::start), frozen by [`finish`](Self::finish).
    pub fn elapsed(&self) -> Duration {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => end.duration_since(start),
            (Some(start), None) => start.elapsed(),
            _ => Duration::ZERO,
        }
    }

    pub fn record_merge(&mut self) {
        self.merges += 1;
    }

    pub fn record_rescans(&mut self, count: u64) {
        self.rescans += count;
    }

    pub fn record_parallel_sweep(&mut self) {
        self.parallel_sweeps += 1;
    }

    /// Copies the cache counters into this snapshot.
    pub fn with_cache(mut self, cache: CacheStats) -> Self {
        self.pair_evaluations = cache.evaluations;
        self.cache_hits = cache.hits;
        self.invalidated = cache.invalidated;
        self.evictions = cache.evictions;
        self
    }

    /// Fraction of pair lookups answered from the cache.
    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.pair_evaluations;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    pub fn merges_per_second(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.merges as f64 / secs
        } else {
            0.0
        }
    }
}
