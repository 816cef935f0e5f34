//! Memoized pair values.
//!
//! Every value is keyed by the canonical `(low, high)` pair and indexed by
//! both endpoints, so retiring a region retracts exactly the entries that
//! mention it. Entries are never dropped on a timer or by recency: every
//! live pair is a candidate for the next merge.
//!
//! The cache also owns the eviction policy for composite member detail.
//! Evicting detail never touches pair values, since those depend only on
//! the composite's fixed centroid and weight.

use std::collections::{HashMap, HashSet};

use gravclust_config::CacheConfig;
use gravclust_core::{ClusterError, DistanceMetric, RegionId, Result};
use tracing::trace;

use crate::pair::PairValueProvider;
use crate::region::RegionStore;

/// Counters maintained by [`PotentialCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Pair values computed by the provider.
    pub evaluations: u64,
    /// Entries removed because an endpoint retired.
    pub invalidated: u64,
    /// Composites whose member detail was released.
    pub evictions: u64,
}

/// Pair value cache with retirement-driven invalidation.
///
/// With caching disabled every lookup goes to the provider and nothing is
/// stored; results are identical either way.
#[derive(Debug)]
pub struct PotentialCache {
    enabled: bool,
    eviction_member_threshold: usize,
    values: HashMap<(RegionId, RegionId), f64>,
    region_to_pairs: HashMap<RegionId, HashSet<(RegionId, RegionId)>>,
    stats: CacheStats,
}

impl PotentialCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            enabled: config.enabled,
            eviction_member_threshold: config.eviction_member_threshold,
            values: HashMap::new(),
            region_to_pairs: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn eviction_member_threshold(&self) -> usize {
        self.eviction_member_threshold
    }

    /// Returns the cached value for a live pair, computing it on a miss.
    ///
    /// # Errors
    ///
    /// Fails with [`ClusterError::InvariantViolation`] if either endpoint is
    /// not live or both are the same region. Provider errors propagate.
    pub fn get_or_compute<M: DistanceMetric>(
        &mut self,
        store: &RegionStore,
        provider: &PairValueProvider<M>,
        a: RegionId,
        b: RegionId,
    ) -> Result<f64> {
        for id in [a, b] {
            if !store.is_live(id) {
                return Err(ClusterError::invariant(
                    format!("pair value requested for retired region {id}"),
                    store.merge_count(),
                ));
            }
        }
        if a == b {
            return Err(ClusterError::invariant(
                format!("pair value requested for region {a} with itself"),
                store.merge_count(),
            ));
        }

        let key = RegionId::ordered(a, b);
        if let Some(&value) = self.values.get(&key) {
            self.stats.hits += 1;
            return Ok(value);
        }

        let value = provider.value(store, key.0, key.1)?;
        self.stats.evaluations += 1;
        self.store_value(key, value);
        Ok(value)
    }

    /// Cached value for a pair, without computing.
    pub fn get(&self, a: RegionId, b: RegionId) -> Option<f64> {
        self.values.get(&RegionId::ordered(a, b)).copied()
    }

    /// Records values computed outside the cache for pairs `(from, target)`.
    pub fn insert_sweep(&mut self, from: RegionId, values: &[(RegionId, f64)]) {
        self.stats.evaluations += values.len() as u64;
        for &(target, value) in values {
            self.store_value(RegionId::ordered(from, target), value);
        }
    }

    fn store_value(&mut self, key: (RegionId, RegionId), value: f64) {
        if !self.enabled {
            return;
        }
        if self.values.insert(key, value).is_none() {
            self.region_to_pairs.entry(key.0).or_default().insert(key);
            self.region_to_pairs.entry(key.1).or_default().insert(key);
        }
    }

    /// Removes every entry mentioning `id`. Returns the number removed.
    pub fn invalidate(&mut self, id: RegionId) -> usize {
        let Some(pairs) = self.region_to_pairs.remove(&id) else {
            return 0;
        };

        for pair in &pairs {
            self.values.remove(pair);
            let other = if pair.0 == id { pair.1 } else { pair.0 };
            if let Some(other_set) = self.region_to_pairs.get_mut(&other) {
                other_set.remove(pair);
                if other_set.is_empty() {
                    self.region_to_pairs.remove(&other);
                }
            }
        }

        self.stats.invalidated += pairs.len() as u64;
        pairs.len()
    }

    /// Returns true if any entry mentions `id`.
    pub fn mentions(&self, id: RegionId) -> bool {
        self.region_to_pairs.contains_key(&id)
    }

    /// Releases the member detail of composite `id` once it has more
    /// members than the eviction threshold.
    ///
    /// Returns true if detail was released.
    pub fn note_eviction_eligible(&mut self, id: RegionId, store: &mut RegionStore) -> bool {
        let Some(member_count) = store.member_count(id) else {
            return false;
        };
        if member_count <= self.eviction_member_threshold || !store.release_members(id) {
            return false;
        }

        self.stats.evictions += 1;
        trace!(
            event = "evict_members",
            region = %id,
            member_count,
            threshold = self.eviction_member_threshold,
        );
        true
    }

    /// Number of cached pair values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests;
