//! Tracking the best live pair across merges.
//!
//! Two strategies implement [`MaxPairIndex`]:
//!
//! - [`NeighborMaxPairIndex`]: every live region remembers its best live
//!   partner; a merge sweeps the new composite once against the live set
//!   and rescans only the regions whose best partner just retired
//! - [`ScanMaxPairIndex`]: rescans every live pair after every merge, the
//!   naive baseline used to cross-check the neighbor index
//!
//! Both select the same pair for the same state: highest value first, then
//! the smallest `(low, high)` id pair (see [`ScoredPair::beats`]).

mod neighbor;
mod scan;
mod sweep;

#[cfg(test)]
mod tests;

use gravclust_config::IndexStrategy;
use gravclust_core::{DistanceMetric, RegionId, Result};

use crate::cache::PotentialCache;
use crate::pair::{PairValueProvider, ScoredPair};
use crate::region::RegionStore;
use crate::stats::EngineStats;

pub use neighbor::NeighborMaxPairIndex;
pub use scan::ScanMaxPairIndex;
pub use sweep::Sweeper;

/// Everything an index needs to evaluate pairs during one update.
pub struct SweepContext<'a, M> {
    pub store: &'a RegionStore,
    pub provider: &'a PairValueProvider<M>,
    pub cache: &'a mut PotentialCache,
    pub sweeper: &'a Sweeper,
    pub stats: &'a mut EngineStats,
}

impl<'a, M: DistanceMetric> SweepContext<'a, M> {
    /// Value of a live pair through the cache.
    pub fn value(&mut self, a: RegionId, b: RegionId) -> Result<f64> {
        self.cache.get_or_compute(self.store, self.provider, a, b)
    }

    /// Values of `from` against every region in `targets`.
    ///
    /// Runs on the thread pool when the live set is large enough. Results
    /// are in `targets` order either way and are recorded in the cache.
    pub fn sweep(&mut self, from: RegionId, targets: &[RegionId]) -> Result<Vec<(RegionId, f64)>> {
        let parallel = self.sweeper.is_parallel_for(self.store.live_count());
        let values = self
            .sweeper
            .sweep(self.store, self.provider, from, targets, parallel)?;
        if parallel {
            self.stats.record_parallel_sweep();
        }
        self.cache.insert_sweep(from, &values);
        Ok(values)
    }

    /// Best partner of `id` among all other live regions.
    pub fn best_partner(&mut self, id: RegionId) -> Result<Option<ScoredPair>> {
        let store = self.store;
        let mut best = None;
        for &other in store.live_ids() {
            if other == id {
                continue;
            }
            let value = self.value(id, other)?;
            best = Some(ScoredPair::pick(best, ScoredPair::new(id, other, value)));
        }
        Ok(best)
    }
}

/// Maintains the globally best live pair.
pub trait MaxPairIndex {
    /// Builds the index over the current live set.
    fn build<M: DistanceMetric>(&mut self, ctx: &mut SweepContext<'_, M>) -> Result<()>;

    /// The best live pair, or `None` with fewer than two live regions.
    fn best_pair(&self) -> Option<ScoredPair>;

    /// Updates the index after `retired_a` and `retired_b` merged into
    /// `composite`. The store already reflects the merge.
    fn on_merge<M: DistanceMetric>(
        &mut self,
        ctx: &mut SweepContext<'_, M>,
        retired_a: RegionId,
        retired_b: RegionId,
        composite: RegionId,
    ) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// Index chosen by configuration.
#[derive(Debug, Clone)]
pub enum PairIndex {
    Neighbor(NeighborMaxPairIndex),
    Scan(ScanMaxPairIndex),
}

impl PairIndex {
    pub fn for_strategy(strategy: IndexStrategy, leaf_count: usize) -> Self {
        match strategy {
            IndexStrategy::BestNeighbor => {
                PairIndex::Neighbor(NeighborMaxPairIndex::with_leaf_capacity(leaf_count))
            }
            IndexStrategy::FullScan => PairIndex::Scan(ScanMaxPairIndex::new()),
        }
    }
}

impl MaxPairIndex for PairIndex {
    fn build<M: DistanceMetric>(&mut self, ctx: &mut SweepContext<'_, M>) -> Result<()> {
        match self {
            PairIndex::Neighbor(index) => index.build(ctx),
            PairIndex::Scan(index) => index.build(ctx),
        }
    }

    fn best_pair(&self) -> Option<ScoredPair> {
        match self {
            PairIndex::Neighbor(index) => index.best_pair(),
            PairIndex::Scan(index) => index.best_pair(),
        }
    }

    fn on_merge<M: DistanceMetric>(
        &mut self,
        ctx: &mut SweepContext<'_, M>,
        retired_a: RegionId,
        retired_b: RegionId,
        composite: RegionId,
    ) -> Result<()> {
        match self {
            PairIndex::Neighbor(index) => index.on_merge(ctx, retired_a, retired_b, composite),
            PairIndex::Scan(index) => index.on_merge(ctx, retired_a, retired_b, composite),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            PairIndex::Neighbor(index) => index.name(),
            PairIndex::Scan(index) => index.name(),
        }
    }
}
