//! Full-scan index.

use gravclust_core::{DistanceMetric, RegionId, Result};

use super::{MaxPairIndex, SweepContext};
use crate::pair::ScoredPair;

/// Recomputes the best pair over every live pair after each merge.
///
/// O(n²) lookups per merge. Values still go through the cache, so with
/// caching enabled only the composite's pairs are computed fresh.
#[derive(Debug, Clone, Default)]
pub struct ScanMaxPairIndex {
    best: Option<ScoredPair>,
}

impl ScanMaxPairIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn scan<M: DistanceMetric>(&mut self, ctx: &mut SweepContext<'_, M>) -> Result<()> {
        let live: Vec<RegionId> = ctx.store.live_ids().to_vec();
        let mut best = None;
        for (i, &a) in live.iter().enumerate() {
            for &b in &live[i + 1..] {
                let value = ctx.value(a, b)?;
                best = Some(ScoredPair::pick(best, ScoredPair::new(a, b, value)));
            }
        }
        self.best = best;
        Ok(())
    }
}

impl MaxPairIndex for ScanMaxPairIndex {
    fn build<M: DistanceMetric>(&mut self, ctx: &mut SweepContext<'_, M>) -> Result<()> {
        self.scan(ctx)
    }

    fn best_pair(&self) -> Option<ScoredPair> {
        self.best
    }

    fn on_merge<M: DistanceMetric>(
        &mut self,
        ctx: &mut SweepContext<'_, M>,
        _retired_a: RegionId,
        _retired_b: RegionId,
        _composite: RegionId,
    ) -> Result<()> {
        self.scan(ctx)
    }

    fn name(&self) -> &'static str {
        "full_scan"
    }
}
