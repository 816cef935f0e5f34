//! Best-neighbor index.

use gravclust_core::{DistanceMetric, RegionId, Result};
use smallvec::SmallVec;
use tracing::trace;

use super::{MaxPairIndex, SweepContext};
use crate::pair::ScoredPair;

/// Per-region best partner, with the global best derived from them.
///
/// After a merge of `a` and `b` into `c`:
///
/// 1. `c` is swept once against every other live region
/// 2. a region whose best partner was `a` or `b` is rescanned in full
/// 3. every other region keeps its best unless the pair with `c` beats it
///
/// Step 3 is exact because retiring `a` and `b` cannot improve any pair
/// that did not involve them.
#[derive(Debug, Clone, Default)]
pub struct NeighborMaxPairIndex {
    /// Best live partner by region slot; `None` once retired.
    best_partner: Vec<Option<ScoredPair>>,
    best: Option<ScoredPair>,
}

impl NeighborMaxPairIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_leaf_capacity(leaves: usize) -> Self {
        Self {
            best_partner: Vec::with_capacity((2 * leaves).saturating_sub(1)),
            best: None,
        }
    }

    /// Current best partner of `id`.
    pub fn best_partner_of(&self, id: RegionId) -> Option<ScoredPair> {
        self.best_partner.get(id.index()).copied().flatten()
    }

    fn set(&mut self, id: RegionId, pair: Option<ScoredPair>) {
        if self.best_partner.len() <= id.index() {
            self.best_partner.resize(id.index() + 1, None);
        }
        self.best_partner[id.index()] = pair;
    }

    fn refresh_best<M>(&mut self, ctx: &SweepContext<'_, M>) {
        self.best = ctx
            .store
            .live_ids()
            .iter()
            .filter_map(|&id| self.best_partner_of(id))
            .fold(None, |best, pair| Some(ScoredPair::pick(best, pair)));
    }
}

impl MaxPairIndex for NeighborMaxPairIndex {
    fn build<M: DistanceMetric>(&mut self, ctx: &mut SweepContext<'_, M>) -> Result<()> {
        let mut live: Vec<RegionId> = ctx.store.live_ids().to_vec();
        live.sort_unstable();

        self.best_partner.clear();
        for (i, &id) in live.iter().enumerate() {
            for (other, value) in ctx.sweep(id, &live[i + 1..])? {
                let pair = ScoredPair::new(id, other, value);
                let for_id = ScoredPair::pick(self.best_partner_of(id), pair);
                let for_other = ScoredPair::pick(self.best_partner_of(other), pair);
                self.set(id, Some(for_id));
                self.set(other, Some(for_other));
            }
        }

        self.refresh_best(ctx);
        Ok(())
    }

    fn best_pair(&self) -> Option<ScoredPair> {
        self.best
    }

    fn on_merge<M: DistanceMetric>(
        &mut self,
        ctx: &mut SweepContext<'_, M>,
        retired_a: RegionId,
        retired_b: RegionId,
        composite: RegionId,
    ) -> Result<()> {
        self.set(retired_a, None);
        self.set(retired_b, None);

        let others: Vec<RegionId> = ctx
            .store
            .live_ids()
            .iter()
            .copied()
            .filter(|&id| id != composite)
            .collect();

        let mut composite_best = None;
        let mut stale: SmallVec<[RegionId; 8]> = SmallVec::new();
        for (other, value) in ctx.sweep(composite, &others)? {
            let pair = ScoredPair::new(composite, other, value);
            composite_best = Some(ScoredPair::pick(composite_best, pair));

            match self.best_partner_of(other) {
                Some(current) if current.involves(retired_a) || current.involves(retired_b) => {
                    stale.push(other)
                }
                None => stale.push(other),
                Some(current) => {
                    if pair.beats(&current) {
                        self.set(other, Some(pair));
                    }
                }
            }
        }
        self.set(composite, composite_best);

        for &id in &stale {
            let best = ctx.best_partner(id)?;
            trace!(
                event = "rescan",
                region = %id,
                partner = ?best.and_then(|p| p.partner_of(id)).map(|p| p.get()),
            );
            self.set(id, best);
        }
        ctx.stats.record_rescans(stale.len() as u64);

        self.refresh_best(ctx);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "best_neighbor"
    }
}
