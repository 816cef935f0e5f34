//! Tests for the max-pair indexes.

use gravclust_config::{CacheConfig, ClusterConfig, ForceLawConfig, SweepThreadCount};
use gravclust_core::{EuclideanDistance, Position, RegionId};
use gravclust_test::random::{clustered_points, uniform_points};

use super::{MaxPairIndex, NeighborMaxPairIndex, PairIndex, ScanMaxPairIndex, SweepContext, Sweeper};
use crate::cache::PotentialCache;
use crate::pair::{PairValueProvider, ScoredPair};
use crate::region::RegionStore;
use crate::stats::EngineStats;

struct Harness {
    store: RegionStore,
    provider: PairValueProvider<EuclideanDistance>,
    cache: PotentialCache,
    sweeper: Sweeper,
    stats: EngineStats,
}

impl Harness {
    fn new(points: &[(f64, f64, f64)], sweeper: Sweeper) -> Self {
        let mut store = RegionStore::new();
        for &(x, y, w) in points {
            store.create_leaf(Position::new(x, y), w).unwrap();
        }
        Self {
            store,
            provider: PairValueProvider::new(EuclideanDistance, &ForceLawConfig::default()),
            cache: PotentialCache::new(&CacheConfig::default()),
            sweeper,
            stats: EngineStats::default(),
        }
    }

    fn ctx(&mut self) -> SweepContext<'_, EuclideanDistance> {
        SweepContext {
            store: &self.store,
            provider: &self.provider,
            cache: &mut self.cache,
            sweeper: &self.sweeper,
            stats: &mut self.stats,
        }
    }

    /// Merges the index's best pair and returns it.
    fn merge_best<I: MaxPairIndex>(&mut self, index: &mut I) -> Option<ScoredPair> {
        let best = index.best_pair()?;
        let composite = self.store.create_composite(best.low, best.high).unwrap();
        self.cache.invalidate(best.low);
        self.cache.invalidate(best.high);
        index
            .on_merge(&mut self.ctx(), best.low, best.high, composite)
            .unwrap();
        Some(best)
    }
}

fn brute_force_best(store: &RegionStore, provider: &PairValueProvider<EuclideanDistance>) -> Option<ScoredPair> {
    let live = store.live_ids();
    let mut best = None;
    for (i, &a) in live.iter().enumerate() {
        for &b in &live[i + 1..] {
            let value = provider.value(store, a, b).unwrap();
            best = Some(ScoredPair::pick(best, ScoredPair::new(a, b, value)));
        }
    }
    best
}

fn as_tuples(points: &[gravclust_core::LeafPoint]) -> Vec<(f64, f64, f64)> {
    points.iter().map(|p| (p.lon, p.lat, p.weight)).collect()
}

#[test]
fn test_neighbor_build_finds_closest_pair() {
    let mut h = Harness::new(&[(0.0, 0.0, 1.0), (1.0, 0.0, 1.0), (3.0, 0.0, 1.0)], Sweeper::sequential());
    let mut index = NeighborMaxPairIndex::new();
    index.build(&mut h.ctx()).unwrap();

    let best = index.best_pair().unwrap();
    assert_eq!((best.low, best.high), (RegionId::new(0), RegionId::new(1)));
    assert_eq!(best.value, 1.0);
    assert_eq!(
        index.best_partner_of(RegionId::new(2)).map(|p| p.low),
        Some(RegionId::new(1))
    );
}

#[test]
fn test_terminal_when_one_region_left() {
    let mut h = Harness::new(&[(0.0, 0.0, 1.0), (1.0, 0.0, 1.0)], Sweeper::sequential());
    let mut index = NeighborMaxPairIndex::new();
    index.build(&mut h.ctx()).unwrap();

    assert!(h.merge_best(&mut index).is_some());
    assert_eq!(index.best_pair(), None);
    assert_eq!(h.store.live_count(), 1);
}

#[test]
fn test_tie_breaks_on_smallest_ids() {
    // Two identical pairs: (0,1) and (2,3) have equal value.
    let points = [(0.0, 0.0, 1.0), (0.1, 0.0, 1.0), (100.0, 0.0, 1.0), (100.1, 0.0, 1.0)];
    let mut h = Harness::new(&points, Sweeper::sequential());
    let mut index = NeighborMaxPairIndex::new();
    index.build(&mut h.ctx()).unwrap();

    let first = h.merge_best(&mut index).unwrap();
    assert_eq!((first.low.get(), first.high.get()), (0, 1));
    let second = h.merge_best(&mut index).unwrap();
    assert_eq!((second.low.get(), second.high.get()), (2, 3));
}

#[test]
fn test_neighbor_matches_brute_force_every_step() {
    let points = as_tuples(&clustered_points(7, 60, 5));
    let mut h = Harness::new(&points, Sweeper::sequential());
    let mut index = NeighborMaxPairIndex::new();
    index.build(&mut h.ctx()).unwrap();

    loop {
        let expected = brute_force_best(&h.store, &h.provider);
        assert_eq!(index.best_pair(), expected);
        if h.merge_best(&mut index).is_none() {
            break;
        }
    }
    assert_eq!(h.store.merge_count(), 59);
    assert!(h.stats.rescans > 0);
}

#[test]
fn test_strategies_agree() {
    let points = as_tuples(&uniform_points(11, 40));
    let mut neighbor = Harness::new(&points, Sweeper::sequential());
    let mut scan = Harness::new(&points, Sweeper::sequential());

    let mut a = PairIndex::Neighbor(NeighborMaxPairIndex::new());
    let mut b = PairIndex::Scan(ScanMaxPairIndex::new());
    a.build(&mut neighbor.ctx()).unwrap();
    b.build(&mut scan.ctx()).unwrap();
    assert_eq!(a.name(), "best_neighbor");
    assert_eq!(b.name(), "full_scan");

    loop {
        let left = neighbor.merge_best(&mut a);
        let right = scan.merge_best(&mut b);
        assert_eq!(left, right);
        if left.is_none() {
            break;
        }
    }
}

#[test]
fn test_parallel_sweep_matches_sequential() {
    let points = as_tuples(&uniform_points(3, 50));
    let config = ClusterConfig::new().with_sweep_threads(SweepThreadCount::Count(2), 1);
    let mut parallel = Harness::new(&points, Sweeper::new(&config).unwrap());
    let mut sequential = Harness::new(&points, Sweeper::sequential());

    let mut a = NeighborMaxPairIndex::new();
    let mut b = NeighborMaxPairIndex::new();
    a.build(&mut parallel.ctx()).unwrap();
    b.build(&mut sequential.ctx()).unwrap();

    loop {
        let left = parallel.merge_best(&mut a);
        let right = sequential.merge_best(&mut b);
        assert_eq!(left, right);
        if left.is_none() {
            break;
        }
    }
    assert!(parallel.stats.parallel_sweeps > 0);
    assert_eq!(sequential.stats.parallel_sweeps, 0);
}

#[test]
fn test_sweeper_threshold() {
    let config = ClusterConfig::new().with_sweep_threads(SweepThreadCount::Auto, 100);
    let sweeper = Sweeper::new(&config).unwrap();
    assert!(!sweeper.is_parallel_for(99));
    assert!(sweeper.is_parallel_for(100));

    let config = ClusterConfig::new().with_sweep_threads(SweepThreadCount::None, 1);
    assert!(!Sweeper::new(&config).unwrap().is_parallel_for(1_000_000));
}

#[test]
fn test_retired_entries_leave_the_cache() {
    let points = as_tuples(&uniform_points(5, 20));
    let mut h = Harness::new(&points, Sweeper::sequential());
    let mut index = NeighborMaxPairIndex::new();
    index.build(&mut h.ctx()).unwrap();

    while let Some(pair) = h.merge_best(&mut index) {
        assert!(!h.cache.mentions(pair.low));
        assert!(!h.cache.mentions(pair.high));
        assert!(index.best_partner_of(pair.low).is_none());
    }
    assert!(h.cache.is_empty());
}
