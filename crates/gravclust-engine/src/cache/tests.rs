//! Tests for the pair value cache.

use gravclust_config::{CacheConfig, ForceLawConfig};
use gravclust_core::{ClusterError, EuclideanDistance, Position, RegionId};

use super::PotentialCache;
use crate::pair::PairValueProvider;
use crate::region::RegionStore;

fn setup(n: usize) -> (RegionStore, Vec<RegionId>, PairValueProvider<EuclideanDistance>) {
    let mut store = RegionStore::new();
    let ids = (0..n)
        .map(|i| store.create_leaf(Position::new(i as f64, 0.0), 1.0).unwrap())
        .collect();
    let provider = PairValueProvider::new(EuclideanDistance, &ForceLawConfig::default());
    (store, ids, provider)
}

fn cache(enabled: bool, threshold: usize) -> PotentialCache {
    PotentialCache::new(&CacheConfig {
        enabled,
        eviction_member_threshold: threshold,
    })
}

#[test]
fn test_hit_after_miss() {
    let (store, ids, provider) = setup(3);
    let mut cache = cache(true, 256);

    let first = cache.get_or_compute(&store, &provider, ids[0], ids[1]).unwrap();
    let second = cache.get_or_compute(&store, &provider, ids[1], ids[0]).unwrap();
    assert_eq!(first, second);
    assert_eq!(cache.stats().evaluations, 1);
    assert_eq!(cache.stats().hits, 1);
    assert_eq!(cache.get(ids[1], ids[0]), Some(first));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_disabled_cache_always_computes() {
    let (store, ids, provider) = setup(2);
    let mut cache = cache(false, 256);

    let first = cache.get_or_compute(&store, &provider, ids[0], ids[1]).unwrap();
    let second = cache.get_or_compute(&store, &provider, ids[0], ids[1]).unwrap();
    assert_eq!(first, second);
    assert_eq!(cache.stats().evaluations, 2);
    assert_eq!(cache.stats().hits, 0);
    assert!(cache.is_empty());
}

#[test]
fn test_invalidate_removes_every_mention() {
    let (store, ids, provider) = setup(4);
    let mut cache = cache(true, 256);
    for i in 0..4 {
        for j in (i + 1)..4 {
            cache.get_or_compute(&store, &provider, ids[i], ids[j]).unwrap();
        }
    }
    assert_eq!(cache.len(), 6);

    assert_eq!(cache.invalidate(ids[1]), 3);
    assert!(!cache.mentions(ids[1]));
    assert_eq!(cache.get(ids[0], ids[1]), None);
    assert!(cache.get(ids[0], ids[2]).is_some());
    assert_eq!(cache.len(), 3);

    assert_eq!(cache.invalidate(ids[1]), 0);
    assert_eq!(cache.invalidate(ids[0]), 2);
    assert_eq!(cache.stats().invalidated, 5);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_retired_region_is_rejected() {
    let (mut store, ids, provider) = setup(3);
    let mut cache = cache(true, 256);
    cache.get_or_compute(&store, &provider, ids[0], ids[1]).unwrap();
    store.create_composite(ids[0], ids[1]).unwrap();

    // Still cached, but the endpoint retired.
    let err = cache.get_or_compute(&store, &provider, ids[0], ids[2]).unwrap_err();
    assert!(matches!(err, ClusterError::InvariantViolation { last_sequence: 1, .. }));
    assert!(cache.get_or_compute(&store, &provider, ids[2], ids[2]).is_err());
}

#[test]
fn test_insert_sweep() {
    let (store, ids, _) = setup(3);
    let mut cache = cache(true, 256);
    cache.insert_sweep(ids[2], &[(ids[0], 0.25), (ids[1], 1.0)]);

    assert_eq!(cache.get(ids[0], ids[2]), Some(0.25));
    assert_eq!(cache.get(ids[2], ids[1]), Some(1.0));
    assert_eq!(cache.stats().evaluations, 2);
    assert!(cache.mentions(ids[2]));
    assert_eq!(store.live_count(), 3);
}

#[test]
fn test_eviction_respects_threshold() {
    let (mut store, ids, _) = setup(4);
    let mut cache = cache(true, 2);

    let pair = store.create_composite(ids[0], ids[1]).unwrap();
    assert!(!cache.note_eviction_eligible(pair, &mut store));
    assert!(store.has_member_detail(pair));

    let triple = store.create_composite(pair, ids[2]).unwrap();
    assert!(cache.note_eviction_eligible(triple, &mut store));
    assert!(!store.has_member_detail(triple));
    assert!(!cache.note_eviction_eligible(triple, &mut store));
    assert_eq!(cache.stats().evictions, 1);

    // Core record unaffected.
    assert_eq!(store.weight(triple), Some(3.0));
    assert_eq!(store.collect_leaves(triple), vec![ids[0], ids[1], ids[2]]);
}
