//! Tests for pair values and selection order.

use gravclust_config::ForceLawConfig;
use gravclust_core::{
    ClusterError, EuclideanDistance, HaversineDistance, PlanarDistance, Position, RegionId,
};

use super::{Attraction, PairValueProvider, ScoredPair};
use crate::region::RegionStore;

fn force(exponent: f64, min_distance: f64, max_distance: Option<f64>) -> ForceLawConfig {
    ForceLawConfig {
        exponent,
        min_distance,
        max_distance,
    }
}

fn line(points: &[(f64, f64)]) -> (RegionStore, Vec<RegionId>) {
    let mut store = RegionStore::new();
    let ids = points
        .iter()
        .map(|&(x, w)| store.create_leaf(Position::new(x, 0.0), w).unwrap())
        .collect();
    (store, ids)
}

#[test]
fn test_inverse_fourth_power() {
    let provider = PairValueProvider::new(EuclideanDistance, &force(4.0, 0.0, None));
    let (store, ids) = line(&[(0.0, 1.0), (1.0, 1.0), (3.0, 1.0)]);

    assert_eq!(provider.value(&store, ids[0], ids[1]).unwrap(), 1.0);
    assert_eq!(provider.value(&store, ids[1], ids[2]).unwrap(), 1.0 / 16.0);
    assert_eq!(provider.value(&store, ids[0], ids[2]).unwrap(), 1.0 / 81.0);
}

#[test]
fn test_fractional_exponent() {
    let provider = PairValueProvider::new(EuclideanDistance, &force(2.5, 0.0, None));
    let (store, ids) = line(&[(0.0, 1.0), (4.0, 1.0)]);
    let value = provider.value(&store, ids[0], ids[1]).unwrap();
    assert!((value - 1.0 / 32.0).abs() < 1e-15);
}

#[test]
fn test_value_is_symmetric() {
    let provider = PairValueProvider::new(PlanarDistance::new(40.0), &force(4.0, 0.5, None));
    let mut store = RegionStore::new();
    let a = store.create_leaf(Position::new(-87.6, 41.8), 2.7e6).unwrap();
    let b = store.create_leaf(Position::new(-88.0, 42.0), 1.3e5).unwrap();

    let ab = provider.value(&store, a, b).unwrap();
    let ba = provider.value(&store, b, a).unwrap();
    assert_eq!(ab.to_bits(), ba.to_bits());
}

#[test]
fn test_min_distance_clamp() {
    let provider = PairValueProvider::new(EuclideanDistance, &force(4.0, 0.5, None));
    let (store, ids) = line(&[(0.0, 1.0), (0.0, 1.0), (0.1, 1.0)]);

    // Coincident and very close pairs both clamp to 0.5.
    assert_eq!(provider.value(&store, ids[0], ids[1]).unwrap(), 16.0);
    assert_eq!(provider.value(&store, ids[0], ids[2]).unwrap(), 16.0);
}

#[test]
fn test_max_distance_truncates() {
    let provider = PairValueProvider::new(EuclideanDistance, &force(4.0, 0.0, Some(2.0)));
    let (store, ids) = line(&[(0.0, 1.0), (2.0, 1.0), (5.0, 1.0)]);

    assert_eq!(provider.value(&store, ids[0], ids[1]).unwrap(), 1.0 / 16.0);
    assert_eq!(provider.value(&store, ids[0], ids[2]).unwrap(), 0.0);
}

#[test]
fn test_coincident_without_clamp_is_degenerate() {
    let provider = PairValueProvider::new(EuclideanDistance, &force(4.0, 0.0, None));
    let (store, ids) = line(&[(1.0, 1.0), (1.0, 2.0)]);

    assert_eq!(
        provider.value(&store, ids[1], ids[0]),
        Err(ClusterError::degenerate(ids[0], ids[1]))
    );
}

#[test]
fn test_overflow_is_invariant_violation() {
    let provider = PairValueProvider::new(EuclideanDistance, &force(4.0, 0.0, None));
    let (store, ids) = line(&[(0.0, 1e300), (1e-100, 1e300)]);

    assert!(matches!(
        provider.value(&store, ids[0], ids[1]),
        Err(ClusterError::InvariantViolation { last_sequence: 0, .. })
    ));
}

#[test]
fn test_haversine_provider() {
    let provider = PairValueProvider::new(HaversineDistance, &force(2.0, 0.0, None));
    let attraction = provider.attraction(Position::new(0.0, 0.0), 1.0, Position::new(1.0, 0.0), 1.0);
    let Attraction::Value(value) = attraction else {
        panic!("expected a value, got {attraction:?}");
    };
    let miles = std::f64::consts::PI * 3959.0 / 180.0;
    assert!((value - 1.0 / (miles * miles)).abs() < 1e-12);
}

#[test]
fn test_selection_order() {
    let r = RegionId::new;
    let mut pairs = vec![
        ScoredPair::new(r(4), r(2), 1.0),
        ScoredPair::new(r(0), r(9), 0.5),
        ScoredPair::new(r(1), r(3), 1.0),
        ScoredPair::new(r(1), r(2), 1.0),
        ScoredPair::new(r(7), r(8), 3.0),
    ];
    pairs.sort_by(ScoredPair::selection_cmp);

    let order: Vec<_> = pairs.iter().map(|p| (p.low.get(), p.high.get())).collect();
    assert_eq!(order, vec![(7, 8), (1, 2), (1, 3), (2, 4), (0, 9)]);
}

#[test]
fn test_partner_and_pick() {
    let r = RegionId::new;
    let pair = ScoredPair::new(r(5), r(2), 0.25);
    assert_eq!((pair.low, pair.high), (r(2), r(5)));
    assert_eq!(pair.partner_of(r(2)), Some(r(5)));
    assert_eq!(pair.partner_of(r(5)), Some(r(2)));
    assert_eq!(pair.partner_of(r(3)), None);
    assert!(pair.involves(r(5)));

    let better = ScoredPair::new(r(0), r(1), 0.25);
    assert_eq!(ScoredPair::pick(None, pair), pair);
    assert_eq!(ScoredPair::pick(Some(pair), better), better);
    assert_eq!(ScoredPair::pick(Some(better), pair), better);
}
