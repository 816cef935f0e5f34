//! Tests for domain types.

use super::*;

#[test]
fn test_region_id_ordering() {
    let a = RegionId::new(7);
    let b = RegionId::new(3);
    assert_eq!(RegionId::ordered(a, b), (b, a));
    assert_eq!(RegionId::ordered(b, a), (b, a));
    assert_eq!(RegionId::from_index(12).index(), 12);
    assert_eq!(format!("{}", RegionId::new(42)), "42");
}

#[test]
fn test_weighted_mean() {
    let c = Position::weighted_mean(Position::new(0.0, 0.0), 1.0, Position::new(1.0, 2.0), 1.0)
        .unwrap();
    assert_eq!(c, Position::new(0.5, 1.0));

    let c = Position::weighted_mean(Position::new(0.0, 0.0), 3.0, Position::new(4.0, 0.0), 1.0)
        .unwrap();
    assert_eq!(c.lon, 1.0);
}

#[test]
fn test_weighted_mean_zero_weight() {
    let p = Position::new(1.0, 1.0);
    assert!(Position::weighted_mean(p, 0.0, p, 0.0).is_none());
}

#[test]
fn test_leaf_validation() {
    assert!(LeafPoint::new(10.0, 20.0, 1.0).validate(0).is_ok());
    assert!(LeafPoint::new(f64::NAN, 20.0, 1.0).validate(0).is_err());
    assert!(LeafPoint::new(10.0, f64::INFINITY, 1.0).validate(0).is_err());
    assert!(LeafPoint::new(10.0, 20.0, 0.0).validate(0).is_err());

    match LeafPoint::new(10.0, 20.0, -2.0).validate(5) {
        Err(crate::ClusterError::InvalidInput { index, .. }) => assert_eq!(index, 5),
        other => panic!("unexpected result: {other:?}"),
    }
}
