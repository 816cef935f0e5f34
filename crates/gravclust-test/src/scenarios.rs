//! Hand-built inputs with known merge order.
//!
//! All scenarios use raw planar coordinates and are meant to be run with
//! Euclidean distance.

use gravclust_core::LeafPoint;

/// Points at 0, 1 and 3 on a line with weight 1.
///
/// With exponent 4 and no clamp the pair values are 1, 1/16 and 1/81, so
/// leaves 0 and 1 merge first into a composite of weight 2 at 0.5.
pub fn collinear_triple() -> Vec<LeafPoint> {
    vec![
        LeafPoint::new(0.0, 0.0, 1.0),
        LeafPoint::new(1.0, 0.0, 1.0),
        LeafPoint::new(3.0, 0.0, 1.0),
    ]
}

/// Two tight pairs far apart: {0, 0.1} and {100, 100.1}, weight 1 each.
pub fn two_close_pairs() -> Vec<LeafPoint> {
    vec![
        LeafPoint::new(0.0, 0.0, 1.0),
        LeafPoint::new(0.1, 0.0, 1.0),
        LeafPoint::new(100.0, 0.0, 1.0),
        LeafPoint::new(100.1, 0.0, 1.0),
    ]
}

pub fn single_point() -> Vec<LeafPoint> {
    vec![LeafPoint::new(-87.63, 41.88, 2_700_000.0)]
}

/// Four points at the corners of a unit square, all weight 1.
///
/// Every side has the same value, so the order is decided by ids alone.
pub fn unit_square() -> Vec<LeafPoint> {
    vec![
        LeafPoint::new(0.0, 0.0, 1.0),
        LeafPoint::new(1.0, 0.0, 1.0),
        LeafPoint::new(1.0, 1.0, 1.0),
        LeafPoint::new(0.0, 1.0, 1.0),
    ]
}

/// Two leaves at the same position.
pub fn coincident_pair() -> Vec<LeafPoint> {
    vec![LeafPoint::new(5.0, 5.0, 1.0), LeafPoint::new(5.0, 5.0, 3.0)]
}
