//! Positions and weighted input leaves.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{ClusterError, Result};

/// A position given as longitude/latitude degrees.
///
/// Planar metrics read `lon` as x and `lat` as y.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position {
    pub lon: f64,
    pub lat: f64,
}

impl Position {
    #[inline]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Returns true if both coordinates are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }

    /// Weight-averaged position of two weighted positions.
    ///
    /// Returns `None` when the combined weight is not strictly positive,
    /// since the centroid is then undefined.
    pub fn weighted_mean(a: Position, weight_a: f64, b: Position, weight_b: f64) -> Option<Self> {
        let total = weight_a + weight_b;
        if !(total > 0.0) {
            return None;
        }
        Some(Self {
            lon: (weight_a * a.lon + weight_b * b.lon) / total,
            lat: (weight_a * a.lat + weight_b * b.lat) / total,
        })
    }
}

/// One already-loaded input record: a weighted point.
///
/// # Example
///
/// ```
/// use gravclust_core::LeafPoint;
///
/// let p = LeafPoint::new(-122.42, 37.77, 8_000.0);
/// assert!(p.validate(0).is_ok());
/// assert!(LeafPoint::new(0.0, 0.0, -1.0).validate(1).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LeafPoint {
    pub lon: f64,
    pub lat: f64,
    pub weight: f64,
}

impl LeafPoint {
    pub const fn new(lon: f64, lat: f64, weight: f64) -> Self {
        Self { lon, lat, weight }
    }

    #[inline]
    pub fn position(&self) -> Position {
        Position::new(self.lon, self.lat)
    }

    /// Checks that this record can seed a leaf region.
    ///
    /// Weights must be finite and strictly positive: a zero-weight leaf has
    /// no defined centroid contribution.
    pub fn validate(&self, index: usize) -> Result<()> {
        if !self.position().is_finite() {
            return Err(ClusterError::InvalidInput {
                index,
                reason: format!("non-finite coordinates ({}, {})", self.lon, self.lat),
            });
        }
        if !self.weight.is_finite() || self.weight <= 0.0 {
            return Err(ClusterError::InvalidInput {
                index,
                reason: format!("weight must be finite and positive, got {}", self.weight),
            });
        }
        Ok(())
    }
}
