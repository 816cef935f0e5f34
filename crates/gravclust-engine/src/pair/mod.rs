//! Pair attraction values.
//!
//! The attraction between two live regions is
//! `w_a * w_b / distance(a, b)^exponent`, evaluated on the regions' fixed
//! centroids and weights. [`PairValueProvider`] holds no memory of past
//! calls; memoization is [`PotentialCache`](crate::PotentialCache)'s job.

use std::cmp::Ordering;

use gravclust_config::ForceLawConfig;
use gravclust_core::{ClusterError, DistanceMetric, Position, RegionId, Result};

use crate::region::RegionStore;

/// Computes attraction values under a fixed force law and distance metric.
///
/// # Example
///
/// ```
/// use gravclust_config::ForceLawConfig;
/// use gravclust_core::{EuclideanDistance, Position, RegionId};
/// use gravclust_engine::{PairValueProvider, RegionStore};
///
/// let force = ForceLawConfig { exponent: 4.0, min_distance: 0.0, max_distance: None };
/// let provider = PairValueProvider::new(EuclideanDistance, &force);
///
/// let mut store = RegionStore::new();
/// let a = store.create_leaf(Position::new(0.0, 0.0), 2.0).unwrap();
/// let b = store.create_leaf(Position::new(2.0, 0.0), 4.0).unwrap();
///
/// // 2 * 4 / 2^4
/// assert_eq!(provider.value(&store, a, b).unwrap(), 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct PairValueProvider<M> {
    metric: M,
    exponent: f64,
    // Set when the exponent is a small integer so `powi` can be used.
    integer_exponent: Option<i32>,
    min_distance: f64,
    max_distance: Option<f64>,
}

impl<M: DistanceMetric> PairValueProvider<M> {
    pub fn new(metric: M, force: &ForceLawConfig) -> Self {
        let exponent = force.exponent;
        let integer_exponent = (exponent.fract() == 0.0 && exponent.abs() <= i32::MAX as f64)
            .then_some(exponent as i32);
        Self {
            metric,
            exponent,
            integer_exponent,
            min_distance: force.min_distance,
            max_distance: force.max_distance,
        }
    }

    pub fn metric(&self) -> &M {
        &self.metric
    }

    pub fn exponent(&self) -> f64 {
        self.exponent
    }

    /// Attraction between two regions of `store`.
    ///
    /// The arguments may be given in either order; the value is computed on
    /// the canonical `(low, high)` order so it is bit-for-bit symmetric.
    ///
    /// # Errors
    ///
    /// - [`ClusterError::DegenerateDistance`] if the minimum-distance clamp
    ///   is disabled and both centroids coincide
    /// - [`ClusterError::InvariantViolation`] if either region does not
    ///   exist or the value is negative, NaN or infinite
    pub fn value(&self, store: &RegionStore, a: RegionId, b: RegionId) -> Result<f64> {
        let (low, high) = RegionId::ordered(a, b);
        let (Some(ra), Some(rb)) = (store.region(low), store.region(high)) else {
            return Err(ClusterError::invariant(
                format!("pair value requested for unknown region in ({low}, {high})"),
                store.merge_count(),
            ));
        };

        match self.attraction(ra.centroid(), ra.weight(), rb.centroid(), rb.weight()) {
            Attraction::Value(value) if value.is_finite() && value >= 0.0 => Ok(value),
            Attraction::Value(value) => Err(ClusterError::invariant(
                format!("pair ({low}, {high}) has invalid value {value}"),
                store.merge_count(),
            )),
            Attraction::Coincident => Err(ClusterError::degenerate(low, high)),
        }
    }

    /// Raw attraction between two weighted positions.
    pub fn attraction(&self, a: Position, weight_a: f64, b: Position, weight_b: f64) -> Attraction {
        let raw = self.metric.distance(a, b);
        if raw.is_nan() {
            return Attraction::Value(f64::NAN);
        }
        if self.max_distance.is_some_and(|max| raw > max) {
            return Attraction::Value(0.0);
        }

        let distance = if self.min_distance > 0.0 {
            raw.max(self.min_distance)
        } else {
            raw
        };
        if distance == 0.0 {
            return Attraction::Coincident;
        }

        let denominator = match self.integer_exponent {
            Some(n) => distance.powi(n),
            None => distance.powf(self.exponent),
        };
        Attraction::Value(weight_a * weight_b / denominator)
    }
}

/// Outcome of a raw attraction evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Attraction {
    Value(f64),
    /// Centroids coincide and no clamp is configured.
    Coincident,
}

/// A live pair and its attraction value, stored in canonical order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredPair {
    pub low: RegionId,
    pub high: RegionId,
    pub value: f64,
}

impl ScoredPair {
    pub fn new(a: RegionId, b: RegionId, value: f64) -> Self {
        let (low, high) = RegionId::ordered(a, b);
        Self { low, high, value }
    }

    /// Selection order: higher value first, then the lexicographically
    /// smallest `(low, high)`.
    ///
    /// ```
    /// use gravclust_core::RegionId;
    /// use gravclust_engine::ScoredPair;
    ///
    /// let r = RegionId::new;
    /// let a = ScoredPair::new(r(3), r(1), 1.0);
    /// let b = ScoredPair::new(r(0), r(4), 1.0);
    /// let c = ScoredPair::new(r(5), r(6), 2.0);
    ///
    /// assert!(b.beats(&a));
    /// assert!(c.beats(&b));
    /// assert!(!a.beats(&a));
    /// ```
    pub fn beats(&self, other: &ScoredPair) -> bool {
        self.selection_cmp(other) == Ordering::Less
    }

    /// Total order where the pair selected first sorts first.
    pub fn selection_cmp(&self, other: &ScoredPair) -> Ordering {
        other
            .value
            .total_cmp(&self.value)
            .then_with(|| (self.low, self.high).cmp(&(other.low, other.high)))
    }

    pub fn involves(&self, id: RegionId) -> bool {
        self.low == id || self.high == id
    }

    /// The other endpoint, if `id` is one of the two.
    pub fn partner_of(&self, id: RegionId) -> Option<RegionId> {
        if self.low == id {
            Some(self.high)
        } else if self.high == id {
            Some(self.low)
        } else {
            None
        }
    }

    /// Keeps whichever of `current` and `candidate` is selected first.
    #[inline]
    pub fn pick(current: Option<ScoredPair>, candidate: ScoredPair) -> ScoredPair {
        match current {
            Some(best) if !candidate.beats(&best) => best,
            _ => candidate,
        }
    }
}

#[cfg(test)]
mod tests;
