//! Distance metric implementations.

use std::fmt::Debug;

use crate::domain::Position;

/// Miles per degree of latitude used by the planar approximation.
pub const MILES_PER_DEGREE: f64 = 69.0;

/// Mean Earth radius in miles.
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Measures the distance between two positions.
///
/// Implementations must be stateless after construction and symmetric:
/// `distance(a, b) == distance(b, a)` bit for bit. Pair values inherit
/// their symmetry from this.
///
/// # Example
///
/// ```
/// use gravclust_core::{DistanceMetric, Position};
///
/// #[derive(Debug)]
/// struct Manhattan;
///
/// impl DistanceMetric for Manhattan {
///     fn distance(&self, a: Position, b: Position) -> f64 {
///         (a.lon - b.lon).abs() + (a.lat - b.lat).abs()
///     }
/// }
///
/// let d = Manhattan.distance(Position::new(0.0, 0.0), Position::new(1.0, 2.0));
/// assert_eq!(d, 3.0);
/// ```
pub trait DistanceMetric: Send + Sync + Debug {
    /// Returns a non-negative distance.
    fn distance(&self, a: Position, b: Position) -> f64;
}

/// Cosine-corrected Euclidean distance in miles.
///
/// Longitude differences are scaled by the cosine of a fixed reference
/// latitude, then the degree distance is converted at 69 miles per degree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanarDistance {
    cos_reference: f64,
}

impl PlanarDistance {
    /// Creates a planar metric corrected at `reference_latitude` degrees.
    pub fn new(reference_latitude: f64) -> Self {
        Self {
            cos_reference: reference_latitude.to_radians().cos(),
        }
    }

    /// Creates a planar metric corrected at the mean latitude of `positions`.
    ///
    /// Falls back to the equator for an empty slice.
    pub fn centered_on<'a>(positions: impl IntoIterator<Item = &'a Position>) -> Self {
        let (sum, count) = positions
            .into_iter()
            .fold((0.0, 0usize), |(sum, count), p| (sum + p.lat, count + 1));
        if count == 0 {
            Self::new(0.0)
        } else {
            Self::new(sum / count as f64)
        }
    }

    /// Cosine of the reference latitude.
    pub fn cos_reference(&self) -> f64 {
        self.cos_reference
    }
}

impl DistanceMetric for PlanarDistance {
    #[inline]
    fn distance(&self, a: Position, b: Position) -> f64 {
        let dlon = (a.lon - b.lon) * self.cos_reference;
        let dlat = a.lat - b.lat;
        (dlon * dlon + dlat * dlat).sqrt() * MILES_PER_DEGREE
    }
}

/// Great-circle (haversine) distance in miles.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HaversineDistance;

impl DistanceMetric for HaversineDistance {
    fn distance(&self, a: Position, b: Position) -> f64 {
        let lat1 = a.lat.to_radians();
        let lat2 = b.lat.to_radians();
        let half_dlat = (lat2 - lat1) / 2.0;
        let half_dlon = (b.lon - a.lon).to_radians() / 2.0;

        let h = half_dlat.sin().powi(2) + lat1.cos() * lat2.cos() * half_dlon.sin().powi(2);
        // Rounding can push h marginally above 1 for antipodal points.
        2.0 * EARTH_RADIUS_MILES * h.clamp(0.0, 1.0).sqrt().asin()
    }
}

/// Plain Euclidean distance in input units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EuclideanDistance;

impl DistanceMetric for EuclideanDistance {
    #[inline]
    fn distance(&self, a: Position, b: Position) -> f64 {
        let dx = a.lon - b.lon;
        let dy = a.lat - b.lat;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Configuration-selected metric.
///
/// A closed enum keeps the engine monomorphic for the built-in metrics;
/// callers with their own metric plug it in through the generic parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    Planar(PlanarDistance),
    Haversine(HaversineDistance),
    Euclidean(EuclideanDistance),
}

impl DistanceMetric for Metric {
    #[inline]
    fn distance(&self, a: Position, b: Position) -> f64 {
        match self {
            Metric::Planar(m) => m.distance(a, b),
            Metric::Haversine(m) => m.distance(a, b),
            Metric::Euclidean(m) => m.distance(a, b),
        }
    }
}
