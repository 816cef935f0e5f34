//! Continuous potential surface.
//!
//! Independent of the merge loop: evaluates
//! `Σ weight / distance^(exponent - 1)` at arbitrary sample positions from a
//! fixed set of sources. A source at exactly zero distance from a sample is
//! that sample itself and contributes nothing. Samples are processed in
//! chunks on the rayon pool.

use gravclust_config::ForceLawConfig;
use gravclust_core::{DistanceMetric, LeafPoint, Position};
use rayon::prelude::*;

/// Samples per parallel work item.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Potential field derived from a force law.
///
/// # Example
///
/// ```
/// use gravclust_config::ForceLawConfig;
/// use gravclust_core::{EuclideanDistance, LeafPoint, Position};
/// use gravclust_engine::PotentialSurface;
///
/// let force = ForceLawConfig { exponent: 4.0, min_distance: 0.0, max_distance: None };
/// let surface = PotentialSurface::new(EuclideanDistance, &force);
/// let sources = [LeafPoint::new(0.0, 0.0, 8.0), LeafPoint::new(2.0, 0.0, 1.0)];
///
/// // 8 / 2^3 from the first source; the second is the sample itself.
/// assert_eq!(surface.potential_at(Position::new(2.0, 0.0), &sources), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct PotentialSurface<M> {
    metric: M,
    exponent: f64,
    min_distance: f64,
    max_distance: Option<f64>,
    chunk_size: usize,
}

impl<M: DistanceMetric> PotentialSurface<M> {
    pub fn new(metric: M, force: &ForceLawConfig) -> Self {
        Self {
            metric,
            exponent: force.potential_exponent(),
            min_distance: force.min_distance,
            max_distance: force.max_distance,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Exponent of the potential, one less than the force law's.
    pub fn exponent(&self) -> f64 {
        self.exponent
    }

    /// Potential at a single position.
    pub fn potential_at(&self, sample: Position, sources: &[LeafPoint]) -> f64 {
        sources
            .iter()
            .map(|source| {
                let raw = self.metric.distance(sample, source.position());
                if raw == 0.0 || self.max_distance.is_some_and(|max| raw > max) {
                    return 0.0;
                }
                let distance = if self.min_distance > 0.0 {
                    raw.max(self.min_distance)
                } else {
                    raw
                };
                source.weight / distance.powf(self.exponent)
            })
            .sum()
    }

    /// Potential at every sample, in sample order.
    pub fn evaluate(&self, samples: &[Position], sources: &[LeafPoint]) -> Vec<f64> {
        samples
            .par_chunks(self.chunk_size)
            .flat_map_iter(|chunk| chunk.iter().map(|&sample| self.potential_at(sample, sources)))
            .collect()
    }
}
