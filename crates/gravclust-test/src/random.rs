//! Seeded point clouds.
//!
//! Coordinates fall inside the continental US bounding box so the planar
//! and great-circle metrics behave as they do on real census data.

use gravclust_core::LeafPoint;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub const MIN_LON: f64 = -124.7;
pub const MAX_LON: f64 = -67.0;
pub const MIN_LAT: f64 = 24.5;
pub const MAX_LAT: f64 = 49.4;

fn weight(rng: &mut ChaCha8Rng) -> f64 {
    // Heavy-tailed, like town populations.
    let exponent: f64 = rng.random_range(2.0..6.0);
    10f64.powf(exponent).round()
}

/// `count` points uniformly spread over the bounding box.
pub fn uniform_points(seed: u64, count: usize) -> Vec<LeafPoint> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let lon = rng.random_range(MIN_LON..MAX_LON);
            let lat = rng.random_range(MIN_LAT..MAX_LAT);
            LeafPoint::new(lon, lat, weight(&mut rng))
        })
        .collect()
}

/// `count` points scattered around `clusters` random centers.
///
/// Points sit within about half a degree of their center.
pub fn clustered_points(seed: u64, count: usize, clusters: usize) -> Vec<LeafPoint> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let centers: Vec<(f64, f64)> = (0..clusters.max(1))
        .map(|_| {
            (
                rng.random_range(MIN_LON + 1.0..MAX_LON - 1.0),
                rng.random_range(MIN_LAT + 1.0..MAX_LAT - 1.0),
            )
        })
        .collect();

    (0..count)
        .map(|i| {
            let (lon, lat) = centers[i % centers.len()];
            let dlon = rng.random_range(-0.5..0.5);
            let dlat = rng.random_range(-0.5..0.5);
            LeafPoint::new(lon + dlon, lat + dlat, weight(&mut rng))
        })
        .collect()
}
