//! gravclust Core - shared types for gravity clustering
//!
//! This crate provides the fundamental abstractions used by the engine:
//! - Region identities, positions and leaf input records
//! - Distance metrics (planar approximation, great circle, raw Euclidean)
//! - The error taxonomy shared across crates

pub mod domain;
pub mod error;
pub mod geometry;

pub use domain::{LeafPoint, Position, RegionId};
pub use error::{ClusterError, Result};
pub use geometry::{
    DistanceMetric, EuclideanDistance, HaversineDistance, Metric, PlanarDistance,
    EARTH_RADIUS_MILES, MILES_PER_DEGREE,
};
