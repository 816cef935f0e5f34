//! Shared test fixtures for gravclust crates.
//!
//! This crate provides point sets for testing. It does NOT depend on
//! `gravclust-engine` so the engine can use it as a dev-dependency.
//!
//! - [`scenarios`] - small hand-built inputs with known merge order
//! - [`random`] - seeded, reproducible point clouds
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! gravclust-test = { workspace = true }
//! ```
//!
//! ```
//! use gravclust_test::scenarios::collinear_triple;
//! use gravclust_test::total_weight;
//!
//! assert_eq!(total_weight(&collinear_triple()), 3.0);
//! ```

pub mod random;
pub mod scenarios;

use gravclust_core::LeafPoint;

pub use random::{clustered_points, uniform_points};
pub use scenarios::{collinear_triple, single_point, two_close_pairs};

/// Sum of input weights, accumulated in input order.
pub fn total_weight(points: &[LeafPoint]) -> f64 {
    points.iter().map(|p| p.weight).sum()
}
