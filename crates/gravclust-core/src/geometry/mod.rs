//! Distance metrics between positions.
//!
//! The engine only sees the [`DistanceMetric`] trait. Which approximation is
//! in use is a configuration decision:
//!
//! - [`PlanarDistance`]: cosine-corrected equirectangular approximation in
//!   miles, fast and accurate at regional scale
//! - [`HaversineDistance`]: exact great-circle distance in miles
//! - [`EuclideanDistance`]: raw planar distance in input units

mod metric;


pub use metric::{
    DistanceMetric, EuclideanDistance, HaversineDistance, Metric, PlanarDistance,
    EARTH_RADIUS_MILES, MILES_PER_DEGREE,
};
