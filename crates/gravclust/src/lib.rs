//! gravclust - hierarchical gravity clustering of weighted points
//!
//! Repeatedly merges the pair of regions with the strongest attraction
//! `w_a * w_b / d^exponent` until one region remains. The output is the
//! complete merge sequence, from individual points to a single region.
//!
//! # Example
//!
//! ```rust
//! use gravclust::prelude::*;
//!
//! let points = vec![
//!     LeafPoint::new(-87.63, 41.88, 2_700_000.0),
//!     LeafPoint::new(-87.75, 41.85, 65_000.0),
//!     LeafPoint::new(-90.20, 38.63, 300_000.0),
//! ];
//!
//! let log = cluster_with(&points, ClusterConfig::default()).unwrap();
//! assert_eq!(log.len(), 2);
//! assert_eq!(log.total_weight(), Some(3_065_000.0));
//! ```

#[cfg(feature = "console")]
pub mod console;

mod run;

pub use gravclust_config::{
    CacheConfig, ClusterConfig, ConfigError, DistanceConfig, EnvironmentMode, ForceLawConfig,
    IndexStrategy, SweepThreadCount,
};
pub use gravclust_core::{
    ClusterError, DistanceMetric, EuclideanDistance, HaversineDistance, LeafPoint, Metric,
    PlanarDistance, Position, RegionId, Result,
};
pub use gravclust_engine::encode;
pub use gravclust_engine::{
    EngineStats, MergeEngine, MergeLog, MergeRecord, PotentialSurface, RegionSnapshot,
    RunOutcome,
};
pub use run::{cluster, cluster_with, load_config, CONFIG_FILE};

pub mod prelude {
    pub use super::{cluster, cluster_with};
    pub use super::{ClusterConfig, DistanceConfig, ForceLawConfig, IndexStrategy};
    pub use super::{ClusterError, LeafPoint, Position, RegionId};
    pub use super::{MergeEngine, MergeLog, MergeRecord, RunOutcome};
}
