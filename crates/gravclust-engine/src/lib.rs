//! gravclust merge engine
//!
//! Incremental greedy clustering of weighted points:
//! - RegionStore: arena of leaves and composites with atomic merges
//! - PairValueProvider: inverse-power attraction between two regions
//! - PotentialCache: memoized pair values, invalidated on retirement
//! - MaxPairIndex: best live pair across merges (best-neighbor or full scan)
//! - MergeEngine: the merge loop, its records and streaming
//! - Merge table encodings and the continuous potential surface

pub mod cache;
pub mod encode;
pub mod engine;
pub mod index;
pub mod pair;
pub mod potential;
pub mod region;
pub mod stats;

pub use cache::{CacheStats, PotentialCache};
pub use encode::EncodeError;
pub use engine::{
    metric_for, EngineState, MergeEngine, MergeLog, MergeRecord, RegionSnapshot, RunOutcome,
};
pub use index::{
    MaxPairIndex, NeighborMaxPairIndex, PairIndex, ScanMaxPairIndex, SweepContext, Sweeper,
};
pub use pair::{Attraction, PairValueProvider, ScoredPair};
pub use potential::PotentialSurface;
pub use region::{Region, RegionStore, MAX_LEAVES};
pub use stats::EngineStats;
