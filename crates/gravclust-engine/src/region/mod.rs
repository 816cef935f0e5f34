//! Region arena.
//!
//! Regions live in an append-only arena addressed by [`RegionId`]. The core
//! record of a region (centroid, weight, member count, parents) is written
//! once and never changes. Two things do change:
//!
//! - liveness: a region retires the instant a merge consumes it
//! - member detail: the optional leaf list of a composite, kept only while
//!   it is small enough to be worth holding for verification
//!
//! [`RegionStore::create_composite`] is the only way to retire a region, and
//! it retires both parents in the same call that creates the composite.

mod store;


pub use store::{Region, RegionStore, MAX_LEAVES};
