//! Domain types: region identities, positions and input leaves.

mod point;
mod region_id;

#[cfg(test)]
mod tests;

pub use point::{LeafPoint, Position};
pub use region_id::RegionId;
