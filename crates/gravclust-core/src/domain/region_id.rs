//! Stable region identities.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stable, immutable identity of a region.
///
/// Leaves take their input index (`0..n`). Composites are numbered after the
/// leaves in merge order, so merge `k` (1-based) creates `RegionId(n + k - 1)`.
/// Identifiers are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct RegionId(u32);

impl RegionId {
    /// Creates an identifier from its raw value.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Creates an identifier from an arena index.
    ///
    /// The region store rejects leaf counts whose arena would not fit in
    /// `u32` before any region is created.
    #[inline]
    pub fn from_index(index: usize) -> Self {
        debug_assert!(index <= u32::MAX as usize);
        Self(index as u32)
    }

    /// Returns the raw value.
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Returns the arena slot of this region.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Orders two identifiers smallest-first.
    ///
    /// This canonical form keys cached pair values and drives the merge
    /// tie-break rule.
    #[inline]
    pub fn ordered(a: RegionId, b: RegionId) -> (RegionId, RegionId) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for RegionId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}
