//! Region store implementation.

use gravclust_core::{ClusterError, Position, RegionId, Result};

/// Largest leaf count whose leaves and composites all fit in a [`RegionId`].
///
/// `n` leaves produce ids up to `2n - 2`.
pub const MAX_LEAVES: usize = 1 << 31;

/// Sentinel slot in `live_slot` for regions that are not live.
const NOT_LIVE: usize = usize::MAX;

/// Immutable core record of a region.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    id: RegionId,
    centroid: Position,
    weight: f64,
    member_count: usize,
    parents: Option<(RegionId, RegionId)>,
    created_at: u64,
}

impl Region {
    pub fn id(&self) -> RegionId {
        self.id
    }

    /// Population-weighted centroid.
    pub fn centroid(&self) -> Position {
        self.centroid
    }

    /// Total weight of all member leaves.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Number of leaves under this region.
    pub fn member_count(&self) -> usize {
        self.member_count
    }

    /// The two regions merged into this one, smallest id first.
    pub fn parents(&self) -> Option<(RegionId, RegionId)> {
        self.parents
    }

    pub fn is_leaf(&self) -> bool {
        self.parents.is_none()
    }

    /// Merge sequence number that created this region (0 for leaves).
    pub fn created_at(&self) -> u64 {
        self.created_at
    }
}

/// Owner of every region created during a run.
///
/// # Example
///
/// ```
/// use gravclust_core::Position;
/// use gravclust_engine::RegionStore;
///
/// let mut store = RegionStore::new();
/// let a = store.create_leaf(Position::new(0.0, 0.0), 1.0).unwrap();
/// let b = store.create_leaf(Position::new(2.0, 0.0), 3.0).unwrap();
///
/// let c = store.create_composite(a, b).unwrap();
/// assert_eq!(store.weight(c), Some(4.0));
/// assert_eq!(store.centroid(c), Some(Position::new(1.5, 0.0)));
/// assert!(!store.is_live(a) && !store.is_live(b));
/// assert!(store.is_live(c));
/// ```
#[derive(Debug, Default)]
pub struct RegionStore {
    regions: Vec<Region>,
    /// Merge sequence that retired each region, by arena slot.
    retired_at: Vec<Option<u64>>,
    /// Leaf members of composites while retained, by arena slot.
    detail: Vec<Option<Vec<RegionId>>>,
    /// Dense list of live regions.
    live: Vec<RegionId>,
    /// Position of each region in `live`, or `NOT_LIVE`.
    live_slot: Vec<usize>,
    leaf_count: usize,
    merge_count: u64,
}

impl RegionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with room for `leaves` leaves and all their merges.
    pub fn with_leaf_capacity(leaves: usize) -> Self {
        let slots = (2 * leaves).saturating_sub(1);
        Self {
            regions: Vec::with_capacity(slots),
            retired_at: Vec::with_capacity(slots),
            detail: Vec::with_capacity(slots),
            live: Vec::with_capacity(leaves),
            live_slot: Vec::with_capacity(slots),
            leaf_count: 0,
            merge_count: 0,
        }
    }

    /// Rejects leaf counts whose region ids would overflow a [`RegionId`].
    pub fn check_leaf_count(leaves: usize) -> Result<()> {
        if leaves > MAX_LEAVES {
            return Err(ClusterError::InvalidInput {
                index: MAX_LEAVES,
                reason: format!("at most {MAX_LEAVES} points are supported, got {leaves}"),
            });
        }
        Ok(())
    }

    /// Creates a live leaf region.
    ///
    /// Leaves must all be created before the first merge, so leaf ids stay
    /// `0..n` and composite ids follow them.
    ///
    /// # Errors
    ///
    /// Fails if a merge has already happened, if the leaf would not fit in
    /// a [`RegionId`], if the position is not finite, or if the weight is
    /// not strictly positive.
    pub fn create_leaf(&mut self, position: Position, weight: f64) -> Result<RegionId> {
        let index = self.regions.len();
        if self.merge_count > 0 {
            return Err(ClusterError::InvalidInput {
                index,
                reason: "leaves cannot be added after the first merge".to_string(),
            });
        }
        Self::check_leaf_count(index + 1)?;
        if !position.is_finite() {
            return Err(ClusterError::InvalidInput {
                index,
                reason: format!("non-finite coordinates ({}, {})", position.lon, position.lat),
            });
        }
        if !weight.is_finite() || weight <= 0.0 {
            return Err(ClusterError::InvalidInput {
                index,
                reason: format!("weight must be finite and positive, got {weight}"),
            });
        }

        let id = RegionId::from_index(index);
        self.push(Region {
            id,
            centroid: position,
            weight,
            member_count: 1,
            parents: None,
            created_at: 0,
        });
        self.detail.push(None);
        self.leaf_count += 1;
        Ok(id)
    }

    /// Merges two live regions into a new composite and retires both.
    ///
    /// All checks run before any state changes, so a failed call leaves the
    /// store untouched. On success no observer can see one parent retired
    /// while the other is still live.
    ///
    /// # Errors
    ///
    /// - [`ClusterError::InvalidMerge`] if either id is not live, or both
    ///   ids are the same region
    /// - [`ClusterError::InvariantViolation`] if the combined weight is not
    ///   positive
    pub fn create_composite(&mut self, a: RegionId, b: RegionId) -> Result<RegionId> {
        if !self.is_live(a) {
            return Err(ClusterError::invalid_merge(a));
        }
        if !self.is_live(b) || a == b {
            return Err(ClusterError::invalid_merge(b));
        }

        let (low, high) = RegionId::ordered(a, b);
        let (ra, rb) = (&self.regions[low.index()], &self.regions[high.index()]);
        let weight = ra.weight + rb.weight;
        let centroid = Position::weighted_mean(ra.centroid, ra.weight, rb.centroid, rb.weight)
            .ok_or_else(|| {
                ClusterError::invariant(
                    format!("centroid of {low} + {high} has non-positive total weight {weight}"),
                    self.merge_count,
                )
            })?;
        let member_count = ra.member_count + rb.member_count;

        let sequence = self.merge_count + 1;
        let members = match (self.take_members(low), self.take_members(high)) {
            (Some(mut left), Some(right)) => {
                left.extend(right);
                Some(left)
            }
            _ => None,
        };

        self.retire(low, sequence);
        self.retire(high, sequence);
        self.merge_count = sequence;

        let id = RegionId::from_index(self.regions.len());
        self.push(Region {
            id,
            centroid,
            weight,
            member_count,
            parents: Some((low, high)),
            created_at: sequence,
        });
        self.detail.push(members);
        Ok(id)
    }

    fn push(&mut self, region: Region) {
        self.live_slot.push(self.live.len());
        self.live.push(region.id);
        self.retired_at.push(None);
        self.regions.push(region);
    }

    /// Removes a region from the live set. Returns false if it was not live.
    fn retire(&mut self, id: RegionId, sequence: u64) -> bool {
        let Some(&slot) = self.live_slot.get(id.index()) else {
            return false;
        };
        if slot == NOT_LIVE {
            return false;
        }

        self.live.swap_remove(slot);
        if let Some(&moved) = self.live.get(slot) {
            self.live_slot[moved.index()] = slot;
        }
        self.live_slot[id.index()] = NOT_LIVE;
        self.retired_at[id.index()] = Some(sequence);
        true
    }

    /// Moves the leaf member list of `id` out of the store.
    fn take_members(&mut self, id: RegionId) -> Option<Vec<RegionId>> {
        if self.regions.get(id.index())?.is_leaf() {
            Some(vec![id])
        } else {
            self.detail.get_mut(id.index())?.take()
        }
    }

    // === Queries ===

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id.index())
    }

    pub fn centroid(&self, id: RegionId) -> Option<Position> {
        self.region(id).map(Region::centroid)
    }

    pub fn weight(&self, id: RegionId) -> Option<f64> {
        self.region(id).map(Region::weight)
    }

    pub fn member_count(&self, id: RegionId) -> Option<usize> {
        self.region(id).map(Region::member_count)
    }

    pub fn parents(&self, id: RegionId) -> Option<(RegionId, RegionId)> {
        self.region(id).and_then(Region::parents)
    }

    pub fn is_live(&self, id: RegionId) -> bool {
        self.live_slot
            .get(id.index())
            .is_some_and(|&slot| slot != NOT_LIVE)
    }

    /// Merge sequence number that retired `id`, if it has retired.
    pub fn retired_at(&self, id: RegionId) -> Option<u64> {
        self.retired_at.get(id.index()).copied().flatten()
    }

    /// Live regions, in no particular order.
    pub fn live_ids(&self) -> &[RegionId] {
        &self.live
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Total number of regions ever created.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Number of composites created so far.
    pub fn merge_count(&self) -> u64 {
        self.merge_count
    }

    /// Leaf members of `id` from retained detail.
    ///
    /// Returns `None` once the detail has been released, or for retired
    /// composites whose list moved into their child.
    pub fn members(&self, id: RegionId) -> Option<Vec<RegionId>> {
        let region = self.region(id)?;
        if region.is_leaf() {
            Some(vec![id])
        } else {
            self.detail.get(id.index())?.clone()
        }
    }

    /// Returns true if member detail is held for the composite `id`.
    pub fn has_member_detail(&self, id: RegionId) -> bool {
        self.detail
            .get(id.index())
            .is_some_and(|detail| detail.is_some())
    }

    /// Drops the member detail of `id`. Returns true if anything was released.
    pub fn release_members(&mut self, id: RegionId) -> bool {
        self.detail
            .get_mut(id.index())
            .is_some_and(|detail| detail.take().is_some())
    }

    /// Collects the leaves under `id` by walking the parent links.
    ///
    /// Works regardless of eviction since core records are never dropped.
    /// Leaves are returned in ascending id order.
    pub fn collect_leaves(&self, id: RegionId) -> Vec<RegionId> {
        let mut leaves = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            match self.parents(next) {
                Some((a, b)) => {
                    stack.push(a);
                    stack.push(b);
                }
                None if self.region(next).is_some() => leaves.push(next),
                None => {}
            }
        }
        leaves.sort_unstable();
        leaves
    }
}
