//! Merge records and the collected merge log.

use std::collections::HashSet;

use gravclust_core::{ClusterError, LeafPoint, Position, RegionId, Result};
use serde::{Deserialize, Serialize};

use crate::region::Region;
use crate::stats::EngineStats;

/// A region as it was when a merge consumed or created it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionSnapshot {
    pub id: RegionId,
    pub position: Position,
    pub weight: f64,
    pub member_count: usize,
}

impl RegionSnapshot {
    pub fn is_leaf(&self) -> bool {
        self.member_count == 1
    }
}

impl From<&Region> for RegionSnapshot {
    fn from(region: &Region) -> Self {
        Self {
            id: region.id(),
            position: region.centroid(),
            weight: region.weight(),
            member_count: region.member_count(),
        }
    }
}

/// One merge. `left` is always the smaller id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeRecord {
    /// 1-based, gapless.
    pub sequence: u64,
    pub left: RegionSnapshot,
    pub right: RegionSnapshot,
    pub composite: RegionSnapshot,
    /// Attraction value of the merged pair.
    pub value: f64,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Fewer than two input points; nothing to merge.
    Trivial { leaf_count: usize },
    /// Merged down to a single region.
    Merged,
    /// Stopped between merges by the caller. The records are a valid prefix.
    Cancelled { completed: u64 },
}

/// Records of one run in sequence order.
#[derive(Debug, Clone)]
pub struct MergeLog {
    records: Vec<MergeRecord>,
    outcome: RunOutcome,
    stats: EngineStats,
}

impl MergeLog {
    pub fn new(records: Vec<MergeRecord>, outcome: RunOutcome, stats: EngineStats) -> Self {
        Self {
            records,
            outcome,
            stats,
        }
    }

    pub fn records(&self) -> &[MergeRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<MergeRecord> {
        self.records
    }

    pub fn outcome(&self) -> RunOutcome {
        self.outcome
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_trivial(&self) -> bool {
        matches!(self.outcome, RunOutcome::Trivial { .. })
    }

    /// The last composite created.
    pub fn final_region(&self) -> Option<&RegionSnapshot> {
        self.records.last().map(|r| &r.composite)
    }

    /// Weight of the last composite, which for a complete run is the total
    /// input weight.
    pub fn total_weight(&self) -> Option<f64> {
        self.final_region().map(|r| r.weight)
    }

    /// Leaves referenced by the records, in input order.
    ///
    /// For a complete run this is the original input, so feeding it back
    /// into a fresh engine reproduces the same records.
    pub fn leaf_points(&self) -> Vec<LeafPoint> {
        let mut leaves: Vec<RegionSnapshot> = self
            .records
            .iter()
            .flat_map(|r| [r.left, r.right])
            .filter(RegionSnapshot::is_leaf)
            .collect();
        leaves.sort_unstable_by_key(|leaf| leaf.id);
        leaves
            .into_iter()
            .map(|leaf| LeafPoint::new(leaf.position.lon, leaf.position.lat, leaf.weight))
            .collect()
    }

    /// Checks the structural properties every merge log must have.
    ///
    /// - sequence numbers run 1, 2, 3, ... without gaps
    /// - each composite weighs exactly the sum of its two parts
    /// - no region is consumed twice or used after it was consumed
    /// - composite ids are fresh
    /// - a complete run has `leaf_count - 1` records
    pub fn check_well_formed(&self, leaf_count: usize) -> Result<()> {
        check_records(&self.records, leaf_count, self.outcome == RunOutcome::Merged)
    }
}

fn check_records(records: &[MergeRecord], leaf_count: usize, complete: bool) -> Result<()> {
    let mut retired: HashSet<RegionId> = HashSet::new();
    let mut created: HashSet<RegionId> = HashSet::new();
    let mut last = 0;

    for record in records {
        let fail = |message: String| Err(ClusterError::invariant(message, last));
        if record.sequence != last + 1 {
            return fail(format!("sequence {} follows {last}", record.sequence));
        }
        if record.left.id >= record.right.id {
            return fail(format!("record {} endpoints out of order", record.sequence));
        }
        if record.left.weight + record.right.weight != record.composite.weight {
            return fail(format!("record {} weight is not additive", record.sequence));
        }
        if record.left.member_count + record.right.member_count != record.composite.member_count {
            return fail(format!("record {} member count is not additive", record.sequence));
        }
        for endpoint in [record.left.id, record.right.id] {
            if !retired.insert(endpoint) {
                return fail(format!("region {endpoint} consumed twice"));
            }
            if endpoint.index() >= leaf_count && !created.contains(&endpoint) {
                return fail(format!("region {endpoint} used before it was created"));
            }
        }
        if record.composite.id.index() < leaf_count
            || !created.insert(record.composite.id)
            || retired.contains(&record.composite.id)
        {
            return fail(format!("composite id {} is not fresh", record.composite.id));
        }
        last = record.sequence;
    }

    let expected = leaf_count.saturating_sub(1);
    if complete && records.len() != expected {
        return Err(ClusterError::invariant(
            format!("{} records for {leaf_count} leaves", records.len()),
            last,
        ));
    }
    Ok(())
}
