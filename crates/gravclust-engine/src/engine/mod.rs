//! The merge loop.
//!
//! [`MergeEngine`] owns every piece of mutable state for one run and is the
//! only thing that mutates it. It can be driven one merge at a time with
//! [`step`](MergeEngine::step), as an iterator of records, to completion
//! with [`run`](MergeEngine::run), or streamed over a channel with
//! [`run_with_channel`](MergeEngine::run_with_channel).

mod record;


use std::sync::atomic::{AtomicBool, Ordering};

use gravclust_config::{ClusterConfig, DistanceConfig};
use gravclust_core::{
    ClusterError, DistanceMetric, EuclideanDistance, HaversineDistance, LeafPoint, Metric,
    PlanarDistance, Position, RegionId, Result,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cache::PotentialCache;
use crate::index::{MaxPairIndex, PairIndex, SweepContext, Sweeper};
use crate::pair::{PairValueProvider, ScoredPair};
use crate::region::RegionStore;
use crate::stats::EngineStats;

pub use record::{MergeLog, MergeRecord, RegionSnapshot, RunOutcome};

/// Relative tolerance for re-deriving a composite centroid from its leaves.
const CENTROID_TOLERANCE: f64 = 1e-9;

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// At least two live regions.
    Running,
    /// One region (or none) left. Terminal.
    Done,
    /// A fatal error stopped the run. Terminal.
    Aborted { last_sequence: u64 },
}

/// Builds the configured metric, centering the planar approximation on
/// the mean input latitude unless a reference latitude is given.
pub fn metric_for(distance: &DistanceConfig, points: &[LeafPoint]) -> Metric {
    match *distance {
        DistanceConfig::Planar {
            reference_latitude: Some(lat),
        } => Metric::Planar(PlanarDistance::new(lat)),
        DistanceConfig::Planar {
            reference_latitude: None,
        } => {
            let positions: Vec<Position> = points.iter().map(LeafPoint::position).collect();
            Metric::Planar(PlanarDistance::centered_on(&positions))
        }
        DistanceConfig::Haversine => Metric::Haversine(HaversineDistance),
        DistanceConfig::Euclidean => Metric::Euclidean(EuclideanDistance),
    }
}

/// Greedy merge engine for one run.
///
/// # Example
///
/// ```
/// use gravclust_config::{ClusterConfig, DistanceConfig};
/// use gravclust_core::LeafPoint;
/// use gravclust_engine::{MergeEngine, RunOutcome};
///
/// let points = [
///     LeafPoint::new(0.0, 0.0, 1.0),
///     LeafPoint::new(1.0, 0.0, 1.0),
///     LeafPoint::new(3.0, 0.0, 1.0),
/// ];
/// let config = ClusterConfig::new()
///     .with_distance(DistanceConfig::Euclidean)
///     .with_min_distance(0.0);
///
/// let log = MergeEngine::new(&points, config).unwrap().run().unwrap();
///
/// assert_eq!(log.outcome(), RunOutcome::Merged);
/// assert_eq!(log.len(), 2);
/// let first = &log.records()[0];
/// assert_eq!((first.left.id.get(), first.right.id.get()), (0, 1));
/// assert_eq!(first.composite.weight, 2.0);
/// assert_eq!(first.composite.position.lon, 0.5);
/// ```
#[derive(Debug)]
pub struct MergeEngine<M: DistanceMetric = Metric> {
    config: ClusterConfig,
    store: RegionStore,
    provider: PairValueProvider<M>,
    cache: PotentialCache,
    index: PairIndex,
    sweeper: Sweeper,
    stats: EngineStats,
    state: EngineState,
    leaf_count: usize,
    /// Sequence number of the last record handed out.
    emitted: u64,
}

impl MergeEngine<Metric> {
    /// Creates an engine using the metric named by `config.distance`.
    ///
    /// # Errors
    ///
    /// Configuration errors, invalid input points, and errors from the
    /// initial pair evaluation are reported before any merge happens.
    pub fn new(points: &[LeafPoint], config: ClusterConfig) -> Result<Self> {
        let metric = metric_for(&config.distance, points);
        Self::with_metric(points, config, metric)
    }
}

impl<M: DistanceMetric> MergeEngine<M> {
    /// Creates an engine with an explicit distance metric.
    pub fn with_metric(points: &[LeafPoint], config: ClusterConfig, metric: M) -> Result<Self> {
        config.validate()?;
        RegionStore::check_leaf_count(points.len())?;

        let mut store = RegionStore::with_leaf_capacity(points.len());
        for (index, point) in points.iter().enumerate() {
            point.validate(index)?;
            store.create_leaf(point.position(), point.weight)?;
        }

        let mut engine = Self {
            provider: PairValueProvider::new(metric, &config.force),
            cache: PotentialCache::new(&config.cache),
            index: PairIndex::for_strategy(config.index, points.len()),
            sweeper: Sweeper::new(&config)?,
            stats: EngineStats::default(),
            state: EngineState::Running,
            leaf_count: points.len(),
            emitted: 0,
            store,
            config,
        };
        engine.stats.start();

        if engine.leaf_count < 2 {
            engine.state = EngineState::Done;
            engine.stats.finish();
            info!(event = "cluster_trivial", leaf_count = engine.leaf_count);
            return Ok(engine);
        }

        info!(
            event = "cluster_start",
            leaf_count = engine.leaf_count,
            exponent = engine.config.force.exponent,
            strategy = engine.index.name(),
            cache = engine.cache.is_enabled(),
            mode = ?engine.config.environment_mode,
        );

        engine.index.build(&mut SweepContext {
            store: &engine.store,
            provider: &engine.provider,
            cache: &mut engine.cache,
            sweeper: &engine.sweeper,
            stats: &mut engine.stats,
        })?;

        Ok(engine)
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == EngineState::Done
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Region arena, for provenance queries.
    pub fn store(&self) -> &RegionStore {
        &self.store
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// The pair the next step will merge.
    pub fn peek_best(&self) -> Option<ScoredPair> {
        match self.state {
            EngineState::Running => self.index.best_pair(),
            _ => None,
        }
    }

    /// Statistics so far, including cache counters.
    pub fn stats(&self) -> EngineStats {
        self.stats.clone().with_cache(self.cache.stats())
    }

    /// Performs one merge.
    ///
    /// Returns `Ok(None)` once a single region remains.
    ///
    /// # Errors
    ///
    /// Any error is fatal: the engine moves to [`EngineState::Aborted`] and
    /// every later call fails with [`ClusterError::Aborted`]. Errors raised
    /// by a merge carry the sequence number of the last record returned,
    /// available through [`ClusterError::last_sequence`].
    pub fn step(&mut self) -> Result<Option<MergeRecord>> {
        match self.state {
            EngineState::Running => {}
            EngineState::Done => return Ok(None),
            EngineState::Aborted { last_sequence } => {
                return Err(ClusterError::Aborted { last_sequence })
            }
        }

        match self.merge_best() {
            Ok(Some(record)) => {
                self.emitted = record.sequence;
                if self.store.live_count() <= 1 {
                    self.finish();
                }
                Ok(Some(record))
            }
            Ok(None) => {
                self.finish();
                Ok(None)
            }
            Err(err) => {
                self.state = EngineState::Aborted {
                    last_sequence: self.emitted,
                };
                self.stats.finish();
                let err = err.at_sequence(self.emitted);
                warn!(event = "cluster_aborted", last_sequence = self.emitted, error = %err);
                Err(err)
            }
        }
    }

    /// Runs to completion.
    pub fn run(mut self) -> Result<MergeLog> {
        let mut records = Vec::with_capacity(self.leaf_count.saturating_sub(1));
        while let Some(record) = self.step()? {
            records.push(record);
        }
        Ok(self.into_log(records, false))
    }

    /// Runs to completion, sending each record as it is produced.
    ///
    /// `terminate` is checked between merges; once set the run stops and
    /// returns the records so far with [`RunOutcome::Cancelled`]. A closed
    /// receiver does not stop the run.
    pub fn run_with_channel(
        self,
        terminate: Option<&AtomicBool>,
        sender: mpsc::UnboundedSender<MergeRecord>,
    ) -> Result<MergeLog> {
        self.run_with_callback(terminate, |record| {
            let _ = sender.send(record.clone());
        })
    }

    /// Runs to completion, handing each record to `on_record` as it is
    /// produced.
    ///
    /// `terminate` is checked after every callback, so a callback that sets
    /// it stops the run before the next merge.
    pub fn run_with_callback<F>(
        mut self,
        terminate: Option<&AtomicBool>,
        mut on_record: F,
    ) -> Result<MergeLog>
    where
        F: FnMut(&MergeRecord),
    {
        let mut records = Vec::with_capacity(self.leaf_count.saturating_sub(1));
        loop {
            if !self.is_done() && terminate.is_some_and(|flag| flag.load(Ordering::SeqCst)) {
                self.stats.finish();
                info!(event = "cluster_cancelled", merges = self.emitted);
                return Ok(self.into_log(records, true));
            }
            match self.step()? {
                Some(record) => {
                    on_record(&record);
                    records.push(record);
                }
                None => break,
            }
        }
        Ok(self.into_log(records, false))
    }

    fn into_log(self, records: Vec<MergeRecord>, cancelled: bool) -> MergeLog {
        let outcome = if self.leaf_count < 2 {
            RunOutcome::Trivial {
                leaf_count: self.leaf_count,
            }
        } else if cancelled {
            RunOutcome::Cancelled {
                completed: self.emitted,
            }
        } else {
            RunOutcome::Merged
        };
        let stats = self.stats();
        MergeLog::new(records, outcome, stats)
    }

    fn finish(&mut self) {
        self.state = EngineState::Done;
        self.stats.finish();
        let stats = self.stats();
        info!(
            event = "cluster_end",
            merges = stats.merges,
            duration_ms = stats.elapsed().as_millis() as u64,
            pair_evaluations = stats.pair_evaluations,
            cache_hits = stats.cache_hits,
            rescans = stats.rescans,
            evictions = stats.evictions,
        );
    }

    fn merge_best(&mut self) -> Result<Option<MergeRecord>> {
        if self.store.live_count() < 2 {
            return Ok(None);
        }
        let Some(best) = self.index.best_pair() else {
            return Ok(None);
        };
        let sequence = self.store.merge_count() + 1;

        for id in [best.low, best.high] {
            if !self.store.is_live(id) {
                return Err(ClusterError::invariant(
                    format!("index selected retired region {id}"),
                    self.emitted,
                ));
            }
        }
        if !best.value.is_finite() || best.value < 0.0 {
            return Err(ClusterError::invariant(
                format!("best pair ({}, {}) has value {}", best.low, best.high, best.value),
                self.emitted,
            ));
        }

        let left = self.snapshot(best.low)?;
        let right = self.snapshot(best.high)?;
        let composite = self.store.create_composite(best.low, best.high)?;

        self.cache.invalidate(best.low);
        self.cache.invalidate(best.high);
        if self.cache.mentions(best.low) || self.cache.mentions(best.high) {
            return Err(ClusterError::invariant(
                format!("cache still holds values for retired ({}, {})", best.low, best.high),
                self.emitted,
            ));
        }
        self.cache.note_eviction_eligible(composite, &mut self.store);

        self.index.on_merge(
            &mut SweepContext {
                store: &self.store,
                provider: &self.provider,
                cache: &mut self.cache,
                sweeper: &self.sweeper,
                stats: &mut self.stats,
            },
            best.low,
            best.high,
            composite,
        )?;

        let composite = self.snapshot(composite)?;
        if self.config.environment_mode.is_asserted() {
            self.assert_composite(&left, &right, &composite)?;
        }
        if self.config.environment_mode.is_fully_asserted() {
            self.assert_members(composite.id)?;
            self.assert_index_matches_scan()?;
        }

        self.stats.record_merge();
        debug!(
            event = "merge",
            step = sequence,
            left = %left.id,
            right = %right.id,
            composite = %composite.id,
            value = best.value,
            weight = composite.weight,
            live = self.store.live_count(),
        );

        Ok(Some(MergeRecord {
            sequence,
            left,
            right,
            composite,
            value: best.value,
        }))
    }

    fn snapshot(&self, id: RegionId) -> Result<RegionSnapshot> {
        self.store
            .region(id)
            .map(RegionSnapshot::from)
            .ok_or_else(|| ClusterError::invariant(format!("unknown region {id}"), self.emitted))
    }

    fn assert_composite(
        &self,
        left: &RegionSnapshot,
        right: &RegionSnapshot,
        composite: &RegionSnapshot,
    ) -> Result<()> {
        let weight_ok = composite.weight.is_finite()
            && composite.weight > 0.0
            && composite.weight >= left.weight
            && composite.weight >= right.weight;
        let count_ok = composite.member_count == left.member_count + right.member_count;
        if weight_ok && count_ok && composite.position.is_finite() {
            Ok(())
        } else {
            Err(ClusterError::invariant(
                format!(
                    "composite {} (weight {}, {} members) inconsistent with its parts",
                    composite.id, composite.weight, composite.member_count
                ),
                self.emitted,
            ))
        }
    }

    /// Re-derives the composite centroid from retained leaf members.
    fn assert_members(&self, id: RegionId) -> Result<()> {
        let Some(members) = self.store.members(id) else {
            return Ok(());
        };
        let (mut lon, mut lat, mut weight) = (0.0, 0.0, 0.0);
        for leaf in &members {
            let region = self.snapshot(*leaf)?;
            lon += region.weight * region.position.lon;
            lat += region.weight * region.position.lat;
            weight += region.weight;
        }
        let centroid = self.snapshot(id)?.position;
        let close = |a: f64, b: f64| {
            (a - b).abs() <= CENTROID_TOLERANCE * a.abs().max(b.abs()).max(1.0)
        };
        if members.len() == self.store.member_count(id).unwrap_or(0)
            && close(lon / weight, centroid.lon)
            && close(lat / weight, centroid.lat)
        {
            Ok(())
        } else {
            Err(ClusterError::invariant(
                format!("composite {id} centroid disagrees with its {} members", members.len()),
                self.emitted,
            ))
        }
    }

    /// Compares the index's best pair against a brute-force scan.
    fn assert_index_matches_scan(&self) -> Result<()> {
        let live = self.store.live_ids();
        let mut expected = None;
        for (i, &a) in live.iter().enumerate() {
            for &b in &live[i + 1..] {
                let value = self.provider.value(&self.store, a, b)?;
                expected = Some(ScoredPair::pick(expected, ScoredPair::new(a, b, value)));
            }
        }
        let actual = self.index.best_pair();
        if actual == expected {
            Ok(())
        } else {
            Err(ClusterError::invariant(
                format!("index best {actual:?} differs from full scan {expected:?}"),
                self.emitted,
            ))
        }
    }
}

impl<M: DistanceMetric> Iterator for MergeEngine<M> {
    type Item = Result<MergeRecord>;

    /// Yields one record per merge; ends after the last merge or after the
    /// first error.
    fn next(&mut self) -> Option<Self::Item> {
        if matches!(self.state, EngineState::Aborted { .. }) {
            return None;
        }
        self.step().transpose()
    }
}
