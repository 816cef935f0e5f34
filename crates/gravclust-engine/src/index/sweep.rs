//! Composite sweeps, optionally on a rayon pool.

use gravclust_config::{ClusterConfig, SweepThreadCount};
use gravclust_core::{ClusterError, DistanceMetric, RegionId, Result};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::pair::PairValueProvider;
use crate::region::RegionStore;

/// Evaluates one region against many, sequentially or in parallel.
///
/// Parallel sweeps return exactly what a sequential sweep returns: values
/// are pure functions of the store and collected in input order.
#[derive(Debug, Default)]
pub struct Sweeper {
    /// Live-set size from which sweeps run in parallel.
    parallel_from: Option<usize>,
    /// Dedicated pool for an explicit thread count.
    pool: Option<ThreadPool>,
}

impl Sweeper {
    /// Builds a sweeper from the run configuration.
    ///
    /// # Errors
    ///
    /// Fails with [`ClusterError::Config`] if a dedicated pool cannot be
    /// created.
    pub fn new(config: &ClusterConfig) -> Result<Self> {
        if !config.parallel_sweep(usize::MAX) {
            return Ok(Self::sequential());
        }

        let pool = match config.sweep_threads {
            SweepThreadCount::Count(threads) => Some(
                ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("gravclust-sweep-{i}"))
                    .build()
                    .map_err(|e| ClusterError::Config(format!("sweep thread pool: {e}")))?,
            ),
            _ => None,
        };

        Ok(Self {
            parallel_from: Some(config.parallel_sweep_min_regions),
            pool,
        })
    }

    pub fn sequential() -> Self {
        Self::default()
    }

    /// Returns true if a sweep over `live_regions` runs in parallel.
    pub fn is_parallel_for(&self, live_regions: usize) -> bool {
        self.parallel_from
            .is_some_and(|threshold| live_regions >= threshold)
    }

    pub fn sweep<M: DistanceMetric>(
        &self,
        store: &RegionStore,
        provider: &PairValueProvider<M>,
        from: RegionId,
        targets: &[RegionId],
        parallel: bool,
    ) -> Result<Vec<(RegionId, f64)>> {
        let evaluate = |&target: &RegionId| provider.value(store, from, target).map(|v| (target, v));

        if !parallel {
            return targets.iter().map(evaluate).collect();
        }
        match &self.pool {
            Some(pool) => pool.install(|| targets.par_iter().map(evaluate).collect()),
            None => targets.par_iter().map(evaluate).collect(),
        }
    }
}
