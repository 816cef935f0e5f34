//! Configuration system for gravclust.
//!
//! Load clustering configuration from TOML or YAML files to control the
//! force law, distance metric, caching and index strategy without code
//! changes. A configuration is supplied once per run and is immutable for
//! the run's duration.
//!
//! # Examples
//!
//! Load configuration from TOML string:
//!
//! ```
//! use gravclust_config::{ClusterConfig, IndexStrategy};
//!
//! let config = ClusterConfig::from_toml_str(r#"
//!     index = "full_scan"
//!
//!     [force]
//!     exponent = 4.0
//!     min_distance = 1.0
//!     max_distance = 250.0
//!
//!     [distance]
//!     type = "haversine"
//!
//!     [cache]
//!     eviction_member_threshold = 64
//! "#).unwrap();
//!
//! assert_eq!(config.index, IndexStrategy::FullScan);
//! assert_eq!(config.force.potential_exponent(), 3.0);
//! assert!(config.validate().is_ok());
//! ```
//!
//! Use default config when file is missing:
//!
//! ```
//! use gravclust_config::ClusterConfig;
//!
//! let config = ClusterConfig::load("cluster.toml").unwrap_or_default();
//! // Proceeds with defaults if file doesn't exist
//! ```

use std::path::Path;

use gravclust_core::ClusterError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default force-law exponent. The derived potential exponent is one less.
pub const DEFAULT_EXPONENT: f64 = 4.0;

/// Default minimum-distance clamp, in metric units.
pub const DEFAULT_MIN_DISTANCE: f64 = 0.5;

/// Default member count above which composite member detail is released.
pub const DEFAULT_EVICTION_MEMBER_THRESHOLD: usize = 256;

/// Default live-set size from which the composite sweep runs in parallel.
pub const DEFAULT_PARALLEL_SWEEP_MIN_REGIONS: usize = 4096;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<ConfigError> for ClusterError {
    fn from(err: ConfigError) -> Self {
        ClusterError::Config(err.to_string())
    }
}

/// Main clustering configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ClusterConfig {
    /// Assertion level for the merge loop.
    #[serde(default)]
    pub environment_mode: EnvironmentMode,

    /// Force law: exponent and distance clamps.
    #[serde(default)]
    pub force: ForceLawConfig,

    /// Distance metric.
    #[serde(default)]
    pub distance: DistanceConfig,

    /// Pair value caching and member-detail eviction.
    #[serde(default)]
    pub cache: CacheConfig,

    /// How the best remaining pair is tracked.
    #[serde(default)]
    pub index: IndexStrategy,

    /// Thread count for the per-merge composite sweep.
    #[serde(default)]
    pub sweep_threads: SweepThreadCount,

    /// Live-set size from which the sweep is split across threads.
    #[serde(default = "default_parallel_sweep_min_regions")]
    pub parallel_sweep_min_regions: usize,
}

fn default_parallel_sweep_min_regions() -> usize {
    DEFAULT_PARALLEL_SWEEP_MIN_REGIONS
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            environment_mode: EnvironmentMode::default(),
            force: ForceLawConfig::default(),
            distance: DistanceConfig::default(),
            cache: CacheConfig::default(),
            index: IndexStrategy::default(),
            sweep_threads: SweepThreadCount::default(),
            parallel_sweep_min_regions: DEFAULT_PARALLEL_SWEEP_MIN_REGIONS,
        }
    }
}

impl ClusterConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or contains invalid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Sets the force-law exponent.
    pub fn with_exponent(mut self, exponent: f64) -> Self {
        self.force.exponent = exponent;
        self
    }

    /// Sets the minimum-distance clamp (0 disables it).
    pub fn with_min_distance(mut self, min_distance: f64) -> Self {
        self.force.min_distance = min_distance;
        self
    }

    /// Sets the maximum-distance truncation.
    pub fn with_max_distance(mut self, max_distance: Option<f64>) -> Self {
        self.force.max_distance = max_distance;
        self
    }

    /// Sets the distance metric.
    pub fn with_distance(mut self, distance: DistanceConfig) -> Self {
        self.distance = distance;
        self
    }

    /// Enables or disables pair value caching.
    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache.enabled = enabled;
        self
    }

    /// Sets the member-detail eviction threshold.
    pub fn with_eviction_threshold(mut self, threshold: usize) -> Self {
        self.cache.eviction_member_threshold = threshold;
        self
    }

    /// Sets the best-pair index strategy.
    pub fn with_index_strategy(mut self, index: IndexStrategy) -> Self {
        self.index = index;
        self
    }

    /// Sets the environment mode.
    pub fn with_environment_mode(mut self, mode: EnvironmentMode) -> Self {
        self.environment_mode = mode;
        self
    }

    /// Sets the sweep thread count and the live-set size that enables it.
    pub fn with_sweep_threads(mut self, threads: SweepThreadCount, min_regions: usize) -> Self {
        self.sweep_threads = threads;
        self.parallel_sweep_min_regions = min_regions;
        self
    }

    /// Checks the configuration before a run starts.
    ///
    /// # Examples
    ///
    /// ```
    /// use gravclust_config::ClusterConfig;
    ///
    /// assert!(ClusterConfig::new().validate().is_ok());
    /// assert!(ClusterConfig::new().with_exponent(0.0).validate().is_err());
    /// assert!(ClusterConfig::new().with_min_distance(-1.0).validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.force.validate()?;
        self.distance.validate()?;
        if let SweepThreadCount::Count(0) = self.sweep_threads {
            return Err(ConfigError::Invalid(
                "sweep_threads count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns true if the composite sweep should run on multiple threads
    /// for a live set of `live_regions`.
    pub fn parallel_sweep(&self, live_regions: usize) -> bool {
        match self.sweep_threads {
            SweepThreadCount::None => false,
            SweepThreadCount::Count(n) if n <= 1 => false,
            _ => live_regions >= self.parallel_sweep_min_regions,
        }
    }
}

/// Environment mode controlling how much the merge loop checks itself.
///
/// The retired-endpoint check and pair value sanity checks run in every
/// mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentMode {
    /// Mandatory checks only.
    Production,

    /// Mandatory checks plus cheap per-merge assertions.
    #[default]
    FastAssert,

    /// Also verifies composites against retained members and the index
    /// against a full scan after every merge.
    FullAssert,
}

impl EnvironmentMode {
    /// Returns true if per-merge assertions are enabled.
    pub fn is_asserted(&self) -> bool {
        !matches!(self, EnvironmentMode::Production)
    }

    /// Returns true if full (expensive) assertions are enabled.
    pub fn is_fully_asserted(&self) -> bool {
        matches!(self, EnvironmentMode::FullAssert)
    }
}

/// Force-law configuration: `value = w_a * w_b / d^exponent`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", default)]
pub struct ForceLawConfig {
    /// Force-law exponent.
    pub exponent: f64,

    /// Distances below this are clamped up to it. 0 disables the clamp.
    pub min_distance: f64,

    /// Pairs farther apart than this have zero attraction.
    pub max_distance: Option<f64>,
}

impl Default for ForceLawConfig {
    fn default() -> Self {
        Self {
            exponent: DEFAULT_EXPONENT,
            min_distance: DEFAULT_MIN_DISTANCE,
            max_distance: None,
        }
    }
}

impl ForceLawConfig {
    /// Exponent of the derived potential field, one less than the force law's.
    pub fn potential_exponent(&self) -> f64 {
        self.exponent - 1.0
    }

    /// Returns true if the minimum-distance clamp is active.
    pub fn clamps_min_distance(&self) -> bool {
        self.min_distance > 0.0
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.exponent.is_finite() || self.exponent <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "force exponent must be finite and positive, got {}",
                self.exponent
            )));
        }
        if !self.min_distance.is_finite() || self.min_distance < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "min_distance must be finite and non-negative, got {}",
                self.min_distance
            )));
        }
        if let Some(max) = self.max_distance {
            if max.is_nan() || max <= self.min_distance {
                return Err(ConfigError::Invalid(format!(
                    "max_distance ({max}) must exceed min_distance ({})",
                    self.min_distance
                )));
            }
        }
        Ok(())
    }
}

/// Distance metric configuration.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DistanceConfig {
    /// Cosine-corrected planar approximation in miles.
    Planar {
        /// Latitude for the cosine correction. Defaults to the mean input latitude.
        #[serde(default)]
        reference_latitude: Option<f64>,
    },

    /// Great-circle distance in miles.
    Haversine,

    /// Raw planar distance in input units.
    Euclidean,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        DistanceConfig::Planar {
            reference_latitude: None,
        }
    }
}

impl DistanceConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if let DistanceConfig::Planar {
            reference_latitude: Some(lat),
        } = self
        {
            if !lat.is_finite() || lat.abs() > 90.0 {
                return Err(ConfigError::Invalid(format!(
                    "reference_latitude must lie in [-90, 90], got {lat}"
                )));
            }
        }
        Ok(())
    }
}

/// Pair value cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", default)]
pub struct CacheConfig {
    /// Memoize pair values for live pairs. Disabling only affects speed.
    pub enabled: bool,

    /// Composites with more members than this drop their member detail.
    pub eviction_member_threshold: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            eviction_member_threshold: DEFAULT_EVICTION_MEMBER_THRESHOLD,
        }
    }
}

/// Strategy for tracking the best remaining pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexStrategy {
    /// Each region remembers its best live partner.
    #[default]
    BestNeighbor,

    /// Rescan every live pair after every merge.
    FullScan,
}

/// Sweep thread count configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepThreadCount {
    /// Use the global rayon pool.
    #[default]
    Auto,

    /// Always sweep sequentially.
    None,

    /// Specific number of threads.
    Count(usize),
}
