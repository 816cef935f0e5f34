//! Entry points that hide engine wiring.

use std::path::Path;

use gravclust_config::{ClusterConfig, ConfigError};
use gravclust_core::{LeafPoint, Result};
use gravclust_engine::{MergeEngine, MergeLog};
use tracing::warn;

/// Configuration file read by [`cluster`].
pub const CONFIG_FILE: &str = "cluster.toml";

/// Loads `path`, falling back to defaults when the file cannot be read.
///
/// A file that exists but does not parse is still an error.
pub fn load_config(path: impl AsRef<Path>) -> Result<ClusterConfig> {
    let path = path.as_ref();
    match ClusterConfig::load(path) {
        Ok(config) => Ok(config),
        Err(ConfigError::Io(err)) => {
            warn!(
                event = "config_fallback",
                path = %path.display(),
                reason = %err,
            );
            Ok(ClusterConfig::default())
        }
        Err(err) => Err(err.into()),
    }
}

/// Clusters `points` with the configuration in `cluster.toml`, or defaults.
pub fn cluster(points: &[LeafPoint]) -> Result<MergeLog> {
    cluster_with(points, load_config(CONFIG_FILE)?)
}

/// Clusters `points` with an explicit configuration.
pub fn cluster_with(points: &[LeafPoint], config: ClusterConfig) -> Result<MergeLog> {
    #[cfg(feature = "console")]
    crate::console::init();

    MergeEngine::new(points, config)?.run()
}
