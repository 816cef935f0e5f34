//! Error types for gravclust

use thiserror::Error;

use crate::domain::RegionId;

/// Main error type for clustering operations.
///
/// None of these are recoverable inside a run: every merge depends on the
/// full correctness of the state left by the previous one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClusterError {
    /// Invalid configuration, detected before the merge loop starts.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An input leaf cannot take part in a weighted merge.
    #[error("Invalid input point {index}: {reason}")]
    InvalidInput {
        /// Position of the offending record in the input sequence.
        index: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// A composite was requested from a region that is not live.
    #[error("Invalid merge: region {id} is not live")]
    InvalidMerge {
        /// The retired or unknown region.
        id: RegionId,
        /// Last valid merge sequence number, when raised mid-run.
        last_sequence: Option<u64>,
    },

    /// Two regions coincide and no minimum-distance clamp is configured.
    #[error("Degenerate distance between regions {a} and {b} (min_distance clamp disabled)")]
    DegenerateDistance {
        /// First region.
        a: RegionId,
        /// Second region.
        b: RegionId,
        /// Last valid merge sequence number, when raised mid-run.
        last_sequence: Option<u64>,
    },

    /// Internal invariant broken mid-run. The merge sequence is corrupt
    /// after `last_sequence`.
    #[error("Invariant violation after merge {last_sequence}: {message}")]
    InvariantViolation {
        /// Description of the broken invariant.
        message: String,
        /// Sequence number of the last valid merge record (0 if none).
        last_sequence: u64,
    },

    /// The engine was stepped again after a fatal error.
    #[error("Run aborted after merge {last_sequence}; restart from the original input")]
    Aborted {
        /// Sequence number of the last valid merge record.
        last_sequence: u64,
    },
}

impl ClusterError {
    /// Builds an invariant violation tagged with the last valid sequence number.
    pub fn invariant(message: impl Into<String>, last_sequence: u64) -> Self {
        ClusterError::InvariantViolation {
            message: message.into(),
            last_sequence,
        }
    }

    /// A merge request naming a region that is not live.
    pub fn invalid_merge(id: RegionId) -> Self {
        ClusterError::InvalidMerge {
            id,
            last_sequence: None,
        }
    }

    /// Coincident regions with the minimum-distance clamp disabled.
    pub fn degenerate(a: RegionId, b: RegionId) -> Self {
        ClusterError::DegenerateDistance {
            a,
            b,
            last_sequence: None,
        }
    }

    /// Re-tags a mid-run failure with the last valid merge sequence number.
    ///
    /// Components below the merge loop do not know how far the run got;
    /// the engine stamps their errors on the way out.
    pub fn at_sequence(self, sequence: u64) -> Self {
        match self {
            ClusterError::InvariantViolation { message, .. } => ClusterError::InvariantViolation {
                message,
                last_sequence: sequence,
            },
            ClusterError::InvalidMerge { id, .. } => ClusterError::InvalidMerge {
                id,
                last_sequence: Some(sequence),
            },
            ClusterError::DegenerateDistance { a, b, .. } => ClusterError::DegenerateDistance {
                a,
                b,
                last_sequence: Some(sequence),
            },
            other => other,
        }
    }

    /// Returns the last valid merge sequence number for mid-run failures.
    pub fn last_sequence(&self) -> Option<u64> {
        match self {
            ClusterError::InvariantViolation { last_sequence, .. }
            | ClusterError::Aborted { last_sequence } => Some(*last_sequence),
            ClusterError::InvalidMerge { last_sequence, .. }
            | ClusterError::DegenerateDistance { last_sequence, .. } => *last_sequence,
            _ => None,
        }
    }
}

/// Result type alias for clustering operations
pub type Result<T> = std::result::Result<T, ClusterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_sequence_stamps_mid_run_errors() {
        let err = ClusterError::invariant("bad value", 7).at_sequence(3);
        assert_eq!(err.last_sequence(), Some(3));

        let id = RegionId::new(4);
        let err = ClusterError::invalid_merge(id);
        assert_eq!(err.last_sequence(), None);
        assert_eq!(
            err.at_sequence(3),
            ClusterError::InvalidMerge {
                id,
                last_sequence: Some(3)
            }
        );

        let err = ClusterError::degenerate(RegionId::new(2), RegionId::new(6)).at_sequence(1);
        assert_eq!(err.last_sequence(), Some(1));
    }

    #[test]
    fn test_at_sequence_leaves_setup_errors_alone() {
        let err = ClusterError::Config("bad".into()).at_sequence(5);
        assert_eq!(err, ClusterError::Config("bad".into()));
        assert_eq!(err.last_sequence(), None);
    }

    #[test]
    fn test_display() {
        let err = ClusterError::Aborted { last_sequence: 12 };
        assert_eq!(
            err.to_string(),
            "Run aborted after merge 12; restart from the original input"
        );
    }
}
