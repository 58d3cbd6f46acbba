//! Replay errors.

use sieve_core::CoreError;

/// Replay result type
pub type ReplayResult<T> = Result<T, ReplayError>;

/// Replay errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    /// The guide disagrees with the transitions enabled at the current state
    #[error("misguided execution at step {step}: {reason}")]
    MisguidedExecution { step: usize, reason: String },
    /// Invalid replay option
    #[error("configuration error: {reason}")]
    Configuration { reason: String },
    /// Nothing to replay
    #[error("replay needs at least one lane")]
    NoLanes,
    /// Trace file could not be decoded
    #[error("invalid trace: {reason}")]
    InvalidTrace { reason: String },
    /// Trace file could not be read
    #[error("IO error on {path}: {reason}")]
    Io { path: String, reason: String },
    /// Writing to the output failed
    #[error("output error: {reason}")]
    Output { reason: String },
}

impl From<CoreError> for ReplayError {
    fn from(err: CoreError) -> Self {
        Self::InvalidTrace {
            reason: err.to_string(),
        }
    }
}

impl From<ReplayError> for CoreError {
    fn from(err: ReplayError) -> Self {
        match err {
            ReplayError::MisguidedExecution { step, reason } => CoreError::MisguidedExecution {
                reason: format!("step {}: {}", step, reason),
            },
            ReplayError::Io { path, reason } => CoreError::Io {
                reason: format!("{}: {}", path, reason),
            },
            ReplayError::Configuration { reason } => CoreError::Configuration { reason },
            other => CoreError::Validation {
                field: "replay".to_string(),
                reason: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_error_display() {
        let err = ReplayError::MisguidedExecution {
            step: 3,
            reason: "guide expects 2 enabled transitions, state has 1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "misguided execution at step 3: guide expects 2 enabled transitions, state has 1"
        );
        assert_eq!(ReplayError::NoLanes.to_string(), "replay needs at least one lane");
    }

    #[test]
    fn test_into_core_error() {
        let core: CoreError = ReplayError::MisguidedExecution {
            step: 1,
            reason: "x".to_string(),
        }
        .into();
        assert!(matches!(core, CoreError::MisguidedExecution { .. }));
    }
}
