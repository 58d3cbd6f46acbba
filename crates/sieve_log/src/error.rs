//! Fault log errors.

use sieve_core::CoreError;
use std::path::Path;

/// Fault log result type
pub type LogResult<T> = Result<T, LogError>;

/// Fault log errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogError {
    /// Invalid directory or session name
    #[error("configuration error: {reason}")]
    Configuration { reason: String },
    /// The number of reported faults reached the error bound
    #[error("excessive errors: error bound of {bound} reached")]
    ExcessiveErrors { bound: usize },
    /// Trace capture, report persistence or output failed
    #[error("IO error on {path}: {reason}")]
    Io { path: String, reason: String },
}

impl LogError {
    /// Wrap an IO error with the path it concerns
    #[must_use]
    pub fn io(path: &Path, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<LogError> for CoreError {
    fn from(err: LogError) -> Self {
        match err {
            LogError::Configuration { reason } => CoreError::Configuration { reason },
            LogError::ExcessiveErrors { bound } => CoreError::ExcessiveErrors { bound },
            LogError::Io { path, reason } => CoreError::Io {
                reason: format!("{}: {}", path, reason),
            },
        }
    }
}
