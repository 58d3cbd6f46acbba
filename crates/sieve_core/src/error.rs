//! Core error types for SIEVE.

use std::fmt;

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Invalid encoding
    InvalidEncoding { reason: String },

    /// Unsupported trace document version
    UnsupportedFormat { expected: u32, actual: u32 },

    /// Invalid ID or name
    InvalidId { reason: String },

    /// Invalid configuration (unknown option, wrong value type, bad directory)
    Configuration { reason: String },

    /// Validation error
    Validation { field: String, reason: String },

    /// Already exists
    AlreadyExists { kind: String, id: String },

    /// Too many faults reported
    ExcessiveErrors { bound: usize },

    /// Replay guide disagrees with the model
    MisguidedExecution { reason: String },

    /// Storage failure
    Io { reason: String },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEncoding { reason } => write!(f, "Invalid encoding: {}", reason),
            Self::UnsupportedFormat { expected, actual } => {
                write!(
                    f,
                    "Unsupported trace format: expected {}, got {}",
                    expected, actual
                )
            }
            Self::InvalidId { reason } => write!(f, "Invalid ID: {}", reason),
            Self::Configuration { reason } => write!(f, "Configuration error: {}", reason),
            Self::Validation { field, reason } => {
                write!(f, "Validation failed for {}: {}", field, reason)
            }
            Self::AlreadyExists { kind, id } => write!(f, "{} already exists: {}", kind, id),
            Self::ExcessiveErrors { bound } => {
                write!(f, "Excessive errors: error bound of {} reached", bound)
            }
            Self::MisguidedExecution { reason } => write!(f, "Misguided execution: {}", reason),
            Self::Io { reason } => write!(f, "IO error: {}", reason),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidEncoding {
            reason: err.to_string(),
        }
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::ExcessiveErrors { bound: 5 };
        assert_eq!(format!("{}", err), "Excessive errors: error bound of 5 reached");

        let err = CoreError::AlreadyExists {
            kind: "Section".to_string(),
            id: "verify".to_string(),
        };
        assert_eq!(format!("{}", err), "Section already exists: verify");
    }

    #[test]
    fn test_unsupported_format_error() {
        let err = CoreError::UnsupportedFormat {
            expected: 1,
            actual: 7,
        };
        let s = format!("{}", err);
        assert!(s.contains('1'));
        assert!(s.contains('7'));
    }

    #[test]
    fn test_from_json_error() {
        let err = serde_json::from_str::<u32>("not json").unwrap_err();
        let core: CoreError = err.into();
        assert!(matches!(core, CoreError::InvalidEncoding { .. }));
    }

    #[test]
    fn test_error_equality() {
        let err1 = CoreError::ExcessiveErrors { bound: 2 };
        let err2 = CoreError::ExcessiveErrors { bound: 2 };
        assert_eq!(err1, err2);

        let err3 = CoreError::ExcessiveErrors { bound: 3 };
        assert_ne!(err1, err3);
    }
}
