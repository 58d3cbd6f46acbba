//! Identifiers for SIEVE entities.
//!
//! Fault ids are dense: the n-th admitted fault class gets id n.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// Fault identifier - identifies one admitted fault class in a log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FaultId(usize);

impl FaultId {
    /// Create from raw index
    #[must_use]
    pub const fn from_raw(value: usize) -> Self {
        Self(value)
    }

    /// Get raw index
    #[must_use]
    pub const fn as_usize(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for FaultId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for FaultId {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

/// Session name - root of every file name a log creates
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionName(String);

impl SessionName {
    /// Create a session name
    ///
    /// # Errors
    ///
    /// Returns error if the name is empty or contains a path separator
    pub fn new(name: impl Into<String>) -> CoreResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(CoreError::Configuration {
                reason: "session name is empty".to_string(),
            });
        }
        if name.contains(['/', '\\']) {
            return Err(CoreError::InvalidId {
                reason: format!("session name {:?} contains a path separator", name),
            });
        }
        Ok(Self(name))
    }

    /// Get as string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the trace for the given fault
    #[must_use]
    pub fn trace_file_name(&self, id: FaultId) -> String {
        format!("{}_{}.trace", self.0, id)
    }

    /// File name of the persisted report
    #[must_use]
    pub fn report_file_name(&self) -> String {
        format!("{}_log.txt", self.0)
    }
}

impl TryFrom<String> for SessionName {
    type Error = CoreError;

    fn try_from(value: String) -> CoreResult<Self> {
        Self::new(value)
    }
}

impl From<SessionName> for String {
    fn from(value: SessionName) -> Self {
        value.0
    }
}

impl std::fmt::Display for SessionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_id_roundtrip() {
        let id = FaultId::from_raw(3);
        assert_eq!(id.as_usize(), 3);
        assert_eq!(id.to_string(), "3");
        assert_eq!(FaultId::from(3), id);
    }

    #[test]
    fn test_fault_id_ordering() {
        assert!(FaultId::from_raw(0) < FaultId::from_raw(1));
    }

    #[test]
    fn test_session_name_empty() {
        let result = SessionName::new("");
        assert!(matches!(result, Err(CoreError::Configuration { .. })));
    }

    #[test]
    fn test_session_name_separator() {
        assert!(SessionName::new("a/b").is_err());
    }

    #[test]
    fn test_session_file_names() {
        let name = SessionName::new("dining").unwrap();
        assert_eq!(name.trace_file_name(FaultId::from_raw(2)), "dining_2.trace");
        assert_eq!(name.report_file_name(), "dining_log.txt");
    }

    #[test]
    fn test_session_name_serde_rejects_empty() {
        let result: Result<SessionName, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());

        let name: SessionName = serde_json::from_str("\"run\"").unwrap();
        assert_eq!(name.as_str(), "run");
    }
}
