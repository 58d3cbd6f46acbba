//! Guide reader over a recorded trace.

use crate::error::{ReplayError, ReplayResult};
use sieve_core::{GuideStep, TraceDocument};
use std::collections::VecDeque;
use std::path::Path;

/// Sequence of recorded choices consumed during replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guide {
    /// Choices not yet consumed
    buffer: VecDeque<GuideStep>,
    /// Number of choices consumed
    position: usize,
    /// Total choices in the guide
    total: usize,
    /// Session that recorded the trace
    session: String,
    /// Rendered configuration of that session
    config: Vec<String>,
}

impl Guide {
    /// Create a guide from steps
    #[must_use]
    pub fn from_steps(steps: Vec<GuideStep>) -> Self {
        let total = steps.len();
        Self {
            buffer: steps.into(),
            position: 0,
            total,
            session: String::new(),
            config: Vec::new(),
        }
    }

    /// Create a guide from a trace document
    #[must_use]
    pub fn from_document(doc: TraceDocument) -> Self {
        let mut guide = Self::from_steps(doc.steps);
        guide.session = doc.session;
        guide.config = doc.config;
        guide
    }

    /// Load a `.trace` file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not a valid trace
    pub fn load(path: &Path) -> ReplayResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| ReplayError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let doc = TraceDocument::decode(&bytes)?;
        tracing::debug!(path = %path.display(), steps = doc.len(), "loaded guide");
        Ok(Self::from_document(doc))
    }

    /// Consume the next choice
    pub fn next_step(&mut self) -> Option<GuideStep> {
        let step = self.buffer.pop_front()?;
        self.position += 1;
        Some(step)
    }

    /// Peek at the next choice without consuming it
    #[must_use]
    pub fn peek_step(&self) -> Option<&GuideStep> {
        self.buffer.front()
    }

    /// Check if there are more choices
    #[must_use]
    pub fn has_more(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Get remaining choice count
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buffer.len()
    }

    /// Number of choices consumed so far
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Get total choice count
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Session that recorded the trace, empty if unknown
    #[must_use]
    pub fn session(&self) -> &str {
        &self.session
    }

    /// Configuration lines recorded with the trace
    #[must_use]
    pub fn config(&self) -> &[String] {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guide_from_steps() {
        let guide = Guide::from_steps(vec![GuideStep::new(2, 0), GuideStep::new(2, 1)]);
        assert_eq!(guide.total(), 2);
        assert_eq!(guide.remaining(), 2);
        assert!(guide.has_more());
        assert_eq!(guide.position(), 0);
    }

    #[test]
    fn test_guide_next_step() {
        let mut guide = Guide::from_steps(vec![GuideStep::new(3, 2)]);
        assert_eq!(guide.peek_step(), Some(&GuideStep::new(3, 2)));
        assert_eq!(guide.remaining(), 1); // peek doesn't consume
        assert_eq!(guide.next_step(), Some(GuideStep::new(3, 2)));
        assert_eq!(guide.position(), 1);
        assert!(!guide.has_more());
        assert_eq!(guide.next_step(), None);
        assert_eq!(guide.position(), 1);
    }

    #[test]
    fn test_guide_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s_0.trace");
        let doc = TraceDocument::new("s")
            .with_config(vec!["-errorBound=2".to_string()])
            .with_steps(vec![GuideStep::new(1, 0)]);
        std::fs::write(&path, doc.encode().unwrap()).unwrap();

        let guide = Guide::load(&path).unwrap();
        assert_eq!(guide.session(), "s");
        assert_eq!(guide.config(), &["-errorBound=2".to_string()]);
        assert_eq!(guide.total(), 1);
    }

    #[test]
    fn test_guide_load_missing() {
        let dir = tempfile::tempdir().unwrap();
        let result = Guide::load(&dir.path().join("none.trace"));
        assert!(matches!(result, Err(ReplayError::Io { .. })));
    }

    #[test]
    fn test_guide_load_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.trace");
        std::fs::write(&path, b"not a trace").unwrap();
        assert!(matches!(
            Guide::load(&path),
            Err(ReplayError::InvalidTrace { .. })
        ));
    }
}
