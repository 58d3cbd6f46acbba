//! The search as seen by the fault log.

use crate::error::{LogError, LogResult};
use sieve_core::{Configuration, GuideStep, SessionName, TraceDocument};
use std::path::Path;

/// Handle on the running search.
///
/// The log only needs to know how deep the search currently is and how to
/// save the path that led there.
pub trait SearchHandle {
    /// Length of the current trace
    fn depth(&self) -> usize;

    /// Write the current trace to `path`, overwriting any existing file
    ///
    /// # Errors
    ///
    /// Returns error if the trace cannot be written
    fn capture_trace(&self, path: &Path) -> LogResult<()>;
}

/// Depth-first search stack of recorded choices.
///
/// A search pushes a [`GuideStep`] when it takes a transition and pops it on
/// backtrack. Captured traces are [`TraceDocument`]s.
#[derive(Debug, Clone)]
pub struct TraceStack {
    session: SessionName,
    config: Vec<String>,
    steps: Vec<GuideStep>,
}

impl TraceStack {
    /// Create an empty stack
    #[must_use]
    pub fn new(session: SessionName) -> Self {
        Self {
            session,
            config: Vec::new(),
            steps: Vec::new(),
        }
    }

    /// Record the configuration the search runs under
    #[must_use]
    pub fn with_configuration(mut self, config: &Configuration) -> Self {
        self.config = config.render();
        self
    }

    /// Push a choice
    pub fn push(&mut self, step: GuideStep) {
        self.steps.push(step);
    }

    /// Pop the last choice
    pub fn pop(&mut self) -> Option<GuideStep> {
        self.steps.pop()
    }

    /// Drop choices beyond `depth`
    pub fn truncate(&mut self, depth: usize) {
        self.steps.truncate(depth);
    }

    /// Current choices
    #[must_use]
    pub fn steps(&self) -> &[GuideStep] {
        &self.steps
    }

    /// Snapshot as a trace document
    #[must_use]
    pub fn to_document(&self) -> TraceDocument {
        TraceDocument::new(self.session.as_str())
            .with_config(self.config.clone())
            .with_steps(self.steps.clone())
    }
}

impl SearchHandle for TraceStack {
    fn depth(&self) -> usize {
        self.steps.len()
    }

    fn capture_trace(&self, path: &Path) -> LogResult<()> {
        let bytes = self.to_document().encode().map_err(|e| LogError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        std::fs::write(path, bytes).map_err(|e| LogError::io(path, &e))?;
        tracing::debug!(path = %path.display(), depth = self.steps.len(), "captured trace");
        Ok(())
    }
}
