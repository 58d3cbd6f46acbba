//! Trace documents: the recorded choices leading to a fault.
//!
//! A trace records, for every step from the initial state, how many
//! transitions were enabled and which one was taken. Replaying the choices
//! against the same model reproduces the execution.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// Current trace document version
pub const TRACE_FORMAT_VERSION: u32 = 1;

/// One recorded choice
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuideStep {
    /// Number of transitions enabled at the state
    pub enabled: usize,
    /// Index of the transition taken
    pub chosen: usize,
    /// Short description of the transition taken
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl GuideStep {
    /// Create a step without label
    #[must_use]
    pub fn new(enabled: usize, chosen: usize) -> Self {
        Self {
            enabled,
            chosen,
            label: None,
        }
    }

    /// Attach a label
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl std::fmt::Display for GuideStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "chose {} of {}", self.chosen, self.enabled)?;
        if let Some(label) = &self.label {
            write!(f, " [{}]", label)?;
        }
        Ok(())
    }
}

/// A complete trace as written to a `.trace` file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceDocument {
    /// Document version
    pub format: u32,
    /// Session that produced the trace
    pub session: String,
    /// Rendered configuration of the session
    #[serde(default)]
    pub config: Vec<String>,
    /// Choices from the initial state
    pub steps: Vec<GuideStep>,
}

impl TraceDocument {
    /// Create an empty document for a session
    #[must_use]
    pub fn new(session: impl Into<String>) -> Self {
        Self {
            format: TRACE_FORMAT_VERSION,
            session: session.into(),
            config: Vec::new(),
            steps: Vec::new(),
        }
    }

    /// Attach the rendered configuration
    #[must_use]
    pub fn with_config(mut self, config: Vec<String>) -> Self {
        self.config = config;
        self
    }

    /// Set the steps
    #[must_use]
    pub fn with_steps(mut self, steps: Vec<GuideStep>) -> Self {
        self.steps = steps;
        self
    }

    /// Number of steps
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Is the trace empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Check version and that every choice is within its enabled set
    ///
    /// # Errors
    ///
    /// Returns error on unsupported version or an out-of-range choice
    pub fn validate(&self) -> CoreResult<()> {
        if self.format != TRACE_FORMAT_VERSION {
            return Err(CoreError::UnsupportedFormat {
                expected: TRACE_FORMAT_VERSION,
                actual: self.format,
            });
        }
        for (i, step) in self.steps.iter().enumerate() {
            if step.chosen >= step.enabled {
                return Err(CoreError::Validation {
                    field: format!("steps[{}]", i),
                    reason: format!(
                        "choice {} out of range for {} enabled transitions",
                        step.chosen, step.enabled
                    ),
                });
            }
        }
        Ok(())
    }

    /// Encode as pretty JSON
    ///
    /// # Errors
    ///
    /// Returns error if encoding fails
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Decode and validate
    ///
    /// # Errors
    ///
    /// Returns error if the bytes are not a valid trace document
    pub fn decode(data: &[u8]) -> CoreResult<Self> {
        let doc: Self = serde_json::from_slice(data)?;
        doc.validate()?;
        Ok(doc)
    }
}
