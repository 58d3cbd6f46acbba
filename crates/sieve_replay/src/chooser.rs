//! Choosing the next transition during replay.

use crate::error::{ReplayError, ReplayResult};
use crate::guide::Guide;

/// Picks the transition to take from a state
pub trait TransitionChooser<S, T> {
    /// Next transition from `state`; `None` ends the replay.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::MisguidedExecution`] if the choice cannot be
    /// made consistently with the transitions enabled at `state`
    fn choose(&mut self, state: &S) -> ReplayResult<Option<T>>;
}

/// Computes the transitions enabled at a state.
///
/// The order of the returned transitions must be deterministic: recorded
/// choices are indices into it.
pub trait Enabler<S, T> {
    /// Enabled transitions, in a fixed order
    fn enabled(&self, state: &S) -> Vec<T>;
}

/// Chooser that follows a recorded [`Guide`].
///
/// Each step consumes one guide entry. The replay ends when the guide is
/// exhausted or the state has no enabled transition. A guide entry recorded
/// against a different number of enabled transitions, or choosing an index
/// out of range, is a misguided execution.
#[derive(Debug)]
pub struct GuidedChooser<En> {
    enabler: En,
    guide: Guide,
}

impl<En> GuidedChooser<En> {
    /// Create a chooser
    #[must_use]
    pub fn new(enabler: En, guide: Guide) -> Self {
        Self { enabler, guide }
    }

    /// The guide and how far it has been consumed
    #[must_use]
    pub fn guide(&self) -> &Guide {
        &self.guide
    }
}

impl<S, T, En: Enabler<S, T>> TransitionChooser<S, T> for GuidedChooser<En> {
    fn choose(&mut self, state: &S) -> ReplayResult<Option<T>> {
        let Some(step) = self.guide.peek_step().cloned() else {
            return Ok(None);
        };
        let enabled = self.enabler.enabled(state);
        if enabled.is_empty() {
            tracing::warn!(
                remaining = self.guide.remaining(),
                "no transition enabled; guide not exhausted"
            );
            return Ok(None);
        }
        if enabled.len() != step.enabled {
            return Err(ReplayError::MisguidedExecution {
                step: self.guide.position() + 1,
                reason: format!(
                    "guide expects {} enabled transitions, state has {}",
                    step.enabled,
                    enabled.len()
                ),
            });
        }
        let Some(transition) = enabled.into_iter().nth(step.chosen) else {
            return Err(ReplayError::MisguidedExecution {
                step: self.guide.position() + 1,
                reason: format!(
                    "guide chooses transition {} of {}",
                    step.chosen, step.enabled
                ),
            });
        };
        self.guide.next_step();
        Ok(Some(transition))
    }
}
