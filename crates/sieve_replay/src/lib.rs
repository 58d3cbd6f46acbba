//! SIEVE Replay
//!
//! Deterministic re-execution of a recorded trace.
//! Several lanes can follow the same choices in lock-step.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chooser;
pub mod error;
pub mod guide;
pub mod replayer;

pub use chooser::{Enabler, GuidedChooser, TransitionChooser};
pub use error::{ReplayError, ReplayResult};
pub use guide::Guide;
pub use replayer::{Lane, ReplayConfig, ReplayOutcome, Replayer, StateManager};
