//! Multi-lane replayer.
//!
//! Lane 0 drives: the chooser sees only its state. Every chosen transition is
//! then applied to all lanes, so a concrete execution can shadow a symbolic
//! one step for step.

use crate::chooser::TransitionChooser;
use crate::error::{ReplayError, ReplayResult};
use serde::{Deserialize, Serialize};
use sieve_core::config::standard;
use sieve_core::Section;
use std::io::Write;

/// Advances and describes states of the replayed system
pub trait StateManager<S, T> {
    /// State reached by taking `transition` from `state`
    fn advance(&self, state: &S, transition: &T) -> S;

    /// One-line description of a transition
    fn describe_transition(&self, transition: &T) -> String;

    /// Full description of a state
    fn describe_state(&self, state: &S) -> String;
}

/// Replayer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Print flagged lanes after every step; otherwise only first and last
    pub print_all_states: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            print_all_states: true,
        }
    }
}

impl ReplayConfig {
    /// Read `showStates` from a section
    ///
    /// # Errors
    ///
    /// Returns error if the option is not boolean
    pub fn from_section(section: &Section) -> ReplayResult<Self> {
        let print_all_states =
            section
                .is_true(&standard::show_states())
                .map_err(|e| ReplayError::Configuration {
                    reason: e.to_string(),
                })?;
        Ok(Self { print_all_states })
    }
}

/// One execution replayed in lock-step with the others
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lane<S> {
    /// Current state
    pub state: S,
    /// Whether this lane's states are printed
    pub print: bool,
    /// Name shown in state headers
    pub name: Option<String>,
}

impl<S> Lane<S> {
    /// Create a printed, unnamed lane
    #[must_use]
    pub fn new(state: S) -> Self {
        Self {
            state,
            print: true,
            name: None,
        }
    }

    /// Set the name
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set whether the lane is printed
    #[must_use]
    pub fn printed(mut self, print: bool) -> Self {
        self.print = print;
        self
    }
}

/// Result of a completed replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayOutcome<S> {
    /// Number of transitions taken
    pub steps: usize,
    /// Lanes holding their final states
    pub lanes: Vec<Lane<S>>,
}

impl<S> ReplayOutcome<S> {
    /// Final state of the driving lane
    #[must_use]
    pub fn final_state(&self) -> Option<&S> {
        self.lanes.first().map(|lane| &lane.state)
    }
}

/// Replays transition sequences against a [`StateManager`]
pub struct Replayer<M, W = std::io::Stdout> {
    manager: M,
    out: W,
    config: ReplayConfig,
}

impl<M> Replayer<M, std::io::Stdout> {
    /// Create a replayer printing to stdout
    #[must_use]
    pub fn with_stdout(manager: M) -> Self {
        Self::new(manager, std::io::stdout())
    }
}

impl<M, W: Write> Replayer<M, W> {
    /// Create a replayer
    #[must_use]
    pub fn new(manager: M, out: W) -> Self {
        Self {
            manager,
            out,
            config: ReplayConfig::default(),
        }
    }

    /// Create with custom config
    #[must_use]
    pub fn with_config(mut self, config: ReplayConfig) -> Self {
        self.config = config;
        self
    }

    /// Print every state, or only the first and last
    pub fn set_print_all_states(&mut self, value: bool) {
        self.config.print_all_states = value;
    }

    /// Whether every state is printed
    #[must_use]
    pub fn print_all_states(&self) -> bool {
        self.config.print_all_states
    }

    /// Output sink
    #[must_use]
    pub fn output(&self) -> &W {
        &self.out
    }

    /// Consume the replayer, returning the output sink
    pub fn into_output(self) -> W {
        self.out
    }

    /// Replay from the given lanes until the chooser returns `None`.
    ///
    /// Lane 0's state is handed to the chooser; each chosen transition
    /// advances every lane. Flagged lanes are printed at the start, after
    /// every step if every state is printed, and otherwise once at the end.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::NoLanes`] for an empty lane list, the chooser's
    /// error (no lane is advanced further), or [`ReplayError::Output`]
    pub fn play<S, T, C>(&mut self, mut lanes: Vec<Lane<S>>, chooser: &mut C) -> ReplayResult<ReplayOutcome<S>>
    where
        M: StateManager<S, T>,
        C: TransitionChooser<S, T> + ?Sized,
    {
        if lanes.is_empty() {
            return Err(ReplayError::NoLanes);
        }
        let mut step = 0;
        self.print_lanes::<S, T>(step, &lanes)?;

        while let Some(transition) = chooser.choose(&lanes[0].state)? {
            step += 1;
            let label = self.manager.describe_transition(&transition);
            self.emit(format_args!("Step {}: {}", step, label))?;
            for lane in &mut lanes {
                lane.state = self.manager.advance(&lane.state, &transition);
            }
            tracing::debug!(step, transition = %label, "replayed step");
            if self.config.print_all_states {
                self.print_lanes::<S, T>(step, &lanes)?;
            }
        }

        if !self.config.print_all_states {
            self.print_lanes::<S, T>(step, &lanes)?;
        }
        self.emit(format_args!("Trace ends after {} steps.", step))?;
        tracing::info!(steps = step, lanes = lanes.len(), "replay finished");
        Ok(ReplayOutcome { steps: step, lanes })
    }

    /// Replay a single printed lane
    ///
    /// # Errors
    ///
    /// See [`Replayer::play`]
    pub fn play_single<S, T, C>(&mut self, initial: S, chooser: &mut C) -> ReplayResult<ReplayOutcome<S>>
    where
        M: StateManager<S, T>,
        C: TransitionChooser<S, T> + ?Sized,
    {
        self.play::<S, T, C>(vec![Lane::new(initial)], chooser)
    }

    /// Replay a symbolic lane and a concrete lane side by side.
    ///
    /// The symbolic lane drives and is printed only if `print_symbolic`; the
    /// concrete lane is always printed, so its final state is always shown.
    ///
    /// # Errors
    ///
    /// See [`Replayer::play`]
    pub fn play_dual<S, T, C>(
        &mut self,
        symbolic: S,
        concrete: S,
        print_symbolic: bool,
        chooser: &mut C,
    ) -> ReplayResult<ReplayOutcome<S>>
    where
        M: StateManager<S, T>,
        C: TransitionChooser<S, T> + ?Sized,
    {
        let lanes = vec![
            Lane::new(symbolic).named("Symbolic").printed(print_symbolic),
            Lane::new(concrete).named("Concrete"),
        ];
        self.play::<S, T, C>(lanes, chooser)
    }

    fn print_lanes<S, T>(&mut self, step: usize, lanes: &[Lane<S>]) -> ReplayResult<()>
    where
        M: StateManager<S, T>,
    {
        for lane in lanes.iter().filter(|lane| lane.print) {
            let header = match &lane.name {
                Some(name) => format!("State {} ({}):", step, name),
                None => format!("State {}:", step),
            };
            let body = self.manager.describe_state(&lane.state);
            self.emit(format_args!("\n{}\n{}\n", header, body))?;
        }
        Ok(())
    }

    fn emit(&mut self, message: std::fmt::Arguments<'_>) -> ReplayResult<()> {
        writeln!(self.out, "{}", message).map_err(|e| ReplayError::Output {
            reason: e.to_string(),
        })
    }
}
