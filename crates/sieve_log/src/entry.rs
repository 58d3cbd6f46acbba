//! Fault records.
//!
//! A [`LogEntry`] is whatever the search reports. Its [`Ord`] implementation
//! is the equivalence test of the log: two entries comparing
//! [`Ordering::Equal`] belong to the same fault class and only one of them is
//! kept. The same order fixes the sequence of entries in the persisted report.
//!
//! Once admitted, an entry is wrapped in a [`FaultRecord`] carrying the id,
//! trace path and trace length the log assigned to it.

use serde::{Deserialize, Serialize};
use sieve_core::FaultId;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// A fault reported by the search.
///
/// `Ord` must be a total order in which `Equal` means "same fault class".
/// Fields that do not identify the class (messages, values observed at the
/// time) must not take part in the comparison.
pub trait LogEntry: Ord {
    /// One-line summary printed when the fault is reported
    fn summary(&self) -> String;

    /// Full description written to the persisted report
    fn description(&self) -> String;
}

/// An admitted fault class.
///
/// Immutable: replacing the trace of a class builds a new record that reuses
/// the id and trace path of the old one.
#[derive(Debug, Clone)]
pub struct FaultRecord<E> {
    id: FaultId,
    trace_path: PathBuf,
    length: usize,
    entry: E,
}

impl<E: LogEntry> FaultRecord<E> {
    /// Create a record
    #[must_use]
    pub fn new(id: FaultId, trace_path: PathBuf, length: usize, entry: E) -> Self {
        Self {
            id,
            trace_path,
            length,
            entry,
        }
    }

    /// Id assigned at admission
    #[must_use]
    pub fn id(&self) -> FaultId {
        self.id
    }

    /// Path of the trace file
    #[must_use]
    pub fn trace_path(&self) -> &Path {
        &self.trace_path
    }

    /// Length of the retained trace
    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }

    /// The reported entry
    #[must_use]
    pub fn entry(&self) -> &E {
        &self.entry
    }

    /// New record for a shorter occurrence of the same class
    #[must_use]
    pub fn superseded_by(&self, length: usize, entry: E) -> Self {
        Self::new(self.id, self.trace_path.clone(), length, entry)
    }

    /// Render for the persisted report
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "Error {} (trace length {}, file {})\n{}",
            self.id,
            self.length,
            self.trace_path.display(),
            self.entry.description()
        )
    }
}

impl<E: LogEntry> PartialEq for FaultRecord<E> {
    fn eq(&self, other: &Self) -> bool {
        self.entry.cmp(&other.entry) == Ordering::Equal
    }
}

impl<E: LogEntry> Eq for FaultRecord<E> {}

impl<E: LogEntry> PartialOrd for FaultRecord<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E: LogEntry> Ord for FaultRecord<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.entry.cmp(&other.entry)
    }
}

// Lets the canonical set be searched with a bare entry.
impl<E: LogEntry> Borrow<E> for FaultRecord<E> {
    fn borrow(&self) -> &E {
        &self.entry
    }
}

/// Category of a fault
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FaultKind {
    /// Assertion violated
    Assertion,
    /// No transition enabled in a non-final state
    Deadlock,
    /// Division by zero
    DivisionByZero,
    /// Array or buffer index out of range
    OutOfBounds,
    /// Dereference of an invalid pointer
    InvalidPointer,
    /// Application-defined category
    Other(String),
}

impl std::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Assertion => write!(f, "assertion violation"),
            Self::Deadlock => write!(f, "deadlock"),
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::OutOfBounds => write!(f, "out of bounds"),
            Self::InvalidPointer => write!(f, "invalid pointer"),
            Self::Other(kind) => write!(f, "{}", kind),
        }
    }
}

/// General-purpose fault entry.
///
/// Faults of the same kind at the same location are equivalent; the message
/// is informational only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fault {
    /// Category
    pub kind: FaultKind,
    /// Source location or transition where the fault occurred
    pub location: String,
    /// Details observed at this occurrence
    pub message: String,
}

impl Fault {
    /// Create a fault
    #[must_use]
    pub fn new(kind: FaultKind, location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            location: location.into(),
            message: message.into(),
        }
    }
}

impl PartialEq for Fault {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Fault {}

impl PartialOrd for Fault {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fault {
    fn cmp(&self, other: &Self) -> Ordering {
        self.kind
            .cmp(&other.kind)
            .then_with(|| self.location.cmp(&other.location))
    }
}

impl LogEntry for Fault {
    fn summary(&self) -> String {
        format!("{} at {}", self.kind, self.location)
    }

    fn description(&self) -> String {
        if self.message.is_empty() {
            self.summary()
        } else {
            format!("{} at {}\n{}", self.kind, self.location, self.message)
        }
    }
}
