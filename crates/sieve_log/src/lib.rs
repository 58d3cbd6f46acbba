//! SIEVE Fault Log
//!
//! Records faults found during a search. Equivalent faults are reported once,
//! each fault class keeps the shortest trace seen so far, and the search is
//! truncated after a configured number of reports.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod entry;
pub mod error;
pub mod error_log;
pub mod search;

pub use entry::{Fault, FaultKind, FaultRecord, LogEntry};
pub use error::{LogError, LogResult};
pub use error_log::{ErrorLog, LogConfig, ReportOutcome};
pub use search::{SearchHandle, TraceStack};
