//! SIEVE Core Types
//!
//! This crate contains pure types and logic with no file I/O.
//! Trace documents and configuration dumps serialize to stable JSON.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod id;
pub mod time;
pub mod trace;

// Re-exports
pub use config::{Configuration, OptionKind, OptionSpec, OptionValue, Section};
pub use error::{CoreError, CoreResult};
pub use id::{FaultId, SessionName};
pub use time::Timestamp;
pub use trace::{GuideStep, TraceDocument, TRACE_FORMAT_VERSION};
