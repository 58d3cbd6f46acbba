//! Deduplicating, bounded fault log.

use crate::entry::{FaultRecord, LogEntry};
use crate::error::{LogError, LogResult};
use crate::search::SearchHandle;
use serde::{Deserialize, Serialize};
use sieve_core::config::standard;
use sieve_core::{FaultId, Section, SessionName, Timestamp};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Fault log configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Directory for the report and trace files
    pub directory: PathBuf,
    /// Root of every file name the log writes
    pub session_name: String,
    /// Number of reports after which the search is truncated
    pub error_bound: usize,
}

impl LogConfig {
    /// Create with the default error bound
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>, session_name: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            session_name: session_name.into(),
            error_bound: standard::DEFAULT_ERROR_BOUND as usize,
        }
    }

    /// Set the error bound
    #[must_use]
    pub fn with_error_bound(mut self, bound: usize) -> Self {
        self.error_bound = bound;
        self
    }

    /// Read `directory`, `session` and `errorBound` from a section
    ///
    /// # Errors
    ///
    /// Returns error if an option has the wrong type or the bound is negative
    pub fn from_section(section: &Section) -> LogResult<Self> {
        let directory = standard::directory();
        let session = standard::session();
        let bound = standard::error_bound();
        let config_err = |e: sieve_core::CoreError| LogError::Configuration {
            reason: e.to_string(),
        };

        let directory = section.string(&directory).map_err(config_err)?.unwrap_or_default();
        let session_name = section.string(&session).map_err(config_err)?.unwrap_or_default();
        let error_bound = section
            .integer(&bound)
            .map_err(config_err)?
            .unwrap_or(standard::DEFAULT_ERROR_BOUND);
        let error_bound = usize::try_from(error_bound).map_err(|_| LogError::Configuration {
            reason: format!("error bound must be non-negative, saw {}", error_bound),
        })?;

        Ok(Self::new(directory, session_name).with_error_bound(error_bound))
    }
}

/// How a report was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportOutcome {
    /// New fault class admitted
    Admitted {
        /// Id assigned to the class
        id: FaultId,
    },
    /// Shorter trace replaced the stored one
    Replaced {
        /// Id of the class
        id: FaultId,
        /// Length of the discarded trace
        previous_length: usize,
    },
    /// Equivalent fault with a trace at least as long; nothing stored
    Ignored {
        /// Id of the equivalent class
        id: FaultId,
    },
}

impl ReportOutcome {
    /// Id of the fault class the report resolved to
    #[must_use]
    pub fn id(&self) -> FaultId {
        match self {
            Self::Admitted { id } | Self::Replaced { id, .. } | Self::Ignored { id } => *id,
        }
    }
}

/// Log of the faults found by one search session.
///
/// Not synchronized; share behind a mutex if several threads report.
pub struct ErrorLog<E, W = std::io::Stdout> {
    directory: PathBuf,
    session: SessionName,
    records: BTreeSet<FaultRecord<E>>,
    reported: usize,
    error_bound: usize,
    truncated: bool,
    created_at: Timestamp,
    out: W,
}

impl<E: LogEntry> ErrorLog<E, std::io::Stdout> {
    /// Create a log that prints progress to stdout
    ///
    /// # Errors
    ///
    /// See [`ErrorLog::new`]
    pub fn with_stdout(config: LogConfig) -> LogResult<Self> {
        Self::new(config, std::io::stdout())
    }
}

impl<E: LogEntry, W: Write> ErrorLog<E, W> {
    /// Create a log, creating its directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Configuration`] if the session name is empty or the
    /// path exists and is not a directory, [`LogError::Io`] if the directory
    /// cannot be created
    pub fn new(config: LogConfig, out: W) -> LogResult<Self> {
        let session = SessionName::new(config.session_name).map_err(|e| LogError::Configuration {
            reason: e.to_string(),
        })?;
        let directory = config.directory;

        if !directory.exists() {
            std::fs::create_dir_all(&directory).map_err(|e| LogError::io(&directory, &e))?;
        }
        if !directory.is_dir() {
            return Err(LogError::Configuration {
                reason: format!("no directory named {}", directory.display()),
            });
        }

        info!(session = %session, directory = %directory.display(), bound = config.error_bound, "opened fault log");
        Ok(Self {
            directory,
            session,
            records: BTreeSet::new(),
            reported: 0,
            error_bound: config.error_bound,
            truncated: false,
            created_at: Timestamp::now(),
            out,
        })
    }

    /// Directory holding the report and traces
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Session name
    #[must_use]
    pub fn session_name(&self) -> &SessionName {
        &self.session
    }

    /// Path of the persisted report
    #[must_use]
    pub fn report_path(&self) -> PathBuf {
        self.directory.join(self.session.report_file_name())
    }

    /// Path of the trace for a fault id
    #[must_use]
    pub fn trace_path(&self, id: FaultId) -> PathBuf {
        self.directory.join(self.session.trace_file_name(id))
    }

    /// Configured error bound
    #[must_use]
    pub fn error_bound(&self) -> usize {
        self.error_bound
    }

    /// Change the error bound
    pub fn set_error_bound(&mut self, bound: usize) {
        self.error_bound = bound;
    }

    /// Number of reports, equivalent ones included
    #[must_use]
    pub fn reported_count(&self) -> usize {
        self.reported
    }

    /// Number of distinct fault classes
    #[must_use]
    pub fn distinct_count(&self) -> usize {
        self.records.len()
    }

    /// Whether the error bound was reached
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// When the log was created
    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Admitted records in ascending order
    pub fn records(&self) -> impl Iterator<Item = &FaultRecord<E>> {
        self.records.iter()
    }

    /// Record by id
    #[must_use]
    pub fn get(&self, id: FaultId) -> Option<&FaultRecord<E>> {
        self.records.iter().find(|r| r.id() == id)
    }

    /// Progress output sink
    #[must_use]
    pub fn output(&self) -> &W {
        &self.out
    }

    /// Report a fault found at the current position of `search`.
    ///
    /// Equivalent faults are stored once. A strictly shorter trace replaces
    /// the stored one under the same id and path; anything else is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::ExcessiveErrors`] once the number of reports
    /// reaches the error bound (the report itself is still recorded), or
    /// [`LogError::Io`] if a trace cannot be captured
    pub fn report<S>(&mut self, search: &S, entry: E) -> LogResult<ReportOutcome>
    where
        S: SearchHandle + ?Sized,
    {
        let depth = search.depth();
        Self::say(&mut self.out, format_args!(
            "Error {} encountered at depth {}:\n{}",
            self.reported,
            depth,
            entry.summary()
        ))?;

        let existing = self
            .records
            .get(&entry)
            .map(|r| (r.id(), r.length()));

        let outcome = match existing {
            Some((id, old_length)) if depth < old_length => {
                Self::say(&mut self.out, format_args!(
                    "Equivalent to error {}; new trace ({}) is shorter than old ({}): replacing",
                    id, depth, old_length
                ))?;
                self.replace(search, depth, entry)?;
                info!(%id, depth, old_length, "replaced fault trace with shorter one");
                ReportOutcome::Replaced {
                    id,
                    previous_length: old_length,
                }
            }
            Some((id, old_length)) => {
                Self::say(&mut self.out, format_args!(
                    "Equivalent to error {}; new trace ({}) is not shorter than old ({}): ignoring",
                    id, depth, old_length
                ))?;
                debug!(%id, depth, old_length, "ignored equivalent fault");
                ReportOutcome::Ignored { id }
            }
            None => {
                let id = FaultId::from_raw(self.records.len());
                let path = self.trace_path(id);
                Self::say(&mut self.out, format_args!(
                    "Logging new error {}, writing trace to {}",
                    id,
                    path.display()
                ))?;
                search.capture_trace(&path)?;
                self.records.insert(FaultRecord::new(id, path, depth, entry));
                info!(%id, depth, "admitted new fault");
                ReportOutcome::Admitted { id }
            }
        };

        self.reported += 1;
        if self.reported >= self.error_bound {
            self.truncated = true;
            warn!(bound = self.error_bound, reported = self.reported, "error bound reached; truncating search");
            return Err(LogError::ExcessiveErrors {
                bound: self.error_bound,
            });
        }
        Ok(outcome)
    }

    /// Swap in a shorter trace for an admitted class.
    ///
    /// The new trace is captured next to the old one and renamed over it, so
    /// a failed capture leaves the old trace in place.
    fn replace<S>(&mut self, search: &S, depth: usize, entry: E) -> LogResult<()>
    where
        S: SearchHandle + ?Sized,
    {
        let Some(old) = self.records.take(&entry) else {
            return Ok(());
        };
        let path = old.trace_path().to_path_buf();
        let staging = path.with_extension("trace.partial");

        let captured = search
            .capture_trace(&staging)
            .and_then(|()| std::fs::rename(&staging, &path).map_err(|e| LogError::io(&path, &e)));
        if let Err(err) = captured {
            let _ = std::fs::remove_file(&staging);
            self.records.insert(old);
            return Err(err);
        }

        self.records.insert(old.superseded_by(depth, entry));
        Ok(())
    }

    fn say(out: &mut W, message: std::fmt::Arguments<'_>) -> LogResult<()> {
        writeln!(out, "{}", message).map_err(|e| LogError::Io {
            path: "<output>".to_string(),
            reason: e.to_string(),
        })
    }

    /// Write the human-readable report: a header, then every admitted record
    /// in ascending order, each followed by a blank line.
    ///
    /// # Errors
    ///
    /// Returns error if writing fails
    pub fn write_report<O: Write + ?Sized>(&self, out: &mut O) -> std::io::Result<()> {
        writeln!(out, "Session name....... {}", self.session)?;
        writeln!(out, "Directory.......... {}", self.directory.display())?;
        writeln!(out, "Date............... {}", self.created_at)?;
        writeln!(out, "Reported errors.... {}", self.reported)?;
        writeln!(out, "Distinct errors.... {}", self.records.len())?;
        writeln!(out, "Search truncated... {}", self.truncated)?;
        writeln!(out)?;
        for record in &self.records {
            writeln!(out, "{}", record.render())?;
            writeln!(out)?;
        }
        Ok(())
    }

    /// Write the report to `<directory>/<session>_log.txt`.
    ///
    /// The file is replaced atomically; on failure no partial report is left
    /// behind.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Io`] if the report cannot be written
    pub fn persist(&self) -> LogResult<PathBuf> {
        let path = self.report_path();
        let mut file = Self::staging_file(&self.directory).map_err(|e| LogError::io(&path, &e))?;
        self.write_report(&mut file)
            .and_then(|()| file.flush())
            .map_err(|e| LogError::io(&path, &e))?;
        file.persist(&path).map_err(|e| LogError::io(&path, &e.error))?;
        info!(path = %path.display(), distinct = self.records.len(), "persisted fault report");
        Ok(path)
    }

    /// Temp file for the report, with the mode the trace files get
    /// (0o666 less the umask)
    fn staging_file(directory: &Path) -> std::io::Result<tempfile::NamedTempFile> {
        #[cfg_attr(not(unix), allow(unused_mut))]
        let mut builder = tempfile::Builder::new();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(std::fs::Permissions::from_mode(0o666));
        }
        builder.tempfile_in(directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{Fault, FaultKind};
    use crate::search::TraceStack;
    use sieve_core::{GuideStep, OptionValue, TraceDocument};
    use tempfile::TempDir;

    fn setup(bound: usize) -> (TempDir, ErrorLog<Fault, Vec<u8>>) {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig::new(dir.path().join("out"), "session").with_error_bound(bound);
        let log = ErrorLog::new(config, Vec::new()).unwrap();
        (dir, log)
    }

    fn stack_of(depth: usize) -> TraceStack {
        let mut stack = TraceStack::new(SessionName::new("session").unwrap());
        for i in 0..depth {
            stack.push(GuideStep::new(depth, i));
        }
        stack
    }

    fn fault_a(message: &str) -> Fault {
        Fault::new(FaultKind::Assertion, "main.c:12", message)
    }

    fn fault_b() -> Fault {
        Fault::new(FaultKind::DivisionByZero, "main.c:40", "y / 0")
    }

    fn trace_len(path: &Path) -> usize {
        TraceDocument::decode(&std::fs::read(path).unwrap())
            .unwrap()
            .len()
    }

    #[test]
    fn test_new_creates_directory() {
        let (_dir, log) = setup(5);
        assert!(log.directory().is_dir());
        assert_eq!(log.reported_count(), 0);
        assert_eq!(log.distinct_count(), 0);
        assert!(!log.is_truncated());
    }

    #[test]
    fn test_new_rejects_empty_session() {
        let dir = tempfile::tempdir().unwrap();
        let result: LogResult<ErrorLog<Fault, Vec<u8>>> =
            ErrorLog::new(LogConfig::new(dir.path(), ""), Vec::new());
        assert!(matches!(result, Err(LogError::Configuration { .. })));
    }

    #[test]
    fn test_new_rejects_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain");
        std::fs::write(&file, b"x").unwrap();
        let result: LogResult<ErrorLog<Fault, Vec<u8>>> =
            ErrorLog::new(LogConfig::new(&file, "s"), Vec::new());
        assert!(matches!(result, Err(LogError::Configuration { .. })));
    }

    #[test]
    fn test_admit_writes_trace() {
        let (_dir, mut log) = setup(5);
        let outcome = log.report(&stack_of(5), fault_a("first")).unwrap();
        assert_eq!(outcome, ReportOutcome::Admitted { id: FaultId::from_raw(0) });

        let record = log.get(FaultId::from_raw(0)).unwrap();
        assert_eq!(record.length(), 5);
        assert_eq!(record.trace_path(), log.directory().join("session_0.trace"));
        assert_eq!(trace_len(record.trace_path()), 5);
    }

    #[test]
    fn test_equivalent_faults_deduplicated() {
        let (_dir, mut log) = setup(5);
        log.report(&stack_of(4), fault_a("first")).unwrap();
        let outcome = log.report(&stack_of(4), fault_a("second")).unwrap();

        assert_eq!(outcome, ReportOutcome::Ignored { id: FaultId::from_raw(0) });
        assert_eq!(log.reported_count(), 2);
        assert_eq!(log.distinct_count(), 1);
    }

    #[test]
    fn test_shorter_trace_replaces() {
        let (_dir, mut log) = setup(5);
        log.report(&stack_of(7), fault_a("long")).unwrap();
        let outcome = log.report(&stack_of(3), fault_a("short")).unwrap();

        assert_eq!(
            outcome,
            ReportOutcome::Replaced {
                id: FaultId::from_raw(0),
                previous_length: 7
            }
        );
        let record = log.get(FaultId::from_raw(0)).unwrap();
        assert_eq!(record.length(), 3);
        assert_eq!(record.entry().message, "short");
        assert_eq!(record.trace_path(), log.trace_path(FaultId::from_raw(0)));
        assert_eq!(trace_len(record.trace_path()), 3);
        assert!(!record.trace_path().with_extension("trace.partial").exists());
    }

    #[test]
    fn test_longer_trace_ignored() {
        let (_dir, mut log) = setup(5);
        log.report(&stack_of(3), fault_a("short")).unwrap();
        let outcome = log.report(&stack_of(7), fault_a("long")).unwrap();

        assert_eq!(outcome, ReportOutcome::Ignored { id: FaultId::from_raw(0) });
        let record = log.get(FaultId::from_raw(0)).unwrap();
        assert_eq!(record.length(), 3);
        assert_eq!(record.entry().message, "short");
        assert_eq!(trace_len(record.trace_path()), 3);
    }

    #[test]
    fn test_equal_length_ignored() {
        let (_dir, mut log) = setup(5);
        log.report(&stack_of(3), fault_a("one")).unwrap();
        let outcome = log.report(&stack_of(3), fault_a("two")).unwrap();
        assert!(matches!(outcome, ReportOutcome::Ignored { .. }));
        assert_eq!(log.records().next().unwrap().entry().message, "one");
    }

    #[test]
    fn test_ids_are_sequential() {
        let (_dir, mut log) = setup(10);
        log.report(&stack_of(1), fault_b()).unwrap();
        log.report(&stack_of(1), fault_a("x")).unwrap();
        assert!(log.get(FaultId::from_raw(0)).unwrap().entry().kind == FaultKind::DivisionByZero);
        assert!(log.get(FaultId::from_raw(1)).unwrap().entry().kind == FaultKind::Assertion);
        assert!(log.trace_path(FaultId::from_raw(1)).exists());
    }

    #[test]
    fn test_bound_raises_on_nth_report() {
        let (_dir, mut log) = setup(3);
        assert!(log.report(&stack_of(2), fault_a("1")).is_ok());
        assert!(log.report(&stack_of(2), fault_a("2")).is_ok());
        assert!(!log.is_truncated());

        let result = log.report(&stack_of(2), fault_a("3"));
        assert_eq!(result, Err(LogError::ExcessiveErrors { bound: 3 }));
        assert!(log.is_truncated());
        assert_eq!(log.reported_count(), 3);
    }

    #[test]
    fn test_bound_two_scenario() {
        let (_dir, mut log) = setup(2);
        log.report(&stack_of(5), fault_a("A")).unwrap();
        assert_eq!(log.reported_count(), 1);
        assert_eq!(log.distinct_count(), 1);

        let result = log.report(&stack_of(2), fault_b());
        assert_eq!(result, Err(LogError::ExcessiveErrors { bound: 2 }));
        assert_eq!(log.reported_count(), 2);
        assert_eq!(log.distinct_count(), 2);
        assert!(log.is_truncated());
    }

    #[test]
    fn test_truncation_is_sticky() {
        let (_dir, mut log) = setup(1);
        assert!(log.report(&stack_of(1), fault_a("1")).is_err());
        log.set_error_bound(10);
        log.report(&stack_of(1), fault_b()).unwrap();
        assert!(log.is_truncated());
    }

    #[test]
    fn test_progress_output() {
        let (_dir, mut log) = setup(5);
        log.report(&stack_of(4), fault_a("x")).unwrap();
        log.report(&stack_of(2), fault_a("y")).unwrap();
        let text = String::from_utf8(log.output().clone()).unwrap();
        assert!(text.contains("Error 0 encountered at depth 4:\nassertion violation at main.c:12"));
        assert!(text.contains("Error 1 encountered at depth 2:"));
        assert!(text.contains("replacing"));
    }

    #[test]
    fn test_persist_report_layout() {
        let (_dir, mut log) = setup(5);
        log.report(&stack_of(2), fault_b()).unwrap();
        log.report(&stack_of(3), fault_a("boom")).unwrap();
        let path = log.persist().unwrap();
        assert_eq!(path, log.directory().join("session_log.txt"));

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Session name....... session");
        assert_eq!(lines[3], "Reported errors.... 2");
        assert_eq!(lines[4], "Distinct errors.... 2");
        assert_eq!(lines[5], "Search truncated... false");
        assert_eq!(lines[6], "");
        // ascending order: assertion before division by zero
        assert!(lines[7].starts_with("Error 1 "));
        let first = text.find("assertion violation").unwrap();
        let second = text.find("division by zero").unwrap();
        assert!(first < second);
        assert!(text.ends_with("y / 0\n\n"));
    }

    #[test]
    fn test_persist_is_stable() {
        let (_dir, mut log) = setup(5);
        log.report(&stack_of(2), fault_b()).unwrap();
        let path = log.persist().unwrap();
        let first = std::fs::read(&path).unwrap();
        log.persist().unwrap();
        let second = std::fs::read(&path).unwrap();
        assert_eq!(first, second);
    }

    #[cfg(unix)]
    #[test]
    fn test_report_mode_matches_trace_mode() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, mut log) = setup(5);
        log.report(&stack_of(2), fault_b()).unwrap();
        let report = log.persist().unwrap();

        let mode = |p: &Path| std::fs::metadata(p).unwrap().permissions().mode() & 0o777;
        let trace_mode = mode(&log.trace_path(FaultId::from_raw(0)));
        assert_eq!(mode(&report), trace_mode);
    }

    #[test]
    fn test_persist_failure_leaves_no_file() {
        let (_dir, mut log) = setup(5);
        log.report(&stack_of(2), fault_b()).unwrap();
        std::fs::create_dir(log.report_path()).unwrap();

        let result = log.persist();
        assert!(matches!(result, Err(LogError::Io { .. })));

        let names: Vec<String> = std::fs::read_dir(log.directory())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 2, "unexpected files: {:?}", names);
        assert!(log.trace_path(FaultId::from_raw(0)).exists());
        assert_eq!(log.distinct_count(), 1);
    }

    #[test]
    fn test_log_config_from_section() {
        let mut section = Section::anonymous();
        section
            .set_scalar(&standard::error_bound(), Some(OptionValue::Integer(9)))
            .unwrap();
        section
            .set_scalar(&standard::session(), Some("run".into()))
            .unwrap();
        let config = LogConfig::from_section(&section).unwrap();
        assert_eq!(config.error_bound, 9);
        assert_eq!(config.session_name, "run");
        assert_eq!(config.directory, PathBuf::from("SIEVE_OUTPUT"));

        section
            .set_scalar(&standard::error_bound(), Some(OptionValue::Integer(-1)))
            .unwrap();
        assert!(LogConfig::from_section(&section).is_err());
    }

    /// Search handle whose captures always fail
    struct BrokenSearch(usize);

    impl SearchHandle for BrokenSearch {
        fn depth(&self) -> usize {
            self.0
        }

        fn capture_trace(&self, path: &Path) -> LogResult<()> {
            Err(LogError::Io {
                path: path.display().to_string(),
                reason: "disk full".to_string(),
            })
        }
    }

    #[test]
    fn test_failed_replacement_keeps_old_trace() {
        let (_dir, mut log) = setup(5);
        log.report(&stack_of(6), fault_a("long")).unwrap();

        let result = log.report(&BrokenSearch(2), fault_a("short"));
        assert!(matches!(result, Err(LogError::Io { .. })));

        let record = log.get(FaultId::from_raw(0)).unwrap();
        assert_eq!(record.length(), 6);
        assert_eq!(trace_len(record.trace_path()), 6);
    }

    proptest::proptest! {
        #[test]
        fn prop_distinct_count_matches_classes(
            reports in proptest::collection::vec((0u8..4, 1usize..10), 1..20)
        ) {
            let (_dir, mut log) = setup(usize::MAX);
            let mut shortest = std::collections::BTreeMap::new();
            for (class, depth) in &reports {
                let fault = Fault::new(FaultKind::Assertion, format!("loc{}", class), "");
                log.report(&stack_of(*depth), fault).unwrap();
                let best = shortest.entry(*class).or_insert(*depth);
                *best = (*best).min(*depth);
            }
            proptest::prop_assert_eq!(log.reported_count(), reports.len());
            proptest::prop_assert_eq!(log.distinct_count(), shortest.len());
            for record in log.records() {
                let class: u8 = record.entry().location[3..].parse().unwrap();
                proptest::prop_assert_eq!(record.length(), shortest[&class]);
            }
        }
    }
}
