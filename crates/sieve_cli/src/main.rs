//! SIEVE CLI
//!
//! Inspection of fault reports, trace files and configuration dumps.

#![warn(missing_docs)]
#![warn(clippy::all)]

use clap::{Parser, Subcommand};
use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};
use sieve_core::{Configuration, SessionName};
use sieve_log::{ErrorLog, Fault, LogConfig};
use sieve_replay::{Guide, ReplayConfig};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sieve")]
#[command(about = "SIEVE - counterexample triage and replay", long_about = None)]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty fault log and write its report
    Init {
        /// Log directory
        #[arg(short, long)]
        dir: PathBuf,
        /// Session name
        #[arg(short, long)]
        session: String,
        /// Error bound
        #[arg(short, long, default_value_t = 5)]
        bound: usize,
    },
    /// Print a persisted fault report
    Report {
        /// Log directory
        #[arg(short, long)]
        dir: PathBuf,
        /// Session name
        #[arg(short, long)]
        session: String,
    },
    /// Print the choices recorded in a trace file
    Trace {
        /// Path to the trace file
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Validate and render a configuration dump
    Config {
        /// Path to the JSON configuration
        #[arg(short, long)]
        file: PathBuf,
        /// Section whose log and replay settings to show
        #[arg(long)]
        section: Option<String>,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn init_log(dir: &Path, session: &str, bound: usize) -> Result<PathBuf> {
    let config = LogConfig::new(dir, session).with_error_bound(bound);
    let log: ErrorLog<Fault, _> = ErrorLog::new(config, std::io::sink())?;
    Ok(log.persist()?)
}

fn read_report(dir: &Path, session: &str) -> Result<String> {
    let session = SessionName::new(session)?;
    let path = dir.join(session.report_file_name());
    std::fs::read_to_string(&path).wrap_err_with(|| format!("reading {}", path.display()))
}

fn describe_trace(file: &Path) -> Result<String> {
    let mut guide = Guide::load(file)?;
    let mut out = String::new();
    writeln!(out, "Session: {}", guide.session())?;
    if !guide.config().is_empty() {
        writeln!(out, "Configuration:")?;
        for line in guide.config() {
            writeln!(out, "  {}", line)?;
        }
    }
    writeln!(out, "Steps: {}", guide.total())?;
    while let Some(step) = guide.next_step() {
        writeln!(out, "Step {}: {}", guide.position(), step)?;
    }
    Ok(out)
}

fn describe_config(file: &Path, section: Option<&str>) -> Result<String> {
    let text = std::fs::read_to_string(file).wrap_err_with(|| format!("reading {}", file.display()))?;
    let config: Configuration = serde_json::from_str(&text)?;
    config.validate()?;

    let mut out = String::new();
    for line in config.render() {
        writeln!(out, "{}", line)?;
    }
    if let Some(name) = section {
        let section = config
            .section(name)
            .ok_or_else(|| eyre!("no section named {}", name))?;
        let log = LogConfig::from_section(section)?;
        let replay = ReplayConfig::from_section(section)?;
        writeln!(out, "log: {}", serde_json::to_string(&log)?)?;
        writeln!(out, "replay: {}", serde_json::to_string(&replay)?)?;
    }
    Ok(out)
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.json_logs);
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "sieve starting");

    match cli.command {
        Commands::Init { dir, session, bound } => {
            let path = init_log(&dir, &session, bound)?;
            println!("Wrote {}", path.display());
            Ok(())
        }
        Commands::Report { dir, session } => {
            print!("{}", read_report(&dir, &session)?);
            Ok(())
        }
        Commands::Trace { file } => {
            print!("{}", describe_trace(&file)?);
            Ok(())
        }
        Commands::Config { file, section } => {
            print!("{}", describe_config(&file, section.as_deref())?);
            Ok(())
        }
    }
}
