//! lsmkv CLI
//!
//! Runs a line-oriented command script against an in-memory engine.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use clap::Parser;
use lsmkv::{Command, CompactionScope, CompactionTrigger, Config, Engine, LsmError};
use thiserror::Error;
use tracing_subscriber::{fmt, EnvFilter};

type TextEngine = Engine<String, String>;

/// Errors surfaced while running a script
#[derive(Debug, Error)]
enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Engine(#[from] LsmError),
}

/// lsmkv CLI
#[derive(Parser, Debug)]
#[command(name = "lsmkv-cli")]
#[command(about = "Script an in-memory LSM key-value engine")]
#[command(version)]
struct Args {
    /// Script file to run (reads stdin when omitted)
    script: Option<PathBuf>,

    /// Distinct keys the memtable holds before flushing
    #[arg(short, long, default_value_t = lsmkv::config::DEFAULT_FLUSH_THRESHOLD)]
    flush_threshold: usize,

    /// Compact only the segment chain, leaving the memtable alone
    #[arg(long)]
    segments_only: bool,

    /// Compact automatically once a flush leaves this many segments
    #[arg(short, long)]
    auto_compact: Option<usize>,

    /// Replay the built-in insert/search/delete/compact walkthrough
    #[arg(long, conflicts_with = "script")]
    demo: bool,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,lsmkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!("lsmkv CLI v{}", lsmkv::VERSION);

    let config = Config::builder()
        .flush_threshold(args.flush_threshold)
        .compaction_scope(if args.segments_only {
            CompactionScope::SegmentsOnly
        } else {
            CompactionScope::IncludeMemtable
        })
        .compaction_trigger(match args.auto_compact {
            Some(count) => CompactionTrigger::SegmentCount(count),
            None => CompactionTrigger::Manual,
        })
        .build();

    let mut engine = match TextEngine::new(config) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Failed to create engine: {}", e);
            std::process::exit(1);
        }
    };

    let result = if args.demo {
        run_demo(&mut engine)
    } else {
        run_script(&mut engine, args.script)
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }

    tracing::info!("Final state: {}", engine.stats());
}

/// Run commands from a file or stdin, one per line
fn run_script(engine: &mut TextEngine, script: Option<PathBuf>) -> Result<(), CliError> {
    let reader: Box<dyn BufRead> = match script {
        Some(path) => {
            tracing::info!("Running script {}", path.display());
            Box::new(BufReader::new(File::open(path)?))
        }
        None => Box::new(BufReader::new(io::stdin())),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        match run_line(engine, &line, &mut out) {
            Ok(()) => {}
            // A bad line is reported and skipped; the script keeps going
            Err(CliError::Engine(e)) => tracing::warn!("line {}: {}", line_no + 1, e),
            Err(e) => return Err(e),
        }
    }

    out.flush()?;
    Ok(())
}

/// Run one script line, writing any output to `out`
fn run_line(engine: &mut TextEngine, line: &str, out: &mut impl Write) -> Result<(), CliError> {
    match line.trim() {
        "dump" => {
            write!(out, "{}", engine)?;
            return Ok(());
        }
        "stats" => {
            writeln!(out, "{}", engine.stats())?;
            return Ok(());
        }
        _ => {}
    }

    let command = match Command::<String, String>::parse_line(line)? {
        Some(cmd) => cmd,
        None => return Ok(()),
    };

    match command {
        Command::Get { key } => {
            match engine.get(&key) {
                Some(value) => writeln!(out, "{} = {}", key, value)?,
                None => writeln!(out, "{} not found", key)?,
            }
        }
        Command::Compact => {
            let stats = engine.compact()?;
            writeln!(out, "compacted: {}", stats)?;
        }
        other => {
            engine.execute(other)?;
        }
    }

    Ok(())
}

/// The walkthrough: inserts, a flush, searches, deletes, a compaction,
/// and searches for the deleted keys
fn run_demo(engine: &mut TextEngine) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let mut script = Vec::new();
    for key in [15, 10, 20, 5, 12, 25, 18, 30, 7] {
        script.push(format!("put {} {}", key, key * 100));
    }
    script.push("flush".to_string());
    script.push("dump".to_string());
    for key in [12, 20, 100] {
        script.push(format!("get {}", key));
    }
    for key in [10, 25] {
        script.push(format!("del {}", key));
    }
    script.push("flush".to_string());
    script.push("dump".to_string());
    script.push("compact".to_string());
    script.push("dump".to_string());
    for key in [10, 25] {
        script.push(format!("get {}", key));
    }

    for line in &script {
        writeln!(out, "> {}", line)?;
        run_line(engine, line, &mut out)?;
    }

    out.flush()?;
    Ok(())
}
