//! Biathlon Results CLI Application
//!
//! Command-line interface for the biathlon race processor. It uses the
//! biathlon-core library and adds:
//! - Configuration loading (JSON or TOML)
//! - Printing status lines while the event log is processed
//! - Writing the results table (TXT/JSON)

use anyhow::{Context, Result};
use biathlon_core::{build_results, read_events, RaceProcessor};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

mod config;
mod report;

use report::OutputFormat;

/// Biathlon Results - Process a race event log and print the results table
#[derive(Parser, Debug)]
#[command(name = "biathlon-cli")]
#[command(about = "Process a biathlon race event log", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the race configuration (JSON, or TOML with a .toml extension)
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Path to the event log
    #[arg(value_name = "EVENTS")]
    events: PathBuf,

    /// Results table format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Txt)]
    format: OutputFormat,

    /// Output file for the results table (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Do not print status lines while processing events
    #[arg(long)]
    no_status: bool,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all log output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Biathlon CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using race processor library v{}", biathlon_core::VERSION);

    let config = config::load_config(&args.config)?;
    let events = read_events(&args.events)
        .with_context(|| format!("Failed to read event log: {:?}", args.events))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let mut processor = RaceProcessor::new(&config);
    let lines = processor.process(&events);
    if !args.no_status {
        for line in &lines {
            writeln!(out, "{}", line)?;
        }
    }

    let results = build_results(processor.store(), &config);

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {:?}", path))?;
            report::write_results(BufWriter::new(file), &results, args.format)?;
            log::info!("Results written to {:?}", path);
        }
        None => {
            if args.format == OutputFormat::Txt && !args.no_status {
                writeln!(out, "\nResulting table")?;
            }
            report::write_results(&mut out, &results, args.format)?;
        }
    }

    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
