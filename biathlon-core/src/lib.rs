//! Biathlon Race Processor Library
//!
//! Reconstructs the state of every competitor in a biathlon race from an
//! ordered event log and derives the results table.
//!
//! # Architecture
//!
//! Data flows strictly one way:
//! - The race configuration and the event log are read up front
//! - [`RaceProcessor`] folds the events into a [`CompetitorStore`]
//! - [`build_results`] turns the folded store into ordered [`CompetitorResult`]s
//!
//! The library does NOT:
//! - Re-order events or correct clock skew
//! - Handle more than one race per processor
//! - Print anything (status lines and results are returned to the caller)
//!
//! # Example Usage
//!
//! ```no_run
//! use biathlon_core::{build_results, read_events, RaceConfig, RaceProcessor};
//! use std::path::Path;
//!
//! let config = RaceConfig::from_json_str(
//!     r#"{"laps":2,"lapLen":3651,"penaltyLen":50,"firingLines":1,
//!         "start":"09:30:00.000","startDelta":"00:00:30"}"#,
//! ).unwrap();
//! let events = read_events(Path::new("events")).unwrap();
//!
//! let mut processor = RaceProcessor::new(&config);
//! for line in processor.process(&events) {
//!     println!("{}", line);
//! }
//!
//! for result in build_results(processor.store(), &config) {
//!     println!("{}", result);
//! }
//! ```

// Public modules
pub mod config;
pub mod parser;
pub mod processor;
pub mod report;
pub mod state;
pub mod timing;
pub mod types;

// Re-export main types for convenience
pub use config::{RaceConfig, TARGETS_PER_LINE};
pub use parser::{parse_event_line, parse_events_str, read_events, EventLogParser};
pub use processor::{RaceProcessor, Status, StatusLine};
pub use report::{
    build_results, CompetitorResult, LapSummary, PenaltySummary, ResultStatus, ShootingSummary,
};
pub use state::{Competitor, CompetitorStore, FiringRange, Lap, Shot};
pub use timing::{format_duration, parse_start_delta};
pub use types::{EventKind, EventRecord, RaceError, Result, Timestamp};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
