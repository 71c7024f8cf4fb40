//! Results aggregation
//!
//! Turns the folded [`CompetitorStore`] into the final results table: one
//! [`CompetitorResult`] per registered competitor, ordered by start time.

use crate::config::{RaceConfig, TARGETS_PER_LINE};
use crate::state::{Competitor, CompetitorStore};
use crate::timing::{duration_seconds, format_duration};
use crate::types::Timestamp;
use chrono::Duration;
use rayon::prelude::*;
use serde::{Serialize, Serializer};
use std::fmt;

/// Final standing of a competitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultStatus {
    Disqualified,
    NotFinished,
    /// Elapsed race time; zero if the competitor never finished
    Finished(Duration),
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultStatus::Disqualified => write!(f, "Disqualified"),
            ResultStatus::NotFinished => write!(f, "NotFinished"),
            ResultStatus::Finished(total) => write!(f, "{}", format_duration(*total)),
        }
    }
}

impl Serialize for ResultStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn serialize_duration<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_duration(*d))
}

/// A completed lap and the average speed over it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LapSummary {
    #[serde(serialize_with = "serialize_duration")]
    pub duration: Duration,
    /// Metres per second
    pub avg_speed: f64,
}

/// Time spent in the penalty loop after one firing range
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PenaltySummary {
    #[serde(serialize_with = "serialize_duration")]
    pub duration: Duration,
    /// Metres per second, over one penalty loop per missed target
    pub avg_speed: f64,
}

/// Hits against all shots the competitor could have fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShootingSummary {
    pub hits: usize,
    pub total: usize,
}

impl fmt::Display for ShootingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.hits, self.total)
    }
}

/// One row of the results table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetitorResult {
    pub id: u32,
    pub status: ResultStatus,
    pub laps: Vec<LapSummary>,
    pub penalties: Vec<PenaltySummary>,
    pub shooting: ShootingSummary,
    #[serde(skip)]
    pub first_lap_start: Option<Timestamp>,
}

impl fmt::Display for CompetitorResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ", self.status, self.id)?;

        let laps: Vec<String> = self
            .laps
            .iter()
            .map(|lap| speed_tuple(lap.duration, lap.avg_speed))
            .collect();
        write!(f, "[{}] ", laps.join(", "))?;

        let penalties: Vec<String> = self
            .penalties
            .iter()
            .map(|penalty| speed_tuple(penalty.duration, penalty.avg_speed))
            .collect();
        write!(f, "[{}] ", penalties.join(", "))?;

        write!(f, "{}", self.shooting)
    }
}

fn speed_tuple(duration: Duration, speed: f64) -> String {
    format!("{{{}, {:.3}}}", format_duration(duration), speed)
}

/// Build the results table for every registered competitor
///
/// Rows are ordered by the start of the first lap; competitors that never
/// started come last. Ties keep ascending competitor id order.
pub fn build_results(store: &CompetitorStore, config: &RaceConfig) -> Vec<CompetitorResult> {
    let registered: Vec<&Competitor> = store.registered().collect();
    log::debug!(
        "Aggregating results for {} of {} competitors",
        registered.len(),
        store.len()
    );

    let mut results: Vec<CompetitorResult> = registered
        .par_iter()
        .map(|competitor| summarize(competitor, config))
        .collect();

    // Stable sort; `registered` is already in id order
    results.sort_by_key(|result| (result.first_lap_start.is_none(), result.first_lap_start));
    results
}

/// Summarise a single competitor
pub fn summarize(competitor: &Competitor, config: &RaceConfig) -> CompetitorResult {
    let status = if competitor.disqualified {
        ResultStatus::Disqualified
    } else if competitor.not_finished {
        ResultStatus::NotFinished
    } else {
        ResultStatus::Finished(competitor.finished_duration.unwrap_or_else(Duration::zero))
    };

    let mut laps = Vec::new();
    let mut penalties = Vec::new();
    let mut hits = 0;

    for lap in &competitor.laps {
        if let Some(duration) = lap.duration {
            if let Some(speed) = average_speed(config.lap_len as f64, duration) {
                laps.push(LapSummary {
                    duration,
                    avg_speed: speed,
                });
            }
        }

        for range in &lap.firing_ranges {
            hits += range.hits();
            if range.hits() == TARGETS_PER_LINE {
                continue;
            }
            let Some(duration) = range.penalty_duration else {
                continue;
            };
            let distance = config.penalty_len as f64 * range.misses() as f64;
            if let Some(speed) = average_speed(distance, duration) {
                penalties.push(PenaltySummary {
                    duration,
                    avg_speed: speed,
                });
            }
        }
    }

    CompetitorResult {
        id: competitor.id,
        status,
        laps,
        penalties,
        shooting: ShootingSummary {
            hits,
            total: config.total_shots(),
        },
        first_lap_start: competitor.first_lap_start(),
    }
}

/// Distance over duration in metres per second; `None` for non-positive durations
fn average_speed(distance: f64, duration: Duration) -> Option<f64> {
    let seconds = duration_seconds(duration);
    (seconds > 0.0).then(|| distance / seconds)
}
