//! Competitor state store
//!
//! Per-competitor state reconstructed from the event log. Laps are append-only;
//! firing ranges belong to the lap they were visited in.

use crate::config::TARGETS_PER_LINE;
use crate::types::Timestamp;
use chrono::Duration;
use std::collections::BTreeMap;

/// A target hit recorded on a firing range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shot {
    /// Target number from the event payload, if it was readable
    pub target: Option<u8>,
}

/// One visit to a firing range
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FiringRange {
    /// Hits in the order they were reported
    pub shots: Vec<Shot>,
    /// When the competitor entered the penalty loop after this range
    pub penalty_entry: Option<Timestamp>,
    /// Time spent in the penalty loop
    pub penalty_duration: Option<Duration>,
}

impl FiringRange {
    pub fn hits(&self) -> usize {
        self.shots.len()
    }

    /// Targets left standing; each one costs a penalty loop
    pub fn misses(&self) -> usize {
        TARGETS_PER_LINE.saturating_sub(self.hits())
    }
}

/// One main lap
#[derive(Debug, Clone, PartialEq)]
pub struct Lap {
    pub start_time: Timestamp,
    /// Set when the lap is completed
    pub duration: Option<Duration>,
    pub firing_ranges: Vec<FiringRange>,
    /// Index into `firing_ranges` of the range last entered
    pub current_firing_range: Option<usize>,
}

impl Lap {
    pub fn new(start_time: Timestamp) -> Self {
        Self {
            start_time,
            duration: None,
            firing_ranges: Vec::new(),
            current_firing_range: None,
        }
    }

    /// Append a firing range and make it the current one
    pub fn enter_firing_range(&mut self) -> usize {
        self.firing_ranges.push(FiringRange::default());
        let index = self.firing_ranges.len() - 1;
        self.current_firing_range = Some(index);
        index
    }

    pub fn current_firing_range_mut(&mut self) -> Option<&mut FiringRange> {
        match self.current_firing_range {
            Some(index) => self.firing_ranges.get_mut(index),
            None => None,
        }
    }
}

/// Everything known about one competitor
#[derive(Debug, Clone, PartialEq)]
pub struct Competitor {
    pub id: u32,

    pub registered: bool,
    pub was_on_start_line: bool,
    pub disqualified: bool,
    pub not_finished: bool,

    pub scheduled_start: Option<Timestamp>,
    pub actual_start: Option<Timestamp>,
    pub on_start_line: Option<Timestamp>,

    /// Index into `laps` of the lap in progress
    pub current_lap: usize,
    /// Total race time, set once all laps are completed
    pub finished_duration: Option<Duration>,
    pub laps: Vec<Lap>,

    /// Reason given when the competitor could not continue
    pub comment: Option<String>,
}

impl Competitor {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            registered: false,
            was_on_start_line: false,
            disqualified: false,
            not_finished: false,
            scheduled_start: None,
            actual_start: None,
            on_start_line: None,
            current_lap: 0,
            finished_duration: None,
            laps: Vec::new(),
            comment: None,
        }
    }

    pub fn current_lap_mut(&mut self) -> Option<&mut Lap> {
        self.laps.get_mut(self.current_lap)
    }

    /// Laps with a recorded completion
    pub fn completed_laps(&self) -> usize {
        self.laps.iter().filter(|lap| lap.duration.is_some()).count()
    }

    pub fn first_lap_start(&self) -> Option<Timestamp> {
        self.laps.first().map(|lap| lap.start_time)
    }

    pub fn has_finished(&self) -> bool {
        self.finished_duration.is_some()
    }
}

/// All competitors seen during one processing pass, keyed by id
#[derive(Debug, Clone, Default)]
pub struct CompetitorStore {
    competitors: BTreeMap<u32, Competitor>,
}

impl CompetitorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a competitor, creating it with empty history on first sight
    pub fn get_or_insert(&mut self, id: u32) -> &mut Competitor {
        self.competitors.entry(id).or_insert_with(|| {
            log::debug!("New competitor {}", id);
            Competitor::new(id)
        })
    }

    pub fn get(&self, id: u32) -> Option<&Competitor> {
        self.competitors.get(&id)
    }

    /// Competitors in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = &Competitor> {
        self.competitors.values()
    }

    pub fn registered(&self) -> impl Iterator<Item = &Competitor> {
        self.iter().filter(|c| c.registered)
    }

    pub fn len(&self) -> usize {
        self.competitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.competitors.is_empty()
    }
}
