//! Core types for the biathlon race processor
//!
//! This module defines the fundamental types read from an event log: timestamps,
//! event kinds and event records, plus the library error type.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type used throughout the processor (clock time of day).
pub type Timestamp = NaiveTime;

/// Result type for processor operations
pub type Result<T> = std::result::Result<T, RaceError>;

/// Errors that can occur while reading a race configuration or event log
#[derive(Debug, thiserror::Error)]
pub enum RaceError {
    #[error("Malformed event line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Incoming event kinds, numbered as they appear in the event log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// 1: the competitor registered
    Registered,
    /// 2: the start time was set by a draw (payload: start time)
    StartTimeAssigned,
    /// 3: the competitor is on the start line
    OnStartLine,
    /// 4: the competitor has started
    Started,
    /// 5: the competitor is on a firing range (payload: firing line)
    EnteredFiringRange,
    /// 6: a target has been hit (payload: target)
    TargetHit,
    /// 7: the competitor left the firing range
    LeftFiringRange,
    /// 8: the competitor entered the penalty laps
    EnteredPenaltyLoop,
    /// 9: the competitor left the penalty laps
    LeftPenaltyLoop,
    /// 10: the competitor ended the main lap
    LapCompleted,
    /// 11: the competitor can't continue (payload: comment)
    CannotContinue,
    /// Any id outside 1..=11
    Unknown(u32),
}

impl EventKind {
    /// Numeric id of this kind as written in the log
    pub fn id(&self) -> u32 {
        match self {
            EventKind::Registered => 1,
            EventKind::StartTimeAssigned => 2,
            EventKind::OnStartLine => 3,
            EventKind::Started => 4,
            EventKind::EnteredFiringRange => 5,
            EventKind::TargetHit => 6,
            EventKind::LeftFiringRange => 7,
            EventKind::EnteredPenaltyLoop => 8,
            EventKind::LeftPenaltyLoop => 9,
            EventKind::LapCompleted => 10,
            EventKind::CannotContinue => 11,
            EventKind::Unknown(id) => *id,
        }
    }
}

impl From<u32> for EventKind {
    fn from(id: u32) -> Self {
        match id {
            1 => EventKind::Registered,
            2 => EventKind::StartTimeAssigned,
            3 => EventKind::OnStartLine,
            4 => EventKind::Started,
            5 => EventKind::EnteredFiringRange,
            6 => EventKind::TargetHit,
            7 => EventKind::LeftFiringRange,
            8 => EventKind::EnteredPenaltyLoop,
            9 => EventKind::LeftPenaltyLoop,
            10 => EventKind::LapCompleted,
            11 => EventKind::CannotContinue,
            other => EventKind::Unknown(other),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// One line of the event log
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    /// Clock time the event happened at
    pub time: Timestamp,
    /// What happened
    pub kind: EventKind,
    /// Competitor the event refers to
    pub competitor_id: u32,
    /// Kind-dependent extra parameters, whitespace-normalised (may be empty)
    pub payload: String,
    /// The log line as read, trimmed
    pub raw: String,
}

impl EventRecord {
    /// Create an event with no payload
    pub fn new(time: Timestamp, kind: EventKind, competitor_id: u32) -> Self {
        Self {
            time,
            kind,
            competitor_id,
            payload: String::new(),
            raw: String::new(),
        }
    }

    /// Builder method: attach a payload
    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = payload.into();
        self
    }
}
