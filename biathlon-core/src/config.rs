//! Race configuration types
//!
//! The configuration is read once before processing and never mutated. Field
//! names follow the JSON configuration file (`lapLen`, `startDelta`, ...).

use crate::timing::{parse_clock_time, parse_start_delta};
use crate::types::{RaceError, Result, Timestamp};
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Number of targets on every firing line
pub const TARGETS_PER_LINE: usize = 5;

/// Static parameters of a race
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceConfig {
    /// Number of main laps
    #[serde(default)]
    pub laps: u32,

    /// Length of one main lap (metres)
    #[serde(default)]
    pub lap_len: u32,

    /// Length of one penalty loop (metres)
    #[serde(default)]
    pub penalty_len: u32,

    /// Number of firing lines per lap
    #[serde(default)]
    pub firing_lines: u32,

    /// Scheduled mass-start time (`HH:MM:SS.mmm`)
    #[serde(default)]
    pub start: String,

    /// Maximum allowed deviation of the actual start (`HH:MM:SS`)
    #[serde(default)]
    pub start_delta: String,
}

impl RaceConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON text
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Builder method: set the lap count
    pub fn with_laps(mut self, laps: u32) -> Self {
        self.laps = laps;
        self
    }

    /// Builder method: set the lap length
    pub fn with_lap_len(mut self, lap_len: u32) -> Self {
        self.lap_len = lap_len;
        self
    }

    /// Builder method: set the penalty loop length
    pub fn with_penalty_len(mut self, penalty_len: u32) -> Self {
        self.penalty_len = penalty_len;
        self
    }

    /// Builder method: set the number of firing lines
    pub fn with_firing_lines(mut self, firing_lines: u32) -> Self {
        self.firing_lines = firing_lines;
        self
    }

    /// Builder method: set the scheduled mass-start time
    pub fn with_start(mut self, start: impl Into<String>) -> Self {
        self.start = start.into();
        self
    }

    /// Builder method: set the maximum allowed start delay
    pub fn with_start_delta(mut self, start_delta: impl Into<String>) -> Self {
        self.start_delta = start_delta.into();
        self
    }

    /// Parsed maximum allowed start delay
    pub fn start_delta(&self) -> Result<Duration> {
        parse_start_delta(&self.start_delta)
    }

    /// Parsed scheduled mass-start time
    pub fn start_time(&self) -> Result<Timestamp> {
        parse_clock_time(&self.start)
    }

    /// Total shots a competitor can fire over the race
    pub fn total_shots(&self) -> usize {
        self.firing_lines as usize * TARGETS_PER_LINE
    }

    /// Check the configuration for values the race cannot be run with
    pub fn validate(&self) -> Result<()> {
        if self.laps < 1 {
            return Err(RaceError::InvalidConfig(
                "laps must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let json = r#"{
            "laps": 2,
            "lapLen": 3651,
            "penaltyLen": 50,
            "firingLines": 1,
            "start": "09:30:00.000",
            "startDelta": "00:00:30"
        }"#;

        let config = RaceConfig::from_json_str(json).unwrap();
        assert_eq!(config.laps, 2);
        assert_eq!(config.lap_len, 3651);
        assert_eq!(config.penalty_len, 50);
        assert_eq!(config.total_shots(), 5);
        assert_eq!(config.start_delta().unwrap(), Duration::seconds(30));
        assert!(config.start_time().is_ok());
    }

    #[test]
    fn test_partial_config() {
        let config = RaceConfig::from_json_str(r#"{"laps":2,"lapLen":3651}"#).unwrap();
        assert_eq!(config.laps, 2);
        assert_eq!(config.penalty_len, 0);
        assert!(config.start_delta().is_err());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = RaceConfig::new()
            .with_laps(3)
            .with_lap_len(4000)
            .with_penalty_len(150)
            .with_firing_lines(2)
            .with_start("10:00:00.000")
            .with_start_delta("00:01:30");

        assert_eq!(config.laps, 3);
        assert_eq!(config.total_shots(), 10);
        assert_eq!(config.start_delta().unwrap(), Duration::seconds(90));
    }

    #[test]
    fn test_validate() {
        assert!(RaceConfig::new().validate().is_err());
        assert!(RaceConfig::from_json_str("not json").is_err());
    }
}
