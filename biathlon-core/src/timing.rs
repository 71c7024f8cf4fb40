//! Clock-time and duration helpers
//!
//! Every time in the event log is a clock time of day with millisecond
//! precision (`HH:MM:SS.mmm`). Durations are printed in the same shape.

use crate::types::{RaceError, Result, Timestamp};
use chrono::{Duration, NaiveTime, Timelike};

/// chrono format string for a clock time with milliseconds
pub const TIME_FORMAT: &str = "%H:%M:%S.%3f";

/// Parse a `HH:MM:SS.mmm` clock time
pub fn parse_clock_time(s: &str) -> Result<Timestamp> {
    NaiveTime::parse_from_str(s.trim(), TIME_FORMAT)
        .map_err(|e| RaceError::InvalidTime(format!("{:?}: {}", s, e)))
}

/// Parse a clock time wrapped in brackets, as found at the start of a log line
pub fn parse_bracketed_time(s: &str) -> Result<Timestamp> {
    let inner = s
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| RaceError::InvalidTime(format!("{:?} is not wrapped in brackets", s)))?;
    parse_clock_time(inner)
}

/// Parse a `HH:MM:SS` duration such as the configured start delta
pub fn parse_start_delta(s: &str) -> Result<Duration> {
    let parts: Vec<&str> = s.trim().split(':').collect();
    if parts.len() != 3 {
        return Err(RaceError::InvalidDuration(format!(
            "{:?}: expected HH:MM:SS",
            s
        )));
    }

    let mut fields = [0i64; 3];
    for (field, part) in fields.iter_mut().zip(&parts) {
        *field = part
            .parse::<u32>()
            .map_err(|e| RaceError::InvalidDuration(format!("{:?}: {}", s, e)))?
            .into();
    }

    let [hours, minutes, seconds] = fields;
    Ok(Duration::hours(hours) + Duration::minutes(minutes) + Duration::seconds(seconds))
}

/// Format a clock time as `HH:MM:SS.mmm`
pub fn format_clock_time(t: Timestamp) -> String {
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        t.hour(),
        t.minute(),
        t.second(),
        t.nanosecond() / 1_000_000
    )
}

/// Format a duration as `HH:MM:SS.mmm`; hours are not wrapped at 24
pub fn format_duration(d: Duration) -> String {
    let total_ms = d.num_milliseconds();
    let sign = if total_ms < 0 { "-" } else { "" };
    let ms = total_ms.unsigned_abs();

    format!(
        "{}{:02}:{:02}:{:02}.{:03}",
        sign,
        ms / 3_600_000,
        ms / 60_000 % 60,
        ms / 1_000 % 60,
        ms % 1_000
    )
}

/// Duration in fractional seconds, used for speed calculations
pub fn duration_seconds(d: Duration) -> f64 {
    d.num_milliseconds() as f64 / 1_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clock_time() {
        let t = parse_clock_time("12:34:56.789").unwrap();
        assert_eq!(format_clock_time(t), "12:34:56.789");
        assert!(parse_clock_time("invalid-time").is_err());
        // milliseconds are required
        assert!(parse_clock_time("10:00:00").is_err());
        assert!(parse_clock_time("10:00:00.").is_err());
        assert!(parse_clock_time("10:00:00.12").is_err());
    }

    #[test]
    fn test_parse_bracketed_time() {
        let t = parse_bracketed_time("[09:05:59.867]").unwrap();
        assert_eq!(format_clock_time(t), "09:05:59.867");
        assert!(parse_bracketed_time("09:05:59.867").is_err());
        assert!(parse_bracketed_time("[09:05:59.867").is_err());
        assert!(parse_bracketed_time("[]").is_err());
    }

    #[test]
    fn test_parse_start_delta() {
        assert_eq!(parse_start_delta("00:01:30").unwrap(), Duration::seconds(90));
        assert_eq!(parse_start_delta("01:00:00").unwrap(), Duration::hours(1));
        assert!(parse_start_delta("00:01").is_err());
        assert!(parse_start_delta("aa:01:30").is_err());
        assert!(parse_start_delta("").is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::zero()), "00:00:00.000");
        assert_eq!(format_duration(Duration::hours(1)), "01:00:00.000");

        let complex = Duration::hours(2)
            + Duration::minutes(30)
            + Duration::seconds(15)
            + Duration::milliseconds(123);
        assert_eq!(format_duration(complex), "02:30:15.123");
        assert_eq!(format_duration(Duration::milliseconds(-1500)), "-00:00:01.500");
    }

    #[test]
    fn test_duration_seconds() {
        assert_eq!(duration_seconds(Duration::milliseconds(1500)), 1.5);
    }
}
