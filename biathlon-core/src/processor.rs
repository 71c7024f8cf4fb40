//! Race state machine
//!
//! Folds the ordered event log into a [`CompetitorStore`], one transition per
//! event. Events are applied in the order given; nothing is re-sorted.

use crate::config::RaceConfig;
use crate::state::{Competitor, CompetitorStore, Lap, Shot};
use crate::timing::{format_clock_time, parse_clock_time};
use crate::types::{EventKind, EventRecord, Timestamp};
use chrono::Duration;
use std::fmt;

/// What a status line reports
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Registered,
    StartTimeAssigned(Timestamp),
    OnStartLine,
    Started,
    OnFiringRange(String),
    TargetHit(String),
    LeftFiringRange,
    EnteredPenaltyLoop,
    LeftPenaltyLoop,
    LapCompleted,
    CannotContinue(String),
    /// Outgoing event 32
    Disqualified,
    /// Outgoing event 33
    Finished,
}

/// Human-readable line produced while processing an event
#[derive(Debug, Clone, PartialEq)]
pub struct StatusLine {
    pub time: Timestamp,
    pub competitor_id: u32,
    pub status: Status,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.competitor_id;
        write!(f, "[{}] ", format_clock_time(self.time))?;
        match &self.status {
            Status::Registered => write!(f, "The competitor({}) registered", id),
            Status::StartTimeAssigned(start) => write!(
                f,
                "The start time for the competitor({}) was set by a draw to {}",
                id,
                format_clock_time(*start)
            ),
            Status::OnStartLine => write!(f, "The competitor({}) is on the start line", id),
            Status::Started => write!(f, "The competitor({}) has started", id),
            Status::OnFiringRange(line) => {
                write!(f, "The competitor({}) is on the firing range({})", id, line)
            }
            Status::TargetHit(target) => {
                write!(f, "The target({}) has been hit by competitor({})", target, id)
            }
            Status::LeftFiringRange => write!(f, "The competitor({}) left the firing range", id),
            Status::EnteredPenaltyLoop => {
                write!(f, "The competitor({}) entered the penalty laps", id)
            }
            Status::LeftPenaltyLoop => write!(f, "The competitor({}) left the penalty laps", id),
            Status::LapCompleted => write!(f, "The competitor({}) ended the main lap", id),
            Status::CannotContinue(comment) => {
                write!(f, "The competitor({}) can`t continue: {}", id, comment)
            }
            Status::Disqualified => write!(f, "The competitor({}) is disqualified", id),
            Status::Finished => write!(f, "The competitor({}) has finished", id),
        }
    }
}

/// The race state machine - owns the competitor store for one processing pass
pub struct RaceProcessor {
    /// Configured number of main laps
    laps: u32,
    /// Maximum allowed start delay; `None` when the configured value is unusable
    max_start_delay: Option<Duration>,
    store: CompetitorStore,
}

impl RaceProcessor {
    /// Create a processor for one race
    ///
    /// An unparseable `startDelta` is reported once; start events are then
    /// applied without the disqualification check.
    pub fn new(config: &RaceConfig) -> Self {
        let max_start_delay = match config.start_delta() {
            Ok(delta) => Some(delta),
            Err(e) => {
                log::warn!("Ignoring configured start delta: {}", e);
                None
            }
        };

        Self {
            laps: config.laps,
            max_start_delay,
            store: CompetitorStore::new(),
        }
    }

    /// Apply every event in order and collect the status lines
    pub fn process<'a, I>(&mut self, events: I) -> Vec<StatusLine>
    where
        I: IntoIterator<Item = &'a EventRecord>,
    {
        let mut lines = Vec::new();
        let mut count = 0usize;
        for event in events {
            lines.extend(self.apply(event));
            count += 1;
        }
        log::info!(
            "Processed {} events for {} competitors",
            count,
            self.store.len()
        );
        lines
    }

    /// Apply a single event
    ///
    /// Returns the status lines the event produced; events that cannot be
    /// applied are reported and produce none.
    pub fn apply(&mut self, event: &EventRecord) -> Vec<StatusLine> {
        log::debug!("Applying event: {}", event.raw);

        let laps = self.laps;
        let max_start_delay = self.max_start_delay;
        let competitor = self.store.get_or_insert(event.competitor_id);
        let line = |status| StatusLine {
            time: event.time,
            competitor_id: event.competitor_id,
            status,
        };

        match event.kind {
            EventKind::Registered => {
                competitor.registered = true;
                vec![line(Status::Registered)]
            }
            EventKind::StartTimeAssigned => match parse_clock_time(&event.payload) {
                Ok(start) => {
                    competitor.scheduled_start = Some(start);
                    vec![line(Status::StartTimeAssigned(start))]
                }
                Err(e) => {
                    log::warn!(
                        "Skipping start time for competitor {}: {}",
                        competitor.id,
                        e
                    );
                    Vec::new()
                }
            },
            EventKind::OnStartLine => {
                competitor.was_on_start_line = true;
                competitor.on_start_line = Some(event.time);
                vec![line(Status::OnStartLine)]
            }
            EventKind::Started => {
                if start(competitor, event.time, max_start_delay) {
                    vec![line(Status::Disqualified), line(Status::Started)]
                } else {
                    vec![line(Status::Started)]
                }
            }
            EventKind::EnteredFiringRange => match competitor.current_lap_mut() {
                Some(lap) => {
                    let index = lap.enter_firing_range();
                    let firing_line = if event.payload.is_empty() {
                        (index + 1).to_string()
                    } else {
                        event.payload.clone()
                    };
                    vec![line(Status::OnFiringRange(firing_line))]
                }
                None => skip(event, "no lap in progress"),
            },
            EventKind::TargetHit => {
                let Some(range) = competitor
                    .current_lap_mut()
                    .and_then(|lap| lap.current_firing_range_mut())
                else {
                    return skip(event, "not on a firing range");
                };
                let target = event.payload.parse::<u8>().ok();
                if target.is_none() {
                    log::debug!("Unreadable target {:?} in: {}", event.payload, event.raw);
                }
                range.shots.push(Shot { target });
                vec![line(Status::TargetHit(event.payload.clone()))]
            }
            EventKind::LeftFiringRange => vec![line(Status::LeftFiringRange)],
            EventKind::EnteredPenaltyLoop => {
                let Some(range) = competitor
                    .current_lap_mut()
                    .and_then(|lap| lap.current_firing_range_mut())
                else {
                    return skip(event, "no firing range visited in this lap");
                };
                range.penalty_entry = Some(event.time);
                vec![line(Status::EnteredPenaltyLoop)]
            }
            EventKind::LeftPenaltyLoop => {
                let Some(range) = competitor
                    .current_lap_mut()
                    .and_then(|lap| lap.current_firing_range_mut())
                else {
                    return skip(event, "no firing range visited in this lap");
                };
                let Some(entry) = range.penalty_entry else {
                    return skip(event, "penalty loop was never entered");
                };
                range.penalty_duration = Some(event.time - entry);
                vec![line(Status::LeftPenaltyLoop)]
            }
            EventKind::LapCompleted => {
                if competitor.current_lap_mut().is_none() {
                    return skip(event, "no lap in progress");
                }
                let mut lines = vec![line(Status::LapCompleted)];
                if complete_lap(competitor, event.time, laps) {
                    lines.push(line(Status::Finished));
                }
                lines
            }
            EventKind::CannotContinue => {
                competitor.comment = Some(event.payload.clone());
                competitor.not_finished = true;
                vec![line(Status::CannotContinue(event.payload.clone()))]
            }
            EventKind::Unknown(id) => {
                log::warn!("Unexpected event kind {}: {}", id, event.raw);
                Vec::new()
            }
        }
    }

    /// Read-only view of the store
    pub fn store(&self) -> &CompetitorStore {
        &self.store
    }

    /// Hand the folded store over once processing is done
    pub fn into_store(self) -> CompetitorStore {
        self.store
    }
}

/// Record the start and open the first lap; returns true if this start
/// disqualified the competitor
fn start(competitor: &mut Competitor, time: Timestamp, max_delay: Option<Duration>) -> bool {
    competitor.actual_start = Some(time);
    competitor.laps.push(Lap::new(time));
    competitor.current_lap = competitor.laps.len() - 1;

    let Some(max_delay) = max_delay else {
        return false;
    };
    let too_late = match competitor.scheduled_start {
        Some(scheduled) => time - scheduled > max_delay,
        // Started without a drawn start time
        None => true,
    };

    if too_late && !competitor.disqualified {
        log::info!("Competitor {} disqualified for a late start", competitor.id);
        competitor.disqualified = true;
        return true;
    }
    false
}

/// Close the current lap and open the next; returns true if the competitor
/// finished the race with this lap
fn complete_lap(competitor: &mut Competitor, time: Timestamp, laps: u32) -> bool {
    if let Some(lap) = competitor.current_lap_mut() {
        lap.duration = Some(time - lap.start_time);
    }
    competitor.current_lap += 1;
    competitor.laps.push(Lap::new(time));

    if competitor.finished_duration.is_some() || competitor.laps.len() <= laps as usize {
        return false;
    }
    match competitor.actual_start {
        Some(actual_start) => {
            competitor.finished_duration = Some(time - actual_start);
            true
        }
        None => false,
    }
}

fn skip(event: &EventRecord, reason: &str) -> Vec<StatusLine> {
    log::warn!(
        "Skipping event {} for competitor {} ({}): {}",
        event.kind,
        event.competitor_id,
        reason,
        event.raw
    );
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_events_str;
    use chrono::NaiveTime;

    fn config() -> RaceConfig {
        RaceConfig::new()
            .with_laps(2)
            .with_lap_len(3651)
            .with_penalty_len(50)
            .with_firing_lines(1)
            .with_start("10:00:00.000")
            .with_start_delta("00:01:30")
    }

    fn run(config: &RaceConfig, log: &str) -> (CompetitorStore, Vec<StatusLine>) {
        let events = parse_events_str(log).unwrap();
        let mut processor = RaceProcessor::new(config);
        let lines = processor.process(&events);
        (processor.into_store(), lines)
    }

    #[test]
    fn test_registration() {
        let (store, lines) = run(&config(), "[09:05:59.867] 1 1");
        assert_eq!(store.len(), 1);
        assert!(store.get(1).unwrap().registered);
        assert_eq!(
            lines[0].to_string(),
            "[09:05:59.867] The competitor(1) registered"
        );
    }

    #[test]
    fn test_bad_start_time_is_skipped() {
        let (store, lines) = run(
            &config(),
            "[09:05:59.867] 1 1\n\
             [09:06:00.000] 2 1 soon\n\
             [09:06:00.500] 2 1 10:00:00\n\
             [09:06:01.000] 3 1",
        );
        let competitor = store.get(1).unwrap();
        assert_eq!(competitor.scheduled_start, None);
        assert!(competitor.was_on_start_line);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_late_start_disqualifies() {
        let (store, lines) = run(
            &config(),
            "[09:00:00.000] 1 1\n\
             [09:00:01.000] 2 1 10:00:00.000\n\
             [10:01:31.000] 4 1\n\
             [10:20:00.000] 10 1\n\
             [10:40:00.000] 10 1",
        );
        let competitor = store.get(1).unwrap();
        assert!(competitor.disqualified);
        assert!(competitor.has_finished());
        assert_eq!(lines[2].status, Status::Disqualified);
        assert_eq!(lines[3].status, Status::Started);
    }

    #[test]
    fn test_start_within_delta() {
        let (store, lines) = run(
            &config(),
            "[09:00:01.000] 2 1 10:00:00.000\n[10:01:30.000] 4 1",
        );
        let competitor = store.get(1).unwrap();
        assert!(!competitor.disqualified);
        assert_eq!(competitor.laps.len(), 1);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_unusable_delta_skips_disqualification() {
        let config = config().with_start_delta("later");
        let (store, _) = run(&config, "[10:30:00.000] 4 1");
        assert!(!store.get(1).unwrap().disqualified);
    }

    #[test]
    fn test_start_without_draw_disqualifies() {
        let (store, _) = run(&config(), "[10:00:00.000] 4 1");
        assert!(store.get(1).unwrap().disqualified);
    }

    #[test]
    fn test_shots_go_to_current_range_of_current_lap() {
        let (store, _) = run(
            &config(),
            "[09:00:01.000] 2 1 10:00:00.000\n\
             [10:00:00.000] 4 1\n\
             [10:05:00.000] 5 1 1\n\
             [10:05:10.000] 6 1 1\n\
             [10:05:11.000] 6 1 2\n\
             [10:05:20.000] 7 1\n\
             [10:10:00.000] 10 1\n\
             [10:15:00.000] 5 1 1\n\
             [10:15:10.000] 6 1 4",
        );
        let competitor = store.get(1).unwrap();
        assert_eq!(competitor.laps.len(), 2);
        assert_eq!(competitor.laps[0].firing_ranges[0].hits(), 2);
        assert_eq!(
            competitor.laps[0].firing_ranges[0].shots[1],
            Shot { target: Some(2) }
        );
        assert_eq!(competitor.laps[1].firing_ranges[0].hits(), 1);
    }

    #[test]
    fn test_penalty_duration() {
        let (store, _) = run(
            &config(),
            "[09:00:01.000] 2 1 10:00:00.000\n\
             [10:00:00.000] 4 1\n\
             [10:05:00.000] 5 1 1\n\
             [10:05:20.000] 7 1\n\
             [10:05:21.000] 8 1\n\
             [10:06:21.500] 9 1",
        );
        let range = &store.get(1).unwrap().laps[0].firing_ranges[0];
        assert_eq!(range.penalty_duration, Some(Duration::milliseconds(60_500)));
    }

    #[test]
    fn test_out_of_order_events_are_skipped() {
        let (store, lines) = run(
            &config(),
            "[10:00:00.000] 6 1 1\n\
             [10:00:01.000] 5 1 1\n\
             [10:00:02.000] 9 1\n\
             [10:00:03.000] 10 1\n\
             [10:00:04.000] 4 1\n\
             [10:00:05.000] 6 1 1\n\
             [10:00:06.000] 5 1 1\n\
             [10:00:07.000] 9 1",
        );
        let competitor = store.get(1).unwrap();
        assert_eq!(competitor.laps.len(), 1);
        assert_eq!(competitor.laps[0].firing_ranges.len(), 1);
        assert!(competitor.laps[0].firing_ranges[0].shots.is_empty());
        assert_eq!(competitor.laps[0].firing_ranges[0].penalty_duration, None);
        // disqualified (no draw), started, on firing range
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_finish_after_configured_laps() {
        let (store, lines) = run(
            &config(),
            "[09:00:01.000] 2 1 10:00:00.000\n\
             [10:00:00.000] 4 1\n\
             [10:20:00.000] 10 1\n\
             [10:41:00.000] 10 1\n\
             [11:00:00.000] 10 1",
        );
        let competitor = store.get(1).unwrap();
        assert_eq!(competitor.finished_duration, Some(Duration::minutes(41)));
        assert_eq!(competitor.completed_laps(), 3);
        assert_eq!(
            lines.iter().filter(|l| l.status == Status::Finished).count(),
            1
        );
    }

    #[test]
    fn test_cannot_continue_is_terminal() {
        let (store, lines) = run(
            &config(),
            "[09:00:01.000] 2 1 10:00:00.000\n\
             [10:00:00.000] 4 1\n\
             [10:10:00.000] 11 1 Lost in the forest\n\
             [10:20:00.000] 10 1",
        );
        let competitor = store.get(1).unwrap();
        assert!(competitor.not_finished);
        assert_eq!(competitor.comment.as_deref(), Some("Lost in the forest"));
        assert_eq!(
            lines[2].to_string(),
            "[10:10:00.000] The competitor(1) can`t continue: Lost in the forest"
        );
    }

    #[test]
    fn test_apply_single_events() {
        let ten = |m| NaiveTime::from_hms_opt(10, m, 0).unwrap();
        let mut processor = RaceProcessor::new(&config());

        let lines = processor.apply(
            &EventRecord::new(ten(0), EventKind::StartTimeAssigned, 4).with_payload("10:01:00.000"),
        );
        assert_eq!(
            lines[0].to_string(),
            "[10:00:00.000] The start time for the competitor(4) was set by a draw to 10:01:00.000"
        );

        let lines = processor.apply(&EventRecord::new(ten(2), EventKind::Started, 4));
        assert_eq!(lines.len(), 1);
        assert_eq!(processor.store().get(4).unwrap().actual_start, Some(ten(2)));
    }

    #[test]
    fn test_unknown_event_changes_nothing() {
        let (store, lines) = run(&config(), "[10:00:00.000] 42 7");
        let competitor = store.get(7).unwrap();
        assert_eq!(competitor, &Competitor::new(7));
        assert!(lines.is_empty());
    }
}
