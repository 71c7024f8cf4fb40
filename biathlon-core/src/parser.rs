//! Event log parser
//!
//! Parses the plain-text event log. Each non-blank line has the shape
//!
//! ```text
//! [<HH:MM:SS.mmm>] <event kind> <competitor id> [<extra params>...]
//! ```
//!
//! Ingestion is all-or-nothing: the first malformed line fails the whole read.

use crate::timing::parse_bracketed_time;
use crate::types::{EventKind, EventRecord, RaceError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Event log parser
pub struct EventLogParser;

impl EventLogParser {
    /// Open an event log file and return an iterator over its events
    pub fn parse(path: &Path) -> Result<EventIterator<BufReader<File>>> {
        log::info!("Parsing event log: {:?}", path);

        let file = File::open(path)?;
        Ok(EventIterator::new(BufReader::new(file)))
    }

    /// Iterate over events read from any buffered reader
    pub fn from_reader<R: BufRead>(reader: R) -> EventIterator<R> {
        EventIterator::new(reader)
    }
}

/// Iterator over events from an event log
pub struct EventIterator<R> {
    lines: std::io::Lines<R>,
    line_no: usize,
}

impl<R: BufRead> EventIterator<R> {
    fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> Iterator for EventIterator<R> {
    type Item = Result<EventRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_no += 1;

            if line.trim().is_empty() {
                continue;
            }
            return Some(parse_event_line(&line, self.line_no));
        }
    }
}

/// Parse a single log line; `line_no` is only used for error reporting
pub fn parse_event_line(line: &str, line_no: usize) -> Result<EventRecord> {
    let malformed = |reason: String| RaceError::MalformedLine {
        line: line_no,
        reason,
    };

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 3 {
        return Err(malformed(format!(
            "expected at least 3 fields, found {}",
            fields.len()
        )));
    }

    let time = parse_bracketed_time(fields[0]).map_err(|e| malformed(e.to_string()))?;

    let kind_id: u32 = fields[1]
        .parse()
        .map_err(|_| malformed(format!("event kind {:?} is not a number", fields[1])))?;

    let competitor_id: u32 = fields[2]
        .parse()
        .map_err(|_| malformed(format!("competitor id {:?} is not a number", fields[2])))?;

    Ok(EventRecord {
        time,
        kind: EventKind::from(kind_id),
        competitor_id,
        payload: fields[3..].join(" "),
        raw: line.trim().to_string(),
    })
}

/// Parse a whole event log held in memory
pub fn parse_events_str(content: &str) -> Result<Vec<EventRecord>> {
    EventLogParser::from_reader(content.as_bytes()).collect()
}

/// Read every event of an event log file
pub fn read_events(path: &Path) -> Result<Vec<EventRecord>> {
    let events = EventLogParser::parse(path)?.collect::<Result<Vec<_>>>()?;
    log::info!("Read {} events from {:?}", events.len(), path);
    Ok(events)
}
