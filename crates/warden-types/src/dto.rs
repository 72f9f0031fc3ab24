//! Event and record types shared by the source, policy, store and monitor crates.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Principal used when no identity can be read from an event payload.
pub const UNKNOWN_PRINCIPAL: &str = "Unknown";

/// One entry read from the event source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub record_id: u64,
    pub event_code: u32,
    #[serde(default)]
    pub string_fields: Vec<String>,
}

impl RawEvent {
    pub fn new(record_id: u64, event_code: u32, string_fields: Vec<String>) -> Self {
        Self {
            record_id,
            event_code,
            string_fields,
        }
    }
}

/// Semantic classification of a raw event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionAction {
    SessionStart,
    SessionEnd,
    Ignored,
}

impl SessionAction {
    /// Tag written into a principal's log file.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionAction::SessionStart => "LOGIN",
            SessionAction::SessionEnd => "LOGOUT",
            SessionAction::Ignored => "IGNORED",
        }
    }
}

impl fmt::Display for SessionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line destined for `<principal>.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub principal: String,
    pub action: SessionAction,
    pub timestamp: DateTime<Local>,
}

impl LogRecord {
    pub const TIMESTAMP_FORMAT: &'static str = "%Y-%m-%d %H:%M:%S";

    pub fn new(
        principal: impl Into<String>,
        action: SessionAction,
        timestamp: DateTime<Local>,
    ) -> Self {
        Self {
            principal: principal.into(),
            action,
            timestamp,
        }
    }

    /// Render as `[YYYY-MM-DD HH:MM:SS] ACTION` without the trailing newline.
    pub fn line(&self) -> String {
        format!(
            "[{}] {}",
            self.timestamp.format(Self::TIMESTAMP_FORMAT),
            self.action
        )
    }
}

/// Order in which a handle walks the records appended since its previous read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadDirection {
    /// Newest first.
    #[default]
    Backwards,
    Forwards,
}

impl FromStr for ReadDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "backwards" | "backward" => Ok(ReadDirection::Backwards),
            "forwards" | "forward" => Ok(ReadDirection::Forwards),
            other => Err(format!("unknown read direction: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn log_record_line_format() {
        let ts = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let rec = LogRecord::new("alice", SessionAction::SessionStart, ts);
        assert_eq!(rec.line(), "[2024-03-09 07:05:01] LOGIN");
        let rec = LogRecord::new("alice", SessionAction::SessionEnd, ts);
        assert_eq!(rec.line(), "[2024-03-09 07:05:01] LOGOUT");
    }

    #[test]
    fn raw_event_deserializes_without_fields() {
        let ev: RawEvent = serde_json::from_str(r#"{"record_id":7,"event_code":4624}"#).unwrap();
        assert_eq!(ev, RawEvent::new(7, 4624, vec![]));
    }

    #[test]
    fn read_direction_parses() {
        assert_eq!("Backwards".parse::<ReadDirection>(), Ok(ReadDirection::Backwards));
        assert_eq!("forwards".parse::<ReadDirection>(), Ok(ReadDirection::Forwards));
        assert!("sideways".parse::<ReadDirection>().is_err());
    }
}
