// LogSift - core/model.rs
//
// Core data model types. Pure data definitions with no I/O, no UI,
// no platform dependencies.
//
// These types are the shared vocabulary across all layers.

use crate::util::constants::MISSING_MESSAGE_PLACEHOLDER;
use crate::util::error::ParseFlagError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// =============================================================================
// Log Entry
// =============================================================================

/// A single log line as handed over by the log manager.
///
/// Entries are immutable once constructed: all fields are private and the
/// sanitised `safe_message` is derived exactly once, in `LogEntry::new`.
/// Serialises as `{"timestamp", "flag", "module", "message"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "LogRecord", into = "LogRecord")]
pub struct LogEntry {
    /// Seconds since the Unix epoch (fractional part carries sub-second precision).
    timestamp: f64,

    /// Severity/category tag.
    flag: Flag,

    /// Name of the component that emitted the line.
    module: String,

    /// Message exactly as recorded. `None` when the source had no message.
    raw_message: Option<String>,

    /// Sanitised message used for search and display. Never empty.
    safe_message: String,
}

impl LogEntry {
    pub fn new(
        timestamp: f64,
        flag: Flag,
        module: impl Into<String>,
        raw_message: Option<String>,
    ) -> Self {
        let safe_message = sanitise_message(raw_message.as_deref());
        Self {
            timestamp,
            flag,
            module: module.into(),
            raw_message,
            safe_message,
        }
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn flag(&self) -> Flag {
        self.flag
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn raw_message(&self) -> Option<&str> {
        self.raw_message.as_deref()
    }

    /// Message text that is safe to search and render.
    pub fn safe_message(&self) -> &str {
        &self.safe_message
    }

    /// The timestamp as a UTC date-time, if it is within chrono's range.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        if !self.timestamp.is_finite() {
            return None;
        }
        DateTime::<Utc>::from_timestamp_millis((self.timestamp * 1000.0).round() as i64)
    }

    /// Time of day for list rows, e.g. `14:03:27.512`.
    pub fn format_time(&self) -> String {
        match self.datetime() {
            Some(dt) => dt.format("%H:%M:%S%.3f").to_string(),
            None => "--:--:--.---".to_string(),
        }
    }
}

/// Strip control characters (keeping newlines and tabs) and fall back to the
/// placeholder when nothing printable is left.
fn sanitise_message(raw: Option<&str>) -> String {
    let cleaned: String = raw
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();

    if cleaned.is_empty() {
        MISSING_MESSAGE_PLACEHOLDER.to_string()
    } else {
        cleaned
    }
}

/// On-disk / wire shape of a log entry. `safe_message` is never stored; it is
/// re-derived on deserialisation.
#[derive(Serialize, Deserialize)]
struct LogRecord {
    timestamp: f64,
    flag: Flag,
    #[serde(default)]
    module: String,
    #[serde(default)]
    message: Option<String>,
}

impl From<LogRecord> for LogEntry {
    fn from(record: LogRecord) -> Self {
        LogEntry::new(record.timestamp, record.flag, record.module, record.message)
    }
}

impl From<LogEntry> for LogRecord {
    fn from(entry: LogEntry) -> Self {
        LogRecord {
            timestamp: entry.timestamp,
            flag: entry.flag,
            module: entry.module,
            message: entry.raw_message,
        }
    }
}

// =============================================================================
// Flag
// =============================================================================

/// Severity/category tag attached to every log entry.
///
/// Variants are declared in label order, so the derived `Ord` sorts flags
/// alphabetically by label. Option lists rely on that ordering.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Flag {
    Debug,
    #[serde(alias = "err")]
    Error,
    #[default]
    Info,
    Success,
    #[serde(alias = "warn")]
    Warning,
}

impl Flag {
    /// Returns all variants in label order.
    pub fn all() -> &'static [Flag] {
        &[
            Flag::Debug,
            Flag::Error,
            Flag::Info,
            Flag::Success,
            Flag::Warning,
        ]
    }

    /// Lowercase label used in config, CLI and serialised entries.
    pub fn label(&self) -> &'static str {
        match self {
            Flag::Debug => "debug",
            Flag::Error => "error",
            Flag::Info => "info",
            Flag::Success => "success",
            Flag::Warning => "warning",
        }
    }

    /// Short label for compact display (e.g. table columns).
    pub fn short_label(&self) -> &'static str {
        match self {
            Flag::Debug => "DBG",
            Flag::Error => "ERR",
            Flag::Info => "INFO",
            Flag::Success => "OK",
            Flag::Warning => "WARN",
        }
    }
}

impl std::fmt::Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Flag {
    type Err = ParseFlagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debug" | "dbg" => Ok(Flag::Debug),
            "error" | "err" => Ok(Flag::Error),
            "info" | "inf" => Ok(Flag::Info),
            "success" | "ok" => Ok(Flag::Success),
            "warning" | "warn" | "wrn" => Ok(Flag::Warning),
            _ => Err(ParseFlagError {
                input: s.to_string(),
            }),
        }
    }
}

// =============================================================================
// Unit tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_message_falls_back_to_placeholder() {
        let entry = LogEntry::new(0.0, Flag::Info, "net", None);
        assert_eq!(entry.safe_message(), MISSING_MESSAGE_PLACEHOLDER);
        assert!(entry.raw_message().is_none());

        let empty = LogEntry::new(0.0, Flag::Info, "net", Some(String::new()));
        assert_eq!(empty.safe_message(), MISSING_MESSAGE_PLACEHOLDER);
    }

    #[test]
    fn test_safe_message_strips_control_characters() {
        let entry = LogEntry::new(
            0.0,
            Flag::Error,
            "net",
            Some("read\u{0007} timeout\r\n\tretrying".to_string()),
        );
        assert_eq!(entry.safe_message(), "read timeout\n\tretrying");
        assert_eq!(
            entry.raw_message(),
            Some("read\u{0007} timeout\r\n\tretrying")
        );
    }

    #[test]
    fn test_control_only_message_uses_placeholder() {
        let entry = LogEntry::new(0.0, Flag::Debug, "ui", Some("\u{0000}\u{001b}".to_string()));
        assert_eq!(entry.safe_message(), MISSING_MESSAGE_PLACEHOLDER);
    }

    #[test]
    fn test_flags_sort_alphabetically() {
        let mut flags = vec![Flag::Warning, Flag::Info, Flag::Error, Flag::Success, Flag::Debug];
        flags.sort();
        let labels: Vec<_> = flags.iter().map(Flag::label).collect();
        let mut expected = labels.clone();
        expected.sort();
        assert_eq!(labels, expected);
        assert_eq!(flags.as_slice(), Flag::all());
    }

    #[test]
    fn test_flag_from_str_accepts_aliases() {
        assert_eq!("warn".parse::<Flag>().unwrap(), Flag::Warning);
        assert_eq!(" ERR ".parse::<Flag>().unwrap(), Flag::Error);
        assert!("verbose".parse::<Flag>().is_err());
    }

    #[test]
    fn test_format_time_renders_millis() {
        // 1970-01-02 01:02:03.456 UTC
        let entry = LogEntry::new(86_400.0 + 3_723.456, Flag::Info, "clock", None);
        assert_eq!(entry.format_time(), "01:02:03.456");

        let bogus = LogEntry::new(f64::NAN, Flag::Info, "clock", None);
        assert_eq!(bogus.format_time(), "--:--:--.---");
    }

    #[test]
    fn test_json_round_trip_rederives_safe_message() {
        let json = r#"{"timestamp":12.5,"flag":"warn","module":"db","message":"slow\u0007 query"}"#;
        let entry: LogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.flag(), Flag::Warning);
        assert_eq!(entry.module(), "db");
        assert_eq!(entry.safe_message(), "slow query");

        let back = serde_json::to_string(&entry).unwrap();
        assert!(!back.contains("safe_message"), "got: {back}");
        let again: LogEntry = serde_json::from_str(&back).unwrap();
        assert_eq!(again, entry);
    }

    #[test]
    fn test_json_missing_message_and_module() {
        let entry: LogEntry = serde_json::from_str(r#"{"timestamp":1,"flag":"info"}"#).unwrap();
        assert_eq!(entry.module(), "");
        assert_eq!(entry.safe_message(), MISSING_MESSAGE_PLACEHOLDER);
    }
}
