// LogSift - app/log_manager.rs
//
// The log-manager boundary: where a session gets its authoritative log set.
// Implementations hand back entries in chronological order and absorb their
// own I/O failures, reporting them as "no data" rather than as errors.

use crate::core::model::LogEntry;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Source of log entries for a session.
///
/// Held as `Arc<dyn LogManager>` so implementations can be swapped at runtime.
pub trait LogManager: Send + Sync {
    /// The in-memory buffer for the current run, oldest first.
    fn current_logs(&self) -> Vec<LogEntry>;

    /// Persisted entries for `date`, oldest first. `None` when nothing was
    /// persisted for that date or it could not be read.
    fn logs_for_date(&self, date: NaiveDate) -> Option<Vec<LogEntry>>;
}

/// Log manager backed entirely by memory. Used for embedding and tests.
#[derive(Debug, Default)]
pub struct InMemoryLogManager {
    current: RwLock<Vec<LogEntry>>,
    days: RwLock<HashMap<NaiveDate, Vec<LogEntry>>>,
}

impl InMemoryLogManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Manager whose current buffer is `logs` (oldest first).
    pub fn with_current(logs: Vec<LogEntry>) -> Self {
        Self {
            current: RwLock::new(logs),
            days: RwLock::default(),
        }
    }

    /// Append one entry to the current buffer.
    pub fn push(&self, entry: LogEntry) {
        self.current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    /// Store `logs` (oldest first) as the persisted entries for `date`.
    pub fn insert_day(&self, date: NaiveDate, logs: Vec<LogEntry>) {
        self.days
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(date, logs);
    }
}

impl LogManager for InMemoryLogManager {
    fn current_logs(&self) -> Vec<LogEntry> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn logs_for_date(&self, date: NaiveDate) -> Option<Vec<LogEntry>> {
        self.days
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&date)
            .cloned()
    }
}
