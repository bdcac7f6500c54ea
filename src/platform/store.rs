// LogSift - platform/store.rs
//
// File-backed log manager: one JSON-lines file per UTC day,
// `<dir>/<YYYY-MM-DD>.jsonl`, one serialised `LogEntry` per line, oldest
// first.
//
// Failure policy: read errors never cross the `LogManager` boundary.
//   - Missing day file            -> None (nothing persisted for that date).
//   - Unreadable day file         -> None, logged at warn.
//   - Malformed line              -> line skipped, logged at warn (bounded).
//   - Blank line                  -> skipped silently.

use crate::app::log_manager::LogManager;
use crate::core::model::LogEntry;
use crate::util::constants::{MAX_REPORTED_MALFORMED_LINES, STORE_FILE_EXTENSION};
use crate::util::error::{LogSiftError, StoreError};
use chrono::{NaiveDate, Utc};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Reads day files from a directory.
#[derive(Debug, Clone)]
pub struct JsonLinesStore {
    dir: PathBuf,
}

impl JsonLinesStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the day file for `date`.
    pub fn day_path(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{}.{STORE_FILE_EXTENSION}", date.format("%Y-%m-%d")))
    }

    /// Dates that have a day file, ascending.
    pub fn available_dates(&self) -> Result<Vec<NaiveDate>, StoreError> {
        let read_dir = std::fs::read_dir(&self.dir).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                StoreError::DirectoryNotFound {
                    path: self.dir.clone(),
                }
            } else {
                StoreError::Io {
                    path: self.dir.clone(),
                    source: e,
                }
            }
        })?;

        let mut dates: Vec<NaiveDate> = read_dir
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension()?.to_str()? != STORE_FILE_EXTENSION {
                    return None;
                }
                NaiveDate::parse_from_str(path.file_stem()?.to_str()?, "%Y-%m-%d").ok()
            })
            .collect();
        dates.sort();
        Ok(dates)
    }

    /// Read and decode the day file for `date`.
    ///
    /// `Ok(None)` means no file exists. Malformed lines are reported through
    /// the returned warnings and skipped; they do not fail the read.
    pub fn read_day(
        &self,
        date: NaiveDate,
    ) -> Result<Option<(Vec<LogEntry>, Vec<StoreError>)>, StoreError> {
        let path = self.day_path(date);
        let file = match std::fs::File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io { path, source: e }),
        };

        let mut entries = Vec::new();
        let mut malformed = Vec::new();

        // Lines are split as bytes so a line with invalid UTF-8 is reported
        // as malformed on its own instead of failing the whole read.
        for (idx, line) in BufReader::new(file).split(b'\n').enumerate() {
            let line = line.map_err(|e| StoreError::Io {
                path: path.clone(),
                source: e,
            })?;
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            match serde_json::from_slice::<LogEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => malformed.push(StoreError::MalformedLine {
                    path: path.clone(),
                    line_number: idx + 1,
                    source: e,
                }),
            }
        }

        Ok(Some((entries, malformed)))
    }

    /// Append `entries` to the day file for `date`, creating directories and
    /// the file as needed.
    pub fn append(&self, date: NaiveDate, entries: &[LogEntry]) -> crate::util::error::Result<()> {
        use std::io::Write;

        std::fs::create_dir_all(&self.dir).map_err(|e| LogSiftError::Io {
            path: self.dir.clone(),
            operation: "create store directory",
            source: e,
        })?;

        let path = self.day_path(date);
        let io_err = |e: io::Error| LogSiftError::Io {
            path: path.clone(),
            operation: "append day file",
            source: e,
        };

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_err)?;

        let mut buf = String::new();
        for entry in entries {
            // Serialising a LogEntry cannot fail: all fields are plain data.
            if let Ok(json) = serde_json::to_string(entry) {
                buf.push_str(&json);
                buf.push('\n');
            }
        }
        file.write_all(buf.as_bytes()).map_err(io_err)?;

        tracing::debug!(path = %path.display(), count = entries.len(), "Day file appended");
        Ok(())
    }
}

impl LogManager for JsonLinesStore {
    /// Today's (UTC) day file.
    fn current_logs(&self) -> Vec<LogEntry> {
        self.logs_for_date(Utc::now().date_naive())
            .unwrap_or_default()
    }

    fn logs_for_date(&self, date: NaiveDate) -> Option<Vec<LogEntry>> {
        match self.read_day(date) {
            Ok(Some((entries, malformed))) => {
                for warning in malformed.iter().take(MAX_REPORTED_MALFORMED_LINES) {
                    tracing::warn!(error = %warning, "Skipping malformed log line");
                }
                if malformed.len() > MAX_REPORTED_MALFORMED_LINES {
                    tracing::warn!(
                        suppressed = malformed.len() - MAX_REPORTED_MALFORMED_LINES,
                        %date,
                        "Further malformed lines skipped"
                    );
                }
                tracing::debug!(%date, entries = entries.len(), "Day file read");
                Some(entries)
            }
            Ok(None) => {
                tracing::debug!(%date, "No day file for date");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, %date, "Day file unreadable; treating as no data");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Flag;
    use tempfile::TempDir;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    #[test]
    fn test_missing_day_is_none() {
        let dir = TempDir::new().unwrap();
        let store = JsonLinesStore::new(dir.path());
        assert!(store.logs_for_date(date(1)).is_none());
    }

    #[test]
    fn test_append_then_read_keeps_order() {
        let dir = TempDir::new().unwrap();
        let store = JsonLinesStore::new(dir.path().join("nested"));
        let entries = vec![
            LogEntry::new(1.0, Flag::Info, "app", Some("first".to_string())),
            LogEntry::new(2.0, Flag::Error, "db", None),
        ];
        store.append(date(2), &entries).unwrap();
        store.append(date(2), &entries[..1]).unwrap();

        let read = store.logs_for_date(date(2)).unwrap();
        assert_eq!(read.len(), 3);
        assert_eq!(read[0], entries[0]);
        assert_eq!(read[1], entries[1]);
    }

    #[test]
    fn test_malformed_and_blank_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let store = JsonLinesStore::new(dir.path());
        std::fs::write(
            store.day_path(date(3)),
            "{\"timestamp\":1,\"flag\":\"info\",\"module\":\"a\",\"message\":\"ok\"}\n\
             \n\
             not json\n\
             {\"timestamp\":2,\"flag\":\"nope\"}\n\
             {\"timestamp\":3,\"flag\":\"warn\",\"module\":\"b\"}\n",
        )
        .unwrap();

        let (entries, malformed) = store.read_day(date(3)).unwrap().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(malformed.len(), 2);
        assert!(matches!(
            malformed[0],
            StoreError::MalformedLine { line_number: 3, .. }
        ));
        assert_eq!(store.logs_for_date(date(3)).map(|e| e.len()), Some(2));
    }

    #[test]
    fn test_invalid_utf8_line_skips_only_that_line() {
        let dir = TempDir::new().unwrap();
        let store = JsonLinesStore::new(dir.path());
        let mut content = Vec::new();
        content.extend_from_slice(b"{\"timestamp\":1,\"flag\":\"info\",\"module\":\"a\"}\n");
        content.extend_from_slice(b"{\"timestamp\":2,\"flag\":\"info\",\"message\":\"bad \xff byte\"}\n");
        content.extend_from_slice(b"{\"timestamp\":3,\"flag\":\"error\",\"module\":\"b\"}\r\n");
        std::fs::write(store.day_path(date(4)), content).unwrap();

        let (entries, malformed) = store.read_day(date(4)).unwrap().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].flag(), Flag::Error);
        assert!(matches!(
            malformed.as_slice(),
            [StoreError::MalformedLine { line_number: 2, .. }]
        ));
        assert_eq!(store.logs_for_date(date(4)).map(|e| e.len()), Some(2));
    }

    #[test]
    fn test_available_dates_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        let store = JsonLinesStore::new(dir.path());
        for d in [5, 1, 3] {
            std::fs::write(store.day_path(date(d)), "").unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        std::fs::write(dir.path().join("garbage.jsonl"), "").unwrap();

        assert_eq!(
            store.available_dates().unwrap(),
            vec![date(1), date(3), date(5)]
        );
    }

    #[test]
    fn test_available_dates_missing_directory() {
        let store = JsonLinesStore::new("/nonexistent/logsift-store-test");
        assert!(matches!(
            store.available_dates(),
            Err(StoreError::DirectoryNotFound { .. })
        ));
    }
}
