// LogSift - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// The filtering core has no failure paths; errors only arise at the
// platform boundary (day-file store, config loading) and in the CLI.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all LogSift operations.
#[derive(Debug)]
pub enum LogSiftError {
    /// Reading the day-file store failed.
    Store(StoreError),

    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for LogSiftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "Store error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for LogSiftError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

/// Errors produced while reading per-day log files.
///
/// These never cross the `LogManager` boundary: the store logs them and
/// reports "no data for date" instead.
#[derive(Debug)]
pub enum StoreError {
    /// The store directory does not exist.
    DirectoryNotFound { path: PathBuf },

    /// A day file exists but could not be read.
    Io { path: PathBuf, source: io::Error },

    /// A line in a day file is not a valid JSON log entry.
    MalformedLine {
        path: PathBuf,
        line_number: usize,
        source: serde_json::Error,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirectoryNotFound { path } => {
                write!(f, "Log store directory '{}' does not exist", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "Cannot read day file '{}': {source}", path.display())
            }
            Self::MalformedLine {
                path,
                line_number,
                source,
            } => write!(
                f,
                "'{}' line {line_number}: not a valid log entry: {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::MalformedLine { source, .. } => Some(source),
            Self::DirectoryNotFound { .. } => None,
        }
    }
}

impl From<StoreError> for LogSiftError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for LogSiftError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Flag parsing
// ---------------------------------------------------------------------------

/// A flag label that matches none of the known flags or their aliases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFlagError {
    pub input: String,
}

impl fmt::Display for ParseFlagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown flag '{}'. Valid values: debug, error, info, success, warning",
            self.input
        )
    }
}

impl std::error::Error for ParseFlagError {}

/// Convenience type alias for LogSift results.
pub type Result<T> = std::result::Result<T, LogSiftError>;
