// LogSift - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "LogSift";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "LogSift";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Log entry model
// =============================================================================

/// Text shown in place of a log message that is absent or sanitises to
/// nothing. Guarantees `LogEntry::safe_message` is never empty.
pub const MISSING_MESSAGE_PLACEHOLDER: &str = "<no message>";

/// Label of the "match-all" option at index 0 of every option list.
pub const ALL_OPTION_LABEL: &str = "All";

/// Number of seconds in one calendar day.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

// =============================================================================
// Filtering and debounce
// =============================================================================

/// Default quiet interval for debounced filter/search requests (ms).
pub const DEFAULT_FILTER_DEBOUNCE_MS: u64 = 300;

/// Minimum user-configurable debounce interval (ms).
pub const MIN_FILTER_DEBOUNCE_MS: u64 = 50;

/// Maximum user-configurable debounce interval (ms).
pub const MAX_FILTER_DEBOUNCE_MS: u64 = 5_000;

/// Number of entries above which the filter engine evaluates predicates on
/// the rayon pool instead of sequentially. 0 disables parallel filtering.
pub const DEFAULT_PARALLEL_FILTER_THRESHOLD: usize = 50_000;

/// Hard upper bound on the configurable parallel threshold.
pub const MAX_PARALLEL_FILTER_THRESHOLD: usize = 10_000_000;

// =============================================================================
// Log store
// =============================================================================

/// File extension of per-day log files in the JSON-lines store.
pub const STORE_FILE_EXTENSION: &str = "jsonl";

/// Subdirectory of the platform data directory holding day files.
pub const STORE_DIR_NAME: &str = "logs";

/// Maximum number of malformed lines reported individually per day file.
/// Further malformed lines are counted but not logged one by one.
pub const MAX_REPORTED_MALFORMED_LINES: usize = 20;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Maximum number of characters of a search keyword included in debug output.
pub const DEBUG_MAX_KEYWORD_PREVIEW: usize = 64;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
