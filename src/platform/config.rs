// LogSift - platform/config.rs
//
// Platform-specific configuration, data directory resolution, and config.toml
// loading with startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::app::session::SessionSettings;
use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Resolved platform paths for LogSift data and configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/logsift/)
    pub config_dir: PathBuf,

    /// Data directory; the default day-file store lives below it.
    pub data_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            let data_dir = proj_dirs.data_dir().to_path_buf();

            tracing::debug!(
                config = %config_dir.display(),
                data = %data_dir.display(),
                "Platform paths resolved"
            );

            Self {
                config_dir,
                data_dir,
            }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            let fallback = PathBuf::from(".");
            Self {
                config_dir: fallback.clone(),
                data_dir: fallback,
            }
        }
    }

    /// Default location of the day-file store.
    pub fn default_store_dir(&self) -> PathBuf {
        self.data_dir.join(constants::STORE_DIR_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility -- a newer
/// config file can be used with an older binary without crashing.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[filter]` section.
    pub filter: FilterSection,
    /// `[store]` section.
    pub store: StoreSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[filter]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct FilterSection {
    /// Debounce quiet interval in ms.
    pub debounce_ms: Option<u64>,
    /// Entry count at which filtering goes parallel (0 = never).
    pub parallel_threshold: Option<usize>,
}

/// `[store]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Directory holding `<YYYY-MM-DD>.jsonl` day files.
    pub directory: Option<String>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
///
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Debounce quiet interval in ms.
    pub debounce_ms: u64,
    /// Entry count at which filtering goes parallel (0 = never).
    pub parallel_threshold: usize,
    /// Store directory override.
    pub store_dir: Option<PathBuf>,
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            debounce_ms: constants::DEFAULT_FILTER_DEBOUNCE_MS,
            parallel_threshold: constants::DEFAULT_PARALLEL_FILTER_THRESHOLD,
            store_dir: None,
            log_level: None,
        }
    }
}

impl AppConfig {
    /// Session tunables carried by this config.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            debounce: Duration::from_millis(self.debounce_ms),
            parallel_threshold: self.parallel_threshold,
        }
    }
}

/// Load and validate `config.toml` from the given config directory.
///
/// Returns `AppConfig` with validated values and a list of non-fatal warnings.
/// If the file does not exist, returns defaults with no warnings (first-run).
/// If the file is unparseable, returns defaults with an error warning; the
/// application still starts but the user is informed.
pub fn load_config(config_dir: &Path) -> (AppConfig, Vec<String>) {
    let config_path = config_dir.join(constants::CONFIG_FILE_NAME);
    let mut warnings: Vec<String> = Vec::new();

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), warnings);
    }

    let content = match std::fs::read_to_string(&config_path) {
        Ok(c) => c,
        Err(source) => {
            let err = ConfigError::Io {
                path: config_path.clone(),
                source,
            };
            let msg = format!("{err}. Using defaults.");
            tracing::warn!("{}", msg);
            warnings.push(msg);
            return (AppConfig::default(), warnings);
        }
    };

    let (config, mut parse_warnings) = parse_config(&content, &config_path);
    warnings.append(&mut parse_warnings);
    (config, warnings)
}

/// Parse and validate config.toml content. `path` is only used in messages.
pub fn parse_config(content: &str, path: &Path) -> (AppConfig, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();

    let raw: RawConfig = match toml::from_str(content) {
        Ok(r) => r,
        Err(source) => {
            let err = ConfigError::TomlParse {
                path: path.to_path_buf(),
                source,
            };
            let msg = format!("{err}. Using defaults.");
            tracing::warn!("{}", msg);
            warnings.push(msg);
            return (AppConfig::default(), warnings);
        }
    };

    tracing::info!(path = %path.display(), "Loaded config.toml");

    let mut config = AppConfig::default();

    // -- Filter: debounce_ms --
    if let Some(ms) = raw.filter.debounce_ms {
        if (constants::MIN_FILTER_DEBOUNCE_MS..=constants::MAX_FILTER_DEBOUNCE_MS).contains(&ms) {
            config.debounce_ms = ms;
        } else {
            warnings.push(out_of_range(
                "filter.debounce_ms",
                ms,
                format!(
                    "{}-{}",
                    constants::MIN_FILTER_DEBOUNCE_MS,
                    constants::MAX_FILTER_DEBOUNCE_MS
                ),
                constants::DEFAULT_FILTER_DEBOUNCE_MS,
            ));
        }
    }

    // -- Filter: parallel_threshold --
    if let Some(threshold) = raw.filter.parallel_threshold {
        if threshold <= constants::MAX_PARALLEL_FILTER_THRESHOLD {
            config.parallel_threshold = threshold;
        } else {
            warnings.push(out_of_range(
                "filter.parallel_threshold",
                threshold,
                format!("0-{}", constants::MAX_PARALLEL_FILTER_THRESHOLD),
                constants::DEFAULT_PARALLEL_FILTER_THRESHOLD,
            ));
        }
    }

    // -- Store: directory --
    if let Some(ref dir) = raw.store.directory {
        if !dir.is_empty() {
            config.store_dir = Some(PathBuf::from(dir));
        }
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.clone());
        } else {
            warnings.push(out_of_range(
                "logging.level",
                level,
                valid.join(", "),
                constants::DEFAULT_LOG_LEVEL,
            ));
        }
    }

    if !warnings.is_empty() {
        tracing::warn!(
            count = warnings.len(),
            "Config validation produced warnings"
        );
    }

    (config, warnings)
}

/// Warning text for a rejected value, naming the default that replaces it.
fn out_of_range(
    field: &str,
    value: impl std::fmt::Display,
    expected: String,
    default: impl std::fmt::Display,
) -> String {
    let err = ConfigError::ValueOutOfRange {
        field: field.to_string(),
        value: value.to_string(),
        expected,
    };
    format!("{err}. Using default ({default}).")
}
