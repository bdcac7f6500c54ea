// LogSift - main.rs
//
// Command-line entry point. Handles:
// 1. CLI argument parsing
// 2. Logging initialisation (debug mode support)
// 3. config.toml loading and store resolution
// 4. Driving a LogSession over one day's logs and printing the result

use clap::Parser;
use logsift::app::dispatch::CompletionQueue;
use logsift::app::session::LogSession;
use logsift::core::criteria::{SelectedOption, TimeWindow};
use logsift::core::model::{Flag, LogEntry};
use logsift::platform::config::{load_config, PlatformPaths};
use logsift::platform::store::JsonLinesStore;
use logsift::util;
use chrono::{NaiveDate, NaiveTime};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Upper bound on how long the CLI waits for one background operation.
const OPERATION_TIMEOUT: Duration = Duration::from_secs(300);

/// LogSift - query a day's structured logs.
///
/// Reads `<store>/<YYYY-MM-DD>.jsonl` day files, narrows them by time window,
/// keyword, flag and module, and prints the matching entries newest first.
#[derive(Parser, Debug)]
#[command(name = "LogSift", version, about)]
struct Cli {
    /// Directory holding day files (defaults to config or platform data dir).
    #[arg(short = 's', long = "store")]
    store: Option<PathBuf>,

    /// Day to inspect, YYYY-MM-DD (defaults to today, UTC).
    #[arg(long = "date", value_parser = parse_date)]
    date: Option<NaiveDate>,

    /// Only entries whose message contains this text (case-sensitive).
    #[arg(short = 'k', long = "keyword")]
    keyword: Option<String>,

    /// Only entries with this flag; repeat for several.
    #[arg(short = 'f', long = "flag")]
    flags: Vec<Flag>,

    /// Only entries from this module; repeat for several.
    #[arg(short = 'm', long = "module")]
    modules: Vec<String>,

    /// Start of the time window, HH:MM[:SS].
    #[arg(long = "from", value_parser = parse_time, requires = "to")]
    from: Option<NaiveTime>,

    /// End of the time window, HH:MM[:SS].
    #[arg(long = "to", value_parser = parse_time, requires = "from")]
    to: Option<NaiveTime>,

    /// Keyword-only search over the whole day, ignoring other filters.
    #[arg(long = "search", requires = "keyword")]
    search: bool,

    /// Print oldest first.
    #[arg(short = 'r', long = "reverse")]
    reverse: bool,

    /// Print one JSON object per line instead of table rows.
    #[arg(long = "json")]
    json: bool,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    /// Directory containing config.toml.
    #[arg(long = "config-dir")]
    config_dir: Option<PathBuf>,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|e| format!("expected HH:MM or HH:MM:SS: {e}"))
}

fn main() {
    // Usage errors exit with 1; --help and --version still exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    // Config is read before logging starts so its level can apply; warnings
    // are replayed once tracing is up.
    let platform_paths = PlatformPaths::resolve();
    let config_dir = cli
        .config_dir
        .clone()
        .unwrap_or_else(|| platform_paths.config_dir.clone());
    let (config, config_warnings) = load_config(&config_dir);

    util::logging::init(cli.debug, config.log_level.as_deref());

    tracing::info!(
        version = util::constants::APP_VERSION,
        debug = cli.debug,
        "LogSift starting"
    );
    for warning in &config_warnings {
        tracing::warn!("{}", warning);
        eprintln!("Warning: {warning}");
    }

    // Store directory: CLI override > config > platform default
    let store_dir = cli
        .store
        .clone()
        .or_else(|| config.store_dir.clone())
        .unwrap_or_else(|| platform_paths.default_store_dir());

    if !store_dir.is_dir() {
        tracing::error!(path = %store_dir.display(), "Store directory not found");
        eprintln!(
            "Error: store directory '{}' does not exist",
            store_dir.display()
        );
        std::process::exit(1);
    }

    let store = Arc::new(JsonLinesStore::new(&store_dir));
    let queue = CompletionQueue::new();
    let session = LogSession::new(store, config.session_settings(), queue.sender());

    let Some(printed) = run_query(&cli, &session, &queue) else {
        eprintln!("Error: timed out waiting for results");
        std::process::exit(1);
    };

    match printed {
        Ok(rows) => tracing::info!(rows, "LogSift finished"),
        // Broken pipe (e.g. `| head`) is not worth reporting.
        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
        Err(e) => {
            eprintln!("Error: failed to write output: {e}");
            std::process::exit(1);
        }
    }
}

/// Load, narrow and print the matching rows. Returns the number printed, or
/// `None` on timeout.
fn run_query(
    cli: &Cli,
    session: &LogSession,
    queue: &CompletionQueue,
) -> Option<std::io::Result<usize>> {
    session.load(cli.date, || {});
    if !queue.run_next(OPERATION_TIMEOUT) {
        return None;
    }

    if cli.search {
        let found: Arc<Mutex<Option<Vec<LogEntry>>>> = Arc::default();
        let slot = Arc::clone(&found);
        let keyword = cli.keyword.as_deref().unwrap_or_default();
        session.search(keyword, true, move |logs| {
            *slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(logs);
        });
        if !queue.run_next(OPERATION_TIMEOUT) {
            return None;
        }
        let mut rows = found
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .unwrap_or_default();
        if cli.reverse {
            rows.reverse();
        }
        return Some(print_rows(&rows, cli.json).map(|()| rows.len()));
    }

    if let Some(keyword) = &cli.keyword {
        session.update_keyword(keyword);
    }
    if !cli.flags.is_empty() {
        session.update_flags(selection(cli.flags.iter().copied()));
    }
    if !cli.modules.is_empty() {
        session.update_modules(selection(cli.modules.iter().cloned()));
    }
    if let (Some(from), Some(to)) = (cli.from, cli.to) {
        let date = cli
            .date
            .unwrap_or_else(|| chrono::Utc::now().date_naive());
        let window = TimeWindow::for_date_between(date, from, to);
        // Keep the window on the loaded buffer so refresh does not reload.
        session.update_time_window(TimeWindow { date: cli.date, ..window });
    }

    session.refresh(true, || {});
    if !queue.run_next(OPERATION_TIMEOUT) {
        return None;
    }

    if cli.reverse {
        session.reverse_display_order();
    }
    Some(session.with_displayed_logs(|rows| {
        print_rows(rows, cli.json).map(|()| rows.len())
    }))
}

/// Option list selecting exactly `values`, with `All` unselected.
fn selection<T>(values: impl IntoIterator<Item = T>) -> Vec<SelectedOption<T>> {
    std::iter::once(SelectedOption::all().selected(false))
        .chain(values.into_iter().map(|v| SelectedOption::new(v).selected(true)))
        .collect()
}

fn print_rows(rows: &[LogEntry], json: bool) -> std::io::Result<()> {
    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());

    for entry in rows {
        if json {
            let line = serde_json::to_string(entry).map_err(std::io::Error::from)?;
            writeln!(out, "{line}")?;
        } else {
            writeln!(
                out,
                "{}  {:<4}  {:<16}  {}",
                entry.format_time(),
                entry.flag().short_label(),
                entry.module(),
                entry.safe_message()
            )?;
        }
    }
    out.flush()
}
