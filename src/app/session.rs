// LogSift - app/session.rs
//
// LogSession: owns the authoritative log set, the displayed subset, and the
// filter criteria, and exposes the operations the presentation layer drives.
//
// Architecture:
//   - State lives behind one mutex. Criteria mutators and the display-order
//     toggle are synchronous and hold the lock only briefly.
//   - `load`, `search` and `refresh` run as jobs on the session's single
//     worker thread. Jobs snapshot what they need, compute unlocked, then
//     write back, so slow filtering never blocks input handling.
//   - Because there is exactly one worker, loads and refreshes never overlap
//     and run in submission order: the last submitted load wins.
//   - Debounced requests go through `DebouncedExecutor`, whose fired action
//     only queues the job on the worker.
//   - Completions are posted to the presentation's `CompletionQueue` and run
//     when the presentation thread drains it.

use crate::app::debounce::DebouncedExecutor;
use crate::app::dispatch::{CompletionSender, Job, Worker};
use crate::app::log_manager::LogManager;
use crate::core::criteria::{normalise_options, FilterCriteria, SelectedOption, TimeWindow};
use crate::core::filter::FilterEngine;
use crate::core::model::{Flag, LogEntry};
use crate::util::constants::{DEFAULT_FILTER_DEBOUNCE_MS, DEFAULT_PARALLEL_FILTER_THRESHOLD};
use crate::util::logging::preview;
use chrono::NaiveDate;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Tunables for a session, usually derived from `AppConfig`.
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    /// Quiet interval for debounced `search`/`refresh` requests.
    pub debounce: Duration,
    /// Passed to `FilterEngine::new`.
    pub parallel_threshold: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_FILTER_DEBOUNCE_MS),
            parallel_threshold: DEFAULT_PARALLEL_FILTER_THRESHOLD,
        }
    }
}

#[derive(Debug, Default)]
struct SessionState {
    /// Full candidate set for the active date, newest first.
    integral_logs: Arc<Vec<LogEntry>>,

    /// Subset of `integral_logs` passing `criteria`, same relative order.
    displayed_logs: Vec<LogEntry>,

    criteria: FilterCriteria,

    /// Date `integral_logs` was loaded for (`None` = current buffer).
    loaded_date: Option<NaiveDate>,

    /// The criteria's date differs from `loaded_date`; the next refresh
    /// reloads before filtering.
    date_changed: bool,
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Query front-end over one day's logs.
pub struct LogSession {
    state: Arc<Mutex<SessionState>>,
    manager: Arc<dyn LogManager>,
    engine: FilterEngine,
    completions: CompletionSender,
    // Field order matters for drop: the debouncer (and any pending action
    // holding a worker handle) goes first, then the worker drains and joins.
    debouncer: DebouncedExecutor,
    worker: Worker,
}

impl LogSession {
    /// Create a session reading from `manager` and posting completions to
    /// `completions`. Nothing is loaded until `load` is called.
    pub fn new(
        manager: Arc<dyn LogManager>,
        settings: SessionSettings,
        completions: CompletionSender,
    ) -> Self {
        let debouncer = DebouncedExecutor::new(settings.debounce);
        tracing::debug!(
            debounce_ms = debouncer.interval().as_millis() as u64,
            parallel_threshold = settings.parallel_threshold,
            "Log session created"
        );

        Self {
            state: Arc::new(Mutex::new(SessionState::default())),
            manager,
            engine: FilterEngine::new(settings.parallel_threshold),
            completions,
            debouncer,
            worker: Worker::spawn(),
        }
    }

    // -------------------------------------------------------------------------
    // Background operations
    // -------------------------------------------------------------------------

    /// Load the authoritative set for `date` (or the current buffer when
    /// `None`), rebuild the flag/module option lists, and show everything
    /// unfiltered. `completion` runs on the presentation thread once the data
    /// is ready.
    pub fn load(&self, date: Option<NaiveDate>, completion: impl FnOnce() + Send + 'static) {
        let state = Arc::clone(&self.state);
        let manager = Arc::clone(&self.manager);
        let completions = self.completions.clone();

        self.worker.submit(Box::new(move || {
            let logs = fetch(manager.as_ref(), date);
            let count = ingest(&state, date, logs, true);

            tracing::info!(entries = count, date = ?date, "Logs loaded");
            completions.post(completion);
        }));
    }

    /// Keyword-only query over the authoritative set, ignoring every other
    /// criterion. Does not touch the displayed logs or stored criteria.
    ///
    /// `execute_immediately` bypasses the debouncer (explicit commits);
    /// otherwise bursts of calls collapse into the last one.
    pub fn search(
        &self,
        keyword: &str,
        execute_immediately: bool,
        completion: impl FnOnce(Vec<LogEntry>) + Send + 'static,
    ) {
        let state = Arc::clone(&self.state);
        let engine = self.engine;
        let completions = self.completions.clone();
        let keyword = keyword.to_string();

        tracing::debug!(
            keyword = %preview(&keyword),
            immediate = execute_immediately,
            "Search requested"
        );

        self.dispatch(
            execute_immediately,
            Box::new(move || {
                let logs = Arc::clone(&lock(&state).integral_logs);
                let matches = engine.search(&keyword, &logs);
                completions.post(move || completion(matches));
            }),
        );
    }

    /// Recompute the displayed logs from the authoritative set and the
    /// current criteria. If the time window moved to a different date since
    /// the last load, that date's logs are loaded first.
    pub fn refresh(&self, execute_immediately: bool, completion: impl FnOnce() + Send + 'static) {
        let state = Arc::clone(&self.state);
        let manager = Arc::clone(&self.manager);
        let engine = self.engine;
        let completions = self.completions.clone();

        tracing::debug!(immediate = execute_immediately, "Refresh requested");

        self.dispatch(
            execute_immediately,
            Box::new(move || {
                let reload = {
                    let mut st = lock(&state);
                    match st.criteria.date() {
                        Some(date) if st.date_changed => {
                            st.date_changed = false;
                            Some(date)
                        }
                        _ => None,
                    }
                };
                if let Some(date) = reload {
                    let logs = fetch(manager.as_ref(), Some(date));
                    let count = ingest(&state, Some(date), logs, false);
                    tracing::info!(entries = count, %date, "Logs reloaded for new date");
                }

                let (criteria, logs) = {
                    let st = lock(&state);
                    (st.criteria.clone(), Arc::clone(&st.integral_logs))
                };
                let displayed = engine.apply(&criteria, &logs);
                lock(&state).displayed_logs = displayed;

                completions.post(completion);
            }),
        );
    }

    fn dispatch(&self, execute_immediately: bool, job: Job) {
        if execute_immediately {
            self.worker.submit(job);
        } else {
            let worker = self.worker.handle();
            self.debouncer.execute(move || {
                worker.submit(job);
            });
        }
    }

    // -------------------------------------------------------------------------
    // Synchronous mutators
    // -------------------------------------------------------------------------

    /// Set the standing keyword filter. Empty clears it.
    pub fn update_keyword(&self, keyword: &str) {
        lock(&self.state).criteria.keyword = Some(keyword.to_string());
    }

    /// Replace the flag selection. A list without the `All` sentinel at
    /// index 0 is normalised to have one.
    pub fn update_flags(&self, flags: Vec<SelectedOption<Flag>>) {
        lock(&self.state).criteria.flag_options = normalise_options(flags);
    }

    /// Replace the module selection. Normalised like `update_flags`.
    pub fn update_modules(&self, modules: Vec<SelectedOption<String>>) {
        lock(&self.state).criteria.module_options = normalise_options(modules);
    }

    /// Replace the time window. A window on a different date than the one
    /// currently loaded marks the session for reload on the next refresh.
    pub fn update_time_window(&self, window: TimeWindow) {
        let mut st = lock(&self.state);
        st.date_changed = window.date != st.loaded_date;
        st.criteria.time_window = window;

        tracing::debug!(
            date = ?window.date,
            date_changed = st.date_changed,
            "Time window updated"
        );
    }

    /// Reverse the displayed logs in place.
    ///
    /// Presentation-only: the authoritative set and criteria are untouched,
    /// so the next refresh restores newest-first order.
    pub fn reverse_display_order(&self) {
        lock(&self.state).displayed_logs.reverse();
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Snapshot of the displayed logs.
    pub fn displayed_logs(&self) -> Vec<LogEntry> {
        lock(&self.state).displayed_logs.clone()
    }

    /// Borrow the displayed logs without cloning them.
    pub fn with_displayed_logs<R>(&self, f: impl FnOnce(&[LogEntry]) -> R) -> R {
        f(&lock(&self.state).displayed_logs)
    }

    /// Snapshot of the authoritative set (newest first).
    pub fn integral_logs(&self) -> Arc<Vec<LogEntry>> {
        Arc::clone(&lock(&self.state).integral_logs)
    }

    /// Snapshot of the current criteria.
    pub fn criteria(&self) -> FilterCriteria {
        lock(&self.state).criteria.clone()
    }

    /// Whether the next refresh will reload for a new date.
    pub fn is_date_changed(&self) -> bool {
        lock(&self.state).date_changed
    }
}

/// Ask the manager for `date`'s logs (or the current buffer).
fn fetch(manager: &dyn LogManager, date: Option<NaiveDate>) -> Vec<LogEntry> {
    match date {
        Some(date) => manager.logs_for_date(date).unwrap_or_default(),
        None => manager.current_logs(),
    }
}

/// Install a freshly fetched, chronological log set: newest first, with
/// option lists rebuilt from what it contains. With `show_all` the displayed
/// logs become the whole set in the same critical section. Returns the entry
/// count.
fn ingest(
    state: &Mutex<SessionState>,
    date: Option<NaiveDate>,
    mut logs: Vec<LogEntry>,
    show_all: bool,
) -> usize {
    logs.reverse();
    let shown = show_all.then(|| logs.clone());

    // Option discovery scans the whole set; do it before taking the lock.
    let mut discovered = FilterCriteria::default();
    if !logs.is_empty() {
        discovered.discover_options(&logs);
    }
    let count = logs.len();

    let mut st = lock(state);
    st.criteria.flag_options = discovered.flag_options;
    st.criteria.module_options = discovered.module_options;
    st.integral_logs = Arc::new(logs);
    if let Some(shown) = shown {
        st.displayed_logs = shown;
    } else if count == 0 {
        st.displayed_logs.clear();
    }
    st.loaded_date = date;
    st.date_changed = st.criteria.date() != date;
    count
}

// =============================================================================
// Unit tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::dispatch::CompletionQueue;
    use crate::app::log_manager::InMemoryLogManager;
    use std::sync::mpsc;

    const WAIT: Duration = Duration::from_secs(5);

    fn make_entry(timestamp: f64, flag: Flag, module: &str, message: &str) -> LogEntry {
        LogEntry::new(timestamp, flag, module, Some(message.to_string()))
    }

    fn settings() -> SessionSettings {
        SessionSettings {
            debounce: Duration::from_millis(100),
            parallel_threshold: 0,
        }
    }

    fn session_with(logs: Vec<LogEntry>) -> (LogSession, CompletionQueue, Arc<InMemoryLogManager>) {
        let queue = CompletionQueue::new();
        let manager = Arc::new(InMemoryLogManager::with_current(logs));
        let session = LogSession::new(manager.clone(), settings(), queue.sender());
        (session, queue, manager)
    }

    fn load_and_wait(session: &LogSession, queue: &CompletionQueue) {
        session.load(None, || {});
        assert!(queue.run_next(WAIT), "load did not complete");
    }

    fn refresh_and_wait(session: &LogSession, queue: &CompletionQueue) {
        session.refresh(true, || {});
        assert!(queue.run_next(WAIT), "refresh did not complete");
    }

    fn timestamps(logs: &[LogEntry]) -> Vec<f64> {
        logs.iter().map(LogEntry::timestamp).collect()
    }

    #[test]
    fn test_load_discovers_flags_and_reverses() {
        let flags = [Flag::Info, Flag::Info, Flag::Error, Flag::Warning, Flag::Error];
        let logs = flags
            .iter()
            .enumerate()
            .map(|(i, f)| make_entry(i as f64, *f, "m", "x"))
            .collect();
        let (session, queue, _) = session_with(logs);
        load_and_wait(&session, &queue);

        let labels: Vec<_> = session
            .criteria()
            .flag_options
            .iter()
            .map(|o| o.label())
            .collect();
        assert_eq!(labels, vec!["All", "error", "info", "warning"]);
        assert_eq!(
            timestamps(&session.displayed_logs()),
            vec![4.0, 3.0, 2.0, 1.0, 0.0]
        );
    }

    #[test]
    fn test_load_empty_resets_options_and_clears() {
        let (session, queue, _) = session_with(vec![make_entry(1.0, Flag::Info, "m", "x")]);
        session.update_flags(vec![SelectedOption::new(Flag::Info).selected(true)]);

        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        session.update_time_window(TimeWindow::for_date(date));
        session.load(Some(date), || {});
        assert!(queue.run_next(WAIT));

        let criteria = session.criteria();
        assert_eq!(criteria.flag_options, vec![SelectedOption::all()]);
        assert_eq!(criteria.module_options, vec![SelectedOption::all()]);
        assert!(session.displayed_logs().is_empty());
        assert!(session.integral_logs().is_empty());
        assert!(!session.is_date_changed());
    }

    #[test]
    fn test_refresh_before_load_is_empty() {
        let (session, queue, _) = session_with(vec![make_entry(1.0, Flag::Info, "m", "x")]);
        refresh_and_wait(&session, &queue);
        assert!(session.displayed_logs().is_empty());
    }

    #[test]
    fn test_refresh_applies_standing_filter() {
        let logs = vec![
            make_entry(1.0, Flag::Error, "net", "connect timeout"),
            make_entry(2.0, Flag::Info, "db", "ok"),
            make_entry(3.0, Flag::Error, "db", "read timeout"),
        ];
        let (session, queue, _) = session_with(logs);
        load_and_wait(&session, &queue);

        session.update_keyword("timeout");
        refresh_and_wait(&session, &queue);
        assert_eq!(timestamps(&session.displayed_logs()), vec![3.0, 1.0]);

        let mut modules = session.criteria().module_options;
        modules[0].is_selected = false;
        for option in modules.iter_mut().skip(1) {
            option.is_selected = option.value().map(String::as_str) == Some("net");
        }
        session.update_modules(modules);
        refresh_and_wait(&session, &queue);
        assert_eq!(timestamps(&session.displayed_logs()), vec![1.0]);

        session.update_keyword("");
        session.update_modules(Vec::new());
        refresh_and_wait(&session, &queue);
        assert_eq!(session.displayed_logs().len(), 3);
    }

    #[test]
    fn test_search_is_keyword_only_and_leaves_view_alone() {
        let logs = vec![
            make_entry(1.0, Flag::Error, "net", "connect timeout"),
            make_entry(2.0, Flag::Info, "db", "ok"),
            make_entry(3.0, Flag::Info, "db", "read timeout"),
        ];
        let (session, queue, _) = session_with(logs);
        load_and_wait(&session, &queue);

        session.update_flags(vec![
            SelectedOption::all().selected(false),
            SelectedOption::new(Flag::Error).selected(true),
        ]);
        refresh_and_wait(&session, &queue);
        let before = session.displayed_logs();
        let criteria_before = session.criteria();

        let (tx, rx) = mpsc::channel();
        session.search("timeout", true, move |found| tx.send(found).unwrap());
        assert!(queue.run_next(WAIT));
        let found = rx.recv().unwrap();

        assert_eq!(timestamps(&found), vec![3.0, 1.0]);
        assert_eq!(session.displayed_logs(), before);
        assert_eq!(session.criteria(), criteria_before);
    }

    #[test]
    fn test_debounced_search_coalesces() {
        let logs = vec![
            make_entry(1.0, Flag::Info, "m", "alpha"),
            make_entry(2.0, Flag::Info, "m", "beta"),
        ];
        let (session, queue, _) = session_with(logs);
        load_and_wait(&session, &queue);

        let (tx, rx) = mpsc::channel();
        for keyword in ["a", "al", "alp", "alph"] {
            let tx = tx.clone();
            let kw = keyword.to_string();
            session.search(keyword, false, move |found| tx.send((kw, found.len())).unwrap());
        }

        assert!(queue.run_next(WAIT));
        assert!(!queue.run_next(Duration::from_millis(400)));
        assert_eq!(rx.try_recv(), Ok(("alph".to_string(), 1)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_debounced_refresh_coalesces_to_last_keyword() {
        let logs = vec![
            make_entry(1.0, Flag::Info, "m", "alpha"),
            make_entry(2.0, Flag::Info, "m", "alpine"),
            make_entry(3.0, Flag::Info, "m", "beta"),
        ];
        let (session, queue, _) = session_with(logs);
        load_and_wait(&session, &queue);

        let (tx, rx) = mpsc::channel();
        for keyword in ["a", "al", "alp", "alph"] {
            session.update_keyword(keyword);
            let tx = tx.clone();
            session.refresh(false, move || tx.send(keyword).unwrap());
        }

        assert!(queue.run_next(WAIT), "debounced refresh never completed");
        assert!(!queue.run_next(Duration::from_millis(400)));
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec!["alph"]);
        assert_eq!(timestamps(&session.displayed_logs()), vec![1.0]);
    }

    #[test]
    fn test_immediate_refresh_while_debounce_pending() {
        let logs = vec![
            make_entry(1.0, Flag::Info, "m", "alpha"),
            make_entry(2.0, Flag::Info, "m", "beta"),
        ];
        let (session, queue, _) = session_with(logs);
        load_and_wait(&session, &queue);

        let (tx, rx) = mpsc::channel();
        let debounced = tx.clone();
        session.update_keyword("beta");
        session.refresh(false, move || debounced.send("debounced").unwrap());
        for _ in 0..3 {
            let tx = tx.clone();
            session.refresh(true, move || tx.send("immediate").unwrap());
        }

        // Three immediate completions plus the one settled debounced refresh.
        for _ in 0..4 {
            assert!(queue.run_next(WAIT));
        }
        assert!(!queue.run_next(Duration::from_millis(400)));
        let fired: Vec<_> = rx.try_iter().collect();
        assert_eq!(fired.iter().filter(|f| **f == "immediate").count(), 3);
        assert_eq!(fired.iter().filter(|f| **f == "debounced").count(), 1);
        assert_eq!(timestamps(&session.displayed_logs()), vec![2.0]);
    }

    #[test]
    fn test_ingest_shows_new_set_in_one_step() {
        let state = Mutex::new(SessionState::default());
        lock(&state).displayed_logs = vec![make_entry(9.0, Flag::Error, "old", "stale")];

        let logs = vec![
            make_entry(1.0, Flag::Info, "m", "a"),
            make_entry(2.0, Flag::Info, "m", "b"),
        ];
        assert_eq!(ingest(&state, None, logs.clone(), true), 2);
        {
            let st = lock(&state);
            assert_eq!(timestamps(&st.displayed_logs), vec![2.0, 1.0]);
            assert_eq!(st.displayed_logs, *st.integral_logs);
        }

        // Without show_all the previous view stays until the caller filters.
        lock(&state).displayed_logs.truncate(1);
        ingest(&state, None, logs, false);
        assert_eq!(timestamps(&lock(&state).displayed_logs), vec![2.0]);
    }

    #[test]
    fn test_with_displayed_logs_borrows_current_view() {
        let (session, queue, _) = session_with(vec![
            make_entry(1.0, Flag::Info, "m", "a"),
            make_entry(2.0, Flag::Error, "m", "b"),
        ]);
        load_and_wait(&session, &queue);
        session.reverse_display_order();

        let first = session.with_displayed_logs(|rows| rows.first().map(LogEntry::timestamp));
        assert_eq!(first, Some(1.0));
    }

    #[test]
    fn test_immediate_refresh_runs_once_per_call() {
        let (session, queue, _) = session_with(vec![make_entry(1.0, Flag::Info, "m", "x")]);
        load_and_wait(&session, &queue);

        let (tx, rx) = mpsc::channel();
        for i in 0..5 {
            let tx = tx.clone();
            session.refresh(true, move || tx.send(i).unwrap());
        }
        for _ in 0..5 {
            assert!(queue.run_next(WAIT));
        }
        let order: Vec<_> = rx.try_iter().collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_date_change_reloads_on_next_refresh() {
        let (session, queue, manager) = session_with(vec![make_entry(1.0, Flag::Info, "m", "now")]);
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let window = TimeWindow::for_date(date);
        manager.insert_day(
            date,
            vec![
                make_entry(window.start + 10.0, Flag::Debug, "old", "first"),
                make_entry(window.start + 20.0, Flag::Warning, "old", "second"),
            ],
        );
        load_and_wait(&session, &queue);

        session.update_time_window(window);
        assert!(session.is_date_changed());
        // Mutator alone does no I/O.
        assert_eq!(session.integral_logs().len(), 1);

        refresh_and_wait(&session, &queue);
        assert!(!session.is_date_changed());
        assert_eq!(
            timestamps(&session.displayed_logs()),
            vec![window.start + 20.0, window.start + 10.0]
        );
        let modules: Vec<_> = session
            .criteria()
            .module_options
            .iter()
            .map(|o| o.label())
            .collect();
        assert_eq!(modules, vec!["All", "old"]);
    }

    #[test]
    fn test_same_date_does_not_mark_changed() {
        let (session, queue, _) = session_with(Vec::new());
        load_and_wait(&session, &queue);
        session.update_time_window(TimeWindow::new(0.0, 10.0));
        assert!(!session.is_date_changed());
    }

    #[test]
    fn test_reverse_is_discarded_by_refresh() {
        let logs = vec![
            make_entry(1.0, Flag::Info, "m", "A"),
            make_entry(2.0, Flag::Info, "m", "B"),
            make_entry(3.0, Flag::Info, "m", "C"),
        ];
        let (session, queue, _) = session_with(logs);
        load_and_wait(&session, &queue);
        assert_eq!(timestamps(&session.displayed_logs()), vec![3.0, 2.0, 1.0]);

        session.reverse_display_order();
        assert_eq!(timestamps(&session.displayed_logs()), vec![1.0, 2.0, 3.0]);
        assert_eq!(timestamps(&session.integral_logs()), vec![3.0, 2.0, 1.0]);

        refresh_and_wait(&session, &queue);
        assert_eq!(timestamps(&session.displayed_logs()), vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_overlapping_loads_last_submitted_wins() {
        let (session, queue, manager) = session_with(vec![make_entry(1.0, Flag::Info, "m", "now")]);
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        manager.insert_day(date, vec![make_entry(5.0, Flag::Error, "old", "then")]);

        let (tx, rx) = mpsc::channel();
        let first = tx.clone();
        session.load(None, move || first.send("current").unwrap());
        session.load(Some(date), move || tx.send("dated").unwrap());
        assert!(queue.run_next(WAIT));
        assert!(queue.run_next(WAIT));

        // Superseded completions still fire, in submission order.
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec!["current", "dated"]);
        assert_eq!(timestamps(&session.integral_logs()), vec![5.0]);
    }
}
