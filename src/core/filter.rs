// LogSift - core/filter.rs
//
// Composable filter engine for log entries.
// Criteria are turned into an ordered chain of independent predicates that
// are AND-combined; evaluation is pure and preserves input order.
// Core layer: pure logic, no I/O or UI dependencies.

use crate::core::criteria::{is_unrestricted, selected_values, FilterCriteria};
use crate::core::model::{Flag, LogEntry};
use crate::util::constants::DEFAULT_PARALLEL_FILTER_THRESHOLD;
use rayon::prelude::*;
use std::collections::HashSet;
use std::time::Instant;

/// A single filter condition. Shared across rayon workers, hence `Sync`.
pub type Predicate<'a> = Box<dyn Fn(&LogEntry) -> bool + Send + Sync + 'a>;

/// Build the predicate chain for `criteria`, in evaluation order:
/// time window, keyword, flags, modules.
///
/// The time predicate is always present; the others only when their
/// dimension restricts anything.
pub fn build_predicates(criteria: &FilterCriteria) -> Vec<Predicate<'_>> {
    let mut predicates: Vec<Predicate<'_>> = Vec::with_capacity(4);

    let window = criteria.time_window;
    predicates.push(Box::new(move |e: &LogEntry| window.contains(e.timestamp())));

    if let Some(keyword) = criteria.active_keyword() {
        predicates.push(keyword_predicate(keyword));
    }

    if !is_unrestricted(&criteria.flag_options) {
        let flags: HashSet<Flag> = selected_values(&criteria.flag_options)
            .into_iter()
            .copied()
            .collect();
        predicates.push(Box::new(move |e: &LogEntry| flags.contains(&e.flag())));
    }

    if !is_unrestricted(&criteria.module_options) {
        let modules: HashSet<&str> = selected_values(&criteria.module_options)
            .into_iter()
            .map(String::as_str)
            .collect();
        predicates.push(Box::new(move |e: &LogEntry| modules.contains(e.module())));
    }

    predicates
}

/// Case-sensitive literal substring match on the sanitised message.
pub fn keyword_predicate(keyword: &str) -> Predicate<'_> {
    Box::new(move |e: &LogEntry| e.safe_message().contains(keyword))
}

fn matches_all(entry: &LogEntry, predicates: &[Predicate<'_>]) -> bool {
    predicates.iter().all(|p| p(entry))
}

/// Applies predicate chains to log sets.
///
/// Large inputs are evaluated on the rayon pool; the indexed parallel
/// iterator keeps results in input order, so both paths return identical
/// output.
#[derive(Debug, Clone, Copy)]
pub struct FilterEngine {
    /// Inputs with at least this many entries are filtered in parallel.
    /// 0 disables parallel filtering.
    parallel_threshold: usize,
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::new(DEFAULT_PARALLEL_FILTER_THRESHOLD)
    }
}

impl FilterEngine {
    pub fn new(parallel_threshold: usize) -> Self {
        Self { parallel_threshold }
    }

    /// Indices of entries in `logs` satisfying every predicate.
    ///
    /// An empty chain matches everything.
    pub fn matching_indices(&self, logs: &[LogEntry], predicates: &[Predicate<'_>]) -> Vec<usize> {
        if predicates.is_empty() {
            return (0..logs.len()).collect();
        }

        if self.parallel_threshold > 0 && logs.len() >= self.parallel_threshold {
            logs.par_iter()
                .enumerate()
                .filter(|(_, entry)| matches_all(entry, predicates))
                .map(|(idx, _)| idx)
                .collect()
        } else {
            logs.iter()
                .enumerate()
                .filter(|(_, entry)| matches_all(entry, predicates))
                .map(|(idx, _)| idx)
                .collect()
        }
    }

    /// Entries of `logs` passing `criteria`, in their original order.
    pub fn apply(&self, criteria: &FilterCriteria, logs: &[LogEntry]) -> Vec<LogEntry> {
        let started = Instant::now();
        let predicates = build_predicates(criteria);
        let result = self.collect(logs, &predicates);

        tracing::debug!(
            input = logs.len(),
            output = result.len(),
            predicates = predicates.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "Filter applied"
        );
        result
    }

    /// Keyword-only query, ignoring every other dimension. An empty keyword
    /// matches everything.
    pub fn search(&self, keyword: &str, logs: &[LogEntry]) -> Vec<LogEntry> {
        let predicates: Vec<Predicate<'_>> = if keyword.is_empty() {
            Vec::new()
        } else {
            vec![keyword_predicate(keyword)]
        };
        let result = self.collect(logs, &predicates);

        tracing::debug!(input = logs.len(), output = result.len(), "Search applied");
        result
    }

    fn collect(&self, logs: &[LogEntry], predicates: &[Predicate<'_>]) -> Vec<LogEntry> {
        if predicates.is_empty() {
            return logs.to_vec();
        }
        self.matching_indices(logs, predicates)
            .into_iter()
            .map(|idx| logs[idx].clone())
            .collect()
    }
}
