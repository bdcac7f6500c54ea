// LogSift - core/criteria.rs
//
// Filter criteria: the time window, keyword, and flag/module selections the
// presentation layer edits and the filter engine consumes.
// Core layer: pure data, no I/O.

use crate::core::model::{Flag, LogEntry};
use crate::util::constants::{ALL_OPTION_LABEL, SECONDS_PER_DAY};
use chrono::{NaiveDate, NaiveTime, Timelike};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::hash::Hash;

// =============================================================================
// Selectable options
// =============================================================================

/// Value carried by a selectable option: either the "match-all" sentinel or a
/// concrete flag/module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OptionValue<T> {
    All,
    Value(T),
}

/// One entry of a flag or module option list.
///
/// Index 0 of every list is the `All` sentinel. When it is selected the
/// dimension is unrestricted and the other selection states are ignored;
/// otherwise the filter is the union of the selected concrete values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedOption<T> {
    pub value: OptionValue<T>,
    pub is_selected: bool,
}

impl<T> SelectedOption<T> {
    /// The "match-all" sentinel, selected.
    pub fn all() -> Self {
        Self {
            value: OptionValue::All,
            is_selected: true,
        }
    }

    /// A concrete, initially unselected option.
    pub fn new(value: T) -> Self {
        Self {
            value: OptionValue::Value(value),
            is_selected: false,
        }
    }

    /// Builder-style selection toggle.
    pub fn selected(mut self, is_selected: bool) -> Self {
        self.is_selected = is_selected;
        self
    }

    pub fn is_all(&self) -> bool {
        matches!(self.value, OptionValue::All)
    }

    /// The concrete value, or `None` for the sentinel.
    pub fn value(&self) -> Option<&T> {
        match &self.value {
            OptionValue::All => None,
            OptionValue::Value(v) => Some(v),
        }
    }
}

impl<T: fmt::Display> SelectedOption<T> {
    /// Display label ("All" for the sentinel).
    pub fn label(&self) -> String {
        match &self.value {
            OptionValue::All => ALL_OPTION_LABEL.to_string(),
            OptionValue::Value(v) => v.to_string(),
        }
    }
}

/// Build an option list from observed values: the `All` sentinel followed by
/// the distinct values in ascending order.
pub fn build_options<T, I>(values: I) -> Vec<SelectedOption<T>>
where
    T: Ord,
    I: IntoIterator<Item = T>,
{
    let distinct: BTreeSet<T> = values.into_iter().collect();
    std::iter::once(SelectedOption::all())
        .chain(distinct.into_iter().map(SelectedOption::new))
        .collect()
}

/// Restore the list invariant on caller-supplied options: exactly one `All`
/// sentinel, at index 0.
///
/// A list that arrives without a sentinel keeps its explicit selections, so
/// the inserted sentinel is unselected; an empty list becomes `[All]`.
pub fn normalise_options<T>(options: Vec<SelectedOption<T>>) -> Vec<SelectedOption<T>> {
    let leading = options.first().filter(|o| o.is_all()).map(|o| o.is_selected);
    let no_sentinel_selected = options.is_empty();

    let mut normalised = Vec::with_capacity(options.len() + 1);
    normalised.push(SelectedOption::all().selected(leading.unwrap_or(no_sentinel_selected)));
    normalised.extend(options.into_iter().filter(|o| !o.is_all()));
    normalised
}

/// True when the list places no restriction on its dimension.
pub fn is_unrestricted<T>(options: &[SelectedOption<T>]) -> bool {
    options.first().map_or(true, |o| o.is_all() && o.is_selected)
}

/// Selected concrete values of a list (sentinel excluded).
pub fn selected_values<T: Eq + Hash>(options: &[SelectedOption<T>]) -> HashSet<&T> {
    options
        .iter()
        .filter(|o| o.is_selected)
        .filter_map(SelectedOption::value)
        .collect()
}

// =============================================================================
// Time window
// =============================================================================

/// Inclusive `[start, end]` interval in seconds since the Unix epoch.
///
/// `date` records which day's logs the window refers to. `None` means the
/// log manager's in-memory buffer for the current run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub date: Option<NaiveDate>,
    pub start: f64,
    pub end: f64,
}

impl TimeWindow {
    /// Window covering every timestamp, over the current buffer.
    pub fn unbounded() -> Self {
        Self {
            date: None,
            start: f64::NEG_INFINITY,
            end: f64::INFINITY,
        }
    }

    /// Explicit bounds over the current buffer.
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            date: None,
            start,
            end,
        }
    }

    /// The whole of `date` (UTC). Every timestamp before the next midnight
    /// is inside; the next midnight itself is not.
    pub fn for_date(date: NaiveDate) -> Self {
        let start = day_start(date);
        Self {
            date: Some(date),
            start,
            end: just_below(start + SECONDS_PER_DAY),
        }
    }

    /// Part of `date` between two times of day, both inclusive.
    pub fn for_date_between(date: NaiveDate, from: NaiveTime, to: NaiveTime) -> Self {
        let base = day_start(date);
        Self {
            date: Some(date),
            start: base + seconds_into_day(from),
            end: base + seconds_into_day(to),
        }
    }

    pub fn contains(&self, timestamp: f64) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self::unbounded()
    }
}

fn day_start(date: NaiveDate) -> f64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp() as f64
}

/// Largest `f64` strictly less than `x` (finite, non-NaN `x`).
fn just_below(x: f64) -> f64 {
    if x == 0.0 {
        -f64::from_bits(1)
    } else if x > 0.0 {
        f64::from_bits(x.to_bits() - 1)
    } else {
        f64::from_bits(x.to_bits() + 1)
    }
}

fn seconds_into_day(time: NaiveTime) -> f64 {
    f64::from(time.num_seconds_from_midnight()) + f64::from(time.nanosecond()) / 1e9
}

// =============================================================================
// Filter criteria
// =============================================================================

/// Complete filter state. All dimensions are AND-combined when applied.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    /// Inclusive time window; defaults to unbounded.
    pub time_window: TimeWindow,

    /// Substring search (case-sensitive). `None` or empty = no filter.
    pub keyword: Option<String>,

    /// Flag options; index 0 is the `All` sentinel.
    pub flag_options: Vec<SelectedOption<Flag>>,

    /// Module options; index 0 is the `All` sentinel.
    pub module_options: Vec<SelectedOption<String>>,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            time_window: TimeWindow::unbounded(),
            keyword: None,
            flag_options: vec![SelectedOption::all()],
            module_options: vec![SelectedOption::all()],
        }
    }
}

impl FilterCriteria {
    /// The keyword, if one is set and non-empty.
    pub fn active_keyword(&self) -> Option<&str> {
        self.keyword.as_deref().filter(|k| !k.is_empty())
    }

    /// Date the time window refers to.
    pub fn date(&self) -> Option<NaiveDate> {
        self.time_window.date
    }

    /// Reset both option lists to `[All]`.
    pub fn reset_options(&mut self) {
        self.flag_options = vec![SelectedOption::all()];
        self.module_options = vec![SelectedOption::all()];
    }

    /// Replace both option lists with the distinct flags and modules observed
    /// in `logs`, collected in a single pass.
    pub fn discover_options(&mut self, logs: &[LogEntry]) {
        let mut flags = BTreeSet::new();
        let mut modules = BTreeSet::new();
        for entry in logs {
            flags.insert(entry.flag());
            modules.insert(entry.module());
        }

        self.flag_options = build_options(flags);
        self.module_options = build_options(modules.into_iter().map(str::to_string));
    }
}

// =============================================================================
// Unit tests
// =============================================================================
