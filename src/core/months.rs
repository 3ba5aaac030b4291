//! Month expansion - turns a date range into the ordered list of calendar months
//! it covers.
//!
//! Both ends are normalized to the first day of their month, so the day of month in
//! the input never affects the result. Each month starts with a COE of 1 and a
//! salary of 0, ready for the user to edit.

use crate::format;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// COE assigned to freshly expanded months
pub const DEFAULT_COE: f64 = 1.0;
/// Salary assigned to freshly expanded months
pub const DEFAULT_SALARY: f64 = 0.0;

/// Editable inputs for one calendar month of a calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthEntry {
    /// Calendar year
    pub year: i32,
    /// Calendar month, 1-based
    pub month: u32,
    /// Display label, e.g. `"marzo de 2023"`
    pub month_name: String,
    /// Days in this calendar month
    pub days: u32,
    /// Coeficiente de Equivalencia
    pub coe: f64,
    /// Declared salary
    pub salary: f64,
}

impl MonthEntry {
    /// Creates the default entry for a year and 1-based month.
    #[must_use]
    pub fn new(year: i32, month: u32) -> Self {
        Self {
            year,
            month,
            month_name: format::month_name(year, month),
            days: days_in_month(year, month),
            coe: DEFAULT_COE,
            salary: DEFAULT_SALARY,
        }
    }
}

/// Returns true for Gregorian leap years.
#[must_use]
pub fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}

/// Number of days in a 1-based month, or 0 for an invalid month.
#[must_use]
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Number of months covered by the inclusive range, 0 when `start` is after `end`
/// once both are normalized to their month.
#[must_use]
pub fn count_months(start: NaiveDate, end: NaiveDate) -> usize {
    let start_index = month_index(start);
    let end_index = month_index(end);
    if start_index > end_index {
        return 0;
    }
    usize::try_from(end_index - start_index + 1).unwrap_or(0)
}

/// Expands `start..=end` into one [`MonthEntry`] per calendar month, in ascending
/// order. Returns an empty list when `start`'s month comes after `end`'s.
#[must_use]
pub fn expand_months(start: NaiveDate, end: NaiveDate) -> Vec<MonthEntry> {
    let mut months = Vec::with_capacity(count_months(start, end));
    let (mut year, mut month) = (start.year(), start.month());
    let (end_year, end_month) = (end.year(), end.month());

    while (year, month) <= (end_year, end_month) {
        months.push(MonthEntry::new(year, month));
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }

    months
}

// Months since year 0, used for ordering and counting.
fn month_index(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month0())
}
