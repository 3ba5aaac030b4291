//! Aggregation of a calculation's months into totals and averages.

use crate::core::formula::ComputedMonth;
use crate::entities::calculation_month;
use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};

/// Figures the aggregator reads from a month, whether freshly computed or loaded
/// from the database.
pub trait MonthFigures {
    /// Declared salary
    fn salary(&self) -> f64;
    /// Coeficiente de Equivalencia
    fn coe(&self) -> f64;
    /// Derived monthly result
    fn result(&self) -> f64;
    /// Days in the calendar month
    fn days(&self) -> u32;
}

impl MonthFigures for ComputedMonth {
    fn salary(&self) -> f64 {
        self.entry.salary
    }
    fn coe(&self) -> f64 {
        self.entry.coe
    }
    fn result(&self) -> f64 {
        self.result
    }
    fn days(&self) -> u32 {
        self.entry.days
    }
}

impl MonthFigures for calculation_month::Model {
    fn salary(&self) -> f64 {
        self.salary
    }
    fn coe(&self) -> f64 {
        self.coe
    }
    fn result(&self) -> f64 {
        self.result
    }
    fn days(&self) -> u32 {
        self.days
    }
}

/// Totals and averages over a non-empty set of months.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Sum of salaries
    pub total_salary: f64,
    /// `total_salary / total_months`
    pub average_salary: f64,
    /// Sum of monthly results
    pub total_result: f64,
    /// `total_result / total_months`
    pub average_result: f64,
    /// Mean COE
    pub average_coe: f64,
    /// Sum of days across the months
    pub total_days: u32,
    /// Number of months
    pub total_months: usize,
}

/// Summarizes `months`.
///
/// # Errors
/// Returns [`Error::EmptyPeriod`] when `months` is empty, since averages are undefined.
#[allow(clippy::cast_precision_loss)] // month counts are at most a few hundred
pub fn summarize<M: MonthFigures>(months: &[M]) -> Result<Summary> {
    if months.is_empty() {
        return Err(Error::EmptyPeriod);
    }

    let total_salary: f64 = months.iter().map(MonthFigures::salary).sum();
    let total_result: f64 = months.iter().map(MonthFigures::result).sum();
    let total_coe: f64 = months.iter().map(MonthFigures::coe).sum();
    let total_days: u32 = months.iter().map(MonthFigures::days).sum();
    let count = months.len() as f64;

    Ok(Summary {
        total_salary,
        average_salary: total_salary / count,
        total_result,
        average_result: total_result / count,
        average_coe: total_coe / count,
        total_days,
        total_months: months.len(),
    })
}
