//! Monthly result formula.
//!
//! `result = salary * ((ud - coe) / coe + 1)`. A COE of zero yields a result of zero
//! instead of dividing by zero; this is the defined behaviour, not an error.
//! Results are never rounded here.

use crate::core::months::MonthEntry;
use serde::{Deserialize, Serialize};

/// Computes the monthly result for a salary, COE and UD value.
#[must_use]
pub fn monthly_result(salary: f64, coe: f64, ud: f64) -> f64 {
    if coe == 0.0 {
        return 0.0;
    }
    salary * ((ud - coe) / coe + 1.0)
}

/// A month together with the result derived from its inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedMonth {
    /// The inputs the result was computed from
    pub entry: MonthEntry,
    /// `monthly_result(entry.salary, entry.coe, ud)`
    pub result: f64,
}

impl ComputedMonth {
    /// Computes the result for `entry` under `ud`.
    #[must_use]
    pub fn compute(entry: MonthEntry, ud: f64) -> Self {
        let result = monthly_result(entry.salary, entry.coe, ud);
        Self { entry, result }
    }
}

/// Recomputes every month's result under `ud`.
#[must_use]
pub fn compute_months(entries: &[MonthEntry], ud: f64) -> Vec<ComputedMonth> {
    entries
        .iter()
        .cloned()
        .map(|entry| ComputedMonth::compute(entry, ud))
        .collect()
}
