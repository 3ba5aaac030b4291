//! Calculation operations shared by the create workflow, the editor and the
//! list/detail views.
//!
//! Every path that persists a calculation goes through [`new_calculation`] or
//! [`recomputed_changes`], which derive the header aggregates from the months being
//! written. Aggregates already stored in the database are never reused.

use crate::{
    core::{
        access::{Principal, ensure_authenticated, ensure_can_calculate},
        formula::{ComputedMonth, compute_months},
        months::{MonthEntry, count_months},
        summary::{Summary, summarize},
    },
    entities::{calculation, calculation_month},
    errors::{Error, Result},
    store::{CalculationChanges, CalculationStore, NewCalculation, NewMonth},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Parameters collected before the months are generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationParams {
    /// Label for the calculation
    pub name: String,
    /// UD value applied to every month
    pub ud_value: f64,
    /// Period start; only year and month matter
    pub start_date: NaiveDate,
    /// Period end; only year and month matter
    pub end_date: NaiveDate,
}

impl CalculationParams {
    /// Checks every parameter constraint and returns the number of months the
    /// period expands to.
    ///
    /// # Errors
    /// [`Error::EmptyName`], [`Error::InvalidUdValue`], [`Error::InvalidDateRange`]
    /// or [`Error::TooManyMonths`], in that order of precedence.
    pub fn validate(&self, max_months: usize) -> Result<usize> {
        if self.name.trim().is_empty() {
            return Err(Error::EmptyName);
        }
        validate_ud_value(self.ud_value)?;

        let months = count_months(self.start_date, self.end_date);
        if months == 0 {
            return Err(Error::InvalidDateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        if months > max_months {
            return Err(Error::TooManyMonths {
                months,
                max: max_months,
            });
        }
        Ok(months)
    }
}

/// Rejects a UD value that is not a positive finite number.
pub fn validate_ud_value(ud_value: f64) -> Result<()> {
    if ud_value.is_finite() && ud_value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidUdValue { value: ud_value })
    }
}

/// Rejects a negative or non-finite COE or salary for the month at `index`.
pub fn validate_month_value(field: &'static str, value: f64, index: usize) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidMonthValue {
            field,
            value,
            index,
        })
    }
}

/// Validates the COE and salary of every month.
pub fn validate_months(months: &[MonthEntry]) -> Result<()> {
    for (index, month) in months.iter().enumerate() {
        validate_month_value("coe", month.coe, index)?;
        validate_month_value("salary", month.salary, index)?;
    }
    Ok(())
}

impl From<&calculation_month::Model> for MonthEntry {
    fn from(row: &calculation_month::Model) -> Self {
        Self {
            year: row.year,
            month: row.month,
            month_name: row.month_name.clone(),
            days: row.days,
            coe: row.coe,
            salary: row.salary,
        }
    }
}

impl From<&calculation_month::Model> for ComputedMonth {
    fn from(row: &calculation_month::Model) -> Self {
        Self {
            entry: MonthEntry::from(row),
            result: row.result,
        }
    }
}

fn month_count(months: usize) -> Result<u32> {
    u32::try_from(months).map_err(|_| Error::TooManyMonths {
        months,
        max: u32::MAX as usize,
    })
}

/// Builds the store payload for a new calculation, with aggregates derived from
/// `months`.
///
/// # Errors
/// [`Error::EmptyPeriod`] when `months` is empty.
pub fn new_calculation(
    params: &CalculationParams,
    months: &[ComputedMonth],
) -> Result<NewCalculation> {
    let summary = summarize(months)?;
    Ok(NewCalculation {
        name: params.name.trim().to_string(),
        ud_value: params.ud_value,
        start_date: params.start_date,
        end_date: params.end_date,
        total_salary: summary.total_salary,
        total_result: summary.total_result,
        average_coe: summary.average_coe,
        total_months: month_count(summary.total_months)?,
        months: months.iter().map(NewMonth::from).collect(),
    })
}

/// Builds a full update for an edited calculation: name, UD, aggregates and the
/// replacement month set, all consistent with `months`.
///
/// # Errors
/// [`Error::EmptyPeriod`] when `months` is empty.
pub fn recomputed_changes(
    name: &str,
    ud_value: f64,
    months: &[ComputedMonth],
) -> Result<CalculationChanges> {
    let summary = summarize(months)?;
    Ok(CalculationChanges {
        name: Some(name.trim().to_string()),
        ud_value: Some(ud_value),
        total_salary: Some(summary.total_salary),
        total_result: Some(summary.total_result),
        average_coe: Some(summary.average_coe),
        total_months: Some(month_count(summary.total_months)?),
        months: Some(months.iter().map(NewMonth::from).collect()),
        ..Default::default()
    })
}

/// A stored calculation prepared for display.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculationView {
    /// Header row as stored
    pub calculation: calculation::Model,
    /// Months in chronological order with their stored results
    pub months: Vec<ComputedMonth>,
    /// Aggregates computed from `months`; `None` when there are no months
    pub summary: Option<Summary>,
}

/// Ordering of the calculation list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Newest first
    #[default]
    Date,
    /// Alphabetical, ignoring case
    Name,
    /// Largest total result first
    Result,
}

/// Search and ordering applied to the calculation list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOptions {
    /// Case-insensitive substring the name must contain; blank matches everything
    pub search: Option<String>,
    /// Ordering of the remaining calculations
    pub sort_by: SortBy,
}

/// Keeps the calculations whose name contains `options.search` and orders them by
/// `options.sort_by`.
#[must_use]
pub fn filter_and_sort(
    calculations: &[calculation::Model],
    options: &ListOptions,
) -> Vec<calculation::Model> {
    let needle = options
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let mut listed: Vec<calculation::Model> = calculations
        .iter()
        .filter(|c| {
            needle
                .as_deref()
                .is_none_or(|n| c.name.to_lowercase().contains(n))
        })
        .cloned()
        .collect();

    match options.sort_by {
        SortBy::Date => listed.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        }),
        SortBy::Name => listed.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name))
        }),
        SortBy::Result => listed.sort_by(|a, b| b.total_result.total_cmp(&a.total_result)),
    }
    listed
}

/// Lists the principal's calculations, filtered and ordered by `options`.
pub async fn list_calculations<S>(
    store: &S,
    principal: &Principal,
    options: &ListOptions,
) -> Result<Vec<calculation::Model>>
where
    S: CalculationStore + ?Sized,
{
    let owner_id = ensure_authenticated(principal)?;
    let calculations = store.list_calculations(owner_id).await?;
    Ok(filter_and_sort(&calculations, options))
}

/// Loads one calculation with its months and a summary computed from those months.
pub async fn view_calculation<S>(
    store: &S,
    principal: &Principal,
    id: i64,
) -> Result<CalculationView>
where
    S: CalculationStore + ?Sized,
{
    let owner_id = ensure_authenticated(principal)?;
    let stored = store.get_calculation(owner_id, id).await?;
    let months: Vec<ComputedMonth> = stored.months.iter().map(ComputedMonth::from).collect();
    let summary = summarize(&months).ok();
    Ok(CalculationView {
        calculation: stored.calculation,
        months,
        summary,
    })
}

/// Deletes one of the principal's calculations and its months.
pub async fn delete_calculation<S>(store: &S, principal: &Principal, id: i64) -> Result<()>
where
    S: CalculationStore + ?Sized,
{
    let owner_id = ensure_authenticated(principal)?;
    store.delete_calculation(owner_id, id).await
}

/// Copies a calculation under `new_name`, or `"<name> (Copia)"` when no name is
/// given. Results and aggregates of the copy are recomputed from its months.
#[instrument(skip(store, principal))]
pub async fn duplicate_calculation<S>(
    store: &S,
    principal: &Principal,
    id: i64,
    new_name: Option<&str>,
) -> Result<calculation::Model>
where
    S: CalculationStore + ?Sized,
{
    ensure_can_calculate(principal)?;
    let owner_id = ensure_authenticated(principal)?;
    let original = store.get_calculation(owner_id, id).await?;

    let name = new_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map_or_else(
            || format!("{} (Copia)", original.calculation.name),
            str::to_string,
        );
    let params = CalculationParams {
        name,
        ud_value: original.calculation.ud_value,
        start_date: original.calculation.start_date,
        end_date: original.calculation.end_date,
    };

    let entries: Vec<MonthEntry> = original.months.iter().map(MonthEntry::from).collect();
    let months = compute_months(&entries, params.ud_value);
    let data = new_calculation(&params, &months)?;

    let copy = store.create_calculation(owner_id, data).await?;
    info!("Duplicated calculation {} as {}", id, copy.id);
    Ok(copy)
}
