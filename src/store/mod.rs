//! Calculation store contract.
//!
//! The workflow talks to persistence only through [`CalculationStore`]. Every
//! operation is scoped by the caller's owner id; a calculation owned by someone else
//! behaves exactly like a missing one. The store trusts the aggregate fields it is
//! given and never recomputes them.

/// `SeaORM` implementation of the store
pub mod database;

pub use database::{DatabaseStore, find_months};

use crate::core::formula::ComputedMonth;
use crate::entities::{calculation, calculation_month};
use crate::errors::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Month row to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMonth {
    /// Calendar year
    pub year: i32,
    /// Calendar month, 1-based
    pub month: u32,
    /// Display label
    pub month_name: String,
    /// Days in the month
    pub days: u32,
    /// Coeficiente de Equivalencia
    pub coe: f64,
    /// Declared salary
    pub salary: f64,
    /// Derived result
    pub result: f64,
}

impl From<&ComputedMonth> for NewMonth {
    fn from(month: &ComputedMonth) -> Self {
        Self {
            year: month.entry.year,
            month: month.entry.month,
            month_name: month.entry.month_name.clone(),
            days: month.entry.days,
            coe: month.entry.coe,
            salary: month.entry.salary,
            result: month.result,
        }
    }
}

/// Header fields and months for a new calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCalculation {
    /// Label
    pub name: String,
    /// UD value for the whole period
    pub ud_value: f64,
    /// Period start
    pub start_date: NaiveDate,
    /// Period end
    pub end_date: NaiveDate,
    /// Sum of salaries
    pub total_salary: f64,
    /// Sum of results
    pub total_result: f64,
    /// Mean COE
    pub average_coe: f64,
    /// Number of months
    pub total_months: u32,
    /// Months in chronological order
    pub months: Vec<NewMonth>,
}

/// Partial update of a calculation. `None` leaves a field untouched; `Some(months)`
/// replaces the whole month set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalculationChanges {
    /// New label
    pub name: Option<String>,
    /// New UD value
    pub ud_value: Option<f64>,
    /// New period start
    pub start_date: Option<NaiveDate>,
    /// New period end
    pub end_date: Option<NaiveDate>,
    /// New salary total
    pub total_salary: Option<f64>,
    /// New result total
    pub total_result: Option<f64>,
    /// New mean COE
    pub average_coe: Option<f64>,
    /// New month count
    pub total_months: Option<u32>,
    /// Replacement month set
    pub months: Option<Vec<NewMonth>>,
}

/// A calculation header with its months ordered by year then month.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculationWithMonths {
    /// Header row
    pub calculation: calculation::Model,
    /// Owned month rows, chronological
    pub months: Vec<calculation_month::Model>,
}

/// Persistence of calculation headers and their months.
#[async_trait]
pub trait CalculationStore: Send + Sync {
    /// Lists the owner's calculations, newest first.
    async fn list_calculations(&self, owner_id: &str) -> Result<Vec<calculation::Model>>;

    /// Loads a calculation and its months.
    ///
    /// # Errors
    /// [`Error::CalculationNotFound`](crate::errors::Error::CalculationNotFound) when
    /// the id does not exist or belongs to another owner.
    async fn get_calculation(&self, owner_id: &str, id: i64) -> Result<CalculationWithMonths>;

    /// Inserts the header, then the months. If the months cannot be inserted the
    /// header is deleted again before the error is returned.
    ///
    /// # Errors
    /// [`Error::Unauthenticated`](crate::errors::Error::Unauthenticated) for a blank
    /// owner id, [`Error::Persistence`](crate::errors::Error::Persistence) when a
    /// write fails.
    async fn create_calculation(
        &self,
        owner_id: &str,
        data: NewCalculation,
    ) -> Result<calculation::Model>;

    /// Applies `changes` to the header and, when months are supplied, deletes the
    /// existing months and inserts the new set.
    async fn update_calculation(
        &self,
        owner_id: &str,
        id: i64,
        changes: CalculationChanges,
    ) -> Result<calculation::Model>;

    /// Deletes a calculation together with its months.
    async fn delete_calculation(&self, owner_id: &str, id: i64) -> Result<()>;
}

impl From<NewCalculation> for CalculationChanges {
    fn from(data: NewCalculation) -> Self {
        Self {
            name: Some(data.name),
            ud_value: Some(data.ud_value),
            start_date: Some(data.start_date),
            end_date: Some(data.end_date),
            total_salary: Some(data.total_salary),
            total_result: Some(data.total_result),
            average_coe: Some(data.average_coe),
            total_months: Some(data.total_months),
            months: Some(data.months),
        }
    }
}
