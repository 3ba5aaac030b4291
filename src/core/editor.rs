//! Editing a saved calculation.
//!
//! Changing the UD value recomputes every month; changing a month's COE or salary
//! recomputes that month. `save` recomputes all results and aggregates once more
//! before writing, so nothing stale reaches the store.

use crate::{
    core::{
        access::{Principal, ensure_authenticated},
        calculations::{recomputed_changes, validate_month_value, validate_months, validate_ud_value},
        formula::{ComputedMonth, compute_months},
        months::MonthEntry,
        summary::{Summary, summarize},
        workflow::{MonthField, with_field},
    },
    entities::calculation,
    errors::{Error, Result},
    store::CalculationStore,
};
use tracing::info;

/// Working copy of a persisted calculation.
pub struct CalculationEditor<'a, S: CalculationStore + ?Sized> {
    store: &'a S,
    owner_id: String,
    calculation: calculation::Model,
    name: String,
    ud_value: f64,
    months: Vec<ComputedMonth>,
}

impl<'a, S: CalculationStore + ?Sized> CalculationEditor<'a, S> {
    /// Loads the calculation `id` owned by `principal`.
    ///
    /// # Errors
    /// [`Error::Unauthenticated`], or [`Error::CalculationNotFound`] when the id is
    /// missing or belongs to someone else.
    pub async fn load(store: &'a S, principal: &Principal, id: i64) -> Result<Self> {
        let owner_id = ensure_authenticated(principal)?.to_string();
        let stored = store.get_calculation(&owner_id, id).await?;
        Ok(Self {
            store,
            owner_id,
            name: stored.calculation.name.clone(),
            ud_value: stored.calculation.ud_value,
            months: stored.months.iter().map(ComputedMonth::from).collect(),
            calculation: stored.calculation,
        })
    }

    /// The header as last loaded or saved.
    #[must_use]
    pub const fn calculation(&self) -> &calculation::Model {
        &self.calculation
    }

    /// Edited name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Edited UD value.
    #[must_use]
    pub const fn ud_value(&self) -> f64 {
        self.ud_value
    }

    /// Months with their current results.
    #[must_use]
    pub fn months(&self) -> &[ComputedMonth] {
        &self.months
    }

    /// Summary of the months as currently edited.
    pub fn summary(&self) -> Result<Summary> {
        summarize(&self.months)
    }

    /// Renames the calculation. Emptiness is checked on save.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Changes the UD value and recomputes every month.
    pub fn set_ud_value(&mut self, ud_value: f64) -> Result<()> {
        validate_ud_value(ud_value)?;
        self.ud_value = ud_value;
        self.months = self
            .months
            .iter()
            .map(|m| ComputedMonth::compute(m.entry.clone(), ud_value))
            .collect();
        Ok(())
    }

    /// Changes one month's COE or salary and recomputes that month.
    pub fn set_month_value(&mut self, index: usize, field: MonthField, value: f64) -> Result<()> {
        let len = self.months.len();
        let current = self
            .months
            .get(index)
            .ok_or(Error::MonthIndex { index, len })?;
        validate_month_value(field.label(), value, index)?;

        let updated = ComputedMonth::compute(with_field(&current.entry, field, value), self.ud_value);
        self.months[index] = updated;
        Ok(())
    }

    /// Shorthand for [`Self::set_month_value`] with [`MonthField::Coe`].
    pub fn set_coe(&mut self, index: usize, coe: f64) -> Result<()> {
        self.set_month_value(index, MonthField::Coe, coe)
    }

    /// Shorthand for [`Self::set_month_value`] with [`MonthField::Salary`].
    pub fn set_salary(&mut self, index: usize, salary: f64) -> Result<()> {
        self.set_month_value(index, MonthField::Salary, salary)
    }

    /// Recomputes results and aggregates and replaces the stored calculation.
    ///
    /// # Errors
    /// Validation errors before any store call, or the store's error. The working
    /// copy is kept as it was on failure.
    pub async fn save(&mut self) -> Result<calculation::Model> {
        if self.name.trim().is_empty() {
            return Err(Error::EmptyName);
        }
        validate_ud_value(self.ud_value)?;

        let entries: Vec<MonthEntry> = self.months.iter().map(|m| m.entry.clone()).collect();
        validate_months(&entries)?;
        let months = compute_months(&entries, self.ud_value);
        let changes = recomputed_changes(&self.name, self.ud_value, &months)?;

        let updated = self
            .store
            .update_calculation(&self.owner_id, self.calculation.id, changes)
            .await?;
        info!("Saved edits to calculation {}", updated.id);

        self.months = months;
        self.name.clone_from(&updated.name);
        self.calculation = updated.clone();
        Ok(updated)
    }
}
