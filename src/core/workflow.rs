//! Interactive workflow for creating a calculation.
//!
//! The workflow moves through three states:
//!
//! 1. [`WorkflowState::ParamsEntry`] - name, UD value and period are collected.
//! 2. [`WorkflowState::MonthsConfigured`] - the period has been expanded into months
//!    whose COE and salary can be edited one at a time.
//! 3. [`WorkflowState::Computed`] - results and aggregates were computed and the
//!    calculation was persisted.
//!
//! Each transition is triggered by the caller. Going back to an earlier state only
//! re-opens its inputs; the persisted calculation is untouched until the next
//! successful `calculate`, which then updates it instead of creating another one.
//! A failed `calculate` leaves the workflow in `MonthsConfigured` with every edit
//! intact.

use crate::{
    config::settings::CalculatorSettings,
    core::{
        access::{Principal, ensure_authenticated, ensure_can_calculate},
        calculations::{CalculationParams, new_calculation, validate_month_value, validate_months},
        formula::{ComputedMonth, compute_months},
        months::{MonthEntry, expand_months},
        summary::{Summary, summarize},
    },
    entities::calculation,
    errors::{Error, Result},
    store::{CalculationChanges, CalculationStore},
};
use chrono::NaiveDate;
use tracing::{debug, error, info};

/// Result of a successful `calculate`.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculationOutcome {
    /// The persisted header
    pub calculation: calculation::Model,
    /// Per-month results
    pub months: Vec<ComputedMonth>,
    /// Totals and averages
    pub summary: Summary,
}

/// Where the workflow currently is.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    /// Collecting parameters; `draft` holds the last accepted parameters when the
    /// user came back to edit them.
    ParamsEntry {
        /// Previously accepted parameters, if any
        draft: Option<CalculationParams>,
    },
    /// Months generated and open for editing.
    MonthsConfigured {
        /// Accepted parameters
        params: CalculationParams,
        /// One entry per month of the period
        months: Vec<MonthEntry>,
    },
    /// Calculation computed and saved.
    Computed {
        /// Parameters the calculation was saved with
        params: CalculationParams,
        /// Saved results
        outcome: CalculationOutcome,
    },
}

impl WorkflowState {
    /// Short state name used in errors and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ParamsEntry { .. } => "ParamsEntry",
            Self::MonthsConfigured { .. } => "MonthsConfigured",
            Self::Computed { .. } => "Computed",
        }
    }
}

/// Which editable field of a month to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthField {
    /// Coeficiente de Equivalencia
    Coe,
    /// Declared salary
    Salary,
}

impl MonthField {
    /// Field name used in validation errors.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Coe => "coe",
            Self::Salary => "salary",
        }
    }
}

/// Returns a copy of `entry` with one field replaced.
pub(crate) fn with_field(entry: &MonthEntry, field: MonthField, value: f64) -> MonthEntry {
    match field {
        MonthField::Coe => MonthEntry {
            coe: value,
            ..entry.clone()
        },
        MonthField::Salary => MonthEntry {
            salary: value,
            ..entry.clone()
        },
    }
}

/// Stateful create flow for one principal.
pub struct CalculationWorkflow<'a, S: CalculationStore + ?Sized> {
    store: &'a S,
    owner_id: String,
    settings: CalculatorSettings,
    saved_id: Option<i64>,
    state: WorkflowState,
}

impl<'a, S: CalculationStore + ?Sized> CalculationWorkflow<'a, S> {
    /// Starts a workflow in `ParamsEntry`.
    ///
    /// # Errors
    /// [`Error::Unauthenticated`] or [`Error::Forbidden`] when the principal may not
    /// create calculations.
    pub fn start(store: &'a S, principal: &Principal, settings: CalculatorSettings) -> Result<Self> {
        ensure_can_calculate(principal)?;
        let owner_id = ensure_authenticated(principal)?.to_string();
        Ok(Self {
            store,
            owner_id,
            settings,
            saved_id: None,
            state: WorkflowState::ParamsEntry { draft: None },
        })
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// Id of the calculation saved by this workflow, once `calculate` succeeded.
    #[must_use]
    pub const fn saved_id(&self) -> Option<i64> {
        self.saved_id
    }

    /// Parameters to pre-fill the form with: the current draft, or an empty name,
    /// the configured default UD and `today` for both ends of the period.
    #[must_use]
    pub fn default_params(&self, today: NaiveDate) -> CalculationParams {
        match &self.state {
            WorkflowState::ParamsEntry { draft: Some(draft) } => draft.clone(),
            WorkflowState::MonthsConfigured { params, .. } | WorkflowState::Computed { params, .. } => {
                params.clone()
            }
            WorkflowState::ParamsEntry { draft: None } => CalculationParams {
                name: String::new(),
                ud_value: self.settings.default_ud_value,
                start_date: today,
                end_date: today,
            },
        }
    }

    /// Months being configured; empty outside `MonthsConfigured` and `Computed`.
    #[must_use]
    pub fn months(&self) -> Vec<MonthEntry> {
        match &self.state {
            WorkflowState::ParamsEntry { .. } => Vec::new(),
            WorkflowState::MonthsConfigured { months, .. } => months.clone(),
            WorkflowState::Computed { outcome, .. } => {
                outcome.months.iter().map(|m| m.entry.clone()).collect()
            }
        }
    }

    fn invalid_state(&self, expected: &'static str) -> Error {
        Error::InvalidState {
            expected,
            actual: self.state.name(),
        }
    }

    /// Validates `params` and expands the period into months, moving to
    /// `MonthsConfigured`. Returns the number of months generated. On a
    /// validation error the workflow stays in `ParamsEntry`.
    pub fn configure(&mut self, params: CalculationParams) -> Result<usize> {
        if !matches!(self.state, WorkflowState::ParamsEntry { .. }) {
            return Err(self.invalid_state("ParamsEntry"));
        }

        let count = params.validate(self.settings.max_months)?;
        let months = expand_months(params.start_date, params.end_date);
        debug!("Expanded period into {} months", count);

        self.state = WorkflowState::MonthsConfigured { params, months };
        Ok(count)
    }

    /// Replaces the COE or salary of the month at `index`. Other months are left
    /// untouched.
    pub fn set_month_value(&mut self, index: usize, field: MonthField, value: f64) -> Result<()> {
        let actual = self.state.name();
        let WorkflowState::MonthsConfigured { months, .. } = &mut self.state else {
            return Err(Error::InvalidState {
                expected: "MonthsConfigured",
                actual,
            });
        };

        let len = months.len();
        let current = months.get(index).ok_or(Error::MonthIndex { index, len })?;
        validate_month_value(field.label(), value, index)?;
        let updated = with_field(current, field, value);
        months[index] = updated;
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

    /// Returns to `ParamsEntry` keeping the current parameters as the draft. Months
    /// are generated again by the next `configure`.
    pub fn edit_params(&mut self) {
        let draft = match &self.state {
            WorkflowState::ParamsEntry { draft } => draft.clone(),
            WorkflowState::MonthsConfigured { params, .. }
            | WorkflowState::Computed { params, .. } => Some(params.clone()),
        };
        self.state = WorkflowState::ParamsEntry { draft };
    }

    /// Re-opens the months of a computed calculation for editing.
    pub fn edit_months(&mut self) -> Result<()> {
        let WorkflowState::Computed { params, outcome } = &self.state else {
            return Err(self.invalid_state("Computed"));
        };
        let months = outcome.months.iter().map(|m| m.entry.clone()).collect();
        self.state = WorkflowState::MonthsConfigured {
            params: params.clone(),
            months,
        };
        Ok(())
    }

    /// Computes every month's result and the summary, then persists the calculation:
    /// created on the first call, fully replaced on later ones.
    ///
    /// # Errors
    /// Validation errors or the store's error. In both cases the workflow remains in
    /// `MonthsConfigured` with its months unchanged.
    pub async fn calculate(&mut self) -> Result<CalculationOutcome> {
        let (params, entries) = match &self.state {
            WorkflowState::MonthsConfigured { params, months } => (params.clone(), months.clone()),
            _ => return Err(self.invalid_state("MonthsConfigured")),
        };

        validate_months(&entries)?;
        let months = compute_months(&entries, params.ud_value);
        let summary = summarize(&months)?;
        let data = new_calculation(&params, &months)?;

        let saved = match self.saved_id {
            None => self.store.create_calculation(&self.owner_id, data).await,
            Some(id) => {
                self.store
                    .update_calculation(&self.owner_id, id, CalculationChanges::from(data))
                    .await
            }
        };

        let calculation = saved.inspect_err(|e| error!("Failed to save calculation: {}", e))?;
        info!(
            "Calculation {} saved with {} months",
            calculation.id, summary.total_months
        );

        self.saved_id = Some(calculation.id);
        let outcome = CalculationOutcome {
            calculation,
            months,
            summary,
        };
        self.state = WorkflowState::Computed {
            params,
            outcome: outcome.clone(),
        };
        Ok(outcome)
    }
}
