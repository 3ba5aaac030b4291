//! Unified error type for the calculator.
//!
//! Variants fall into four families: validation of user input (never reaches the
//! store), persistence failures reported by the store, missing or foreign
//! calculations, and access control.

use chrono::NaiveDate;
use sea_orm::DbErr;
use thiserror::Error;

/// All errors produced by the calculator core, the store and the bootstrap code.
#[derive(Debug, Error)]
pub enum Error {
    /// The calculation name is empty or whitespace only
    #[error("Calculation name cannot be empty")]
    EmptyName,

    /// UD value is zero, negative or not a finite number
    #[error("UD value must be a positive number, got {value}")]
    InvalidUdValue {
        /// The rejected value
        value: f64,
    },

    /// Start month falls after the end month
    #[error("Start date {start} is after end date {end}")]
    InvalidDateRange {
        /// Requested start date
        start: NaiveDate,
        /// Requested end date
        end: NaiveDate,
    },

    /// The requested range expands to more months than the configured maximum
    #[error("Period spans {months} months, the maximum is {max}")]
    TooManyMonths {
        /// Months the range would expand to
        months: usize,
        /// Configured maximum
        max: usize,
    },

    /// A per-month COE or salary is negative or not finite
    #[error("Invalid {field} {value} for month #{index}")]
    InvalidMonthValue {
        /// `"coe"` or `"salary"`
        field: &'static str,
        /// The rejected value
        value: f64,
        /// Position of the month in the period
        index: usize,
    },

    /// No months to summarize
    #[error("Cannot summarize an empty set of months")]
    EmptyPeriod,

    /// Month position outside the configured period
    #[error("Month index {index} is out of range (period has {len} months)")]
    MonthIndex {
        /// Requested position
        index: usize,
        /// Number of months in the period
        len: usize,
    },

    /// Operation not valid in the current workflow state
    #[error("Invalid workflow state: expected {expected}, found {actual}")]
    InvalidState {
        /// State the operation requires
        expected: &'static str,
        /// State the workflow is in
        actual: &'static str,
    },

    /// Calculation does not exist or belongs to another user
    #[error("Calculation not found: {id}")]
    CalculationNotFound {
        /// Requested calculation id
        id: i64,
    },

    /// No authenticated principal was supplied
    #[error("User is not authenticated")]
    Unauthenticated,

    /// The principal's role may not use the operation
    #[error("Role '{role}' is not allowed to create calculations")]
    Forbidden {
        /// Role of the rejected principal
        role: String,
    },

    /// A store write failed; `message` carries the underlying cause
    #[error("Persistence error: {message}")]
    Persistence {
        /// Description including the underlying cause
        message: String,
    },

    /// Raw database error
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Settings could not be loaded or are invalid
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },
}

impl Error {
    /// Returns true for input errors that are reported inline without touching the store.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyName
                | Self::InvalidUdValue { .. }
                | Self::InvalidDateRange { .. }
                | Self::TooManyMonths { .. }
                | Self::InvalidMonthValue { .. }
                | Self::EmptyPeriod
                | Self::MonthIndex { .. }
        )
    }

    /// Message shown to the user by the surrounding application.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyName => "El nombre del cálculo es obligatorio".to_string(),
            Self::InvalidUdValue { .. } => "El valor UD debe ser mayor a cero".to_string(),
            Self::InvalidDateRange { .. } => {
                "La fecha de inicio debe ser anterior o igual a la fecha de fin".to_string()
            }
            Self::TooManyMonths { max, .. } => {
                format!("El período no puede superar los {max} meses")
            }
            Self::InvalidMonthValue { field, index, .. } => {
                format!("Valor de {field} inválido en el mes {}", index + 1)
            }
            Self::EmptyPeriod => "El período no contiene meses".to_string(),
            Self::MonthIndex { .. } => "El mes indicado no pertenece al período".to_string(),
            Self::InvalidState { .. } => "Acción no disponible en este paso".to_string(),
            Self::CalculationNotFound { .. } => "Cálculo no encontrado".to_string(),
            Self::Unauthenticated => "Usuario no autenticado".to_string(),
            Self::Forbidden { .. } => {
                "Tu cuenta debe estar verificada para crear cálculos".to_string()
            }
            Self::Persistence { message } => format!("Error al guardar el cálculo: {message}"),
            Self::Database(e) => format!("Error de base de datos: {e}"),
            Self::Config { message } => format!("Error de configuración: {message}"),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
