//! Entity module - Contains the SeaORM entity definitions for the database.
//! A calculation header owns an ordered set of month rows.

pub mod calculation;
pub mod calculation_month;

// Re-export specific types to avoid conflicts
pub use calculation::{
    Column as CalculationColumn, Entity as Calculation, Model as CalculationModel,
};
pub use calculation_month::{
    Column as CalculationMonthColumn, Entity as CalculationMonth, Model as CalculationMonthModel,
};
