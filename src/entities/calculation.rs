//! Calculation entity - the header row of a saved pension estimate.
//!
//! Aggregate columns (`total_salary`, `total_result`, `average_coe`, `total_months`)
//! are derived from the owned month rows and rewritten on every save; the database
//! does not enforce them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Calculation database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "calculations")]
pub struct Model {
    /// Unique identifier for the calculation
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Opaque id of the authenticated owner
    pub user_id: String,
    /// Free-text label chosen by the user
    pub name: String,
    /// Unidad de Desarrollo applied to every month of the period
    pub ud_value: f64,
    /// First day of the requested period (only year and month are significant)
    pub start_date: Date,
    /// Last day of the requested period (only year and month are significant)
    pub end_date: Date,
    /// Sum of the monthly salaries
    pub total_salary: f64,
    /// Sum of the monthly results
    pub total_result: f64,
    /// Mean COE across the months
    pub average_coe: f64,
    /// Number of month rows owned by this calculation
    pub total_months: u32,
    /// When the calculation was created
    pub created_at: DateTimeUtc,
    /// When the calculation was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Calculation and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One calculation owns many months
    #[sea_orm(has_many = "super::calculation_month::Entity")]
    Months,
}

impl Related<super::calculation_month::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Months.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
