//! Calculation month entity - one row per calendar month of a calculation.
//!
//! `month` is 1-based (1 = January). `result` is always derived from `salary`,
//! `coe` and the owning calculation's `ud_value`.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Calculation month database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "calculation_months")]
pub struct Model {
    /// Unique identifier for the month row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the owning calculation
    pub calculation_id: i64,
    /// Calendar year
    pub year: i32,
    /// Calendar month, 1-based
    pub month: u32,
    /// Display label such as `"marzo de 2023"`; not authoritative
    pub month_name: String,
    /// Number of days in this calendar month
    pub days: u32,
    /// Coeficiente de Equivalencia for this month
    pub coe: f64,
    /// Salary declared for this month
    pub salary: f64,
    /// Monthly result computed from salary, COE and UD
    pub result: f64,
    /// When the row was inserted
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `CalculationMonth` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each month belongs to one calculation and is removed with it
    #[sea_orm(
        belongs_to = "super::calculation::Entity",
        from = "Column::CalculationId",
        to = "super::calculation::Column::Id",
        on_delete = "Cascade"
    )]
    Calculation,
}

impl Related<super::calculation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Calculation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
