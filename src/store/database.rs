//! `SeaORM` calculation store.
//!
//! Creation writes the header first and the months second, deleting the header
//! again if the months fail. Updates and deletes run inside a database transaction
//! so a failure leaves the previous rows in place.

use super::{CalculationChanges, CalculationStore, CalculationWithMonths, NewCalculation, NewMonth};
use crate::{
    entities::{
        Calculation, CalculationColumn, CalculationMonth, CalculationMonthColumn, calculation,
        calculation_month,
    },
    errors::{Error, Result},
};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, error, info, instrument, warn};

/// Calculation store backed by a `SeaORM` connection.
#[derive(Debug, Clone)]
pub struct DatabaseStore {
    db: DatabaseConnection,
}

impl DatabaseStore {
    /// Wraps an open connection whose tables already exist.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

fn persistence_error(context: &str, err: &DbErr) -> Error {
    Error::Persistence {
        message: format!("{context}: {err}"),
    }
}

/// Retrieves the months stored for a calculation id, ordered by year then month.
///
/// Not scoped by owner; an unknown id yields an empty list.
pub async fn find_months<C>(db: &C, calculation_id: i64) -> Result<Vec<calculation_month::Model>>
where
    C: ConnectionTrait,
{
    CalculationMonth::find()
        .filter(CalculationMonthColumn::CalculationId.eq(calculation_id))
        .order_by_asc(CalculationMonthColumn::Year)
        .order_by_asc(CalculationMonthColumn::Month)
        .all(db)
        .await
        .map_err(|e| persistence_error("Failed to load calculation months", &e))
}

async fn find_owned<C>(db: &C, owner_id: &str, id: i64) -> Result<calculation::Model>
where
    C: ConnectionTrait,
{
    Calculation::find_by_id(id)
        .filter(CalculationColumn::UserId.eq(owner_id))
        .one(db)
        .await
        .map_err(|e| persistence_error("Failed to load calculation", &e))?
        .ok_or(Error::CalculationNotFound { id })
}

async fn insert_months<C>(
    db: &C,
    calculation_id: i64,
    months: &[NewMonth],
) -> std::result::Result<(), DbErr>
where
    C: ConnectionTrait,
{
    if months.is_empty() {
        return Ok(());
    }

    let now = Utc::now();
    let rows = months.iter().map(|m| calculation_month::ActiveModel {
        calculation_id: Set(calculation_id),
        year: Set(m.year),
        month: Set(m.month),
        month_name: Set(m.month_name.clone()),
        days: Set(m.days),
        coe: Set(m.coe),
        salary: Set(m.salary),
        result: Set(m.result),
        created_at: Set(now),
        ..Default::default()
    });

    CalculationMonth::insert_many(rows).exec(db).await?;
    Ok(())
}

#[async_trait]
impl CalculationStore for DatabaseStore {
    #[instrument(skip(self))]
    async fn list_calculations(&self, owner_id: &str) -> Result<Vec<calculation::Model>> {
        let calculations = Calculation::find()
            .filter(CalculationColumn::UserId.eq(owner_id))
            .order_by_desc(CalculationColumn::CreatedAt)
            .order_by_desc(CalculationColumn::Id)
            .all(&self.db)
            .await
            .map_err(|e| persistence_error("Failed to list calculations", &e))?;
        debug!("Fetched {} calculations.", calculations.len());
        Ok(calculations)
    }

    #[instrument(skip(self))]
    async fn get_calculation(&self, owner_id: &str, id: i64) -> Result<CalculationWithMonths> {
        let calculation = find_owned(&self.db, owner_id, id).await?;
        let months = find_months(&self.db, id).await?;
        Ok(CalculationWithMonths {
            calculation,
            months,
        })
    }

    #[instrument(skip(self, data), fields(name = %data.name, months = data.months.len()))]
    async fn create_calculation(
        &self,
        owner_id: &str,
        data: NewCalculation,
    ) -> Result<calculation::Model> {
        if owner_id.trim().is_empty() {
            return Err(Error::Unauthenticated);
        }

        let now = Utc::now();
        let header = calculation::ActiveModel {
            user_id: Set(owner_id.to_string()),
            name: Set(data.name),
            ud_value: Set(data.ud_value),
            start_date: Set(data.start_date),
            end_date: Set(data.end_date),
            total_salary: Set(data.total_salary),
            total_result: Set(data.total_result),
            average_coe: Set(data.average_coe),
            total_months: Set(data.total_months),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let calculation = header
            .insert(&self.db)
            .await
            .map_err(|e| persistence_error("Failed to create calculation", &e))?;

        if let Err(e) = insert_months(&self.db, calculation.id, &data.months).await {
            warn!(
                "Inserting months for calculation {} failed, removing header: {}",
                calculation.id, e
            );
            if let Err(cleanup) = Calculation::delete_by_id(calculation.id)
                .exec(&self.db)
                .await
            {
                error!(
                    "Failed to remove orphaned calculation {}: {}",
                    calculation.id, cleanup
                );
            }
            return Err(persistence_error("Failed to create calculation months", &e));
        }

        info!(
            "Created calculation {} with {} months",
            calculation.id, calculation.total_months
        );
        Ok(calculation)
    }

    #[instrument(skip(self, changes))]
    async fn update_calculation(
        &self,
        owner_id: &str,
        id: i64,
        changes: CalculationChanges,
    ) -> Result<calculation::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| persistence_error("Failed to start transaction", &e))?;

        let existing = find_owned(&txn, owner_id, id).await?;
        let mut active: calculation::ActiveModel = existing.into();
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(ud_value) = changes.ud_value {
            active.ud_value = Set(ud_value);
        }
        if let Some(start_date) = changes.start_date {
            active.start_date = Set(start_date);
        }
        if let Some(end_date) = changes.end_date {
            active.end_date = Set(end_date);
        }
        if let Some(total_salary) = changes.total_salary {
            active.total_salary = Set(total_salary);
        }
        if let Some(total_result) = changes.total_result {
            active.total_result = Set(total_result);
        }
        if let Some(average_coe) = changes.average_coe {
            active.average_coe = Set(average_coe);
        }
        if let Some(total_months) = changes.total_months {
            active.total_months = Set(total_months);
        }
        active.updated_at = Set(Utc::now());

        let updated = active
            .update(&txn)
            .await
            .map_err(|e| persistence_error("Failed to update calculation", &e))?;

        if let Some(months) = changes.months {
            CalculationMonth::delete_many()
                .filter(CalculationMonthColumn::CalculationId.eq(id))
                .exec(&txn)
                .await
                .map_err(|e| persistence_error("Failed to remove calculation months", &e))?;
            insert_months(&txn, id, &months)
                .await
                .map_err(|e| persistence_error("Failed to update calculation months", &e))?;
            debug!("Replaced months of calculation {} with {}", id, months.len());
        }

        txn.commit()
            .await
            .map_err(|e| persistence_error("Failed to commit transaction", &e))?;
        info!("Updated calculation {}", id);
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn delete_calculation(&self, owner_id: &str, id: i64) -> Result<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| persistence_error("Failed to start transaction", &e))?;

        find_owned(&txn, owner_id, id).await?;
        CalculationMonth::delete_many()
            .filter(CalculationMonthColumn::CalculationId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| persistence_error("Failed to delete calculation months", &e))?;
        Calculation::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| persistence_error("Failed to delete calculation", &e))?;

        txn.commit()
            .await
            .map_err(|e| persistence_error("Failed to commit transaction", &e))?;
        info!("Deleted calculation {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_then_get_round_trip() -> Result<()> {
        let store = setup_test_store().await?;
        let data = sample_new_calculation("Periodo 2023");

        let created = store.create_calculation(TEST_OWNER, data.clone()).await?;
        assert_eq!(created.user_id, TEST_OWNER);

        let loaded = store.get_calculation(TEST_OWNER, created.id).await?;
        assert_eq!(loaded.calculation, created);
        assert_eq!(loaded.calculation.name, "Periodo 2023");
        assert_eq!(loaded.calculation.ud_value, data.ud_value);
        assert_eq!(loaded.calculation.start_date, data.start_date);
        assert_eq!(loaded.calculation.end_date, data.end_date);
        assert_eq!(loaded.calculation.total_result, data.total_result);
        assert_eq!(loaded.calculation.total_months as usize, loaded.months.len());

        assert_eq!(loaded.months.len(), data.months.len());
        for (stored, sent) in loaded.months.iter().zip(&data.months) {
            assert_eq!(stored.calculation_id, created.id);
            assert_eq!((stored.year, stored.month), (sent.year, sent.month));
            assert_eq!(stored.month_name, sent.month_name);
            assert_eq!(stored.days, sent.days);
            assert!((stored.coe - sent.coe).abs() < 1e-9);
            assert!((stored.salary - sent.salary).abs() < 1e-9);
            assert!((stored.result - sent.result).abs() < 1e-9);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_get_orders_months_chronologically() -> Result<()> {
        let store = setup_test_store().await?;
        let mut data = sample_new_calculation("Desordenado");
        data.months.reverse();

        let created = store.create_calculation(TEST_OWNER, data).await?;
        let loaded = store.get_calculation(TEST_OWNER, created.id).await?;
        let pairs: Vec<(i32, u32)> = loaded.months.iter().map(|m| (m.year, m.month)).collect();
        assert_eq!(pairs, vec![(2023, 3), (2023, 4), (2023, 5), (2023, 6)]);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_requires_owner() -> Result<()> {
        let store = setup_test_store().await?;
        let result = store
            .create_calculation("", sample_new_calculation("Anon"))
            .await;
        assert!(matches!(result, Err(Error::Unauthenticated)));
        assert!(Calculation::find().all(store.connection()).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_month_insert_removes_header() -> Result<()> {
        let store = setup_test_store().await?;
        store
            .connection()
            .execute_unprepared("DROP TABLE calculation_months")
            .await?;

        let result = store
            .create_calculation(TEST_OWNER, sample_new_calculation("Huérfano"))
            .await;
        assert!(matches!(result, Err(Error::Persistence { .. })));
        assert!(Calculation::find().all(store.connection()).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_scoped_to_owner() -> Result<()> {
        let store = setup_test_store().await?;
        let first = store
            .create_calculation(TEST_OWNER, sample_new_calculation("Primero"))
            .await?;
        let second = store
            .create_calculation(TEST_OWNER, sample_new_calculation("Segundo"))
            .await?;
        store
            .create_calculation("someone-else", sample_new_calculation("Ajeno"))
            .await?;

        let listed = store.list_calculations(TEST_OWNER).await?;
        let ids: Vec<i64> = listed.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        Ok(())
    }

    #[tokio::test]
    async fn test_foreign_calculation_is_not_found() -> Result<()> {
        let store = setup_test_store().await?;
        let created = store
            .create_calculation("someone-else", sample_new_calculation("Ajeno"))
            .await?;

        let get = store.get_calculation(TEST_OWNER, created.id).await;
        assert!(matches!(get, Err(Error::CalculationNotFound { id }) if id == created.id));

        let delete = store.delete_calculation(TEST_OWNER, created.id).await;
        assert!(matches!(delete, Err(Error::CalculationNotFound { .. })));
        assert_eq!(find_months(store.connection(), created.id).await?.len(), 4);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_replaces_months() -> Result<()> {
        let store = setup_test_store().await?;
        let data = sample_new_calculation("Reemplazo");
        let created = store.create_calculation(TEST_OWNER, data.clone()).await?;

        let subset = data.months[1..3].to_vec();
        let changes = CalculationChanges {
            total_months: Some(2),
            months: Some(subset.clone()),
            ..Default::default()
        };
        store
            .update_calculation(TEST_OWNER, created.id, changes)
            .await?;

        let loaded = store.get_calculation(TEST_OWNER, created.id).await?;
        let pairs: Vec<(i32, u32)> = loaded.months.iter().map(|m| (m.year, m.month)).collect();
        assert_eq!(pairs, vec![(2023, 4), (2023, 5)]);
        assert_eq!(loaded.calculation.total_months, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() -> Result<()> {
        let store = setup_test_store().await?;
        let created = store
            .create_calculation(TEST_OWNER, sample_new_calculation("Antes"))
            .await?;

        let updated = store
            .update_calculation(
                TEST_OWNER,
                created.id,
                CalculationChanges {
                    name: Some("Después".to_string()),
                    ..Default::default()
                },
            )
            .await?;

        assert_eq!(updated.name, "Después");
        assert_eq!(updated.ud_value, created.ud_value);
        assert_eq!(updated.total_salary, created.total_salary);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(find_months(store.connection(), created.id).await?.len(), 4);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_missing_calculation() -> Result<()> {
        let store = setup_test_store().await?;
        let result = store
            .update_calculation(TEST_OWNER, 999, CalculationChanges::default())
            .await;
        assert!(matches!(
            result,
            Err(Error::CalculationNotFound { id: 999 })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_cascades_to_months() -> Result<()> {
        let store = setup_test_store().await?;
        let created = store
            .create_calculation(TEST_OWNER, sample_new_calculation("Borrar"))
            .await?;

        store.delete_calculation(TEST_OWNER, created.id).await?;

        let get = store.get_calculation(TEST_OWNER, created.id).await;
        assert!(matches!(get, Err(Error::CalculationNotFound { .. })));
        assert!(find_months(store.connection(), created.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_header_delete_cascades_through_foreign_key() -> Result<()> {
        let store = setup_test_store().await?;
        let created = store
            .create_calculation(TEST_OWNER, sample_new_calculation("Cascada"))
            .await?;

        Calculation::delete_by_id(created.id)
            .exec(store.connection())
            .await?;

        assert!(find_months(store.connection(), created.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_month_replace_rolls_back_update() -> Result<()> {
        let store = setup_test_store().await?;
        let data = sample_new_calculation("Original");
        let created = store.create_calculation(TEST_OWNER, data.clone()).await?;

        store
            .connection()
            .execute_unprepared(
                "CREATE TRIGGER reject_marked_salary BEFORE INSERT ON calculation_months \
                 WHEN NEW.salary = 424242 \
                 BEGIN SELECT RAISE(ABORT, 'rejected month'); END",
            )
            .await?;

        let mut months = data.months.clone();
        months[0].salary = 424_242.0;
        let changes = CalculationChanges {
            name: Some("Cambiado".to_string()),
            total_months: Some(1),
            months: Some(months[..1].to_vec()),
            ..Default::default()
        };
        let result = store
            .update_calculation(TEST_OWNER, created.id, changes)
            .await;
        assert!(matches!(result, Err(Error::Persistence { .. })));

        let loaded = store.get_calculation(TEST_OWNER, created.id).await?;
        assert_eq!(loaded.calculation.name, "Original");
        assert_eq!(loaded.calculation.total_months, 4);
        assert_eq!(loaded.calculation.total_result, created.total_result);
        assert_eq!(loaded.months.len(), 4);
        assert!(loaded.months.iter().all(|m| m.salary != 424_242.0));
        Ok(())
    }

    #[tokio::test]
    async fn test_read_failures_are_persistence_errors() -> Result<()> {
        let store = setup_test_store().await?;
        store
            .connection()
            .execute_unprepared("DROP TABLE calculations")
            .await?;

        let list = store.list_calculations(TEST_OWNER).await;
        assert!(matches!(list, Err(Error::Persistence { .. })));

        let get = store.get_calculation(TEST_OWNER, 1).await;
        assert!(matches!(get, Err(Error::Persistence { .. })));

        let delete = store.delete_calculation(TEST_OWNER, 1).await;
        assert!(matches!(delete, Err(Error::Persistence { .. })));
        Ok(())
    }
}
