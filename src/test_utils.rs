//! Shared test utilities.
//!
//! Provides an in-memory database, sample calculation data and a store double that
//! can be told to fail its writes.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::{
    core::{
        access::{Principal, Role},
        calculations::{CalculationParams, new_calculation},
        formula::compute_months,
        months::{MonthEntry, expand_months},
    },
    entities::calculation,
    errors::{Error, Result},
    store::{
        CalculationChanges, CalculationStore, CalculationWithMonths, DatabaseStore,
        NewCalculation,
    },
};
use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing_subscriber::EnvFilter;

/// Owner id used by most tests.
pub const TEST_OWNER: &str = "test_user";

pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// A [`DatabaseStore`] over a fresh in-memory database.
pub async fn setup_test_store() -> Result<DatabaseStore> {
    Ok(DatabaseStore::new(setup_test_db().await?))
}

/// A verified principal owning [`TEST_OWNER`]'s calculations.
pub fn verified_principal() -> Principal {
    Principal::new(TEST_OWNER, Role::Verificado)
}

/// Parameters spanning March to June 2023 with a UD of 1.5.
pub fn sample_params(name: &str) -> CalculationParams {
    CalculationParams {
        name: name.to_string(),
        ud_value: 1.5,
        start_date: NaiveDate::from_ymd_opt(2023, 3, 15).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2023, 6, 2).unwrap(),
    }
}

/// The four months of [`sample_params`] with varied salaries and COEs, including
/// a zero COE.
pub fn sample_months() -> Vec<MonthEntry> {
    let params = sample_params("sample");
    let mut months = expand_months(params.start_date, params.end_date);
    let values = [(1000.0, 1.0), (1100.0, 1.25), (1200.0, 0.8), (1300.0, 0.0)];
    for (month, (salary, coe)) in months.iter_mut().zip(values) {
        month.salary = salary;
        month.coe = coe;
    }
    months
}

/// Store payload for [`sample_params`] and [`sample_months`] with consistent
/// results and aggregates.
pub fn sample_new_calculation(name: &str) -> NewCalculation {
    let params = sample_params(name);
    let months = compute_months(&sample_months(), params.ud_value);
    new_calculation(&params, &months).expect("sample months are not empty")
}

/// Store double that counts calls and can fail every write.
pub struct FlakyStore {
    inner: DatabaseStore,
    fail_writes: AtomicBool,
    calls: AtomicUsize,
}

impl FlakyStore {
    pub const fn new(inner: DatabaseStore) -> Self {
        Self {
            inner,
            fail_writes: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// Makes create, update and delete fail while set.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of store calls made through this double.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The wrapped store, bypassing counting and failures.
    pub const fn inner(&self) -> &DatabaseStore {
        &self.inner
    }

    fn track_write(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Persistence {
                message: "simulated write failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CalculationStore for FlakyStore {
    async fn list_calculations(&self, owner_id: &str) -> Result<Vec<calculation::Model>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list_calculations(owner_id).await
    }

    async fn get_calculation(&self, owner_id: &str, id: i64) -> Result<CalculationWithMonths> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get_calculation(owner_id, id).await
    }

    async fn create_calculation(
        &self,
        owner_id: &str,
        data: NewCalculation,
    ) -> Result<calculation::Model> {
        self.track_write()?;
        self.inner.create_calculation(owner_id, data).await
    }

    async fn update_calculation(
        &self,
        owner_id: &str,
        id: i64,
        changes: CalculationChanges,
    ) -> Result<calculation::Model> {
        self.track_write()?;
        self.inner.update_calculation(owner_id, id, changes).await
    }

    async fn delete_calculation(&self, owner_id: &str, id: i64) -> Result<()> {
        self.track_write()?;
        self.inner.delete_calculation(owner_id, id).await
    }
}
