//! Database configuration module.
//!
//! Handles the `SQLite` connection and table creation using `SeaORM`. Tables are
//! generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs, including the cascading foreign
//! key from `calculation_months` to `calculations`.

use crate::entities::{Calculation, CalculationMonth};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/jubilacion.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable or returns the
/// default local `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by [`get_database_url`].
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates the `calculations` and `calculation_months` tables if they do not exist.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut calculation_table = schema.create_table_from_entity(Calculation);
    let mut month_table = schema.create_table_from_entity(CalculationMonth);

    calculation_table.if_not_exists();
    month_table.if_not_exists();

    db.execute(builder.build(&calculation_table)).await?;
    db.execute(builder.build(&month_table)).await?;

    info!("Database tables ensured.");
    Ok(())
}
