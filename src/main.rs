use jubilacion_calc::{
    config::{database, settings},
    core::{
        access::{Principal, Role},
        calculations,
    },
    errors::Result,
    format,
    store::DatabaseStore,
};
use dotenvy::dotenv;
use std::env;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load calculator settings
    let settings = settings::load_default_settings()
        .inspect_err(|e| error!("Failed to load settings: {}", e))?;
    info!(
        "Settings loaded (default UD {}, max {} months).",
        settings.calculator.default_ud_value, settings.calculator.max_months
    );

    // 4. Connect and make sure the tables exist
    let db = database::create_connection()
        .await
        .inspect(|_| info!("Database connection established."))
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db).await?;
    let store = DatabaseStore::new(db);

    // 5. List the saved calculations of the configured user, if any
    let Ok(user_id) = env::var("JUBILACION_USER_ID") else {
        info!("JUBILACION_USER_ID not set, nothing to list.");
        return Ok(());
    };
    let role = env::var("JUBILACION_USER_ROLE")
        .ok()
        .map(|r| r.parse::<Role>())
        .transpose()?
        .unwrap_or(Role::Invitado);
    let principal = Principal::new(user_id, role);

    let options = calculations::ListOptions {
        search: env::var("JUBILACION_SEARCH").ok(),
        ..Default::default()
    };
    let saved = calculations::list_calculations(&store, &principal, &options).await?;
    info!("{} saved calculations for {}", saved.len(), principal.id);
    for calculation in &saved {
        info!(
            "#{} {} | {} | {} meses | salarios {} | resultado {}",
            calculation.id,
            calculation.name,
            format::format_period(calculation.start_date, calculation.end_date),
            calculation.total_months,
            format::format_currency(calculation.total_salary),
            format::format_currency(calculation.total_result),
        );
    }

    Ok(())
}
