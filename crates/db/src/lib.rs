//! Persistence layer for the flash-sale engine: connection pool helpers,
//! migrations, models and repositories.

pub mod models;
pub mod repositories;

use sqlx::postgres::PgPoolOptions;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Cheap connectivity probe, used by the health endpoint.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Readiness probe: true once the engine's tables exist, i.e. migrations
/// have been applied. A reachable database with an unmigrated schema is
/// not ready to take allocations.
pub async fn schema_ready(pool: &DbPool) -> Result<bool, sqlx::Error> {
    let (ready,): (bool,) = sqlx::query_as(
        "SELECT to_regclass('public.flash_sales') IS NOT NULL \
            AND to_regclass('public.flash_sale_offers') IS NOT NULL \
            AND to_regclass('public.allocation_attempts') IS NOT NULL",
    )
    .fetch_one(pool)
    .await?;
    Ok(ready)
}

/// Apply pending migrations from `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
