//! Persistence for reelforge.
//!
//! The rest of the workspace sees the record store only through the
//! [`JobStore`] trait: read a project's generation inputs, read a stage's
//! job status map, replace it, or replace it conditionally. [`PgJobStore`]
//! backs the trait with PostgreSQL via the repositories in
//! [`repositories`].

use sqlx::postgres::PgPoolOptions;

pub mod error;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod models;
pub mod pg_store;
pub mod repositories;
pub mod store;

pub use error::StoreError;
pub use pg_store::PgJobStore;
pub use store::JobStore;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Verify the pool can reach the database.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
