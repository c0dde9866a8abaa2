//! Persistence layer for the crowdqueue vote-ordered queue.
//!
//! - [`repositories`]: the entry store and the vote ledger, one SQL statement
//!   (or a handful) per operation.
//! - [`engine`]: the queue engine and next-entry selector, which compose the
//!   repositories inside transactions and own every cross-table invariant.

use sqlx::postgres::PgPoolOptions;

pub mod engine;
pub mod error;
pub mod models;
pub mod repositories;

pub use error::{QueueError, QueueResult};

pub type DbPool = sqlx::PgPool;

/// Default upper bound on pooled connections.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 20;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to confirm the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply any pending migrations from `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
