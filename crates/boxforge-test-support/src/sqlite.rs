//! In-memory `SQLite` pools for store-backed tests.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

/// Connection string for a private in-memory database.
pub const MEMORY_URL: &str = "sqlite::memory:";

/// Build a pool over a fresh in-memory database.
///
/// Every connection to `sqlite::memory:` opens its own database, so the pool
/// is pinned to a single connection that is never recycled.
///
/// # Errors
///
/// Returns an error if the connection cannot be opened.
pub async fn memory_pool() -> Result<SqlitePool> {
    SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect(MEMORY_URL)
        .await
        .context("failed to open in-memory sqlite database")
}
