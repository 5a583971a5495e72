//! Shared test helpers for storage module tests.

use sqlx::sqlite::SqlitePoolOptions;

use crate::storage::SqliteDedupStore;

/// Creates a store over an in-memory database.
///
/// An in-memory SQLite database lives per connection, so the pool is capped
/// at one connection that is never recycled.
pub async fn create_test_store() -> SqliteDedupStore {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database pool");
    SqliteDedupStore::with_pool(pool)
        .await
        .expect("Failed to create schema")
}
