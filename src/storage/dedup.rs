//! Dedup store trait and the SQLite implementation.
//!
//! Reservations are atomic test-and-set operations: an insert that reports
//! whether it added the fingerprint. That is the only synchronization between
//! runs; a second writer is never started for a fingerprint that is already
//! present. There are no transactions spanning the two namespaces, so callers
//! that reserve and then decide not to proceed must release explicitly.

use std::path::Path;

use async_trait::async_trait;
use sqlx::{Pool, Sqlite};

use super::fingerprint::{Fingerprint, Namespace};
use super::migrations::run_migrations;
use super::pool::init_store_pool;
use crate::error_handling::StoreError;

/// Shared, persistent pair of fingerprint sets.
///
/// # Contract
/// - `insert` returns `true` iff this call added the fingerprint.
/// - `remove` of an absent fingerprint is not an error.
/// - Both are atomic with respect to every other process using the same store.
#[async_trait]
pub trait DedupStore: Send + Sync {
    /// Atomically adds `fingerprint` to `namespace`.
    async fn insert(&self, namespace: Namespace, fingerprint: &Fingerprint) -> Result<bool, StoreError>;

    /// Removes `fingerprint` from `namespace`.
    async fn remove(&self, namespace: Namespace, fingerprint: &Fingerprint) -> Result<(), StoreError>;

    /// Reserves a derived path. `false` means some run already reserved it.
    async fn reserve_path(&self, path: &str) -> Result<bool, StoreError> {
        self.insert(Namespace::Paths, &Fingerprint::of_path(path)).await
    }

    /// Reserves a script body. `false` means this exact body was already seen.
    async fn reserve_script(&self, script: &[u8]) -> Result<bool, StoreError> {
        self.insert(Namespace::Scripts, &Fingerprint::of(script)).await
    }

    /// Releases a path reservation that never materialized to a file.
    async fn release_path(&self, fingerprint: &Fingerprint) -> Result<(), StoreError> {
        self.remove(Namespace::Paths, fingerprint).await
    }

    /// Releases a script reservation that never materialized to a file.
    async fn release_script(&self, fingerprint: &Fingerprint) -> Result<(), StoreError> {
        self.remove(Namespace::Scripts, fingerprint).await
    }
}

/// Dedup store backed by a SQLite database file.
///
/// The file may be shared by any number of concurrent processes; WAL mode and
/// a busy timeout make `INSERT OR IGNORE` the atomic test-and-set.
pub struct SqliteDedupStore {
    pool: Pool<Sqlite>,
}

impl SqliteDedupStore {
    /// Opens (creating if needed) the store at `path` and ensures its schema.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let pool = init_store_pool(path).await?;
        Self::with_pool(pool).await
    }

    /// Wraps an existing pool, ensuring the schema exists.
    pub async fn with_pool(pool: Pool<Sqlite>) -> Result<Self, StoreError> {
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Returns the number of fingerprints in `namespace`.
    pub async fn count(&self, namespace: Namespace) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar(count_sql(namespace))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn insert_sql(namespace: Namespace) -> &'static str {
    match namespace {
        Namespace::Paths => "INSERT OR IGNORE INTO path_fingerprints (fingerprint) VALUES (?)",
        Namespace::Scripts => "INSERT OR IGNORE INTO script_fingerprints (fingerprint) VALUES (?)",
    }
}

fn delete_sql(namespace: Namespace) -> &'static str {
    match namespace {
        Namespace::Paths => "DELETE FROM path_fingerprints WHERE fingerprint = ?",
        Namespace::Scripts => "DELETE FROM script_fingerprints WHERE fingerprint = ?",
    }
}

fn count_sql(namespace: Namespace) -> &'static str {
    match namespace {
        Namespace::Paths => "SELECT COUNT(*) FROM path_fingerprints",
        Namespace::Scripts => "SELECT COUNT(*) FROM script_fingerprints",
    }
}

#[async_trait]
impl DedupStore for SqliteDedupStore {
    async fn insert(&self, namespace: Namespace, fingerprint: &Fingerprint) -> Result<bool, StoreError> {
        let result = sqlx::query(insert_sql(namespace))
            .bind(fingerprint.as_bytes().as_slice())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn remove(&self, namespace: Namespace, fingerprint: &Fingerprint) -> Result<(), StoreError> {
        sqlx::query(delete_sql(namespace))
            .bind(fingerprint.as_bytes().as_slice())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
