// storage/migrations.rs
// Store schema management

use sqlx::{Pool, Sqlite};

use crate::error_handling::StoreError;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS path_fingerprints (
        fingerprint BLOB PRIMARY KEY NOT NULL
    ) WITHOUT ROWID",
    "CREATE TABLE IF NOT EXISTS script_fingerprints (
        fingerprint BLOB PRIMARY KEY NOT NULL
    ) WITHOUT ROWID",
];

/// Creates the two fingerprint tables if they do not exist yet.
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<(), StoreError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
