//! Store connection pool management.
//!
//! This module initializes and configures the SQLite connection pool with:
//! - WAL mode enabled for concurrent access from several processes
//! - A busy timeout so concurrent writers wait instead of failing
//! - Automatic database file (and parent directory) creation

use std::path::Path;
use std::time::Duration;

use log::{error, info};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};

use crate::config::STORE_BUSY_TIMEOUT_SECS;
use crate::error_handling::StoreError;

/// Initializes and returns a connection pool for the store at `store_path`.
///
/// Creates the database file and its parent directory if they don't exist.
/// The extractor is strictly sequential, so a single connection is enough.
pub async fn init_store_pool(store_path: &Path) -> Result<Pool<Sqlite>, StoreError> {
    if let Some(parent) = store_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(store_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(STORE_BUSY_TIMEOUT_SECS));

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(|e| {
            error!("Failed to open dedup store {}: {e}", store_path.display());
            StoreError::SqlError(e)
        })?;

    info!("Dedup store opened at {}", store_path.display());
    Ok(pool)
}
