//! Manual release of fingerprints from the dedup store.
//!
//! Scan failures log the fingerprints they released; anything else that
//! should be re-admitted (a quarantined script after a validator fix, an
//! orphaned reservation after a killed run) is released with these hex
//! strings by an operator.

use std::path::Path;

use anyhow::{bail, Context, Result};
use log::info;

use crate::storage::{DedupStore, Fingerprint, Namespace, SqliteDedupStore};

/// Removes the given fingerprints from the store at `store_path`.
///
/// Both fingerprints are validated before the store is touched.
///
/// # Errors
///
/// Returns an error if neither fingerprint is given, either is not 40 hex
/// digits, or the store cannot be opened or updated.
pub async fn release_fingerprints(
    store_path: &Path,
    path_hex: Option<&str>,
    script_hex: Option<&str>,
) -> Result<()> {
    if path_hex.is_none() && script_hex.is_none() {
        bail!("Nothing to release: give --path-fingerprint and/or --script-fingerprint");
    }
    let path = path_hex.map(Fingerprint::from_hex).transpose()?;
    let script = script_hex.map(Fingerprint::from_hex).transpose()?;

    let store = SqliteDedupStore::open(store_path)
        .await
        .with_context(|| format!("Failed to open dedup store {}", store_path.display()))?;

    for (namespace, fingerprint) in [(Namespace::Paths, path), (Namespace::Scripts, script)] {
        if let Some(fingerprint) = fingerprint {
            store
                .remove(namespace, &fingerprint)
                .await
                .with_context(|| format!("Failed to release {} fingerprint {fingerprint}", namespace.as_str()))?;
            info!("Released {} fingerprint {fingerprint}", namespace.as_str());
        }
    }
    store.pool().close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_release_readmits_fingerprints() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("fp.db");
        let path_fp = Fingerprint::of_path("e/x/example.com/a.js");
        let script_fp = Fingerprint::of(b"a()");

        let store = SqliteDedupStore::open(&db).await.unwrap();
        assert!(store.reserve_path("e/x/example.com/a.js").await.unwrap());
        assert!(store.reserve_script(b"a()").await.unwrap());
        store.pool().close().await;

        release_fingerprints(&db, Some(&path_fp.to_hex()), Some(&script_fp.to_hex()))
            .await
            .unwrap();

        let store = SqliteDedupStore::open(&db).await.unwrap();
        assert!(store.reserve_path("e/x/example.com/a.js").await.unwrap());
        assert!(store.reserve_script(b"a()").await.unwrap());
    }

    #[tokio::test]
    async fn test_release_requires_a_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        assert!(release_fingerprints(&dir.path().join("fp.db"), None, None)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_invalid_hex_is_rejected_before_opening_store() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("fp.db");
        assert!(release_fingerprints(&db, Some("xyz"), None).await.is_err());
        assert!(!db.exists());
    }
}
