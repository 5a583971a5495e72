//! In-memory dedup store for tests and one-off runs.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use super::dedup::DedupStore;
use super::fingerprint::{Fingerprint, Namespace};
use crate::error_handling::StoreError;

/// Dedup store holding both fingerprint sets in process memory.
///
/// Nothing is persisted, so it only deduplicates within one process.
#[derive(Debug, Default)]
pub struct InMemoryDedupStore {
    paths: Mutex<HashSet<Fingerprint>>,
    scripts: Mutex<HashSet<Fingerprint>>,
}

impl InMemoryDedupStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn set(&self, namespace: Namespace) -> &Mutex<HashSet<Fingerprint>> {
        match namespace {
            Namespace::Paths => &self.paths,
            Namespace::Scripts => &self.scripts,
        }
    }

    /// Returns whether `fingerprint` is currently present in `namespace`.
    pub fn contains(&self, namespace: Namespace, fingerprint: &Fingerprint) -> bool {
        self.set(namespace)
            .lock()
            .map(|set| set.contains(fingerprint))
            .unwrap_or(false)
    }

    /// Returns the number of fingerprints in `namespace`.
    pub fn len(&self, namespace: Namespace) -> usize {
        self.set(namespace).lock().map(|set| set.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len(Namespace::Paths) == 0 && self.len(Namespace::Scripts) == 0
    }
}

#[async_trait]
impl DedupStore for InMemoryDedupStore {
    async fn insert(&self, namespace: Namespace, fingerprint: &Fingerprint) -> Result<bool, StoreError> {
        // A poisoned lock still holds a consistent set; keep using it
        let mut set = self
            .set(namespace)
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(set.insert(*fingerprint))
    }

    async fn remove(&self, namespace: Namespace, fingerprint: &Fingerprint) -> Result<(), StoreError> {
        let mut set = self
            .set(namespace)
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        set.remove(fingerprint);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reserve_path_twice() {
        let store = InMemoryDedupStore::new();
        assert!(store.reserve_path("a/b/ab/x.js").await.expect("reserve"));
        assert!(!store.reserve_path("a/b/ab/x.js").await.expect("reserve"));
    }

    #[tokio::test]
    async fn test_namespaces_are_disjoint() {
        let store = InMemoryDedupStore::new();
        let bytes = b"same bytes";
        assert!(store.reserve_script(bytes).await.expect("reserve"));
        // The identical digest in the other namespace is still free
        assert!(store
            .insert(Namespace::Paths, &Fingerprint::of(bytes))
            .await
            .expect("insert"));
        assert_eq!(store.len(Namespace::Paths), 1);
        assert_eq!(store.len(Namespace::Scripts), 1);
    }

    #[tokio::test]
    async fn test_release_restores_reservability() {
        let store = InMemoryDedupStore::new();
        assert!(store.reserve_script(b"var a;").await.expect("reserve"));
        store
            .release_script(&Fingerprint::of(b"var a;"))
            .await
            .expect("release");
        assert!(store.is_empty());
        assert!(store.reserve_script(b"var a;").await.expect("reserve"));
    }
}
