use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::StoreResult;
use crate::traits::{validate_key, ObjectStore};

/// In-memory, HashMap-based object store.
///
/// Intended for tests and embedding. Payloads are held behind a `RwLock`
/// and cloned on read/write; replacing a payload is a single map insert, so
/// `insert` is trivially atomic.
pub struct InMemoryObjectStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryObjectStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().expect("lock poisoned").is_empty()
    }

    /// Total payload bytes across all entries.
    pub fn total_bytes(&self) -> u64 {
        self.entries
            .read()
            .expect("lock poisoned")
            .values()
            .map(|payload| payload.len() as u64)
            .sum()
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn insert(&self, key: &str, payload: &[u8]) -> StoreResult<()> {
        validate_key(key)?;
        let mut map = self.entries.write().expect("lock poisoned");
        map.insert(key.to_string(), payload.to_vec());
        Ok(())
    }

    fn select(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        validate_key(key)?;
        let map = self.entries.read().expect("lock poisoned");
        Ok(map.get(key).cloned())
    }

    fn exist(&self, key: &str) -> StoreResult<bool> {
        validate_key(key)?;
        let map = self.entries.read().expect("lock poisoned");
        Ok(map.contains_key(key))
    }

    fn delete_if_exists(&self, key: &str) -> StoreResult<bool> {
        validate_key(key)?;
        let mut map = self.entries.write().expect("lock poisoned");
        Ok(map.remove(key).is_some())
    }

    fn all_keys(&self) -> StoreResult<Vec<String>> {
        let map = self.entries.read().expect("lock poisoned");
        let mut keys: Vec<String> = map.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    fn destroy(&self) -> StoreResult<()> {
        self.entries.write().expect("lock poisoned").clear();
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryObjectStore")
            .field("entry_count", &count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    #[test]
    fn insert_and_select() {
        let store = InMemoryObjectStore::new();
        store.insert("greeting", b"hello world").unwrap();

        let read_back = store.select("greeting").unwrap().expect("should exist");
        assert_eq!(read_back, b"hello world");
    }

    #[test]
    fn insert_replaces_previous_payload() {
        let store = InMemoryObjectStore::new();
        store.insert("k", b"first").unwrap();
        store.insert("k", b"second").unwrap();
        assert_eq!(store.select("k").unwrap().unwrap(), b"second");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn select_missing_returns_none() {
        let store = InMemoryObjectStore::new();
        assert!(store.select("missing").unwrap().is_none());
    }

    #[test]
    fn empty_key_is_rejected() {
        let store = InMemoryObjectStore::new();
        let err = store.insert("", b"x").unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey { .. }));
    }

    #[test]
    fn empty_key_is_rejected_by_every_keyed_operation() {
        let dir = tempfile::tempdir().unwrap();
        let file = crate::file::FileObjectStore::open(
            dir.path(),
            "chest",
            crate::file::SyncMode::OsDefault,
        )
        .unwrap();
        let memory = InMemoryObjectStore::new();
        let backends: [&dyn ObjectStore; 2] = [&memory, &file];

        for store in backends {
            assert!(matches!(store.select(""), Err(StoreError::InvalidKey { .. })));
            assert!(matches!(store.exist(""), Err(StoreError::InvalidKey { .. })));
            assert!(matches!(
                store.delete_if_exists(""),
                Err(StoreError::InvalidKey { .. })
            ));
        }
    }

    #[test]
    fn delete_is_idempotent() {
        let store = InMemoryObjectStore::new();
        store.insert("to-delete", b"x").unwrap();
        assert!(store.delete_if_exists("to-delete").unwrap());
        assert!(!store.exist("to-delete").unwrap());
        assert!(!store.delete_if_exists("to-delete").unwrap());
        assert!(!store.delete_if_exists("never-written").unwrap());
    }

    #[test]
    fn all_keys_is_sorted() {
        let store = InMemoryObjectStore::new();
        store.insert("ccc", b"3").unwrap();
        store.insert("aaa", b"1").unwrap();
        store.insert("bbb", b"2").unwrap();
        assert_eq!(store.all_keys().unwrap(), vec!["aaa", "bbb", "ccc"]);
    }

    #[test]
    fn destroy_removes_all() {
        let store = InMemoryObjectStore::new();
        store.insert("a", b"1").unwrap();
        store.insert("b", b"2").unwrap();
        store.destroy().unwrap();
        assert!(store.is_empty());
        assert!(store.all_keys().unwrap().is_empty());

        // Reusable after destroy.
        store.insert("a", b"again").unwrap();
        assert!(store.exist("a").unwrap());
    }

    #[test]
    fn total_bytes() {
        let store = InMemoryObjectStore::new();
        store.insert("a", b"12345").unwrap();
        store.insert("b", b"123456789").unwrap();
        assert_eq!(store.total_bytes(), 14);
    }

    #[test]
    fn concurrent_reads_are_safe() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryObjectStore::new());
        store.insert("shared", b"shared data").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let payload = store.select("shared").unwrap();
                    assert_eq!(payload.as_deref(), Some(&b"shared data"[..]));
                })
            })
            .collect();

        for h in handles {
            h.join().expect("thread should not panic");
        }
    }

    #[test]
    fn debug_format() {
        let store = InMemoryObjectStore::new();
        store.insert("x", b"x").unwrap();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryObjectStore"));
        assert!(debug.contains("entry_count"));
    }
}
