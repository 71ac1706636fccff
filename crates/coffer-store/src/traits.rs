use crate::error::{StoreError, StoreResult};

/// Key-addressed byte store holding one opaque payload per key.
///
/// All implementations must satisfy these invariants:
/// - `insert` is all-or-nothing: a reader sees either the previous payload or
///   the new one, never a partially written payload.
/// - The store never interprets payloads; serialization and encryption
///   happen above it.
/// - Absent keys are not errors: `select` returns `Ok(None)` and
///   `delete_if_exists` returns `Ok(false)`.
/// - All other I/O errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// Create or fully replace the payload stored under `key`.
    fn insert(&self, key: &str, payload: &[u8]) -> StoreResult<()>;

    /// Read the payload stored under `key`.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    fn select(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Check whether a payload exists under `key`.
    fn exist(&self, key: &str) -> StoreResult<bool>;

    /// Delete the payload under `key`. Returns `true` if it existed.
    fn delete_if_exists(&self, key: &str) -> StoreResult<bool>;

    /// All keys currently stored, sorted.
    fn all_keys(&self) -> StoreResult<Vec<String>>;

    /// Remove every entry and any backing structure.
    ///
    /// The store stays usable: a later `insert` recreates what it needs.
    fn destroy(&self) -> StoreResult<()>;
}

/// Reject keys no backend can store.
pub(crate) fn validate_key(key: &str) -> StoreResult<()> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey {
            key: String::new(),
            reason: "key must not be empty".into(),
        });
    }
    Ok(())
}
