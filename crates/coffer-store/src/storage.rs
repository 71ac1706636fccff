use std::any::Any;
use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace};

use crate::cache::ObjectCache;
use crate::encryption::Encryption;
use crate::error::StoreResult;
use crate::file::{FileObjectStore, SyncMode};
use crate::serializer::Serializer;
use crate::traits::ObjectStore;

/// Typed storage over a byte store: serializer, encryption and cache.
///
/// Writes go serializer → encryption → backend, then update the cache.
/// Reads are served from the cache when warm, otherwise backend →
/// decryption → serializer, then fill the cache.
///
/// `Storage` does not serialize writers; callers that need at most one
/// writer per key hold their own lock around [`Storage::insert`] and
/// [`Storage::delete_if_exists`].
pub struct Storage {
    backend: Box<dyn ObjectStore>,
    encryption: Arc<dyn Encryption>,
    cache: ObjectCache,
    serializer: Serializer,
}

impl Storage {
    /// Open file-backed storage named `name` under `root`.
    pub fn open(
        root: &Path,
        name: &str,
        encryption: Arc<dyn Encryption>,
        cache_capacity: usize,
        sync_mode: SyncMode,
    ) -> StoreResult<Self> {
        let backend = FileObjectStore::open(root, name, sync_mode)?;
        Ok(Self::with_backend(Box::new(backend), encryption, cache_capacity))
    }

    /// Build storage over any backend.
    pub fn with_backend(
        backend: Box<dyn ObjectStore>,
        encryption: Arc<dyn Encryption>,
        cache_capacity: usize,
    ) -> Self {
        Self {
            backend,
            encryption,
            cache: ObjectCache::new(cache_capacity),
            serializer: Serializer,
        }
    }

    /// Persist `value` under `key`, replacing any previous entry.
    pub fn insert<T>(&self, key: &str, value: Arc<T>) -> StoreResult<()>
    where
        T: Serialize + Any + Send + Sync,
    {
        let bytes = self.serializer.encode(value.as_ref())?;
        let sealed = self.encryption.encrypt(&bytes)?;
        if let Err(e) = self.backend.insert(key, &sealed) {
            self.cache.invalidate(key);
            return Err(e);
        }
        self.cache.put(key, value);
        debug!(key, len = sealed.len(), "stored");
        Ok(())
    }

    /// Read the value under `key`, or `None` if there is no entry.
    pub fn select<T>(&self, key: &str) -> StoreResult<Option<Arc<T>>>
    where
        T: DeserializeOwned + Default + Any + Send + Sync,
    {
        if let Some(hit) = self.cache.get::<T>(key) {
            trace!(key, "cache hit");
            return Ok(Some(hit));
        }

        let epoch = self.cache.epoch();
        let Some(sealed) = self.backend.select(key)? else {
            return Ok(None);
        };
        let bytes = self.encryption.decrypt(&sealed)?;
        let value = Arc::new(self.serializer.decode::<T>(key, &bytes)?);
        let cached = self.cache.populate(key, value.clone(), epoch);
        trace!(key, cached, "cache miss");
        Ok(Some(value))
    }

    /// Logical type name recorded for `key`'s entry.
    pub fn logical_type(&self, key: &str) -> StoreResult<Option<String>> {
        let Some(sealed) = self.backend.select(key)? else {
            return Ok(None);
        };
        let bytes = self.encryption.decrypt(&sealed)?;
        self.serializer.peek_type(key, &bytes).map(Some)
    }

    /// Whether an entry exists for `key`.
    pub fn exist(&self, key: &str) -> StoreResult<bool> {
        self.backend.exist(key)
    }

    /// Delete `key`'s entry if present. Returns whether it existed.
    pub fn delete_if_exists(&self, key: &str) -> StoreResult<bool> {
        let result = self.backend.delete_if_exists(key);
        self.cache.invalidate(key);
        result
    }

    /// All stored keys, sorted.
    pub fn all_keys(&self) -> StoreResult<Vec<String>> {
        self.backend.all_keys()
    }

    /// Remove every entry and the backing structure.
    pub fn destroy(&self) -> StoreResult<()> {
        let result = self.backend.destroy();
        self.cache.invalidate_all();
        result
    }

    /// Drop `key` from the cache only.
    pub fn invalidate_cache(&self, key: &str) {
        self.cache.invalidate(key);
    }

    /// Drop the whole cache only.
    pub fn invalidate_cache_all(&self) {
        self.cache.invalidate_all();
    }

    /// The cache, for inspection.
    pub fn cache(&self) -> &ObjectCache {
        &self.cache
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
