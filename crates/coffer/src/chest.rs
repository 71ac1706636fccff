use std::any::{type_name, Any};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use coffer_notify::{ListenerId, ListenerRegistry, Registration, Subscription};
use coffer_store::{Encryption, InMemoryObjectStore, NoEncryption, Storage, StoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::config::CofferConfig;
use crate::error::{ChestError, ChestResult};
use crate::loader::Loader;

/// Values a chest can read back: named-field serde shapes with a
/// parameterless default.
///
/// Stored values decode exactly as written. For entries written by an older
/// shape to load, mark the struct `#[serde(default)]` so fields it lacks
/// come from `Default`:
///
/// ```
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Default, Serialize, Deserialize)]
/// #[serde(default)]
/// struct Profile {
///     name: String,
///     email: String,
/// }
/// ```
pub trait Persist: Serialize + DeserializeOwned + Default + Send + Sync + 'static {}

impl<T> Persist for T where T: Serialize + DeserializeOwned + Default + Send + Sync + 'static {}

/// One named store: typed values under string keys plus the listeners
/// watching them.
///
/// Writes and deletes are serialized by a chest-wide lock; reads never take
/// it. Listeners are notified after the lock is released, so a listener may
/// read, write or (un)subscribe on the same chest.
///
/// [`Chest::destroy`] must not race with other operations on the same chest.
pub struct Chest {
    name: String,
    storage: Storage,
    write_lock: Mutex<()>,
    listeners: Arc<ListenerRegistry>,
    loader: Option<Arc<dyn Loader>>,
}

impl Chest {
    /// Open the file-backed chest `name` under `config.root`.
    pub fn open(
        config: &CofferConfig,
        name: &str,
        encryption: Arc<dyn Encryption>,
    ) -> ChestResult<Self> {
        let storage = Storage::open(
            &config.root,
            name,
            encryption,
            config.cache_capacity,
            config.sync_mode,
        )?;
        Ok(Self::with_storage(name, storage))
    }

    /// Unencrypted chest that lives only in memory.
    pub fn in_memory(name: impl Into<String>, cache_capacity: usize) -> Self {
        let storage = Storage::with_backend(
            Box::new(InMemoryObjectStore::new()),
            Arc::new(NoEncryption),
            cache_capacity,
        );
        Self::with_storage(name, storage)
    }

    pub fn with_storage(name: impl Into<String>, storage: Storage) -> Self {
        Self {
            name: name.into(),
            storage,
            write_lock: Mutex::new(()),
            listeners: Arc::new(ListenerRegistry::new()),
            loader: None,
        }
    }

    pub fn with_loader(mut self, loader: Arc<dyn Loader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn listeners(&self) -> &Arc<ListenerRegistry> {
        &self.listeners
    }

    // ---- Values ----

    /// Save `value` under `key`, replacing any previous entry, then notify
    /// matching listeners.
    ///
    /// Values that serialize to `null` (`None`, `()`) are rejected with
    /// [`StoreError::NullRootValue`](coffer_store::StoreError::NullRootValue).
    pub fn write<T>(&self, key: &str, value: T) -> ChestResult<()>
    where
        T: Serialize + Send + Sync + 'static,
    {
        let value = Arc::new(value);
        {
            let _guard = self.lock_writes();
            self.storage.insert(key, Arc::clone(&value))?;
        }
        self.notify(key, value.as_ref());
        Ok(())
    }

    /// The value under `key`, or `None` if there is no entry.
    pub fn read<T: Persist>(&self, key: &str) -> ChestResult<Option<Arc<T>>> {
        Ok(self.storage.select::<T>(key)?)
    }

    /// The value under `key`, or `default` if there is no entry.
    pub fn read_or<T: Persist>(&self, key: &str, default: T) -> ChestResult<Arc<T>> {
        Ok(self.read(key)?.unwrap_or_else(|| Arc::new(default)))
    }

    /// Save `value` keyed by its type name.
    pub fn write_type<T>(&self, value: T) -> ChestResult<()>
    where
        T: Serialize + Send + Sync + 'static,
    {
        self.write(type_name::<T>(), value)
    }

    /// Read the value saved with [`Chest::write_type`].
    pub fn read_type<T: Persist>(&self) -> ChestResult<Option<Arc<T>>> {
        self.read(type_name::<T>())
    }

    /// Read-modify-write under the write lock.
    ///
    /// Starts from the stored value, or `default` if there is none, applies
    /// `f`, saves the result and notifies listeners with it.
    pub fn execute<T, F>(&self, key: &str, default: T, f: F) -> ChestResult<Arc<T>>
    where
        T: Persist + Clone,
        F: FnOnce(&mut T),
    {
        let value = {
            let _guard = self.lock_writes();
            let mut value = match self.storage.select::<T>(key)? {
                Some(current) => Arc::unwrap_or_clone(current),
                None => default,
            };
            f(&mut value);
            let value = Arc::new(value);
            self.storage.insert(key, Arc::clone(&value))?;
            value
        };
        self.notify(key, value.as_ref());
        Ok(value)
    }

    pub fn exist(&self, key: &str) -> ChestResult<bool> {
        Ok(self.storage.exist(key)?)
    }

    /// Delete `key`'s entry. Deleting an absent key is a no-op returning
    /// `false`.
    pub fn delete(&self, key: &str) -> ChestResult<bool> {
        Ok(self.delete_entry(key)?)
    }

    /// Delete every entry, returning how many keys were removed.
    ///
    /// Every key is attempted even after a failure and nothing is rolled
    /// back; the first failure is reported in [`ChestError::DeleteAll`].
    pub fn delete_all(&self) -> ChestResult<usize> {
        let keys = self.storage.all_keys()?;
        let attempted = keys.len();
        let mut failed = 0;
        let mut first = None;

        for key in &keys {
            if let Err(e) = self.delete_entry(key) {
                warn!(chest = %self.name, key, error = %e, "delete failed");
                failed += 1;
                first.get_or_insert(e);
            }
        }

        match first {
            None => {
                debug!(chest = %self.name, deleted = attempted, "all entries deleted");
                Ok(attempted)
            }
            Some(first) => Err(ChestError::DeleteAll {
                attempted,
                failed,
                first,
            }),
        }
    }

    /// All keys, sorted.
    pub fn all_keys(&self) -> ChestResult<Vec<String>> {
        Ok(self.storage.all_keys()?)
    }

    /// Remove every entry and the chest's directory. The chest stays usable;
    /// the next write recreates it.
    pub fn destroy(&self) -> ChestResult<()> {
        let _guard = self.lock_writes();
        self.storage.destroy()?;
        debug!(chest = %self.name, "destroyed");
        Ok(())
    }

    pub fn invalidate_cache(&self, key: &str) {
        self.storage.invalidate_cache(key);
    }

    pub fn invalidate_cache_all(&self) {
        self.storage.invalidate_cache_all();
    }

    /// Poisoning is ignored: the lock guards no data.
    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn delete_entry(&self, key: &str) -> StoreResult<bool> {
        let _guard = self.lock_writes();
        self.storage.delete_if_exists(key)
    }

    fn notify(&self, key: &str, value: &dyn Any) {
        let delivered = self.listeners.dispatch(key, value);
        trace!(chest = %self.name, key, delivered, "write dispatched");
    }

    // ---- Listeners ----

    pub fn subscribe(&self, registration: Registration) -> ListenerId {
        self.listeners.subscribe(registration)
    }

    /// Subscribe until the returned guard is dropped.
    pub fn subscribe_scoped(&self, registration: Registration) -> Subscription {
        self.listeners.subscribe_scoped(registration)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Remove every registration made with `owned_by::<O>()`.
    pub fn unsubscribe_owner<O: ?Sized>(&self) -> usize {
        self.listeners.unsubscribe_owner::<O>()
    }

    // ---- Loading ----

    /// Hand `request` to the configured [`Loader`], which stores its result
    /// under `key`.
    pub fn load(&self, request: &dyn Any, key: &str) -> ChestResult<()> {
        let loader = self.loader.as_ref().ok_or(ChestError::MissingLoader)?;
        loader.load(self, request, key)
    }

    /// [`Chest::load`] keyed by `T`'s type name.
    pub fn load_type<T: ?Sized>(&self, request: &dyn Any) -> ChestResult<()> {
        self.load(request, type_name::<T>())
    }

    /// Write every item under `key` in order; the last one wins. Each write
    /// notifies listeners. Stops at the first failed write.
    pub fn load_iter<T, I>(&self, key: &str, items: I) -> ChestResult<usize>
    where
        T: Serialize + Send + Sync + 'static,
        I: IntoIterator<Item = T>,
    {
        let mut written = 0;
        for item in items {
            self.write(key, item)?;
            written += 1;
        }
        Ok(written)
    }
}

impl std::fmt::Debug for Chest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chest")
            .field("name", &self.name)
            .field("storage", &self.storage)
            .field("listeners", &self.listeners.len())
            .field("loader", &self.loader.is_some())
            .finish()
    }
}
