use std::any::Any;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;

/// A decoded value as held by the cache. Replaced as a whole, never mutated.
pub type CachedValue = Arc<dyn Any + Send + Sync>;

/// Hit/miss counters, reset only by recreating the cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

struct CacheState {
    entries: LruCache<String, CachedValue>,
    /// Bumped by every put and invalidation; see [`ObjectCache::populate`].
    epoch: u64,
    stats: CacheStats,
}

/// Fixed-capacity LRU cache of decoded values, keyed by entry key.
///
/// Capacity 0 disables caching: every `get` misses and every write is a
/// no-op. Both `get` and `put` refresh recency.
///
/// Reads that miss fill the cache through [`ObjectCache::populate`] with the
/// epoch observed before they went to disk. Any put or invalidation in
/// between moves the epoch and the fill is dropped, so a slow reader never
/// overwrites a newer value or brings back an invalidated one.
pub struct ObjectCache {
    state: Option<Mutex<CacheState>>,
    capacity: usize,
}

impl ObjectCache {
    /// Create a cache holding at most `capacity` values.
    pub fn new(capacity: usize) -> Self {
        let state = NonZeroUsize::new(capacity).map(|cap| {
            Mutex::new(CacheState {
                entries: LruCache::new(cap),
                epoch: 0,
                stats: CacheStats::default(),
            })
        });
        Self { state, capacity }
    }

    /// A cache that never holds anything.
    pub fn disabled() -> Self {
        Self::new(0)
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns `true` unless the capacity is 0.
    pub fn is_enabled(&self) -> bool {
        self.state.is_some()
    }

    /// Look up `key`, refreshing its recency.
    ///
    /// A cached value of a different concrete type than `T` counts as a
    /// miss.
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        let state = self.state.as_ref()?;
        let mut state = state.lock().expect("cache lock poisoned");
        let found = state
            .entries
            .get(key)
            .cloned()
            .and_then(|value| value.downcast::<T>().ok());
        match found {
            Some(_) => state.stats.hits += 1,
            None => state.stats.misses += 1,
        }
        found
    }

    /// Store `value` under `key` after a successful write.
    pub fn put(&self, key: &str, value: CachedValue) {
        if let Some(state) = &self.state {
            let mut state = state.lock().expect("cache lock poisoned");
            state.epoch += 1;
            state.entries.put(key.to_string(), value);
        }
    }

    /// Current epoch. Record it before reading durable storage.
    pub fn epoch(&self) -> u64 {
        self.state
            .as_ref()
            .map(|state| state.lock().expect("cache lock poisoned").epoch)
            .unwrap_or(0)
    }

    /// Fill `key` from a read, unless anything was written or invalidated
    /// since `observed_epoch`. Returns whether the value was cached.
    pub fn populate(&self, key: &str, value: CachedValue, observed_epoch: u64) -> bool {
        let Some(state) = &self.state else {
            return false;
        };
        let mut state = state.lock().expect("cache lock poisoned");
        if state.epoch != observed_epoch {
            return false;
        }
        state.entries.put(key.to_string(), value);
        true
    }

    /// Drop `key` from the cache.
    pub fn invalidate(&self, key: &str) {
        if let Some(state) = &self.state {
            let mut state = state.lock().expect("cache lock poisoned");
            state.epoch += 1;
            state.entries.pop(key);
        }
    }

    /// Drop everything.
    pub fn invalidate_all(&self) {
        if let Some(state) = &self.state {
            let mut state = state.lock().expect("cache lock poisoned");
            state.epoch += 1;
            state.entries.clear();
        }
    }

    /// Whether `key` is cached. Does not touch recency or stats.
    pub fn contains(&self, key: &str) -> bool {
        self.state
            .as_ref()
            .map(|state| state.lock().expect("cache lock poisoned").entries.contains(key))
            .unwrap_or(false)
    }

    /// Number of cached values.
    pub fn len(&self) -> usize {
        self.state
            .as_ref()
            .map(|state| state.lock().expect("cache lock poisoned").entries.len())
            .unwrap_or(0)
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hit/miss counters.
    pub fn stats(&self) -> CacheStats {
        self.state
            .as_ref()
            .map(|state| state.lock().expect("cache lock poisoned").stats)
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for ObjectCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectCache")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}
