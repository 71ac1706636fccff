use std::any::{type_name, Any};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{debug, trace};

use crate::listener::DataChangeListener;
use crate::registration::{Delivery, Registration};
use crate::subscription::Subscription;

/// Opaque token identifying one registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

struct Entry {
    id: ListenerId,
    registration: Registration,
}

/// Fan-out router that delivers writes to matching listeners.
///
/// Registrations are evaluated in registration order. [`dispatch`] takes a
/// snapshot of the matching listeners under the read lock and invokes them
/// after releasing it, so a listener may subscribe or unsubscribe (itself
/// included) from inside a callback. A listener removed while a dispatch is
/// in flight may still receive that one dispatch.
///
/// [`dispatch`]: ListenerRegistry::dispatch
pub struct ListenerRegistry {
    next_id: AtomicU64,
    entries: RwLock<Vec<Entry>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Register a listener. It stays registered until unsubscribed.
    pub fn subscribe(&self, registration: Registration) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        debug!(%id, ?registration, "listener subscribed");
        self.entries
            .write()
            .expect("registry lock poisoned")
            .push(Entry { id, registration });
        id
    }

    /// Register a listener for as long as the returned guard lives.
    pub fn subscribe_scoped(self: &Arc<Self>, registration: Registration) -> Subscription {
        let id = self.subscribe(registration);
        Subscription::new(Arc::downgrade(self), id)
    }

    /// Remove exactly the registration `id`. Returns whether it was present.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.write().expect("registry lock poisoned");
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        let removed = entries.len() != before;
        if removed {
            debug!(%id, "listener unsubscribed");
        }
        removed
    }

    /// Remove every registration owned by `O` (see
    /// [`Registration::owned_by`]). Returns how many were removed.
    ///
    /// Named with a turbofish like `owned_by`, so inside a method the owner
    /// is `unsubscribe_owner::<Self>()`.
    pub fn unsubscribe_owner<O: ?Sized>(&self) -> usize {
        self.unsubscribe_owner_named(type_name::<O>())
    }

    /// Remove every registration whose owner name is `owner`.
    pub fn unsubscribe_owner_named(&self, owner: &str) -> usize {
        let mut entries = self.entries.write().expect("registry lock poisoned");
        let before = entries.len();
        entries.retain(|entry| entry.registration.owner() != Some(owner));
        let removed = before - entries.len();
        debug!(owner, removed, "owner listeners unsubscribed");
        removed
    }

    /// Notify every registration matching a write of `value` under `key`.
    /// Returns the number of listeners notified.
    pub fn dispatch(&self, key: &str, value: &dyn Any) -> usize {
        let targets: Vec<(Arc<dyn DataChangeListener>, Delivery)> = {
            let entries = self.entries.read().expect("registry lock poisoned");
            entries
                .iter()
                .filter_map(|entry| {
                    entry
                        .registration
                        .delivery(key, value)
                        .map(|delivery| (Arc::clone(entry.registration.listener()), delivery))
                })
                .collect()
        };

        for (listener, delivery) in &targets {
            listener.on_keyed_change(key, value);
            listener.on_change(value);
            if let Some(element) = &delivery.element {
                listener.on_element_change(element, value);
            }
        }

        trace!(key, notified = targets.len(), "change dispatched");
        targets.len()
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.entries.read().expect("registry lock poisoned").len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listener_count", &self.len())
            .finish()
    }
}
