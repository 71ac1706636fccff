use std::sync::Weak;

use crate::registry::{ListenerId, ListenerRegistry};

/// Keeps a registration alive; dropping it unsubscribes.
///
/// Holds only a weak reference, so an outstanding guard never keeps the
/// registry alive.
#[must_use = "dropping a Subscription unsubscribes its listener"]
#[derive(Debug)]
pub struct Subscription {
    registry: Option<Weak<ListenerRegistry>>,
    id: ListenerId,
}

impl Subscription {
    pub(crate) fn new(registry: Weak<ListenerRegistry>, id: ListenerId) -> Self {
        Self {
            registry: Some(registry),
            id,
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Keep the registration past the guard's lifetime.
    pub fn detach(mut self) -> ListenerId {
        self.registry = None;
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.take().and_then(|weak| weak.upgrade()) {
            registry.unsubscribe(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::listener::value_fn;
    use crate::registration::Registration;

    fn noop() -> Registration {
        Registration::new(value_fn(|_: &u8| {}))
    }

    #[test]
    fn drop_unsubscribes() {
        let registry = Arc::new(ListenerRegistry::new());
        let sub = registry.subscribe_scoped(noop());
        assert_eq!(registry.len(), 1);
        drop(sub);
        assert!(registry.is_empty());
    }

    #[test]
    fn detach_keeps_registration() {
        let registry = Arc::new(ListenerRegistry::new());
        let id = registry.subscribe_scoped(noop()).detach();
        assert_eq!(registry.len(), 1);
        assert!(registry.unsubscribe(id));
    }

    #[test]
    fn guard_outliving_registry_is_harmless() {
        let registry = Arc::new(ListenerRegistry::new());
        let sub = registry.subscribe_scoped(noop());
        drop(registry);
        drop(sub);
    }

    #[test]
    fn scoped_inside_block() {
        let registry = Arc::new(ListenerRegistry::new());
        {
            let _sub = registry.subscribe_scoped(noop());
            assert_eq!(registry.dispatch("k", &1u8), 1);
        }
        assert_eq!(registry.dispatch("k", &1u8), 0);
    }
}
