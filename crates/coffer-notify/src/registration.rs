use std::any::{type_name, Any};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::listener::DataChangeListener;
use crate::type_tag::TypeTag;

/// Which keys a registration listens to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum KeyFilter {
    /// Every key.
    #[default]
    Any,
    /// Exactly this key.
    Exact(String),
    /// Any key in the set.
    OneOf(BTreeSet<String>),
}

/// A listener plus the criterion deciding which writes reach it.
///
/// Built fluently; with no filter at all the listener sees every write:
///
/// ```ignore
/// Registration::new(keyed_fn(|key, user: &User| println!("{key}: {user:?}")))
///     .key("user")
///     .owned_by::<ProfileScreen>();
/// ```
pub struct Registration {
    key_filter: KeyFilter,
    type_filter: Option<TypeTag>,
    owner: Option<&'static str>,
    listener: Arc<dyn DataChangeListener>,
}

/// Which notification forms a matching registration receives.
pub(crate) struct Delivery {
    pub(crate) element: Option<TypeTag>,
}

impl Registration {
    /// Unfiltered registration for `listener`.
    pub fn new(listener: impl DataChangeListener + 'static) -> Self {
        Self::from_arc(Arc::new(listener))
    }

    /// Unfiltered registration for a shared listener.
    pub fn from_arc(listener: Arc<dyn DataChangeListener>) -> Self {
        Self {
            key_filter: KeyFilter::Any,
            type_filter: None,
            owner: None,
            listener,
        }
    }

    /// Only writes to `key`.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key_filter = KeyFilter::Exact(key.into());
        self
    }

    /// Only writes to keys equal to the string form of one of `keys`.
    pub fn keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: ToString,
    {
        self.key_filter = KeyFilter::OneOf(keys.into_iter().map(|k| k.to_string()).collect());
        self
    }

    /// Only values of type `T`.
    pub fn of_type<T: Any>(self) -> Self {
        self.type_tag(TypeTag::of::<T>())
    }

    /// Only `Vec<E>` values; unfiltered-key registrations also receive the
    /// element form for non-empty lists.
    pub fn of_list<E: Any>(self) -> Self {
        self.type_tag(TypeTag::list_of::<E>())
    }

    /// Only values of the tagged type.
    pub fn type_tag(mut self, tag: TypeTag) -> Self {
        self.type_filter = Some(tag);
        self
    }

    /// Record `O` as the owner, for bulk removal with
    /// [`ListenerRegistry::unsubscribe_owner`](crate::ListenerRegistry::unsubscribe_owner).
    pub fn owned_by<O: ?Sized>(mut self) -> Self {
        self.owner = Some(type_name::<O>());
        self
    }

    pub fn key_filter(&self) -> &KeyFilter {
        &self.key_filter
    }

    pub fn type_filter(&self) -> Option<&TypeTag> {
        self.type_filter.as_ref()
    }

    pub fn owner(&self) -> Option<&'static str> {
        self.owner
    }

    pub(crate) fn listener(&self) -> &Arc<dyn DataChangeListener> {
        &self.listener
    }

    /// Decide whether a write of `value` under `key` reaches this listener.
    pub(crate) fn delivery(&self, key: &str, value: &dyn Any) -> Option<Delivery> {
        if let Some(tag) = &self.type_filter {
            if !tag.matches(value) {
                return None;
            }
        }
        match &self.key_filter {
            KeyFilter::Exact(expected) => (expected == key).then_some(Delivery { element: None }),
            KeyFilter::OneOf(keys) => keys.contains(key).then_some(Delivery { element: None }),
            KeyFilter::Any => Some(Delivery {
                element: self.type_filter.and_then(|tag| tag.element_of(value)),
            }),
        }
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("key_filter", &self.key_filter)
            .field("type_filter", &self.type_filter)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}
