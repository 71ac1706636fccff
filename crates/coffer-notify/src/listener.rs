use std::any::Any;
use std::marker::PhantomData;

use crate::type_tag::TypeTag;

/// Receives change notifications.
///
/// A matching write is delivered in up to three forms, each a separate
/// method so a listener implements only the ones it cares about. Every
/// method defaults to a no-op.
pub trait DataChangeListener: Send + Sync {
    /// The value that was written.
    fn on_change(&self, _value: &dyn Any) {}

    /// The key and the value that was written.
    fn on_keyed_change(&self, _key: &str, _value: &dyn Any) {}

    /// The element type and the list that was written. Only delivered to
    /// unfiltered-key registrations whose type filter is a list type, and
    /// only for non-empty lists.
    fn on_element_change(&self, _element: &TypeTag, _value: &dyn Any) {}
}

/// Listener calling a closure with the key and the value downcast to `T`.
///
/// Values of other types are ignored.
pub struct KeyedFn<T, F> {
    f: F,
    _marker: PhantomData<fn(&T)>,
}

impl<T, F> DataChangeListener for KeyedFn<T, F>
where
    T: Any,
    F: Fn(&str, &T) + Send + Sync,
{
    fn on_keyed_change(&self, key: &str, value: &dyn Any) {
        if let Some(value) = value.downcast_ref::<T>() {
            (self.f)(key, value);
        }
    }
}

/// Build a [`KeyedFn`].
pub fn keyed_fn<T, F>(f: F) -> KeyedFn<T, F>
where
    T: Any,
    F: Fn(&str, &T) + Send + Sync,
{
    KeyedFn {
        f,
        _marker: PhantomData,
    }
}

/// Listener calling a closure with the value downcast to `T`.
pub struct ValueFn<T, F> {
    f: F,
    _marker: PhantomData<fn(&T)>,
}

impl<T, F> DataChangeListener for ValueFn<T, F>
where
    T: Any,
    F: Fn(&T) + Send + Sync,
{
    fn on_change(&self, value: &dyn Any) {
        if let Some(value) = value.downcast_ref::<T>() {
            (self.f)(value);
        }
    }
}

/// Build a [`ValueFn`].
pub fn value_fn<T, F>(f: F) -> ValueFn<T, F>
where
    T: Any,
    F: Fn(&T) + Send + Sync,
{
    ValueFn {
        f,
        _marker: PhantomData,
    }
}
