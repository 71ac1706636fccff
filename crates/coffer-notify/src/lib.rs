//! Change notification routing for Coffer.
//!
//! Listeners register with a match criterion -- an exact key, a set of
//! keys, a value type, or nothing at all -- and the [`ListenerRegistry`]
//! delivers every successful write to the registrations it matches, in
//! registration order.

pub mod listener;
pub mod registration;
pub mod registry;
pub mod subscription;
pub mod type_tag;

pub use listener::{keyed_fn, value_fn, DataChangeListener, KeyedFn, ValueFn};
pub use registration::{KeyFilter, Registration};
pub use registry::{ListenerId, ListenerRegistry};
pub use subscription::Subscription;
pub use type_tag::TypeTag;
