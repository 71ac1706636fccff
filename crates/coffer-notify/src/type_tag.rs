use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Element shape of a list type: how to name the element type and how to
/// measure a value of the list type.
#[derive(Clone, Copy)]
struct ListShape {
    element: fn() -> TypeTag,
    len: fn(&dyn Any) -> Option<usize>,
}

/// Runtime tag for a concrete value type.
///
/// Two tags are equal when they denote the same type. Tags built with
/// [`TypeTag::list_of`] additionally know their element type, which lets the
/// router report it for non-empty lists.
#[derive(Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
    list: Option<ListShape>,
}

impl TypeTag {
    /// Tag for `T`.
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            list: None,
        }
    }

    /// Tag for `Vec<E>` that also knows its element type.
    pub fn list_of<E: Any>() -> Self {
        Self {
            id: TypeId::of::<Vec<E>>(),
            name: type_name::<Vec<E>>(),
            list: Some(ListShape {
                element: TypeTag::of::<E>,
                len: list_len::<E>,
            }),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Full type name, as reported by [`std::any::type_name`].
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether this tag was built with [`TypeTag::list_of`].
    pub fn is_list(&self) -> bool {
        self.list.is_some()
    }

    /// Element tag of a list tag.
    pub fn element(&self) -> Option<TypeTag> {
        self.list.map(|shape| (shape.element)())
    }

    /// Whether `value` is of exactly this type.
    pub fn matches(&self, value: &dyn Any) -> bool {
        value.type_id() == self.id
    }

    /// Element tag, if this is a list tag and `value` is a non-empty list of
    /// this type.
    pub(crate) fn element_of(&self, value: &dyn Any) -> Option<TypeTag> {
        let shape = self.list?;
        let len = (shape.len)(value)?;
        (len > 0).then(|| (shape.element)())
    }
}

fn list_len<E: Any>(value: &dyn Any) -> Option<usize> {
    value.downcast_ref::<Vec<E>>().map(Vec::len)
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeTag").field(&self.name).finish()
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
