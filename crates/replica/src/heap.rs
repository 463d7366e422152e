//! Arena storage for every object reachable from a [`Value::Ref`].
//!
//! Objects are addressed by [`HeapId`], the slot index inside the arena. Ids are handed out by
//! [`Heap::allocate`] only and are never reused, so an id is a stable identity token for the whole life of
//! the heap. That is the property the deep-copy engine depends on when it memoizes originals.

use crate::{error::AccessError, proxy::Proxy, types::TypeId, value::Value};

/// Unique identifier for objects stored inside the heap arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeapId(usize);

impl HeapId {
    /// Returns the raw index value.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// An instance of a class type.
///
/// `slots` holds one value per instance field of the class and all of its superclasses, laid out
/// root-first. The slot of a given field is resolved through [`ClassDesc`](crate::types::ClassDesc).
#[derive(Debug, Clone)]
pub struct Instance {
    class: TypeId,
    slots: Vec<Value>,
}

impl Instance {
    pub(crate) fn new(class: TypeId, slots: Vec<Value>) -> Self {
        Self { class, slots }
    }

    /// Returns the class this object was constructed as.
    #[must_use]
    pub fn class(&self) -> TypeId {
        self.class
    }

    /// Returns the raw slot storage.
    #[must_use]
    pub fn slots(&self) -> &[Value] {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Value] {
        &mut self.slots
    }
}

/// A fixed-length array.
#[derive(Debug, Clone)]
pub struct Array {
    /// The array type itself (`component[]`).
    ty: TypeId,
    component: TypeId,
    items: Vec<Value>,
}

impl Array {
    pub(crate) fn new(ty: TypeId, component: TypeId, items: Vec<Value>) -> Self {
        Self { ty, component, items }
    }

    /// Returns the array type id.
    #[must_use]
    pub fn array_type(&self) -> TypeId {
        self.ty
    }

    /// Returns the declared component type.
    #[must_use]
    pub fn component(&self) -> TypeId {
        self.component
    }

    /// Returns the elements.
    #[must_use]
    pub fn items(&self) -> &[Value] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn items_mut(&mut self) -> &mut [Value] {
        &mut self.items
    }
}

/// A constant of an enumeration type.
///
/// Constants are allocated exactly once, when the enumeration is defined.
#[derive(Debug, Clone)]
pub struct EnumConstant {
    ty: TypeId,
    ordinal: usize,
    name: Box<str>,
}

impl EnumConstant {
    pub(crate) fn new(ty: TypeId, ordinal: usize, name: &str) -> Self {
        Self {
            ty,
            ordinal,
            name: name.into(),
        }
    }

    #[must_use]
    pub fn enum_type(&self) -> TypeId {
        self.ty
    }

    #[must_use]
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Payload of a heap slot.
#[derive(Debug, Clone)]
pub enum HeapData {
    /// Immutable text.
    Text(Box<str>),
    Instance(Instance),
    Array(Array),
    EnumConstant(EnumConstant),
    Proxy(Proxy),
}

impl HeapData {
    /// Returns the runtime type of the object.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        match self {
            Self::Text(_) => TypeId::TEXT,
            Self::Instance(inst) => inst.class(),
            Self::Array(array) => array.array_type(),
            Self::EnumConstant(constant) => constant.enum_type(),
            Self::Proxy(proxy) => proxy.interface(),
        }
    }

    /// Returns a short variant name, used in diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Instance(_) => "instance",
            Self::Array(_) => "array",
            Self::EnumConstant(_) => "enum constant",
            Self::Proxy(_) => "proxy",
        }
    }
}

/// Append-only arena that backs every heap object.
#[derive(Debug, Default)]
pub struct Heap {
    entries: Vec<HeapData>,
}

impl Heap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `data` and returns its id.
    pub fn allocate(&mut self, data: HeapData) -> HeapId {
        let id = HeapId(self.entries.len());
        self.entries.push(data);
        id
    }

    /// Returns the object stored at `id`.
    pub fn get(&self, id: HeapId) -> Result<&HeapData, AccessError> {
        self.entries.get(id.index()).ok_or(AccessError::Dangling(id))
    }

    /// Returns the object stored at `id` mutably.
    pub fn get_mut(&mut self, id: HeapId) -> Result<&mut HeapData, AccessError> {
        self.entries.get_mut(id.index()).ok_or(AccessError::Dangling(id))
    }

    /// Number of objects allocated so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
