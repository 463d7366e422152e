//! The immutable-type registry.
//!
//! A registered type is treated as a leaf by both engines. Copies share its values, and instantiation
//! returns its representative value when one is present.

use indexmap::IndexMap;
use strum::IntoEnumIterator;

use crate::{
    runtime::Runtime,
    types::TypeId,
    value::{PrimitiveKind, Value},
};

/// Mapping from immutable type to an optional representative value.
#[derive(Debug, Clone, PartialEq)]
pub struct ImmutableRegistry {
    entries: IndexMap<TypeId, Option<Value>>,
    /// Snapshot restored by [`ImmutableRegistry::reset`].
    builtin: IndexMap<TypeId, Option<Value>>,
}

impl ImmutableRegistry {
    /// The built-in registry: every primitive kind mapped to its zero value, and text mapped to the
    /// runtime's shared empty text.
    #[must_use]
    pub fn builtin(rt: &Runtime) -> Self {
        let mut builtin: IndexMap<TypeId, Option<Value>> = PrimitiveKind::iter()
            .map(|kind| (TypeId::of_primitive(kind), Some(kind.zero())))
            .collect();
        builtin.insert(TypeId::TEXT, Some(rt.empty_text()));
        Self {
            entries: builtin.clone(),
            builtin,
        }
    }

    #[must_use]
    pub fn contains(&self, ty: TypeId) -> bool {
        self.entries.contains_key(&ty)
    }

    /// Returns the representative value of `ty`, if it is registered with one.
    #[must_use]
    pub fn default_for(&self, ty: TypeId) -> Option<Value> {
        self.entries.get(&ty).copied().flatten()
    }

    /// Inserts or replaces the value of `ty`, returning the previous value.
    pub fn insert_default(&mut self, ty: TypeId, value: Value) -> Option<Value> {
        self.entries.insert(ty, Some(value)).flatten()
    }

    /// Registers `ty` without a value. Returns true when `ty` was not registered before.
    ///
    /// An existing value is kept.
    pub fn mark(&mut self, ty: TypeId) -> bool {
        if self.entries.contains_key(&ty) {
            return false;
        }
        self.entries.insert(ty, None);
        true
    }

    /// Registers `ty` with `value`, replacing any previous value. Returns true when `ty` was not
    /// registered before.
    pub fn mark_with(&mut self, ty: TypeId, value: Value) -> bool {
        self.entries.insert(ty, Some(value)).is_none()
    }

    /// Unregisters `ty`. Returns true when it was registered.
    pub fn remove(&mut self, ty: TypeId) -> bool {
        self.entries.shift_remove(&ty).is_some()
    }

    /// Restores the built-in contents. Returns true when the registry changed.
    pub fn reset(&mut self) -> bool {
        if self.entries == self.builtin {
            return false;
        }
        self.entries.clone_from(&self.builtin);
        true
    }

    /// Registered types in registration order.
    pub fn types(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.entries.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
