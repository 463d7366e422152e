//! The deep-copy engine.
//!
//! [`Cloner::copy`] duplicates every mutable object reachable from a value and shares everything else:
//! primitives, enumeration constants and instances of registered immutable types are returned as-is.
//! Each call owns a visited map from original [`HeapId`] to clone, so cycles terminate and an object
//! reachable along two paths is copied once. A clone is recorded in that map before its contents are
//! copied.
//!
//! Copy targets come from the [`Builder`]. When a freshly built target already holds an object in the
//! slot being filled, that object is reused as the target for the nested copy instead of building
//! another one. Only objects allocated during the current call qualify, so a constructor that stores a
//! pre-existing object never has that object overwritten.

use std::{fmt, rc::Rc};

use ahash::{AHashMap, AHashSet};

use crate::{
    builder::{Builder, check_default},
    error::{CopyError, RegistryError},
    heap::{Array, HeapData, HeapId},
    limits::Limits,
    runtime::Runtime,
    stack::ensure_sufficient_stack,
    types::{FieldId, TypeId},
    value::Value,
};

/// A user-supplied copy routine for one type.
///
/// Consulted after the immutable and visited checks, so it never sees a value that is already copied in
/// the running operation. It must [`CopyContext::remember`] its clone before copying anything that may
/// lead back to `original`.
pub trait TypeCloner {
    fn clone_object(&self, original: HeapId, ctx: &mut CopyContext<'_, '_>) -> Result<Value, CopyError>;
}

/// Deep-copies object graphs.
#[derive(Clone)]
pub struct Cloner {
    builder: Builder,
    cloners: AHashMap<TypeId, Rc<dyn TypeCloner>>,
}

impl fmt::Debug for Cloner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cloner")
            .field("builder", &self.builder)
            .field("cloners", &self.cloners.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Cloner {
    /// Creates a cloner with the built-in registry and default limits.
    #[must_use]
    pub fn new(rt: &Runtime) -> Self {
        Self::with_builder(Builder::new(rt))
    }

    /// Creates a cloner that synthesizes copy targets with `builder` and shares its registry.
    #[must_use]
    pub fn with_builder(builder: Builder) -> Self {
        Self {
            builder,
            cloners: AHashMap::new(),
        }
    }

    #[must_use]
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.builder.set_limits(limits);
        self
    }

    #[must_use]
    pub fn builder(&self) -> &Builder {
        &self.builder
    }

    pub fn builder_mut(&mut self) -> &mut Builder {
        &mut self.builder
    }

    /// Marks `ty` immutable. Returns true when it was not registered before.
    pub fn register(&mut self, ty: TypeId) -> bool {
        self.builder.registry_mut().mark(ty)
    }

    /// Marks `ty` immutable with `value` as its representative instance. Returns true when `ty` was not
    /// registered before.
    pub fn register_with_default(&mut self, rt: &Runtime, ty: TypeId, value: Value) -> Result<bool, RegistryError> {
        check_default(rt, ty, value)?;
        Ok(self.builder.registry_mut().mark_with(ty, value))
    }

    /// Removes `ty` from the immutable types, built-in ones included. Returns true when it was registered.
    ///
    /// Unregistering the text type makes copies duplicate text objects.
    pub fn unregister(&mut self, ty: TypeId) -> bool {
        self.builder.registry_mut().remove(ty)
    }

    /// Restores the built-in immutable types. Returns true when anything changed.
    ///
    /// Type cloners are left in place.
    pub fn reset(&mut self) -> bool {
        self.builder.registry_mut().reset()
    }

    #[must_use]
    pub fn is_immutable(&self, ty: TypeId) -> bool {
        self.builder.registry().contains(ty)
    }

    /// Installs a copy routine for `ty`, returning the one it replaces.
    pub fn register_cloner(&mut self, ty: TypeId, cloner: Rc<dyn TypeCloner>) -> Option<Rc<dyn TypeCloner>> {
        self.cloners.insert(ty, cloner)
    }

    pub fn unregister_cloner(&mut self, ty: TypeId) -> Option<Rc<dyn TypeCloner>> {
        self.cloners.remove(&ty)
    }

    /// Returns a deep copy of `original`.
    ///
    /// Either the whole graph is copied or an error is returned. Objects allocated before a failure stay
    /// on the heap but are never handed out.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn copy(&self, rt: &mut Runtime, original: Value) -> Result<Value, CopyError> {
        let mut session = CopySession::new(self, rt.heap().len());
        let result = session.copy_value(rt, original, Value::Null, 0);
        tracing::debug!(objects = session.visited.len(), ok = result.is_ok(), "copy finished");
        result
    }

    /// Returns a copy of `original` whose fields or elements refer to the same objects as the original's.
    pub fn shallow_copy(&self, rt: &mut Runtime, original: Value) -> Result<Value, CopyError> {
        let Some(id) = original.ref_id() else {
            return Ok(original);
        };
        let data = rt.heap().get(id)?;
        let ty = data.type_id();
        if self.is_leaf(rt, ty) {
            return Ok(original);
        }
        let data = match data {
            HeapData::Instance(instance) => {
                let class = instance.class();
                let target = self.target_instance(rt, class)?;
                for field in rt.instance_fields(class) {
                    let value = rt.field(original, field)?;
                    rt.set_field_by_id(target, field, value)?;
                }
                return Ok(target);
            }
            HeapData::Text(text) => HeapData::Text(text.clone()),
            HeapData::Array(array) => HeapData::Array(array.clone()),
            HeapData::Proxy(proxy) => HeapData::Proxy(proxy.clone()),
            HeapData::EnumConstant(_) => return Ok(original),
        };
        Ok(Value::Ref(rt.allocate(data)))
    }

    fn is_leaf(&self, rt: &Runtime, ty: TypeId) -> bool {
        rt.types().is_enum(ty) || self.is_immutable(ty)
    }

    fn target_instance(&self, rt: &mut Runtime, class: TypeId) -> Result<Value, CopyError> {
        self.builder
            .instantiate(rt, class)
            .map_err(|source| CopyError::Target {
                type_name: rt.types().name(class).to_owned(),
                source,
            })
    }
}

/// State of one top-level copy. Dropped when the copy returns, on every path.
struct CopySession<'c> {
    cloner: &'c Cloner,
    /// Original to clone.
    visited: AHashMap<HeapId, Value>,
    /// Every clone handed out so far, never reused as a target for another original.
    produced: AHashSet<HeapId>,
    /// Heap length when the copy started. Older objects are never reuse candidates.
    fresh_from: usize,
}

impl<'c> CopySession<'c> {
    fn new(cloner: &'c Cloner, fresh_from: usize) -> Self {
        Self {
            cloner,
            visited: AHashMap::new(),
            produced: AHashSet::new(),
            fresh_from,
        }
    }

    fn remember(&mut self, original: HeapId, clone: Value) {
        self.visited.insert(original, clone);
        if let Some(id) = clone.ref_id() {
            self.produced.insert(id);
        }
    }

    /// Returns `candidate` when it can serve as the clone of `original`.
    fn reusable(&self, original: HeapId, candidate: Value) -> Option<HeapId> {
        let id = candidate.ref_id()?;
        let fresh = id.index() >= self.fresh_from;
        (fresh && id != original && !self.visited.contains_key(&id) && !self.produced.contains(&id)).then_some(id)
    }

    fn copy_value(&mut self, rt: &mut Runtime, original: Value, candidate: Value, depth: usize) -> Result<Value, CopyError> {
        let Some(id) = original.ref_id() else {
            return Ok(original);
        };
        let ty = rt.heap().get(id)?.type_id();
        if self.cloner.is_leaf(rt, ty) {
            return Ok(original);
        }
        if let Some(&clone) = self.visited.get(&id) {
            return Ok(clone);
        }
        if let Some(limit) = self.cloner.builder.limits().copy_exceeded(depth) {
            return Err(CopyError::DepthExceeded { limit });
        }
        ensure_sufficient_stack(|| self.copy_object(rt, id, ty, candidate, depth))
    }

    fn copy_object(
        &mut self,
        rt: &mut Runtime,
        id: HeapId,
        ty: TypeId,
        candidate: Value,
        depth: usize,
    ) -> Result<Value, CopyError> {
        if let Some(custom) = self.cloner.cloners.get(&ty).cloned() {
            tracing::trace!(ty = %rt.types().name(ty), "type cloner");
            let mut ctx = CopyContext {
                session: &mut *self,
                rt: &mut *rt,
                depth,
            };
            let clone = custom.clone_object(id, &mut ctx)?;
            if !self.visited.contains_key(&id) {
                self.remember(id, clone);
            }
            return Ok(clone);
        }
        let data = match rt.heap().get(id)? {
            HeapData::Array(array) => {
                let array = array.clone();
                return self.copy_array(rt, id, array, candidate, depth);
            }
            HeapData::Instance(instance) => {
                let class = instance.class();
                return self.copy_instance(rt, id, class, candidate, depth);
            }
            HeapData::Text(text) => HeapData::Text(text.clone()),
            HeapData::Proxy(proxy) => HeapData::Proxy(proxy.clone()),
            HeapData::EnumConstant(_) => return Ok(Value::Ref(id)),
        };
        let clone = Value::Ref(rt.allocate(data));
        self.remember(id, clone);
        Ok(clone)
    }

    fn copy_array(
        &mut self,
        rt: &mut Runtime,
        id: HeapId,
        array: Array,
        candidate: Value,
        depth: usize,
    ) -> Result<Value, CopyError> {
        let reused = self.reusable(id, candidate).filter(|&cid| {
            matches!(rt.heap().get(cid), Ok(HeapData::Array(other))
                if other.array_type() == array.array_type() && other.len() == array.len())
        });
        let target = match reused {
            Some(cid) => Value::Ref(cid),
            None => self
                .cloner
                .builder
                .new_array(rt, array.component(), array.len())
                .map_err(|source| CopyError::Target {
                    type_name: rt.types().name(array.array_type()).to_owned(),
                    source,
                })?,
        };
        self.remember(id, target);

        let array_type = array.array_type();
        for (index, &item) in array.items().iter().enumerate() {
            let existing = rt.array_get(target, index)?;
            let copied = self
                .copy_value(rt, item, existing, depth + 1)
                .map_err(|err| element_error(rt, array_type, index, err))?;
            rt.array_set(target, index, copied)
                .map_err(|err| element_error(rt, array_type, index, err.into()))?;
        }
        Ok(target)
    }

    fn copy_instance(
        &mut self,
        rt: &mut Runtime,
        id: HeapId,
        class: TypeId,
        candidate: Value,
        depth: usize,
    ) -> Result<Value, CopyError> {
        let reused = self.reusable(id, candidate).filter(|&cid| {
            matches!(rt.heap().get(cid), Ok(HeapData::Instance(other))
                if rt.types().is_assignable(other.class(), class))
        });
        let target = match reused {
            Some(cid) => Value::Ref(cid),
            None => self.cloner.target_instance(rt, class)?,
        };
        self.remember(id, target);

        let original = Value::Ref(id);
        for field in rt.instance_fields(class) {
            let value = rt.field(original, field)?;
            let existing = rt.field(target, field)?;
            let copied = self
                .copy_value(rt, value, existing, depth + 1)
                .map_err(|err| field_error(rt, field, err))?;
            rt.set_field_by_id(target, field, copied)
                .map_err(|err| field_error(rt, field, err.into()))?;
        }
        Ok(target)
    }
}

fn element_error(rt: &Runtime, array_type: TypeId, index: usize, source: CopyError) -> CopyError {
    CopyError::Element {
        array_type: rt.types().name(array_type).to_owned(),
        index,
        source: Box::new(source),
    }
}

fn field_error(rt: &Runtime, field: FieldId, source: CopyError) -> CopyError {
    CopyError::Field {
        owner: rt.types().name(field.owner()).to_owned(),
        field: rt
            .types()
            .field(field)
            .map_or_else(|| format!("#{}", field.index()), |desc| desc.name().to_owned()),
        source: Box::new(source),
    }
}

/// Handle given to a [`TypeCloner`] for the duration of one call.
pub struct CopyContext<'s, 'c> {
    session: &'s mut CopySession<'c>,
    rt: &'s mut Runtime,
    depth: usize,
}

impl CopyContext<'_, '_> {
    pub fn runtime(&mut self) -> &mut Runtime {
        self.rt
    }

    /// Deep-copies `value` within the running copy, sharing its visited map.
    pub fn copy(&mut self, value: Value) -> Result<Value, CopyError> {
        self.session.copy_value(self.rt, value, Value::Null, self.depth + 1)
    }

    /// Records `clone` as the copy of `original`, so that references back to `original` resolve to it.
    pub fn remember(&mut self, original: HeapId, clone: Value) {
        self.session.remember(original, clone);
    }

    /// Synthesizes an instance of `ty` with the cloner's builder.
    pub fn instantiate(&mut self, ty: TypeId) -> Result<Value, CopyError> {
        self.session.cloner.target_instance(self.rt, ty)
    }

    /// Fails the running copy with a message attributed to the type of `original`.
    #[must_use]
    pub fn fail(&self, original: HeapId, message: impl Into<String>) -> CopyError {
        let type_name = match self.rt.heap().get(original) {
            Ok(data) => self.rt.types().name(data.type_id()).to_owned(),
            Err(err) => return err.into(),
        };
        CopyError::Cloner {
            type_name,
            message: message.into(),
        }
    }
}
