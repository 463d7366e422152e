//! The instantiation engine.
//!
//! [`Builder::instantiate`] produces a best-effort instance of any type the runtime knows. Registered
//! immutable types yield their representative value, enumerations their first constant, arrays an empty
//! array, interfaces a [`SynthesizingHandler`] proxy. Classes are built by trying each declared
//! constructor in order with recursively synthesized arguments.
//!
//! Failures are tolerated at two levels. A parameter that cannot be synthesized is passed as `Null`, and a
//! constructor that fails is skipped in favour of the next one. The one exception is static
//! initialization: a class whose initializer failed can never be constructed, so that failure aborts the
//! whole call no matter how deep it surfaced.
//!
//! A class is never built inside its own construction. A parameter whose class is already being built
//! further up the same call is passed as `Null`, so `Tree(Tree, Tree)` costs one construction.

use std::rc::Rc;

use smallvec::SmallVec;

use crate::{
    error::{ConstructorFault, InstantiationError, RegistryError},
    heap::HeapId,
    limits::Limits,
    proxy::SynthesizingHandler,
    registry::ImmutableRegistry,
    runtime::{Access, Runtime},
    stack::ensure_sufficient_stack,
    types::{TypeId, TypeKind},
    value::Value,
};

/// Classes whose construction is in progress within one top-level call.
type InProgress = SmallVec<[TypeId; 8]>;

/// What [`Builder`] needs to know about a type, detached from the type table borrow.
enum Plan {
    Zero(Value),
    Text,
    Enum(Option<HeapId>),
    Array(TypeId),
    Interface,
    Class(usize),
}

/// Synthesizes instances of arbitrary runtime types.
///
/// Cloning a builder is cheap. Clones share the registry until one of them registers something, at which
/// point that clone gets its own copy. Proxies created by [`Builder::instantiate`] keep the registry as it
/// was when they were created.
#[derive(Debug, Clone)]
pub struct Builder {
    registry: Rc<ImmutableRegistry>,
    limits: Limits,
}

impl Builder {
    /// Creates a builder with the built-in registry and default limits.
    #[must_use]
    pub fn new(rt: &Runtime) -> Self {
        Self {
            registry: Rc::new(ImmutableRegistry::builtin(rt)),
            limits: Limits::default(),
        }
    }

    /// Replaces the recursion limits.
    #[must_use]
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Returns the recursion limits.
    #[must_use]
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub(crate) fn set_limits(&mut self, limits: Limits) {
        self.limits = limits;
    }

    /// Returns the immutable-type registry consulted before any other rule.
    #[must_use]
    pub fn registry(&self) -> &ImmutableRegistry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut ImmutableRegistry {
        Rc::make_mut(&mut self.registry)
    }

    /// Registers `value` as the representative instance of `ty`, returning the previous one.
    ///
    /// `value` must be an instance of `ty`.
    pub fn add_default(&mut self, rt: &Runtime, ty: TypeId, value: Value) -> Result<Option<Value>, RegistryError> {
        check_default(rt, ty, value)?;
        Ok(self.registry_mut().insert_default(ty, value))
    }

    #[must_use]
    pub fn get_default(&self, ty: TypeId) -> Option<Value> {
        self.registry.default_for(ty)
    }

    /// Allocates a zero-filled array of `len` elements.
    pub fn new_array(&self, rt: &mut Runtime, component: TypeId, len: usize) -> Result<Value, InstantiationError> {
        Ok(rt.new_array(component, len)?)
    }

    /// Synthesizes an instance of `ty`. `None` yields `Null`.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn instantiate(&self, rt: &mut Runtime, ty: impl Into<Option<TypeId>>) -> Result<Value, InstantiationError> {
        match ty.into() {
            Some(ty) => self.instantiate_at(rt, ty, 0, &mut InProgress::new()),
            None => Ok(Value::Null),
        }
    }

    fn instantiate_at(
        &self,
        rt: &mut Runtime,
        ty: TypeId,
        depth: usize,
        building: &mut InProgress,
    ) -> Result<Value, InstantiationError> {
        if let Some(value) = self.registry.default_for(ty) {
            return Ok(value);
        }
        if let Some(limit) = self.limits.instantiation_exceeded(depth) {
            return Err(InstantiationError::DepthExceeded {
                limit,
                type_name: rt.types().name(ty).to_owned(),
            });
        }
        let plan = match rt.types().get(ty)?.kind() {
            TypeKind::Primitive(kind) => Plan::Zero(kind.zero()),
            TypeKind::Text => Plan::Text,
            TypeKind::Enum(desc) => Plan::Enum(desc.constants().first().copied()),
            TypeKind::Array { component } => Plan::Array(*component),
            TypeKind::Interface(_) => Plan::Interface,
            TypeKind::Class(desc) => Plan::Class(desc.constructors().len()),
        };
        match plan {
            Plan::Zero(value) => Ok(value),
            Plan::Text => Ok(rt.new_text("")),
            Plan::Enum(Some(first)) => Ok(Value::Ref(first)),
            Plan::Enum(None) => Err(InstantiationError::NoConstants {
                type_name: rt.types().name(ty).to_owned(),
            }),
            Plan::Array(component) => self.new_array(rt, component, 0),
            Plan::Interface => {
                let handler = Rc::new(SynthesizingHandler::new(self.clone()));
                Ok(rt.new_proxy(ty, handler)?)
            }
            Plan::Class(_) if building.contains(&ty) => Err(InstantiationError::Recursive {
                type_name: rt.types().name(ty).to_owned(),
            }),
            Plan::Class(count) => {
                building.push(ty);
                let result = ensure_sufficient_stack(|| self.instantiate_class(rt, ty, count, depth, building));
                building.pop();
                result
            }
        }
    }

    fn instantiate_class(
        &self,
        rt: &mut Runtime,
        class: TypeId,
        count: usize,
        depth: usize,
        building: &mut InProgress,
    ) -> Result<Value, InstantiationError> {
        let mut attempts = Vec::new();
        for index in 0..count {
            let params: SmallVec<[TypeId; 4]> = rt
                .types()
                .class(class)
                .and_then(|desc| desc.constructors().get(index))
                .map(|ctor| ctor.params().iter().copied().collect())
                .unwrap_or_default();
            let mut args: SmallVec<[Value; 4]> = SmallVec::with_capacity(params.len());
            for &param in &params {
                match self.instantiate_at(rt, param, depth + 1, building) {
                    Ok(value) => args.push(value),
                    Err(err) if err.is_fatal() => return Err(err),
                    Err(err) => {
                        tracing::trace!(param = %rt.types().name(param), error = %err, "substituting null argument");
                        args.push(Value::Null);
                    }
                }
            }
            match rt.construct(class, index, &args, Access::Override) {
                Ok(id) => return Ok(Value::Ref(id)),
                Err(ConstructorFault::Initialization { type_name, message }) => {
                    return Err(InstantiationError::Initialization { type_name, message });
                }
                Err(fault) => {
                    tracing::debug!(class = %rt.types().name(class), index, error = %fault, "constructor failed");
                    attempts.push(fault);
                }
            }
        }
        Err(InstantiationError::Exhausted {
            type_name: rt.types().name(class).to_owned(),
            attempts,
        })
    }
}

/// Rejects a representative value that is not an instance of the type it represents.
pub(crate) fn check_default(rt: &Runtime, ty: TypeId, value: Value) -> Result<(), RegistryError> {
    rt.types().get(ty)?;
    if rt.is_instance(value, ty) {
        Ok(())
    } else {
        Err(RegistryError::Incompatible {
            type_name: rt.types().name(ty).to_owned(),
            value_type: rt.type_name_of(value),
        })
    }
}
