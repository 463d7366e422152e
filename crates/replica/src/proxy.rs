//! Interface proxies.
//!
//! A proxy is a heap object that claims to implement an interface and forwards every method call to a
//! single [`InvocationHandler`]. The instantiation engine uses [`SynthesizingHandler`] so that a
//! synthesized interface instance answers each call with a synthesized value of the declared return type.

use std::{fmt, rc::Rc};

use crate::{
    builder::Builder,
    error::{InstantiationError, InvokeError},
    heap::HeapId,
    runtime::Runtime,
    types::{MethodDesc, TypeId, TypeRef},
    value::Value,
};

/// Receives every method call made on a proxy.
pub trait InvocationHandler {
    /// Handles a call of `method` on the proxy `proxy`, which implements `interface`.
    ///
    /// `method` may be declared by `interface` itself or by one of the interfaces it extends.
    fn invoke(
        &self,
        rt: &mut Runtime,
        proxy: HeapId,
        interface: TypeId,
        method: &MethodDesc,
        args: &[Value],
    ) -> Result<Value, InvokeError>;
}

/// Heap payload of a proxy object.
#[derive(Clone)]
pub struct Proxy {
    interface: TypeId,
    handler: Rc<dyn InvocationHandler>,
}

impl Proxy {
    pub(crate) fn new(interface: TypeId, handler: Rc<dyn InvocationHandler>) -> Self {
        Self { interface, handler }
    }

    /// Returns the implemented interface, which is also the proxy's runtime type.
    #[must_use]
    pub fn interface(&self) -> TypeId {
        self.interface
    }

    #[must_use]
    pub fn handler(&self) -> &Rc<dyn InvocationHandler> {
        &self.handler
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("interface", &self.interface)
            .finish_non_exhaustive()
    }
}

/// Answers every call with a synthesized instance of the method's return type.
///
/// The handler carries no business logic. Generic return types are resolved only by matching a type
/// variable against the runtime type of the first argument declared with that same variable.
#[derive(Debug, Clone)]
pub struct SynthesizingHandler {
    builder: Builder,
}

impl SynthesizingHandler {
    /// Creates a handler that synthesizes values with `builder`'s registry and limits.
    #[must_use]
    pub fn new(builder: Builder) -> Self {
        Self { builder }
    }

    fn resolve_var(
        rt: &Runtime,
        interface: TypeId,
        method: &MethodDesc,
        var: &str,
        args: &[Value],
    ) -> Result<TypeId, InstantiationError> {
        let unresolved = |reason: String| InstantiationError::UnresolvedReturn {
            interface: rt.types().name(interface).to_owned(),
            method: method.name().to_owned(),
            reason,
        };
        if method.params().len() != args.len() {
            return Err(unresolved(format!(
                "declared {} parameter(s) but received {} argument(s)",
                method.params().len(),
                args.len()
            )));
        }
        for (param, &arg) in method.params().iter().zip(args) {
            if !matches!(param, TypeRef::Var(name) if &**name == var) || arg.is_null() {
                continue;
            }
            if let Some(ty) = rt.type_of(arg)? {
                return Ok(ty);
            }
        }
        Err(unresolved(format!("no non-null argument is declared as `{var}`")))
    }
}

impl InvocationHandler for SynthesizingHandler {
    fn invoke(
        &self,
        rt: &mut Runtime,
        _proxy: HeapId,
        interface: TypeId,
        method: &MethodDesc,
        args: &[Value],
    ) -> Result<Value, InvokeError> {
        let target = match method.returns() {
            TypeRef::Void => return Ok(Value::Null),
            TypeRef::Concrete(ty) => *ty,
            TypeRef::Var(var) => Self::resolve_var(rt, interface, method, var, args)?,
            TypeRef::Parameterized { raw, .. } => {
                return Err(InstantiationError::UnresolvedReturn {
                    interface: rt.types().name(interface).to_owned(),
                    method: method.name().to_owned(),
                    reason: format!("parameterized return type `{}<..>`", rt.types().name(*raw)),
                }
                .into());
            }
        };
        tracing::trace!(method = method.name(), target = %rt.types().name(target), "synthesizing return value");
        Ok(self.builder.instantiate(rt, target)?)
    }
}
