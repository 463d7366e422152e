//! Interface descriptors and the signature types used by proxy dispatch.

use crate::types::TypeId;

/// A type as written in a method signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// No value.
    Void,
    /// A plain, non-generic type.
    Concrete(TypeId),
    /// A type variable declared by the method or by its interface.
    Var(Box<str>),
    /// A generic type applied to arguments, such as `List<T>`.
    Parameterized { raw: TypeId, args: Vec<TypeRef> },
}

impl TypeRef {
    #[must_use]
    pub fn var(name: &str) -> Self {
        Self::Var(name.into())
    }
}

impl From<TypeId> for TypeRef {
    fn from(ty: TypeId) -> Self {
        Self::Concrete(ty)
    }
}

/// A declared interface method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDesc {
    name: Box<str>,
    type_params: Vec<Box<str>>,
    params: Vec<TypeRef>,
    returns: TypeRef,
}

impl MethodDesc {
    #[must_use]
    pub fn new(name: &str, params: Vec<TypeRef>, returns: TypeRef) -> Self {
        Self {
            name: name.into(),
            type_params: Vec::new(),
            params,
            returns,
        }
    }

    /// Declares a method-level type variable, as in `<T> T echo(T value)`.
    #[must_use]
    pub fn type_param(mut self, name: &str) -> Self {
        self.type_params.push(name.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn params(&self) -> &[TypeRef] {
        &self.params
    }

    #[must_use]
    pub fn returns(&self) -> &TypeRef {
        &self.returns
    }

    pub(crate) fn declares(&self, var: &str) -> bool {
        self.type_params.iter().any(|param| &**param == var)
    }
}

/// Builder for an interface definition, see [`Runtime::define_interface`](crate::Runtime::define_interface).
#[derive(Debug, Clone)]
pub struct InterfaceDef {
    name: String,
    desc: InterfaceDesc,
}

impl InterfaceDef {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            desc: InterfaceDesc::default(),
        }
    }

    /// Declares an interface-level type variable.
    #[must_use]
    pub fn type_param(mut self, name: &str) -> Self {
        self.desc.type_params.push(name.into());
        self
    }

    #[must_use]
    pub fn extends(mut self, parent: TypeId) -> Self {
        self.desc.extends.push(parent);
        self
    }

    #[must_use]
    pub fn method(mut self, method: MethodDesc) -> Self {
        self.desc.methods.push(method);
        self
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn extends_list(&self) -> &[TypeId] {
        &self.desc.extends
    }

    pub(crate) fn methods(&self) -> &[MethodDesc] {
        &self.desc.methods
    }

    pub(crate) fn declares(&self, var: &str) -> bool {
        self.desc.declares(var)
    }

    pub(crate) fn into_desc(self) -> InterfaceDesc {
        self.desc
    }
}

/// Descriptor of a defined interface.
#[derive(Debug, Clone, Default)]
pub struct InterfaceDesc {
    type_params: Vec<Box<str>>,
    extends: Vec<TypeId>,
    methods: Vec<MethodDesc>,
}

impl InterfaceDesc {
    #[must_use]
    pub fn type_params(&self) -> &[Box<str>] {
        &self.type_params
    }

    #[must_use]
    pub fn extends(&self) -> &[TypeId] {
        &self.extends
    }

    #[must_use]
    pub fn methods(&self) -> &[MethodDesc] {
        &self.methods
    }

    /// Returns true when `var` is one of this interface's own type variables.
    #[must_use]
    pub fn declares(&self, var: &str) -> bool {
        self.type_params.iter().any(|param| &**param == var)
    }
}
