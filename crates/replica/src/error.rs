//! Error types.
//!
//! The two failures callers see at the engine boundary are [`InstantiationError`] and [`CopyError`]. Both
//! keep their cause chain (`std::error::Error::source`) so the innermost failure stays diagnosable. The
//! remaining types describe failures of the object model itself.

use thiserror::Error;

use crate::{
    heap::HeapId,
    types::{TypeId, Visibility},
};

/// A heap or type table access was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("heap id #{} does not belong to this runtime", .0.index())]
    Dangling(HeapId),
    #[error("type id {0} does not belong to this runtime")]
    UnknownType(TypeId),
    #[error("cannot {operation} on null")]
    NullReference { operation: &'static str },
    #[error("expected {expected}, found {found}")]
    WrongKind { expected: &'static str, found: String },
    #[error("`{type_name}` has no field `{field}`")]
    NoSuchField { type_name: String, field: String },
    #[error("`{type_name}` has no constant `{constant}`")]
    NoSuchConstant { type_name: String, constant: String },
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("cannot store a value of type `{found}` where `{expected}` is expected")]
    StoreMismatch { expected: String, found: String },
}

/// Why a single constructor invocation did not produce an instance.
///
/// Every variant except [`ConstructorFault::Initialization`] is attributable to that one constructor, so
/// the instantiation engine records it and moves on to the next candidate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructorFault {
    /// The constructor body raised an error.
    #[error("constructor threw: {0}")]
    Thrown(String),
    #[error("{visibility} constructor of `{type_name}` is not accessible")]
    IllegalAccess { type_name: String, visibility: Visibility },
    #[error("illegal argument: {0}")]
    IllegalArgument(String),
    #[error("cannot instantiate abstract class `{type_name}`")]
    Abstract { type_name: String },
    #[error(transparent)]
    Access(#[from] AccessError),
    /// The class's static initializer failed, now or on an earlier attempt.
    #[error("static initialization of `{type_name}` failed: {message}")]
    Initialization { type_name: String, message: String },
}

impl ConstructorFault {
    /// Convenience for constructor bodies: `return Err(ConstructorFault::thrown("bad input"))`.
    #[must_use]
    pub fn thrown(message: impl Into<String>) -> Self {
        Self::Thrown(message.into())
    }
}

/// No instance of a requested type could be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstantiationError {
    #[error("enumeration `{type_name}` declares no constants")]
    NoConstants { type_name: String },
    /// Every declared constructor was tried and failed (or none is declared).
    #[error("no constructor of `{type_name}` could be invoked ({} tried)", .attempts.len())]
    Exhausted {
        type_name: String,
        attempts: Vec<ConstructorFault>,
    },
    /// Static initialization failed. Never retried.
    #[error("static initialization of `{type_name}` failed: {message}")]
    Initialization { type_name: String, message: String },
    #[error("cannot resolve the return type of `{interface}.{method}`: {reason}")]
    UnresolvedReturn {
        interface: String,
        method: String,
        reason: String,
    },
    /// The class is already being built further up the same call.
    #[error("`{type_name}` is already being instantiated")]
    Recursive { type_name: String },
    #[error("instantiation depth limit of {limit} exceeded at `{type_name}`")]
    DepthExceeded { limit: usize, type_name: String },
    #[error(transparent)]
    Access(#[from] AccessError),
}

impl InstantiationError {
    /// Fatal failures abort the whole instantiation instead of falling back to the next constructor or
    /// to a `Null` argument.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Initialization { .. })
    }
}

/// A deep or shallow copy could not be completed.
#[derive(Debug, Error)]
pub enum CopyError {
    #[error("cannot create a copy target for `{type_name}`")]
    Target {
        type_name: String,
        #[source]
        source: InstantiationError,
    },
    #[error("failed to copy element {index} of `{array_type}`")]
    Element {
        array_type: String,
        index: usize,
        #[source]
        source: Box<CopyError>,
    },
    #[error("failed to copy field `{owner}.{field}`")]
    Field {
        owner: String,
        field: String,
        #[source]
        source: Box<CopyError>,
    },
    #[error("access refused while copying")]
    Access(#[from] AccessError),
    #[error("type cloner for `{type_name}` failed: {message}")]
    Cloner { type_name: String, message: String },
    #[error("copy depth limit of {limit} exceeded")]
    DepthExceeded { limit: usize },
}

impl CopyError {
    /// Walks `Element` and `Field` wrappers down to the failure that started the unwind.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::Element { source, .. } | Self::Field { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// A method call on a proxy failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvokeError {
    #[error("`{type_name}` is not a proxy")]
    NotAProxy { type_name: String },
    #[error("interface `{interface}` has no method `{method}`")]
    NoSuchMethod { interface: String, method: String },
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Failed(#[from] InstantiationError),
}

/// An immutable-type registration was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("a value of type `{value_type}` cannot represent `{type_name}`")]
    Incompatible { type_name: String, value_type: String },
    #[error(transparent)]
    Access(#[from] AccessError),
}

/// A type definition was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("type `{0}` is already defined")]
    DuplicateType(String),
    #[error("type id {0} does not belong to this runtime")]
    UnknownType(TypeId),
    #[error("`{name}` cannot extend `{superclass}`: not a class")]
    NotAClass { name: String, superclass: String },
    #[error("`{name}` cannot implement or extend `{interface}`: not an interface")]
    NotAnInterface { name: String, interface: String },
    #[error("class `{class}` declares field `{field}` twice")]
    DuplicateField { class: String, field: String },
    #[error("`{method}` uses undeclared type variable `{variable}`")]
    UndeclaredTypeVariable { method: String, variable: String },
    #[error("enumeration `{name}` declares constant `{constant}` twice")]
    DuplicateConstant { name: String, constant: String },
}
