//! Reflective instantiation and deep copying over an explicit object model.
//!
//! A [`Runtime`] holds a table of type descriptors (classes, interfaces, enumerations, arrays and the
//! built-in primitive and text types) and a heap of objects. On top of it sit two engines:
//!
//! - [`Builder`] synthesizes a best-effort instance of any type by trying declared constructors with
//!   recursively synthesized arguments, and answers interface types with a synthesizing proxy.
//! - [`Cloner`] deep-copies object graphs, sharing immutable leaves and preserving cycles and shared
//!   references within one copy.
//!
//! ```
//! use replica::{ClassDef, Cloner, Constructor, Runtime, TypeId, Value};
//!
//! let mut rt = Runtime::new();
//! let node = rt
//!     .define_class(ClassDef::new("Node").field("label", TypeId::TEXT).default_constructor())
//!     .unwrap();
//! let pair = rt
//!     .define_class(ClassDef::new("Pair").field("left", node).field("right", node).constructor(Constructor::empty()))
//!     .unwrap();
//!
//! let shared = rt.new_object(node, &[]).unwrap();
//! let pair = rt.new_object(pair, &[]).unwrap();
//! rt.set_field(pair, "left", shared).unwrap();
//! rt.set_field(pair, "right", shared).unwrap();
//!
//! let cloner = Cloner::new(&rt);
//! let copy = cloner.copy(&mut rt, pair).unwrap();
//! let left = rt.get_field(copy, "left").unwrap();
//! assert_ne!(left, shared);
//! assert_eq!(left, rt.get_field(copy, "right").unwrap());
//! assert_eq!(cloner.copy(&mut rt, Value::Null).unwrap(), Value::Null);
//! ```

mod builder;
mod cloner;
mod error;
mod heap;
mod limits;
mod proxy;
mod registry;
mod runtime;
mod stack;
mod types;
mod value;

pub use crate::{
    builder::Builder,
    cloner::{Cloner, CopyContext, TypeCloner},
    error::{
        AccessError, ConstructorFault, CopyError, DefinitionError, InstantiationError, InvokeError, RegistryError,
    },
    heap::{Array, EnumConstant, Heap, HeapData, HeapId, Instance},
    limits::{DEFAULT_MAX_INSTANTIATION_DEPTH, Limits},
    proxy::{InvocationHandler, Proxy, SynthesizingHandler},
    registry::ImmutableRegistry,
    runtime::{Access, Runtime},
    types::{
        ClassDef, ClassDesc, Constructor, ConstructorBody, EnumDesc, FieldDesc, FieldId, FieldSlot, InitState,
        InterfaceDef, InterfaceDesc, MethodDesc, StaticInit, TypeDesc, TypeId, TypeKind, TypeRef, TypeTable,
        Visibility,
    },
    value::{PrimitiveKind, Value},
};
