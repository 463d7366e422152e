//! Class descriptors: fields, constructors and one-shot static initialization.

use std::{fmt, rc::Rc};

use strum::Display;

use crate::{
    error::ConstructorFault,
    heap::HeapId,
    runtime::Runtime,
    types::TypeId,
    value::{PrimitiveKind, Value},
};

/// Body of a constructor.
///
/// Runs against a freshly allocated instance (`this`) whose slots hold zero values and receives the
/// already type-checked arguments.
pub type ConstructorBody = dyn Fn(&mut Runtime, HeapId, &[Value]) -> Result<(), ConstructorFault>;

/// One-time class initializer. An `Err` poisons the class for the life of the runtime.
pub type StaticInit = dyn Fn(&mut Runtime, TypeId) -> Result<(), String>;

/// Declared accessibility of a constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Package,
    Private,
}

/// A declared constructor.
#[derive(Clone)]
pub struct Constructor {
    params: Vec<TypeId>,
    visibility: Visibility,
    body: Rc<ConstructorBody>,
}

impl Constructor {
    /// Creates a public constructor taking `params`.
    pub fn new(
        params: impl Into<Vec<TypeId>>,
        body: impl Fn(&mut Runtime, HeapId, &[Value]) -> Result<(), ConstructorFault> + 'static,
    ) -> Self {
        Self {
            params: params.into(),
            visibility: Visibility::Public,
            body: Rc::new(body),
        }
    }

    /// A public constructor with no parameters and an empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new(), |_, _, _| Ok(()))
    }

    #[must_use]
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    #[must_use]
    pub fn params(&self) -> &[TypeId] {
        &self.params
    }

    #[must_use]
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub(crate) fn body(&self) -> Rc<ConstructorBody> {
        Rc::clone(&self.body)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("params", &self.params)
            .field("visibility", &self.visibility)
            .finish_non_exhaustive()
    }
}

/// A declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDesc {
    name: Box<str>,
    ty: TypeId,
    is_static: bool,
}

impl FieldDesc {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn ty(&self) -> TypeId {
        self.ty
    }

    /// Class-level fields are shared state and never part of an instance graph.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.is_static
    }
}

/// Identity of a field: its declaring class plus its declaration index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldId {
    owner: TypeId,
    index: usize,
}

impl FieldId {
    pub(crate) fn new(owner: TypeId, index: usize) -> Self {
        Self { owner, index }
    }

    #[must_use]
    pub fn owner(self) -> TypeId {
        self.owner
    }

    #[must_use]
    pub fn index(self) -> usize {
        self.index
    }
}

/// Where a field's value lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSlot {
    /// Index into an instance's slot vector.
    Instance(usize),
    /// Index into the declaring class's static values.
    Static(usize),
}

/// Progress of a class's static initialization.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InitState {
    #[default]
    Pending,
    /// The initializer is on the stack; re-entrant construction is allowed.
    Running,
    Done,
    /// The initializer failed. The class can never be constructed again.
    Failed(String),
}

/// Builder for a class definition, see [`Runtime::define_class`].
#[derive(Clone)]
pub struct ClassDef {
    name: String,
    superclass: Option<TypeId>,
    interfaces: Vec<TypeId>,
    fields: Vec<FieldDesc>,
    constructors: Vec<Constructor>,
    is_abstract: bool,
    static_init: Option<Rc<StaticInit>>,
}

impl ClassDef {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            superclass: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            constructors: Vec::new(),
            is_abstract: false,
            static_init: None,
        }
    }

    /// Sets the superclass. Defaults to [`TypeId::OBJECT`].
    #[must_use]
    pub fn extends(mut self, superclass: TypeId) -> Self {
        self.superclass = Some(superclass);
        self
    }

    #[must_use]
    pub fn implements(mut self, interface: TypeId) -> Self {
        self.interfaces.push(interface);
        self
    }

    #[must_use]
    pub fn field(mut self, name: &str, ty: TypeId) -> Self {
        self.fields.push(FieldDesc {
            name: name.into(),
            ty,
            is_static: false,
        });
        self
    }

    #[must_use]
    pub fn static_field(mut self, name: &str, ty: TypeId) -> Self {
        self.fields.push(FieldDesc {
            name: name.into(),
            ty,
            is_static: true,
        });
        self
    }

    /// Declares a constructor. Declaration order is the order the instantiation engine tries them in.
    #[must_use]
    pub fn constructor(mut self, ctor: Constructor) -> Self {
        self.constructors.push(ctor);
        self
    }

    /// Shorthand for declaring [`Constructor::empty`].
    #[must_use]
    pub fn default_constructor(self) -> Self {
        self.constructor(Constructor::empty())
    }

    #[must_use]
    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    #[must_use]
    pub fn static_initializer(mut self, init: impl Fn(&mut Runtime, TypeId) -> Result<(), String> + 'static) -> Self {
        self.static_init = Some(Rc::new(init));
        self
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn superclass(&self) -> Option<TypeId> {
        self.superclass
    }

    pub(crate) fn interfaces(&self) -> &[TypeId] {
        &self.interfaces
    }

    pub(crate) fn fields(&self) -> &[FieldDesc] {
        &self.fields
    }

    pub(crate) fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }
}

impl fmt::Debug for ClassDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDef")
            .field("name", &self.name)
            .field("superclass", &self.superclass)
            .field("fields", &self.fields)
            .field("constructors", &self.constructors.len())
            .finish_non_exhaustive()
    }
}

/// Descriptor of a defined class.
#[derive(Clone)]
pub struct ClassDesc {
    superclass: Option<TypeId>,
    interfaces: Vec<TypeId>,
    fields: Vec<FieldDesc>,
    /// Parallel to `fields`.
    slots: Vec<FieldSlot>,
    /// Declared type of every instance slot, ancestors first.
    slot_layout: Vec<TypeId>,
    static_values: Vec<Value>,
    constructors: Vec<Constructor>,
    is_abstract: bool,
    static_init: Option<Rc<StaticInit>>,
    init_state: InitState,
}

impl ClassDesc {
    /// The root `object` class: no fields, one public no-arg constructor.
    pub(crate) fn root() -> Self {
        Self {
            superclass: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            slots: Vec::new(),
            slot_layout: Vec::new(),
            static_values: Vec::new(),
            constructors: vec![Constructor::empty()],
            is_abstract: false,
            static_init: None,
            init_state: InitState::Done,
        }
    }

    pub(crate) fn from_def(def: ClassDef, superclass: TypeId, mut slot_layout: Vec<TypeId>) -> Self {
        let mut slots = Vec::with_capacity(def.fields.len());
        let mut static_values = Vec::new();
        for field in &def.fields {
            if field.is_static {
                slots.push(FieldSlot::Static(static_values.len()));
                static_values.push(field.ty.as_primitive().map_or(Value::Null, PrimitiveKind::zero));
            } else {
                slots.push(FieldSlot::Instance(slot_layout.len()));
                slot_layout.push(field.ty);
            }
        }
        Self {
            superclass: Some(superclass),
            interfaces: def.interfaces,
            fields: def.fields,
            slots,
            slot_layout,
            static_values,
            constructors: def.constructors,
            is_abstract: def.is_abstract,
            init_state: if def.static_init.is_some() {
                InitState::Pending
            } else {
                InitState::Done
            },
            static_init: def.static_init,
        }
    }

    #[must_use]
    pub fn superclass(&self) -> Option<TypeId> {
        self.superclass
    }

    #[must_use]
    pub fn interfaces(&self) -> &[TypeId] {
        &self.interfaces
    }

    /// Fields declared by this class only, static ones included, in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDesc] {
        &self.fields
    }

    #[must_use]
    pub fn slot(&self, field_index: usize) -> Option<FieldSlot> {
        self.slots.get(field_index).copied()
    }

    /// Declared types of all instance slots, inherited ones first.
    #[must_use]
    pub fn slot_layout(&self) -> &[TypeId] {
        &self.slot_layout
    }

    /// Constructors in declaration order.
    #[must_use]
    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    #[must_use]
    pub fn init_state(&self) -> &InitState {
        &self.init_state
    }

    pub(crate) fn set_init_state(&mut self, state: InitState) {
        self.init_state = state;
    }

    pub(crate) fn static_init(&self) -> Option<Rc<StaticInit>> {
        self.static_init.clone()
    }

    pub(crate) fn static_values(&self) -> &[Value] {
        &self.static_values
    }

    pub(crate) fn static_values_mut(&mut self) -> &mut [Value] {
        &mut self.static_values
    }
}

impl fmt::Debug for ClassDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDesc")
            .field("superclass", &self.superclass)
            .field("interfaces", &self.interfaces)
            .field("fields", &self.fields)
            .field("constructors", &self.constructors)
            .field("is_abstract", &self.is_abstract)
            .field("init_state", &self.init_state)
            .finish_non_exhaustive()
    }
}
