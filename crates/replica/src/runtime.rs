//! The runtime: a type table plus the heap it describes.
//!
//! Everything the engines know about a type or an object they learn through this module. Host code uses
//! the same API to define its types, build object graphs and inspect the results of an instantiation or a
//! copy.

use std::rc::Rc;

use smallvec::SmallVec;

use crate::{
    error::{AccessError, ConstructorFault, DefinitionError, InvokeError},
    heap::{Array, EnumConstant, Heap, HeapData, HeapId, Instance},
    proxy::{InvocationHandler, Proxy},
    types::{ClassDef, FieldDesc, FieldId, FieldSlot, InitState, InterfaceDef, TypeId, TypeTable, Visibility},
    value::Value,
};

/// Whether [`Runtime::construct`] honours constructor visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    /// Only public constructors may be invoked.
    #[default]
    Checked,
    /// Any constructor may be invoked regardless of its declared visibility.
    Override,
}

/// Owner of all types and objects.
#[derive(Debug)]
pub struct Runtime {
    types: TypeTable,
    heap: Heap,
    /// Shared empty text, the registered default for the text type.
    empty_text: HeapId,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// Creates a runtime holding only the built-in types.
    #[must_use]
    pub fn new() -> Self {
        let mut heap = Heap::new();
        let empty_text = heap.allocate(HeapData::Text(Box::from("")));
        Self {
            types: TypeTable::new(),
            heap,
            empty_text,
        }
    }

    #[must_use]
    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    #[must_use]
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub(crate) fn allocate(&mut self, data: HeapData) -> HeapId {
        self.heap.allocate(data)
    }

    // -- definitions --

    pub fn define_class(&mut self, def: ClassDef) -> Result<TypeId, DefinitionError> {
        self.types.define_class(def)
    }

    pub fn define_interface(&mut self, def: InterfaceDef) -> Result<TypeId, DefinitionError> {
        self.types.define_interface(def)
    }

    /// Defines an enumeration and allocates its constants, in declaration order.
    pub fn define_enum(&mut self, name: &str, constants: &[&str]) -> Result<TypeId, DefinitionError> {
        self.types.check_enum(name, constants)?;
        let ty = self.types.next_type_id();
        let ids = constants
            .iter()
            .enumerate()
            .map(|(ordinal, constant)| {
                self.heap
                    .allocate(HeapData::EnumConstant(EnumConstant::new(ty, ordinal, constant)))
            })
            .collect();
        let defined = self.types.define_enum(name, ids);
        debug_assert_eq!(defined, ty);
        Ok(defined)
    }

    /// Returns the array type of `component`, defining it on first use.
    pub fn array_type(&mut self, component: TypeId) -> Result<TypeId, AccessError> {
        self.types.array_type(component)
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.types.lookup(name)
    }

    // -- inspection --

    /// Returns the runtime type of `value`, or `None` for `Null`.
    pub fn type_of(&self, value: Value) -> Result<Option<TypeId>, AccessError> {
        Ok(match value {
            Value::Null => None,
            Value::Ref(id) => Some(self.heap.get(id)?.type_id()),
            other => other.primitive_kind().map(TypeId::of_primitive),
        })
    }

    /// Returns true when `value` may be stored where `ty` is expected.
    ///
    /// `Null` is an instance of every reference type and of no primitive type.
    #[must_use]
    pub fn is_instance(&self, value: Value, ty: TypeId) -> bool {
        match self.type_of(value) {
            Ok(None) => !self.types.is_primitive(ty),
            Ok(Some(actual)) => self.types.is_assignable(actual, ty),
            Err(_) => false,
        }
    }

    /// Name of the runtime type of `value`, `"null"` for `Null`.
    #[must_use]
    pub fn type_name_of(&self, value: Value) -> String {
        match self.type_of(value) {
            Ok(Some(ty)) => self.types.name(ty).to_owned(),
            Ok(None) => "null".to_owned(),
            Err(_) => "<dangling>".to_owned(),
        }
    }

    fn check_store(&self, expected: TypeId, value: Value) -> Result<(), AccessError> {
        if self.is_instance(value, expected) {
            Ok(())
        } else {
            Err(AccessError::StoreMismatch {
                expected: self.types.name(expected).to_owned(),
                found: self.type_name_of(value),
            })
        }
    }

    fn deref(&self, value: Value, operation: &'static str) -> Result<(HeapId, &HeapData), AccessError> {
        match value {
            Value::Ref(id) => Ok((id, self.heap.get(id)?)),
            Value::Null => Err(AccessError::NullReference { operation }),
            other => Err(AccessError::WrongKind {
                expected: "reference",
                found: self.type_name_of(other),
            }),
        }
    }

    // -- text --

    /// Returns the shared empty text.
    #[must_use]
    pub fn empty_text(&self) -> Value {
        Value::Ref(self.empty_text)
    }

    pub fn new_text(&mut self, text: &str) -> Value {
        Value::Ref(self.heap.allocate(HeapData::Text(text.into())))
    }

    pub fn text(&self, value: Value) -> Result<&str, AccessError> {
        match self.deref(value, "read text")? {
            (_, HeapData::Text(text)) => Ok(&**text),
            (_, other) => Err(AccessError::WrongKind {
                expected: "text",
                found: other.kind_name().to_owned(),
            }),
        }
    }

    // -- arrays --

    /// Allocates an array of `len` zero values.
    pub fn new_array(&mut self, component: TypeId, len: usize) -> Result<Value, AccessError> {
        let ty = self.types.array_type(component)?;
        let zero = self.types.zero_value(component);
        let array = Array::new(ty, component, vec![zero; len]);
        Ok(Value::Ref(self.heap.allocate(HeapData::Array(array))))
    }

    /// Allocates an array holding `items`, each of which must be storable as `component`.
    pub fn array_from(&mut self, component: TypeId, items: Vec<Value>) -> Result<Value, AccessError> {
        let ty = self.types.array_type(component)?;
        for &item in &items {
            self.check_store(component, item)?;
        }
        Ok(Value::Ref(self.heap.allocate(HeapData::Array(Array::new(ty, component, items)))))
    }

    pub fn array(&self, value: Value) -> Result<&Array, AccessError> {
        match self.deref(value, "index")? {
            (_, HeapData::Array(array)) => Ok(array),
            (_, other) => Err(AccessError::WrongKind {
                expected: "array",
                found: other.kind_name().to_owned(),
            }),
        }
    }

    pub fn array_len(&self, value: Value) -> Result<usize, AccessError> {
        Ok(self.array(value)?.len())
    }

    pub fn array_get(&self, value: Value, index: usize) -> Result<Value, AccessError> {
        let array = self.array(value)?;
        array.items().get(index).copied().ok_or(AccessError::IndexOutOfBounds {
            index,
            len: array.len(),
        })
    }

    /// Stores `item` at `index`. The store is checked against the array's component type.
    pub fn array_set(&mut self, value: Value, index: usize, item: Value) -> Result<(), AccessError> {
        let Some(id) = value.ref_id() else {
            return Err(AccessError::NullReference { operation: "index" });
        };
        let array = self.array(value)?;
        let (component, len) = (array.component(), array.len());
        if index >= len {
            return Err(AccessError::IndexOutOfBounds { index, len });
        }
        self.check_store(component, item)?;
        if let HeapData::Array(array) = self.heap.get_mut(id)? {
            array.items_mut()[index] = item;
        }
        Ok(())
    }

    // -- construction --

    /// Invokes constructor `index` of `class` on a fresh instance.
    ///
    /// The class and its superclasses are statically initialized first, root first. Arguments are checked
    /// against the declared parameter types before the body runs.
    pub fn construct(
        &mut self,
        class: TypeId,
        index: usize,
        args: &[Value],
        access: Access,
    ) -> Result<HeapId, ConstructorFault> {
        let type_name = self.types.name(class).to_owned();
        let Some(desc) = self.types.class(class) else {
            return Err(AccessError::WrongKind {
                expected: "class",
                found: type_name,
            }
            .into());
        };
        if desc.is_abstract() {
            return Err(ConstructorFault::Abstract { type_name });
        }
        self.ensure_initialized(class)?;

        let Some(desc) = self.types.class(class) else {
            return Err(AccessError::UnknownType(class).into());
        };
        let Some(ctor) = desc.constructors().get(index) else {
            return Err(ConstructorFault::IllegalArgument(format!(
                "`{type_name}` has no constructor #{index}"
            )));
        };
        if access == Access::Checked && ctor.visibility() != Visibility::Public {
            return Err(ConstructorFault::IllegalAccess {
                type_name,
                visibility: ctor.visibility(),
            });
        }
        if ctor.params().len() != args.len() {
            return Err(ConstructorFault::IllegalArgument(format!(
                "`{type_name}` constructor expects {} argument(s), got {}",
                ctor.params().len(),
                args.len()
            )));
        }
        for (position, (&param, &arg)) in ctor.params().iter().zip(args).enumerate() {
            if !self.is_instance(arg, param) {
                return Err(ConstructorFault::IllegalArgument(format!(
                    "argument {position} of `{type_name}` constructor: expected {}, got {}",
                    self.types.name(param),
                    self.type_name_of(arg)
                )));
            }
        }
        let body = ctor.body();
        let slots = desc.slot_layout().iter().map(|&ty| self.types.zero_value(ty)).collect();

        let id = self.heap.allocate(HeapData::Instance(Instance::new(class, slots)));
        body(self, id, args)?;
        Ok(id)
    }

    /// Runs pending static initializers of `class` and its superclasses, root first.
    ///
    /// A class whose initializer is already running counts as initialized, so an initializer may construct
    /// its own class.
    pub fn ensure_initialized(&mut self, class: TypeId) -> Result<(), ConstructorFault> {
        let chain: SmallVec<[TypeId; 8]> = self.types.chain(class).collect();
        for &ty in chain.iter().rev() {
            let Some(state) = self.types.class(ty).map(|desc| desc.init_state().clone()) else {
                continue;
            };
            match state {
                InitState::Done | InitState::Running => {}
                InitState::Failed(message) => {
                    return Err(ConstructorFault::Initialization {
                        type_name: self.types.name(ty).to_owned(),
                        message,
                    });
                }
                InitState::Pending => {
                    let init = self.types.class_mut(ty).and_then(|desc| {
                        desc.set_init_state(InitState::Running);
                        desc.static_init()
                    });
                    let outcome = init.map_or(Ok(()), |init| init(self, ty));
                    let state = match &outcome {
                        Ok(()) => InitState::Done,
                        Err(message) => InitState::Failed(message.clone()),
                    };
                    if let Some(desc) = self.types.class_mut(ty) {
                        desc.set_init_state(state);
                    }
                    if let Err(message) = outcome {
                        let type_name = self.types.name(ty).to_owned();
                        tracing::warn!(class = %type_name, %message, "static initialization failed");
                        return Err(ConstructorFault::Initialization { type_name, message });
                    }
                }
            }
        }
        Ok(())
    }

    /// Constructs `class` through its first public constructor that accepts `args`.
    pub fn new_object(&mut self, class: TypeId, args: &[Value]) -> Result<Value, ConstructorFault> {
        let type_name = self.types.name(class).to_owned();
        let Some(desc) = self.types.class(class) else {
            return Err(AccessError::WrongKind {
                expected: "class",
                found: type_name,
            }
            .into());
        };
        let index = desc.constructors().iter().position(|ctor| {
            ctor.visibility() == Visibility::Public
                && ctor.params().len() == args.len()
                && ctor.params().iter().zip(args).all(|(&param, &arg)| self.is_instance(arg, param))
        });
        let Some(index) = index else {
            return Err(ConstructorFault::IllegalArgument(format!(
                "no public constructor of `{type_name}` accepts {} argument(s) of the given types",
                args.len()
            )));
        };
        self.construct(class, index, args, Access::Checked).map(Value::Ref)
    }

    // -- fields --

    fn instance(&self, value: Value, operation: &'static str) -> Result<(HeapId, &Instance), AccessError> {
        match self.deref(value, operation)? {
            (id, HeapData::Instance(instance)) => Ok((id, instance)),
            (_, other) => Err(AccessError::WrongKind {
                expected: "instance",
                found: other.kind_name().to_owned(),
            }),
        }
    }

    /// Resolves a field by name on the runtime class of `object`; the most-derived declaration wins.
    pub fn resolve_field(&self, object: Value, name: &str) -> Result<FieldId, AccessError> {
        let (_, instance) = self.instance(object, "resolve a field")?;
        self.types
            .find_field(instance.class(), name)
            .ok_or_else(|| AccessError::NoSuchField {
                type_name: self.types.name(instance.class()).to_owned(),
                field: name.to_owned(),
            })
    }

    /// Instance fields of `class` and its superclasses, most-derived class first, in declaration order.
    #[must_use]
    pub fn instance_fields(&self, class: TypeId) -> Vec<FieldId> {
        self.types
            .chain(class)
            .flat_map(|owner| {
                let fields = self.types.class(owner).map_or(&[][..], |desc| desc.fields());
                fields
                    .iter()
                    .enumerate()
                    .filter(|(_, field)| !field.is_static())
                    .map(move |(index, _)| FieldId::new(owner, index))
            })
            .collect()
    }

    fn field_desc(&self, id: FieldId) -> Result<&FieldDesc, AccessError> {
        self.types.field(id).ok_or(AccessError::UnknownType(id.owner()))
    }

    fn check_owner(&self, class: TypeId, id: FieldId) -> Result<(), AccessError> {
        if self.types.chain(class).any(|ty| ty == id.owner()) {
            Ok(())
        } else {
            Err(AccessError::NoSuchField {
                type_name: self.types.name(class).to_owned(),
                field: self.field_desc(id)?.name().to_owned(),
            })
        }
    }

    pub fn get_field(&self, object: Value, name: &str) -> Result<Value, AccessError> {
        let id = self.resolve_field(object, name)?;
        self.field(object, id)
    }

    pub fn set_field(&mut self, object: Value, name: &str, value: Value) -> Result<(), AccessError> {
        let id = self.resolve_field(object, name)?;
        self.set_field_by_id(object, id, value)
    }

    /// Reads a field. Static fields read the declaring class's value.
    pub fn field(&self, object: Value, id: FieldId) -> Result<Value, AccessError> {
        let (_, instance) = self.instance(object, "read a field")?;
        self.check_owner(instance.class(), id)?;
        match self.types.field_slot(id) {
            Some(FieldSlot::Instance(slot)) => instance.slots().get(slot).copied().ok_or(AccessError::IndexOutOfBounds {
                index: slot,
                len: instance.slots().len(),
            }),
            Some(FieldSlot::Static(slot)) => self.static_value(id.owner(), slot),
            None => Err(AccessError::UnknownType(id.owner())),
        }
    }

    /// Writes a field. The store is checked against the field's declared type.
    pub fn set_field_by_id(&mut self, object: Value, id: FieldId, value: Value) -> Result<(), AccessError> {
        let (heap_id, class) = {
            let (heap_id, instance) = self.instance(object, "write a field")?;
            (heap_id, instance.class())
        };
        self.check_owner(class, id)?;
        self.check_store(self.field_desc(id)?.ty(), value)?;
        match self.types.field_slot(id) {
            Some(FieldSlot::Instance(slot)) => {
                if let HeapData::Instance(instance) = self.heap.get_mut(heap_id)? {
                    let len = instance.slots().len();
                    let target = instance
                        .slots_mut()
                        .get_mut(slot)
                        .ok_or(AccessError::IndexOutOfBounds { index: slot, len })?;
                    *target = value;
                }
                Ok(())
            }
            Some(FieldSlot::Static(slot)) => self.store_static(id.owner(), slot, value),
            None => Err(AccessError::UnknownType(id.owner())),
        }
    }

    fn static_field(&self, class: TypeId, name: &str) -> Result<(FieldId, usize), AccessError> {
        let no_such = || AccessError::NoSuchField {
            type_name: self.types.name(class).to_owned(),
            field: name.to_owned(),
        };
        let id = self.types.find_field(class, name).ok_or_else(no_such)?;
        match self.types.field_slot(id) {
            Some(FieldSlot::Static(slot)) => Ok((id, slot)),
            _ => Err(no_such()),
        }
    }

    fn static_value(&self, owner: TypeId, slot: usize) -> Result<Value, AccessError> {
        let desc = self.types.class(owner).ok_or(AccessError::UnknownType(owner))?;
        desc.static_values()
            .get(slot)
            .copied()
            .ok_or(AccessError::IndexOutOfBounds {
                index: slot,
                len: desc.static_values().len(),
            })
    }

    fn store_static(&mut self, owner: TypeId, slot: usize, value: Value) -> Result<(), AccessError> {
        let desc = self.types.class_mut(owner).ok_or(AccessError::UnknownType(owner))?;
        let values = desc.static_values_mut();
        let len = values.len();
        let target = values.get_mut(slot).ok_or(AccessError::IndexOutOfBounds { index: slot, len })?;
        *target = value;
        Ok(())
    }

    /// Reads a class-level field. Does not trigger static initialization.
    pub fn get_static(&self, class: TypeId, name: &str) -> Result<Value, AccessError> {
        let (id, slot) = self.static_field(class, name)?;
        self.static_value(id.owner(), slot)
    }

    pub fn set_static(&mut self, class: TypeId, name: &str, value: Value) -> Result<(), AccessError> {
        let (id, slot) = self.static_field(class, name)?;
        self.check_store(self.field_desc(id)?.ty(), value)?;
        self.store_static(id.owner(), slot, value)
    }

    // -- enumerations --

    /// Constants of an enumeration in declaration order.
    pub fn enum_constants(&self, ty: TypeId) -> Result<Vec<Value>, AccessError> {
        let desc = self.types.enumeration(ty).ok_or_else(|| AccessError::WrongKind {
            expected: "enumeration",
            found: self.types.name(ty).to_owned(),
        })?;
        Ok(desc.constants().iter().copied().map(Value::Ref).collect())
    }

    pub fn enum_constant(&self, ty: TypeId, name: &str) -> Result<Value, AccessError> {
        for constant in self.enum_constants(ty)? {
            if self.constant_name(constant)? == name {
                return Ok(constant);
            }
        }
        Err(AccessError::NoSuchConstant {
            type_name: self.types.name(ty).to_owned(),
            constant: name.to_owned(),
        })
    }

    /// Returns the declared name of an enumeration constant.
    pub fn constant_name(&self, value: Value) -> Result<&str, AccessError> {
        match self.deref(value, "read a constant")? {
            (_, HeapData::EnumConstant(constant)) => Ok(constant.name()),
            (_, other) => Err(AccessError::WrongKind {
                expected: "enum constant",
                found: other.kind_name().to_owned(),
            }),
        }
    }

    // -- proxies --

    /// Creates a proxy implementing `interface` whose every method call goes to `handler`.
    pub fn new_proxy(&mut self, interface: TypeId, handler: Rc<dyn InvocationHandler>) -> Result<Value, AccessError> {
        if !self.types.is_interface(interface) {
            return Err(AccessError::WrongKind {
                expected: "interface",
                found: self.types.name(interface).to_owned(),
            });
        }
        Ok(Value::Ref(self.heap.allocate(HeapData::Proxy(Proxy::new(interface, handler)))))
    }

    /// Calls `method` on a proxy.
    pub fn invoke(&mut self, target: Value, method: &str, args: &[Value]) -> Result<Value, InvokeError> {
        let (id, proxy) = match self.deref(target, "invoke a method")? {
            (id, HeapData::Proxy(proxy)) => (id, proxy.clone()),
            (_, other) => {
                return Err(InvokeError::NotAProxy {
                    type_name: self.types.name(other.type_id()).to_owned(),
                });
            }
        };
        let Some(desc) = self.types.find_method(proxy.interface(), method).cloned() else {
            return Err(InvokeError::NoSuchMethod {
                interface: self.types.name(proxy.interface()).to_owned(),
                method: method.to_owned(),
            });
        };
        tracing::trace!(interface = %self.types.name(proxy.interface()), method, "proxy dispatch");
        proxy.handler().invoke(self, id, proxy.interface(), &desc, args)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::types::Constructor;

    fn point(rt: &mut Runtime) -> TypeId {
        rt.define_class(
            ClassDef::new("Point")
                .field("x", TypeId::INT)
                .field("y", TypeId::INT)
                .constructor(Constructor::new([TypeId::INT, TypeId::INT], |rt, this, args| {
                    rt.set_field(Value::Ref(this), "x", args[0])?;
                    rt.set_field(Value::Ref(this), "y", args[1])?;
                    Ok(())
                })),
        )
        .unwrap()
    }

    #[test]
    fn new_object_runs_constructor() {
        let mut rt = Runtime::new();
        let point = point(&mut rt);
        let p = rt.new_object(point, &[Value::Int(3), Value::Int(4)]).unwrap();
        assert_eq!(rt.get_field(p, "x").unwrap(), Value::Int(3));
        assert_eq!(rt.get_field(p, "y").unwrap(), Value::Int(4));
        assert_eq!(rt.type_of(p).unwrap(), Some(point));
    }

    #[test]
    fn construct_checks_arguments() {
        let mut rt = Runtime::new();
        let point = point(&mut rt);
        let err = rt.construct(point, 0, &[Value::Int(1)], Access::Checked).unwrap_err();
        assert!(matches!(err, ConstructorFault::IllegalArgument(_)));
        let err = rt
            .construct(point, 0, &[Value::Null, Value::Int(1)], Access::Checked)
            .unwrap_err();
        assert!(matches!(err, ConstructorFault::IllegalArgument(_)));
    }

    #[test]
    fn private_constructor_requires_override() {
        let mut rt = Runtime::new();
        let hidden = rt
            .define_class(ClassDef::new("Hidden").constructor(Constructor::empty().with_visibility(Visibility::Private)))
            .unwrap();
        let err = rt.construct(hidden, 0, &[], Access::Checked).unwrap_err();
        assert!(matches!(
            err,
            ConstructorFault::IllegalAccess {
                visibility: Visibility::Private,
                ..
            }
        ));
        assert!(rt.construct(hidden, 0, &[], Access::Override).is_ok());
    }

    #[test]
    fn static_initializer_runs_once_and_poisons() {
        let mut rt = Runtime::new();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let broken = rt
            .define_class(ClassDef::new("Broken").default_constructor().static_initializer(move |_, _| {
                counter.set(counter.get() + 1);
                Err("boom".to_owned())
            }))
            .unwrap();
        for _ in 0..2 {
            let err = rt.construct(broken, 0, &[], Access::Override).unwrap_err();
            assert!(matches!(err, ConstructorFault::Initialization { ref message, .. } if message == "boom"));
        }
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn superclass_initializes_first() {
        let mut rt = Runtime::new();
        let base = rt
            .define_class(
                ClassDef::new("Base")
                    .static_field("order", TypeId::INT)
                    .default_constructor()
                    .static_initializer(|rt, ty| {
                        rt.set_static(ty, "order", Value::Int(1)).map_err(|err| err.to_string())
                    }),
            )
            .unwrap();
        let derived = rt
            .define_class(ClassDef::new("Derived").extends(base).default_constructor().static_initializer(
                move |rt, _| match rt.get_static(base, "order") {
                    Ok(Value::Int(1)) => Ok(()),
                    other => Err(format!("base not initialized: {other:?}")),
                },
            ))
            .unwrap();
        assert!(rt.construct(derived, 0, &[], Access::Checked).is_ok());
    }

    #[test]
    fn array_stores_are_type_checked() {
        let mut rt = Runtime::new();
        let ints = rt.new_array(TypeId::INT, 2).unwrap();
        assert_eq!(rt.array_get(ints, 1).unwrap(), Value::Int(0));
        rt.array_set(ints, 1, Value::Int(9)).unwrap();
        assert_eq!(rt.array_get(ints, 1).unwrap(), Value::Int(9));
        assert!(matches!(
            rt.array_set(ints, 0, Value::Long(1)),
            Err(AccessError::StoreMismatch { .. })
        ));
        assert!(matches!(
            rt.array_get(ints, 2),
            Err(AccessError::IndexOutOfBounds { index: 2, len: 2 })
        ));
    }

    #[test]
    fn enum_constants_are_preallocated() {
        let mut rt = Runtime::new();
        let color = rt.define_enum("Color", &["RED", "GREEN"]).unwrap();
        let constants = rt.enum_constants(color).unwrap();
        assert_eq!(constants.len(), 2);
        assert_eq!(rt.enum_constant(color, "GREEN").unwrap(), constants[1]);
        assert_eq!(rt.constant_name(constants[0]).unwrap(), "RED");
        assert!(rt.is_instance(constants[0], color));
        assert!(matches!(
            rt.define_enum("Dup", &["A", "A"]),
            Err(DefinitionError::DuplicateConstant { .. })
        ));
    }

    #[test]
    fn null_is_instance_of_references_only() {
        let rt = Runtime::new();
        assert!(rt.is_instance(Value::Null, TypeId::TEXT));
        assert!(rt.is_instance(Value::Null, TypeId::OBJECT));
        assert!(!rt.is_instance(Value::Null, TypeId::INT));
        assert!(rt.is_instance(rt.empty_text(), TypeId::OBJECT));
    }

    #[test]
    fn instance_fields_skip_statics() {
        let mut rt = Runtime::new();
        let base = rt
            .define_class(ClassDef::new("Base").field("a", TypeId::INT).static_field("s", TypeId::INT))
            .unwrap();
        let derived = rt
            .define_class(ClassDef::new("Derived").extends(base).field("b", TypeId::INT))
            .unwrap();
        let fields = rt.instance_fields(derived);
        let names: Vec<_> = fields
            .iter()
            .map(|&id| rt.types().field(id).unwrap().name().to_owned())
            .collect();
        assert_eq!(names, ["b", "a"]);
    }
}
