//! Type descriptors.
//!
//! Every runtime type is described once, when it is defined, and stored in the [`TypeTable`]. The engines
//! only ever query the table: which constructors a class declares, which fields it and its superclasses
//! declare, whether a type is an enumeration, an array or an interface, and whether one type is
//! assignable to another.

mod class;
mod interface;

use std::{fmt, iter};

use ahash::AHashMap;
use strum::IntoEnumIterator;

pub use self::{
    class::{
        ClassDef, ClassDesc, Constructor, ConstructorBody, FieldDesc, FieldId, FieldSlot, InitState, StaticInit,
        Visibility,
    },
    interface::{InterfaceDef, InterfaceDesc, MethodDesc, TypeRef},
};
use crate::{
    error::{AccessError, DefinitionError},
    heap::HeapId,
    value::{PrimitiveKind, Value},
};

/// Identifier of a type inside a [`TypeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    pub const BOOLEAN: Self = Self(0);
    pub const BYTE: Self = Self(1);
    pub const SHORT: Self = Self(2);
    pub const CHAR: Self = Self(3);
    pub const INT: Self = Self(4);
    pub const LONG: Self = Self(5);
    pub const FLOAT: Self = Self(6);
    pub const DOUBLE: Self = Self(7);
    /// The immutable text type.
    pub const TEXT: Self = Self(8);
    /// Root of every class hierarchy.
    pub const OBJECT: Self = Self(9);

    /// Returns the built-in type id for a primitive kind.
    #[must_use]
    pub fn of_primitive(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::Boolean => Self::BOOLEAN,
            PrimitiveKind::Byte => Self::BYTE,
            PrimitiveKind::Short => Self::SHORT,
            PrimitiveKind::Char => Self::CHAR,
            PrimitiveKind::Int => Self::INT,
            PrimitiveKind::Long => Self::LONG,
            PrimitiveKind::Float => Self::FLOAT,
            PrimitiveKind::Double => Self::DOUBLE,
        }
    }

    /// Returns the primitive kind when this is one of the eight built-in primitive ids.
    #[must_use]
    pub fn as_primitive(self) -> Option<PrimitiveKind> {
        Some(match self {
            Self::BOOLEAN => PrimitiveKind::Boolean,
            Self::BYTE => PrimitiveKind::Byte,
            Self::SHORT => PrimitiveKind::Short,
            Self::CHAR => PrimitiveKind::Char,
            Self::INT => PrimitiveKind::Int,
            Self::LONG => PrimitiveKind::Long,
            Self::FLOAT => PrimitiveKind::Float,
            Self::DOUBLE => PrimitiveKind::Double,
            _ => return None,
        })
    }

    /// Returns the raw index value.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A defined enumeration.
#[derive(Debug, Clone)]
pub struct EnumDesc {
    constants: Vec<HeapId>,
}

impl EnumDesc {
    /// Constants in declaration order.
    #[must_use]
    pub fn constants(&self) -> &[HeapId] {
        &self.constants
    }
}

/// Classification of a type.
#[derive(Debug, Clone)]
pub enum TypeKind {
    Primitive(PrimitiveKind),
    Text,
    Class(ClassDesc),
    Enum(EnumDesc),
    Array { component: TypeId },
    Interface(InterfaceDesc),
}

/// Descriptor of a single type.
#[derive(Debug, Clone)]
pub struct TypeDesc {
    name: Box<str>,
    kind: TypeKind,
}

impl TypeDesc {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }
}

/// Registry of all type descriptors known to a runtime.
#[derive(Debug, Clone)]
pub struct TypeTable {
    types: Vec<TypeDesc>,
    by_name: AHashMap<Box<str>, TypeId>,
    /// Interned array types keyed by component type.
    arrays: AHashMap<TypeId, TypeId>,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTable {
    /// Creates a table holding only the built-in types.
    #[must_use]
    pub fn new() -> Self {
        let mut table = Self {
            types: Vec::new(),
            by_name: AHashMap::new(),
            arrays: AHashMap::new(),
        };
        for kind in PrimitiveKind::iter() {
            let name: &'static str = kind.into();
            let id = table.push(name, TypeKind::Primitive(kind));
            debug_assert_eq!(id, TypeId::of_primitive(kind));
        }
        table.push("text", TypeKind::Text);
        table.push("object", TypeKind::Class(ClassDesc::root()));
        debug_assert_eq!(table.lookup("object"), Some(TypeId::OBJECT));
        table
    }

    fn push(&mut self, name: &str, kind: TypeKind) -> TypeId {
        let id = TypeId(u32::try_from(self.types.len()).unwrap_or(u32::MAX));
        self.types.push(TypeDesc { name: name.into(), kind });
        self.by_name.insert(name.into(), id);
        id
    }

    /// Returns the id the next defined type will receive.
    #[must_use]
    pub fn next_type_id(&self) -> TypeId {
        TypeId(u32::try_from(self.types.len()).unwrap_or(u32::MAX))
    }

    fn ensure_free(&self, name: &str) -> Result<(), DefinitionError> {
        if self.by_name.contains_key(name) {
            return Err(DefinitionError::DuplicateType(name.to_owned()));
        }
        Ok(())
    }

    fn ensure_known(&self, ty: TypeId) -> Result<(), DefinitionError> {
        if ty.index() < self.types.len() {
            Ok(())
        } else {
            Err(DefinitionError::UnknownType(ty))
        }
    }

    /// Number of defined types, built-ins included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Returns the descriptor for `ty`.
    pub fn get(&self, ty: TypeId) -> Result<&TypeDesc, AccessError> {
        self.types.get(ty.index()).ok_or(AccessError::UnknownType(ty))
    }

    /// Returns the name of `ty`, or `"<unknown>"` for an id this table never issued.
    #[must_use]
    pub fn name(&self, ty: TypeId) -> &str {
        self.types.get(ty.index()).map_or("<unknown>", TypeDesc::name)
    }

    /// Looks a type up by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    #[must_use]
    pub fn primitive(&self, ty: TypeId) -> Option<PrimitiveKind> {
        ty.as_primitive()
    }

    #[must_use]
    pub fn is_primitive(&self, ty: TypeId) -> bool {
        self.primitive(ty).is_some()
    }

    #[must_use]
    pub fn class(&self, ty: TypeId) -> Option<&ClassDesc> {
        match &self.get(ty).ok()?.kind {
            TypeKind::Class(desc) => Some(desc),
            _ => None,
        }
    }

    pub(crate) fn class_mut(&mut self, ty: TypeId) -> Option<&mut ClassDesc> {
        match &mut self.types.get_mut(ty.index())?.kind {
            TypeKind::Class(desc) => Some(desc),
            _ => None,
        }
    }

    #[must_use]
    pub fn interface(&self, ty: TypeId) -> Option<&InterfaceDesc> {
        match &self.get(ty).ok()?.kind {
            TypeKind::Interface(desc) => Some(desc),
            _ => None,
        }
    }

    #[must_use]
    pub fn enumeration(&self, ty: TypeId) -> Option<&EnumDesc> {
        match &self.get(ty).ok()?.kind {
            TypeKind::Enum(desc) => Some(desc),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_enum(&self, ty: TypeId) -> bool {
        self.enumeration(ty).is_some()
    }

    #[must_use]
    pub fn is_interface(&self, ty: TypeId) -> bool {
        self.interface(ty).is_some()
    }

    /// Returns the component type when `ty` is an array type.
    #[must_use]
    pub fn array_component(&self, ty: TypeId) -> Option<TypeId> {
        match self.get(ty).ok()?.kind {
            TypeKind::Array { component } => Some(component),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_array(&self, ty: TypeId) -> bool {
        self.array_component(ty).is_some()
    }

    /// Returns the array type whose component is `component`, defining it on first use.
    pub fn array_type(&mut self, component: TypeId) -> Result<TypeId, AccessError> {
        if let Some(&ty) = self.arrays.get(&component) {
            return Ok(ty);
        }
        let name = format!("{}[]", self.get(component)?.name());
        let ty = self.push(&name, TypeKind::Array { component });
        self.arrays.insert(component, ty);
        Ok(ty)
    }

    /// Returns the direct superclass of a class type.
    #[must_use]
    pub fn superclass(&self, ty: TypeId) -> Option<TypeId> {
        self.class(ty)?.superclass()
    }

    /// Iterates `ty` followed by each of its superclasses up to [`TypeId::OBJECT`].
    pub fn chain(&self, ty: TypeId) -> impl Iterator<Item = TypeId> + '_ {
        iter::successors(Some(ty), move |&current| self.superclass(current))
    }

    /// Zero value for a slot of type `ty`: the primitive zero, or `Null` for reference types.
    #[must_use]
    pub fn zero_value(&self, ty: TypeId) -> Value {
        self.primitive(ty).map_or(Value::Null, PrimitiveKind::zero)
    }

    /// Returns true when a value whose runtime type is `from` may be stored where `to` is expected.
    #[must_use]
    pub fn is_assignable(&self, from: TypeId, to: TypeId) -> bool {
        if from == to {
            return true;
        }
        let Ok(desc) = self.get(from) else {
            return false;
        };
        match &desc.kind {
            TypeKind::Primitive(_) => false,
            _ if to == TypeId::OBJECT => true,
            TypeKind::Class(_) => self.chain(from).any(|ancestor| {
                ancestor == to
                    || self
                        .class(ancestor)
                        .is_some_and(|class| class.interfaces().iter().any(|&iface| self.extends_interface(iface, to)))
            }),
            TypeKind::Interface(_) => self.extends_interface(from, to),
            TypeKind::Array { component } => {
                let Some(target) = self.array_component(to) else {
                    return false;
                };
                *component == target
                    || (!self.is_primitive(*component)
                        && !self.is_primitive(target)
                        && self.is_assignable(*component, target))
            }
            TypeKind::Text | TypeKind::Enum(_) => false,
        }
    }

    fn extends_interface(&self, iface: TypeId, target: TypeId) -> bool {
        iface == target
            || self
                .interface(iface)
                .is_some_and(|desc| desc.extends().iter().any(|&parent| self.extends_interface(parent, target)))
    }

    /// Finds the field named `name`, searching from `class` towards the root.
    ///
    /// The most-derived declaration wins when a subclass shadows a superclass field.
    #[must_use]
    pub fn find_field(&self, class: TypeId, name: &str) -> Option<FieldId> {
        self.chain(class).find_map(|owner| {
            let desc = self.class(owner)?;
            let index = desc.fields().iter().position(|field| field.name() == name)?;
            Some(FieldId::new(owner, index))
        })
    }

    /// Returns the descriptor of a field.
    #[must_use]
    pub fn field(&self, id: FieldId) -> Option<&FieldDesc> {
        self.class(id.owner())?.fields().get(id.index())
    }

    /// Returns the storage location of a field.
    #[must_use]
    pub fn field_slot(&self, id: FieldId) -> Option<FieldSlot> {
        self.class(id.owner())?.slot(id.index())
    }

    /// Finds a method by name on an interface or any interface it extends.
    #[must_use]
    pub fn find_method(&self, iface: TypeId, name: &str) -> Option<&MethodDesc> {
        let desc = self.interface(iface)?;
        desc.methods()
            .iter()
            .find(|method| method.name() == name)
            .or_else(|| desc.extends().iter().find_map(|&parent| self.find_method(parent, name)))
    }

    /// Validates and registers a class.
    pub fn define_class(&mut self, def: ClassDef) -> Result<TypeId, DefinitionError> {
        self.ensure_free(def.name())?;
        let superclass = def.superclass().unwrap_or(TypeId::OBJECT);
        let Some(parent) = self.class(superclass) else {
            return Err(DefinitionError::NotAClass {
                name: def.name().to_owned(),
                superclass: self.name(superclass).to_owned(),
            });
        };
        let base_layout = parent.slot_layout().to_vec();
        for &iface in def.interfaces() {
            if !self.is_interface(iface) {
                return Err(DefinitionError::NotAnInterface {
                    name: def.name().to_owned(),
                    interface: self.name(iface).to_owned(),
                });
            }
        }
        // Fields and constructor parameters may refer to the class being defined.
        let own_id = self.next_type_id();
        let ensure_known = |ty: TypeId| if ty == own_id { Ok(()) } else { self.ensure_known(ty) };
        for (index, field) in def.fields().iter().enumerate() {
            ensure_known(field.ty())?;
            if def.fields()[..index].iter().any(|other| other.name() == field.name()) {
                return Err(DefinitionError::DuplicateField {
                    class: def.name().to_owned(),
                    field: field.name().to_owned(),
                });
            }
        }
        for ctor in def.constructors() {
            for &param in ctor.params() {
                ensure_known(param)?;
            }
        }
        let name = def.name().to_owned();
        let desc = ClassDesc::from_def(def, superclass, base_layout);
        Ok(self.push(&name, TypeKind::Class(desc)))
    }

    /// Validates and registers an interface.
    pub fn define_interface(&mut self, def: InterfaceDef) -> Result<TypeId, DefinitionError> {
        self.ensure_free(def.name())?;
        for &parent in def.extends_list() {
            if !self.is_interface(parent) {
                return Err(DefinitionError::NotAnInterface {
                    name: def.name().to_owned(),
                    interface: self.name(parent).to_owned(),
                });
            }
        }
        for method in def.methods() {
            for ty_ref in method.params().iter().chain(iter::once(method.returns())) {
                self.validate_type_ref(&def, method, ty_ref)?;
            }
        }
        let name = def.name().to_owned();
        Ok(self.push(&name, TypeKind::Interface(def.into_desc())))
    }

    fn validate_type_ref(
        &self,
        def: &InterfaceDef,
        method: &MethodDesc,
        ty_ref: &TypeRef,
    ) -> Result<(), DefinitionError> {
        match ty_ref {
            TypeRef::Void => Ok(()),
            TypeRef::Concrete(ty) => self.ensure_known(*ty),
            TypeRef::Var(var) => {
                if method.declares(var) || def.declares(var) {
                    Ok(())
                } else {
                    Err(DefinitionError::UndeclaredTypeVariable {
                        method: format!("{}.{}", def.name(), method.name()),
                        variable: var.to_string(),
                    })
                }
            }
            TypeRef::Parameterized { raw, args } => {
                self.ensure_known(*raw)?;
                args.iter().try_for_each(|arg| self.validate_type_ref(def, method, arg))
            }
        }
    }

    /// Registers an enumeration whose constants were already allocated for [`Self::next_type_id`].
    pub(crate) fn define_enum(&mut self, name: &str, constants: Vec<HeapId>) -> TypeId {
        self.push(name, TypeKind::Enum(EnumDesc { constants }))
    }

    /// Checks that `name` is not taken and that `constants` has no duplicates.
    pub(crate) fn check_enum(&self, name: &str, constants: &[&str]) -> Result<(), DefinitionError> {
        self.ensure_free(name)?;
        for (index, constant) in constants.iter().enumerate() {
            if constants[..index].contains(constant) {
                return Err(DefinitionError::DuplicateConstant {
                    name: name.to_owned(),
                    constant: (*constant).to_owned(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with_shapes() -> (TypeTable, TypeId, TypeId, TypeId) {
        let mut table = TypeTable::new();
        let shape = table
            .define_interface(
                InterfaceDef::new("Shape").method(MethodDesc::new("area", vec![], TypeRef::Concrete(TypeId::DOUBLE))),
            )
            .unwrap();
        let base = table
            .define_class(ClassDef::new("Base").implements(shape).field("id", TypeId::INT))
            .unwrap();
        let derived = table
            .define_class(ClassDef::new("Derived").extends(base).field("name", TypeId::TEXT))
            .unwrap();
        (table, shape, base, derived)
    }

    #[test]
    fn builtins_have_fixed_ids() {
        let table = TypeTable::new();
        assert_eq!(table.lookup("int"), Some(TypeId::INT));
        assert_eq!(table.lookup("char"), Some(TypeId::CHAR));
        assert_eq!(table.lookup("text"), Some(TypeId::TEXT));
        assert_eq!(table.primitive(TypeId::DOUBLE), Some(PrimitiveKind::Double));
        assert!(table.class(TypeId::OBJECT).is_some());
    }

    #[test]
    fn class_assignability_follows_superclasses_and_interfaces() {
        let (table, shape, base, derived) = table_with_shapes();
        assert!(table.is_assignable(derived, base));
        assert!(table.is_assignable(derived, shape));
        assert!(table.is_assignable(derived, TypeId::OBJECT));
        assert!(!table.is_assignable(base, derived));
        assert!(!table.is_assignable(TypeId::INT, TypeId::OBJECT));
        assert_eq!(table.chain(derived).collect::<Vec<_>>(), vec![derived, base, TypeId::OBJECT]);
    }

    #[test]
    fn arrays_are_interned_and_covariant_for_references() {
        let (mut table, _, base, derived) = table_with_shapes();
        let bases = table.array_type(base).unwrap();
        let deriveds = table.array_type(derived).unwrap();
        assert_eq!(table.array_type(base).unwrap(), bases);
        assert_eq!(table.name(deriveds), "Derived[]");
        assert!(table.is_assignable(deriveds, bases));
        assert!(!table.is_assignable(bases, deriveds));

        let ints = table.array_type(TypeId::INT).unwrap();
        let longs = table.array_type(TypeId::LONG).unwrap();
        assert!(!table.is_assignable(ints, longs));
        assert!(table.is_assignable(ints, TypeId::OBJECT));
    }

    #[test]
    fn fields_resolve_most_derived_first() {
        let mut table = TypeTable::new();
        let base = table.define_class(ClassDef::new("A").field("x", TypeId::INT)).unwrap();
        let derived = table
            .define_class(ClassDef::new("B").extends(base).field("x", TypeId::LONG).static_field("count", TypeId::INT))
            .unwrap();

        let shadowing = table.find_field(derived, "x").unwrap();
        assert_eq!(shadowing.owner(), derived);
        assert_eq!(table.field(shadowing).unwrap().ty(), TypeId::LONG);
        assert_eq!(table.field_slot(shadowing), Some(FieldSlot::Instance(1)));
        assert_eq!(table.field_slot(table.find_field(base, "x").unwrap()), Some(FieldSlot::Instance(0)));
        assert_eq!(table.field_slot(table.find_field(derived, "count").unwrap()), Some(FieldSlot::Static(0)));
    }

    #[test]
    fn definitions_are_validated() {
        let (mut table, shape, base, _) = table_with_shapes();
        assert!(matches!(
            table.define_class(ClassDef::new("Base")),
            Err(DefinitionError::DuplicateType(name)) if name == "Base"
        ));
        assert!(matches!(
            table.define_class(ClassDef::new("C").extends(shape)),
            Err(DefinitionError::NotAClass { .. })
        ));
        assert!(matches!(
            table.define_class(ClassDef::new("D").implements(base)),
            Err(DefinitionError::NotAnInterface { .. })
        ));
        assert!(matches!(
            table.define_class(ClassDef::new("E").field("a", TypeId::INT).field("a", TypeId::INT)),
            Err(DefinitionError::DuplicateField { .. })
        ));
        assert!(matches!(
            table.define_interface(InterfaceDef::new("F").method(MethodDesc::new("get", vec![], TypeRef::var("T")))),
            Err(DefinitionError::UndeclaredTypeVariable { .. })
        ));
    }
}
