//! Tests for the immutable-type registry as seen through `Builder` and `Cloner`.
use pretty_assertions::assert_eq;
use replica::{Builder, ClassDef, Cloner, RegistryError, Runtime, TypeId, Value};

fn token_class(rt: &mut Runtime) -> TypeId {
    rt.define_class(ClassDef::new("Token").field("id", TypeId::INT).default_constructor())
        .unwrap()
}

#[test]
fn builtin_types_are_immutable() {
    let rt = Runtime::new();
    let cloner = Cloner::new(&rt);
    for ty in [
        TypeId::BOOLEAN,
        TypeId::BYTE,
        TypeId::SHORT,
        TypeId::CHAR,
        TypeId::INT,
        TypeId::LONG,
        TypeId::FLOAT,
        TypeId::DOUBLE,
        TypeId::TEXT,
    ] {
        assert!(cloner.is_immutable(ty), "{ty} should be immutable");
    }
    assert!(!cloner.is_immutable(TypeId::OBJECT));
    assert_eq!(cloner.builder().registry().len(), 9);
}

#[test]
fn add_default_replaces_previous_value() {
    let mut rt = Runtime::new();
    let mut builder = Builder::new(&rt);
    assert_eq!(builder.get_default(TypeId::INT), Some(Value::Int(0)));
    assert_eq!(
        builder.add_default(&rt, TypeId::INT, Value::Int(42)).unwrap(),
        Some(Value::Int(0))
    );
    assert_eq!(builder.instantiate(&mut rt, TypeId::INT).unwrap(), Value::Int(42));
}

#[test]
fn incompatible_default_is_rejected() {
    let mut rt = Runtime::new();
    let mut builder = Builder::new(&rt);
    let token = token_class(&mut rt);
    let text = rt.new_text("not a token");

    let err = builder.add_default(&rt, token, text).unwrap_err();
    assert!(matches!(
        err,
        RegistryError::Incompatible { ref type_name, ref value_type } if type_name == "Token" && value_type == "text"
    ));
    assert!(builder.add_default(&rt, TypeId::INT, Value::Long(1)).is_err());
    assert_eq!(builder.get_default(token), None);

    // null stands in for any reference type
    assert_eq!(builder.add_default(&rt, token, Value::Null).unwrap(), None);
    assert_eq!(builder.instantiate(&mut rt, token).unwrap(), Value::Null);
}

#[test]
fn registering_twice_reports_only_the_first_time() {
    let mut rt = Runtime::new();
    let mut cloner = Cloner::new(&rt);
    let token = token_class(&mut rt);
    assert!(cloner.register(token));
    assert!(!cloner.register(token));
    assert!(!cloner.register(TypeId::TEXT));
}

#[test]
fn register_with_default_feeds_instantiation() {
    let mut rt = Runtime::new();
    let mut cloner = Cloner::new(&rt);
    let token = token_class(&mut rt);
    let shared = rt.new_object(token, &[]).unwrap();

    assert!(cloner.register_with_default(&rt, token, shared).unwrap());
    assert_eq!(cloner.builder().instantiate(&mut rt, token).unwrap(), shared);

    let other = rt.new_object(token, &[]).unwrap();
    assert!(!cloner.register_with_default(&rt, token, other).unwrap());
    assert_eq!(cloner.builder().get_default(token), Some(other));
}

#[test]
fn registered_type_without_value_still_constructs() {
    let mut rt = Runtime::new();
    let mut cloner = Cloner::new(&rt);
    let token = token_class(&mut rt);
    cloner.register(token);
    let value = cloner.builder().instantiate(&mut rt, token).unwrap();
    assert_eq!(rt.type_of(value).unwrap(), Some(token));
    assert_eq!(cloner.copy(&mut rt, value).unwrap(), value);
}

#[test]
fn reset_restores_builtins() {
    let mut rt = Runtime::new();
    let mut cloner = Cloner::new(&rt);
    let token = token_class(&mut rt);
    assert!(!cloner.reset());

    cloner.register(token);
    cloner.unregister(TypeId::INT);
    assert!(!cloner.is_immutable(TypeId::INT));
    assert!(cloner.reset());
    assert!(!cloner.is_immutable(token));
    assert!(cloner.is_immutable(TypeId::INT));
    assert_eq!(cloner.builder().get_default(TypeId::INT), Some(Value::Int(0)));
    assert!(!cloner.reset());
}

#[test]
fn registries_of_cloned_builders_are_independent() {
    let mut rt = Runtime::new();
    let builder = Builder::new(&rt);
    let mut cloner = Cloner::with_builder(builder.clone());
    let token = token_class(&mut rt);
    cloner.register(token);
    assert!(cloner.is_immutable(token));
    assert!(!builder.registry().contains(token));
}
