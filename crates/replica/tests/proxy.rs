//! Tests for interface proxies: synthesized return values, generic return resolution, custom handlers
//! and copying proxies.
use std::{cell::RefCell, rc::Rc};

use pretty_assertions::assert_eq;
use replica::{
    Builder, ClassDef, Cloner, HeapId, InstantiationError, InterfaceDef, InvocationHandler, InvokeError, MethodDesc,
    Runtime, TypeId, TypeRef, Value,
};

fn echo_interface(rt: &mut Runtime) -> TypeId {
    rt.define_interface(
        InterfaceDef::new("Echo")
            .method(MethodDesc::new("echo", vec![TypeRef::var("T")], TypeRef::var("T")).type_param("T"))
            .method(
                MethodDesc::new("pick", vec![TypeRef::Concrete(TypeId::INT), TypeRef::var("T")], TypeRef::var("T"))
                    .type_param("T"),
            )
            .method(MethodDesc::new("count", vec![], TypeRef::Concrete(TypeId::LONG)))
            .method(MethodDesc::new("name", vec![], TypeRef::Concrete(TypeId::TEXT)))
            .method(MethodDesc::new("reset", vec![], TypeRef::Void)),
    )
    .unwrap()
}

#[test]
fn interface_instantiates_to_proxy() {
    let mut rt = Runtime::new();
    let builder = Builder::new(&rt);
    let echo = echo_interface(&mut rt);
    let proxy = builder.instantiate(&mut rt, echo).unwrap();
    assert_eq!(rt.type_of(proxy).unwrap(), Some(echo));
    assert!(rt.is_instance(proxy, echo));
    assert!(rt.is_instance(proxy, TypeId::OBJECT));
}

#[test]
fn generic_return_follows_argument_type() {
    let mut rt = Runtime::new();
    let builder = Builder::new(&rt);
    let echo = echo_interface(&mut rt);
    let proxy = builder.instantiate(&mut rt, echo).unwrap();
    let hello = rt.new_text("hello");

    let result = rt.invoke(proxy, "echo", &[hello]).unwrap();
    assert_eq!(rt.type_of(result).unwrap(), Some(TypeId::TEXT));
    assert_eq!(rt.text(result).unwrap(), "");

    let result = rt.invoke(proxy, "echo", &[Value::Int(5)]).unwrap();
    assert_eq!(result, Value::Int(0));
}

#[test]
fn generic_return_skips_non_matching_parameters() {
    let mut rt = Runtime::new();
    let builder = Builder::new(&rt);
    let echo = echo_interface(&mut rt);
    let proxy = builder.instantiate(&mut rt, echo).unwrap();
    let result = rt.invoke(proxy, "pick", &[Value::Int(1), Value::Bool(true)]).unwrap();
    assert_eq!(result, Value::Bool(false));
}

#[test]
fn generic_return_without_usable_argument_fails() {
    let mut rt = Runtime::new();
    let builder = Builder::new(&rt);
    let echo = echo_interface(&mut rt);
    let proxy = builder.instantiate(&mut rt, echo).unwrap();

    let err = rt.invoke(proxy, "echo", &[Value::Null]).unwrap_err();
    assert!(matches!(
        err,
        InvokeError::Failed(InstantiationError::UnresolvedReturn { ref method, .. }) if method == "echo"
    ));
    let err = rt.invoke(proxy, "echo", &[]).unwrap_err();
    assert!(matches!(err, InvokeError::Failed(InstantiationError::UnresolvedReturn { .. })));
}

#[test]
fn concrete_and_void_returns() {
    let mut rt = Runtime::new();
    let builder = Builder::new(&rt);
    let echo = echo_interface(&mut rt);
    let proxy = builder.instantiate(&mut rt, echo).unwrap();
    assert_eq!(rt.invoke(proxy, "count", &[]).unwrap(), Value::Long(0));
    let name = rt.invoke(proxy, "name", &[]).unwrap();
    assert_eq!(rt.text(name).unwrap(), "");
    assert_eq!(rt.invoke(proxy, "reset", &[]).unwrap(), Value::Null);
}

#[test]
fn concrete_class_return_is_constructed() {
    let mut rt = Runtime::new();
    let builder = Builder::new(&rt);
    let point = rt
        .define_class(ClassDef::new("Point").field("x", TypeId::INT).default_constructor())
        .unwrap();
    let factory = rt
        .define_interface(InterfaceDef::new("Factory").method(MethodDesc::new("make", vec![], point.into())))
        .unwrap();
    let proxy = builder.instantiate(&mut rt, factory).unwrap();
    let made = rt.invoke(proxy, "make", &[]).unwrap();
    assert_eq!(rt.type_of(made).unwrap(), Some(point));
}

#[test]
fn parameterized_return_is_unresolved() {
    let mut rt = Runtime::new();
    let builder = Builder::new(&rt);
    let list = rt
        .define_interface(InterfaceDef::new("List").type_param("E"))
        .unwrap();
    let source = rt
        .define_interface(
            InterfaceDef::new("Source").type_param("E").method(MethodDesc::new(
                "all",
                vec![],
                TypeRef::Parameterized {
                    raw: list,
                    args: vec![TypeRef::var("E")],
                },
            )),
        )
        .unwrap();
    let proxy = builder.instantiate(&mut rt, source).unwrap();
    let err = rt.invoke(proxy, "all", &[]).unwrap_err();
    assert!(matches!(err, InvokeError::Failed(InstantiationError::UnresolvedReturn { .. })));
}

#[test]
fn inherited_methods_dispatch() {
    let mut rt = Runtime::new();
    let builder = Builder::new(&rt);
    let named = rt
        .define_interface(InterfaceDef::new("Named").method(MethodDesc::new("id", vec![], TypeId::INT.into())))
        .unwrap();
    let shape = rt.define_interface(InterfaceDef::new("Shape").extends(named)).unwrap();
    let proxy = builder.instantiate(&mut rt, shape).unwrap();
    assert!(rt.is_instance(proxy, named));
    assert_eq!(rt.invoke(proxy, "id", &[]).unwrap(), Value::Int(0));
}

#[test]
fn invoke_errors() {
    let mut rt = Runtime::new();
    let builder = Builder::new(&rt);
    let echo = echo_interface(&mut rt);
    let proxy = builder.instantiate(&mut rt, echo).unwrap();
    assert!(matches!(
        rt.invoke(proxy, "missing", &[]),
        Err(InvokeError::NoSuchMethod { .. })
    ));
    assert!(matches!(rt.invoke(Value::Null, "echo", &[]), Err(InvokeError::Access(_))));
    let text = rt.new_text("x");
    assert!(matches!(rt.invoke(text, "echo", &[]), Err(InvokeError::NotAProxy { .. })));
}

#[test]
fn proxy_uses_registry_as_of_creation() {
    let mut rt = Runtime::new();
    let mut builder = Builder::new(&rt);
    let echo = echo_interface(&mut rt);
    let proxy = builder.instantiate(&mut rt, echo).unwrap();
    builder.add_default(&rt, TypeId::LONG, Value::Long(7)).unwrap();
    assert_eq!(rt.invoke(proxy, "count", &[]).unwrap(), Value::Long(0));
    let fresh = builder.instantiate(&mut rt, echo).unwrap();
    assert_eq!(rt.invoke(fresh, "count", &[]).unwrap(), Value::Long(7));
}

/// Records every call and answers with the first argument.
#[derive(Default)]
struct Recorder {
    calls: RefCell<Vec<String>>,
}

impl InvocationHandler for Recorder {
    fn invoke(
        &self,
        _rt: &mut Runtime,
        _proxy: HeapId,
        _interface: TypeId,
        method: &MethodDesc,
        args: &[Value],
    ) -> Result<Value, InvokeError> {
        self.calls.borrow_mut().push(method.name().to_owned());
        Ok(args.first().copied().unwrap_or_default())
    }
}

#[test]
fn custom_handler_receives_calls() {
    let mut rt = Runtime::new();
    let echo = echo_interface(&mut rt);
    let recorder = Rc::new(Recorder::default());
    let proxy = rt.new_proxy(echo, recorder.clone()).unwrap();
    assert_eq!(rt.invoke(proxy, "echo", &[Value::Int(3)]).unwrap(), Value::Int(3));
    assert_eq!(rt.invoke(proxy, "reset", &[]).unwrap(), Value::Null);
    assert_eq!(*recorder.calls.borrow(), ["echo", "reset"]);
    assert!(rt.new_proxy(TypeId::OBJECT, recorder).is_err());
}

#[test]
fn copied_proxy_shares_handler() {
    let mut rt = Runtime::new();
    let cloner = Cloner::new(&rt);
    let echo = echo_interface(&mut rt);
    let recorder = Rc::new(Recorder::default());
    let proxy = rt.new_proxy(echo, recorder.clone()).unwrap();

    let copy = cloner.copy(&mut rt, proxy).unwrap();
    assert_ne!(copy, proxy);
    assert_eq!(rt.type_of(copy).unwrap(), Some(echo));
    rt.invoke(copy, "reset", &[]).unwrap();
    assert_eq!(recorder.calls.borrow().len(), 1);
}
