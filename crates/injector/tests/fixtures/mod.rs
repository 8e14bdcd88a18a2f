//! Class graph shared by the integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};

use elif_injector::{
    Arguments, Call, ClassDescriptor, Constructor, FunctionDescriptor, Injectable, Injector,
    InjectorError, Method, Object, Parameter, TypeRegistry, Value,
};

pub const STD_CLASS: &str = "StdClass";

static TRACING: Once = Once::new();

/// Route injector events to the test writer; `RUST_LOG=elif_injector=trace` to see them
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Injector over the full fixture registry
pub fn injector() -> Injector {
    init_tracing();
    Injector::with_registry(registry())
}

/// Fully qualified fixture class name
pub fn class(name: &str) -> String {
    format!("fixtures::{}", name)
}

/// Type without behaviour of its own
#[derive(Debug, Default)]
pub struct Marker;

/// Keeps the constructor arguments it was built with
#[derive(Debug)]
pub struct Record {
    pub args: Arguments,
}

impl Record {
    pub fn arg(&self, index: usize) -> &Value {
        self.args.get(index).expect("argument recorded")
    }

    pub fn object(&self, index: usize) -> &Object {
        self.arg(index).as_object().expect("object argument")
    }
}

/// Property bag with interior mutability
#[derive(Debug, Default)]
pub struct StdClass {
    props: Mutex<HashMap<String, Value>>,
}

impl StdClass {
    pub fn with(name: &str, value: impl Into<Value>) -> Self {
        let class = Self::default();
        class.set(name, value);
        class
    }

    pub fn set(&self, name: &str, value: impl Into<Value>) {
        self.props
            .lock()
            .unwrap()
            .insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.props.lock().unwrap().get(name).cloned()
    }
}

#[derive(Debug)]
pub struct TestDependency {
    pub test_prop: &'static str,
}

impl Injectable for TestDependency {
    fn class_name() -> &'static str {
        "fixtures::TestDependency"
    }

    fn construct(_args: &Arguments) -> Result<Self, InjectorError> {
        Ok(Self { test_prop: "testVal" })
    }
}

#[derive(Debug)]
pub struct TestNeedsDep {
    pub test_dep: Arc<TestDependency>,
}

impl Injectable for TestNeedsDep {
    fn class_name() -> &'static str {
        "fixtures::TestNeedsDep"
    }

    fn parameters() -> Vec<Parameter> {
        vec![Parameter::typed("testDep", "fixtures::TestDependency")]
    }

    fn construct(args: &Arguments) -> Result<Self, InjectorError> {
        Ok(Self {
            test_dep: args.object(0)?,
        })
    }
}

#[derive(Debug)]
pub struct DepImplementation {
    pub test_prop: Mutex<String>,
}

impl Default for DepImplementation {
    fn default() -> Self {
        Self {
            test_prop: Mutex::new("something".to_string()),
        }
    }
}

#[derive(Debug)]
pub struct RequiresInterface {
    pub dep: Arc<DepImplementation>,
}

#[derive(Debug, Default)]
pub struct PreparesImplementationTest {
    pub test_prop: Mutex<Option<i64>>,
}

/// Class whose constructor records its arguments
fn record(name: &str, parameters: Vec<Parameter>) -> ClassDescriptor {
    ClassDescriptor::class(class(name)).constructor(Constructor::public(parameters, |args| {
        Ok(Record { args: args.clone() })
    }))
}

fn marker(name: &str) -> ClassDescriptor {
    ClassDescriptor::class(class(name)).without_constructor(|| Marker)
}

fn typed(name: &str, type_name: &str) -> Parameter {
    Parameter::typed(name, class(type_name))
}

fn returns(
    value: i64,
) -> impl Fn(Call<'_>) -> Result<Value, InjectorError> + Send + Sync + 'static {
    move |_| Ok(Value::from(value))
}

pub fn registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    for class in construction_classes()
        .into_iter()
        .chain(binding_classes())
        .chain(execution_classes())
        .chain(failure_classes())
    {
        registry.register(class);
    }
    for function in functions() {
        registry.register_function(function);
    }
    registry.add::<TestDependency>().add::<TestNeedsDep>();
    registry
}

fn construction_classes() -> Vec<ClassDescriptor> {
    vec![
        ClassDescriptor::class(class("TestDependency2"))
            .without_constructor(|| TestDependency { test_prop: "testVal2" }),
        marker("TestNoConstructor"),
        ClassDescriptor::interface(class("DepInterface")),
        ClassDescriptor::class(class("DepImplementation"))
            .implements(class("DepInterface"))
            .without_constructor(DepImplementation::default),
        ClassDescriptor::class(class("RequiresInterface")).constructor(Constructor::public(
            vec![typed("dep", "DepInterface")],
            |args| Ok(RequiresInterface { dep: args.object(0)? }),
        )),
        record(
            "ProvTestNoDefinitionNullDefaultClass",
            vec![Parameter::untyped("arg").with_default(Value::null())],
        ),
        record(
            "InjectorTestChildClass",
            vec![
                Parameter::untyped("arg1"),
                Parameter::untyped("arg2"),
                Parameter::untyped("arg3").with_default(Value::null()),
            ],
        ),
        record(
            "TestMultiDepsWithCtor",
            vec![typed("val1", "TestDependency"), typed("val2", "TestNeedsDep")],
        ),
        record(
            "NoTypehintNoDefaultConstructorClass",
            vec![
                typed("val1", "TestDependency"),
                Parameter::untyped("arg").with_default(Value::null()),
            ],
        ),
        ClassDescriptor::interface(class("TestNoExplicitDefine")),
        record(
            "InjectorTestCtorParamWithNoTypehintOrDefault",
            vec![Parameter::untyped("val")],
        )
        .implements(class("TestNoExplicitDefine")),
        record(
            "InjectorTestCtorParamWithNoTypehintOrDefaultDependent",
            vec![typed("param", "TestNoExplicitDefine")],
        ),
        record(
            "DependencyWithTypelessParameters",
            vec![Parameter::untyped("thumbnailSize")],
        ),
        record(
            "RequiresDependencyWithTypelessParameters",
            vec![typed("dependency", "DependencyWithTypelessParameters")],
        ),
        record(
            "InjectorTestRawCtorParams",
            ["string", "obj", "int", "array", "float", "bool", "null"]
                .into_iter()
                .map(|name| Parameter::untyped(name))
                .collect(),
        ),
        record("SimpleNoTypehintClass", vec![Parameter::untyped("arg")]),
        record("ClassOuter", vec![typed("dep", "ClassInnerA")]),
        record("ClassInnerA", vec![typed("dep", "ClassInnerB")]),
        marker("ClassInnerB"),
        ClassDescriptor::class(STD_CLASS).without_constructor(StdClass::default),
        ClassDescriptor::interface(class("SomeInterface")),
        ClassDescriptor::class(class("PreparesImplementationTest"))
            .implements(class("SomeInterface"))
            .without_constructor(PreparesImplementationTest::default),
        record("DependencyWithDefinedParam", vec![Parameter::untyped("foo")]),
        record(
            "RequiresDependencyWithDefinedParam",
            vec![typed("obj", "DependencyWithDefinedParam")],
        ),
        marker("TestInstance"),
        record("TestInstanceTypelessParam", vec![Parameter::untyped("typelessParam")]),
        record(
            "InjectorTestNullableParams",
            vec![typed("instance", "TestInstance")
                .nullable()
                .with_default(Value::null())],
        ),
        record(
            "InjectorTestNullableParamTypelessDependency",
            vec![typed("optional", "TestInstanceTypelessParam")
                .nullable()
                .with_default(Value::null())],
        ),
        record(
            "RequiresNullableInterface",
            vec![typed("dep", "DepInterface").nullable()],
        ),
    ]
}

fn binding_classes() -> Vec<ClassDescriptor> {
    vec![
        marker("ConcreteClass1"),
        marker("ConcreteClass2"),
        ClassDescriptor::interface(class("SharedAliasedInterface")),
        marker("SharedClass").implements(class("SharedAliasedInterface")),
        marker("NotSharedClass").implements(class("SharedAliasedInterface")),
        record(
            "ClassWithAliasAsParameter",
            vec![typed("sharedClass", "SharedAliasedInterface")],
        ),
        marker("SomeOtherClass"),
        marker("MadeByDelegate"),
        marker("CallableDelegateClassTest").call_operator(vec![], |_| {
            Ok(Value::from(Object::new(class("MadeByDelegate"), Marker)))
        }),
        marker("StringStdClassDelegateMock").call_operator(vec![], |_| {
            Ok(Value::from(Object::new(STD_CLASS, StdClass::with("test", 42))))
        }),
        marker("StringDelegateWithNoInvokeMethod"),
        ClassDescriptor::interface(class("DelegatableInterface"))
            .method(Method::instance("foo", vec![], returns(1))),
        marker("ImplementsInterface")
            .implements(class("DelegatableInterface"))
            .method(Method::instance("foo", vec![], returns(1))),
        marker("ImplementsInterfaceFactory").call_operator(vec![], |_| {
            Ok(Value::from(Object::new(class("ImplementsInterface"), Marker)))
        }),
        record(
            "RequiresDelegatedInterface",
            vec![typed("interface", "DelegatableInterface")],
        ),
        record(
            "NonConcreteDependencyWithDefaultValue",
            vec![typed("interface", "DelegatableInterface").with_default(Value::null())],
        ),
    ]
}

fn execution_classes() -> Vec<ClassDescriptor> {
    vec![
        marker("ExecuteClassNoDeps").method(Method::instance("execute", vec![], returns(42))),
        ClassDescriptor::class(class("ExecuteClassDeps"))
            .constructor(Constructor::public(
                vec![typed("dep", "TestDependency")],
                |args| Ok(Record { args: args.clone() }),
            ))
            .method(Method::instance("execute", vec![], returns(42))),
        record(
            "ExecuteClassDepsWithMethodDeps",
            vec![typed("dep", "TestDependency")],
        )
        .method(Method::instance(
            "execute",
            vec![
                typed("dep", "TestDependency"),
                Parameter::untyped("arg").with_default(Value::null()),
            ],
            |call| {
                let arg = call.args.value(1)?;
                Ok(if arg.is_null() { Value::from(42) } else { arg.clone() })
            },
        )),
        marker("ExecuteClassStaticMethod")
            .method(Method::static_method("execute", vec![], returns(42))),
        marker("ExecuteClassRelativeStaticMethod")
            .extends(class("ExecuteClassStaticMethod"))
            .method(Method::static_method("execute", vec![], |_| {
                Ok(Value::from("this should NOT be seen"))
            })),
        marker("ExecuteClassInvokable").call_operator(vec![], returns(42)),
        marker("ClassWithStaticMethodThatTakesArg").method(Method::static_method(
            "doSomething",
            vec![Parameter::untyped("arg")],
            |call| Ok(Value::from(call.args.i64(0)? + 1)),
        )),
        ClassDescriptor::class(class("Counter"))
            .without_constructor(|| Mutex::new(0i64))
            .method(Method::instance("increment", vec![], |call| {
                let counter = call.receiver::<Mutex<i64>>()?;
                let mut value = counter.lock().unwrap();
                *value += 1;
                Ok(Value::from(*value))
            })),
    ]
}

fn failure_classes() -> Vec<ClassDescriptor> {
    vec![
        record("TestMissingDependency", vec![typed("dep", "TypoInTypehint")]),
        record("RecursiveClassA", vec![typed("b", "RecursiveClassB")]),
        record("RecursiveClassB", vec![typed("c", "RecursiveClassC")]),
        record("RecursiveClassC", vec![typed("a", "RecursiveClassA")]),
        record("RecursiveClass1", vec![typed("c", "RecursiveClass2")]),
        record("RecursiveClass2", vec![typed("c", "RecursiveClass1")]),
        record("DependsOnCyclic", vec![typed("a", "RecursiveClassA")]),
        ClassDescriptor::class(class("TestDependencyWithProtectedConstructor"))
            .constructor(Constructor::protected(vec![], |_| Ok(Marker))),
        record(
            "TestNeedsDepWithProtCons",
            vec![typed("dep", "TestDependencyWithProtectedConstructor")],
        ),
        ClassDescriptor::class(class("HasNonPublicConstructor"))
            .constructor(Constructor::protected(vec![], |_| Ok(Marker))),
        ClassDescriptor::class(class("HasNonPublicConstructorWithArgs")).constructor(
            Constructor::private(vec![Parameter::untyped("arg")], |_| Ok(Marker)),
        ),
        ClassDescriptor::abstract_class(class("AbstractBase")),
        ClassDescriptor::class(class("ExplodingConstructor")).constructor(Constructor::public(
            vec![],
            |_| Err::<Marker, _>(InjectorError::failure("constructor exploded")),
        )),
    ]
}

fn functions() -> Vec<FunctionDescriptor> {
    vec![
        FunctionDescriptor::new(class("testExecuteFunction"), vec![], returns(42)),
        FunctionDescriptor::new(
            class("testExecuteFunctionWithArg"),
            vec![typed("foo", "ConcreteClass1")],
            returns(42),
        ),
    ]
}
