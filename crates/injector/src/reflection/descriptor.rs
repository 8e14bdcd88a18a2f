use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::container::invokable::{Body, Call};
use crate::container::key::{trim_name, TypeKey};
use crate::container::value::{Arguments, Object, Value};
use crate::errors::InjectorError;

/// Name of the method that makes instances of a class callable
pub const CALL_OPERATOR: &str = "call";

/// Builds a type-erased instance from resolved constructor arguments
pub type Factory =
    Arc<dyn Fn(&Arguments) -> Result<Arc<dyn Any + Send + Sync>, InjectorError> + Send + Sync>;

/// What kind of type a descriptor describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    /// Instantiable type
    Concrete,
    /// Type with shared behaviour but no instances of its own
    Abstract,
    /// Contract implemented by other types
    Interface,
}

impl ClassKind {
    pub fn is_concrete(&self) -> bool {
        matches!(self, ClassKind::Concrete)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassKind::Concrete => "concrete",
            ClassKind::Abstract => "abstract",
            ClassKind::Interface => "interface",
        }
    }
}

/// Constructor accessibility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

/// One declared parameter of a constructor, method or function
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    type_hint: Option<String>,
    nullable: bool,
    default: Option<Value>,
}

impl Parameter {
    /// Parameter without a type constraint
    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_hint: None,
            nullable: false,
            default: None,
        }
    }

    /// Parameter constrained to a class or interface
    pub fn typed(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            type_hint: Some(type_name.into()),
            ..Self::untyped(name)
        }
    }

    /// Allow null for this parameter
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Declare a default value
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_hint(&self) -> Option<&str> {
        self.type_hint.as_deref()
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Nullable, or defaults to null
    pub fn allows_null(&self) -> bool {
        self.nullable || self.default.as_ref().is_some_and(Value::is_null)
    }
}

/// Ordered parameter list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    parameters: Vec<Parameter>,
}

/// The signature of a constructor
pub type ConstructorSignature = Signature;

impl Signature {
    pub fn new(parameters: Vec<Parameter>) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

impl From<Vec<Parameter>> for Signature {
    fn from(parameters: Vec<Parameter>) -> Self {
        Self::new(parameters)
    }
}

/// A declared constructor
#[derive(Clone)]
pub struct Constructor {
    visibility: Visibility,
    signature: Signature,
    factory: Factory,
}

impl Constructor {
    /// Public constructor building a `T` from resolved arguments
    pub fn public<T, F>(parameters: Vec<Parameter>, build: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Arguments) -> Result<T, InjectorError> + Send + Sync + 'static,
    {
        Self::with_visibility(Visibility::Public, parameters, build)
    }

    /// Protected constructor: declared, but not callable by the injector
    pub fn protected<T, F>(parameters: Vec<Parameter>, build: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Arguments) -> Result<T, InjectorError> + Send + Sync + 'static,
    {
        Self::with_visibility(Visibility::Protected, parameters, build)
    }

    /// Private constructor: declared, but not callable by the injector
    pub fn private<T, F>(parameters: Vec<Parameter>, build: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Arguments) -> Result<T, InjectorError> + Send + Sync + 'static,
    {
        Self::with_visibility(Visibility::Private, parameters, build)
    }

    pub fn with_visibility<T, F>(
        visibility: Visibility,
        parameters: Vec<Parameter>,
        build: F,
    ) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Arguments) -> Result<T, InjectorError> + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move |args: &Arguments| {
            let instance = build(args)?;
            Ok(Arc::new(instance) as Arc<dyn Any + Send + Sync>)
        });
        Self {
            visibility,
            signature: Signature::new(parameters),
            factory,
        }
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("visibility", &self.visibility)
            .field("signature", &self.signature)
            .finish()
    }
}

/// A method declared on a class
#[derive(Clone)]
pub struct Method {
    name: String,
    is_static: bool,
    signature: Signature,
    body: Body,
}

impl Method {
    /// Method that needs a receiver
    pub fn instance<F>(name: impl Into<String>, parameters: Vec<Parameter>, body: F) -> Self
    where
        F: Fn(Call<'_>) -> Result<Value, InjectorError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            is_static: false,
            signature: Signature::new(parameters),
            body: Arc::new(body),
        }
    }

    /// Method callable without a receiver
    pub fn static_method<F>(name: impl Into<String>, parameters: Vec<Parameter>, body: F) -> Self
    where
        F: Fn(Call<'_>) -> Result<Value, InjectorError> + Send + Sync + 'static,
    {
        Self {
            is_static: true,
            ..Self::instance(name, parameters, body)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn body(&self) -> &Body {
        &self.body
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("is_static", &self.is_static)
            .field("signature", &self.signature)
            .finish()
    }
}

/// A free function
#[derive(Clone)]
pub struct FunctionDescriptor {
    name: String,
    key: TypeKey,
    signature: Signature,
    body: Body,
}

impl FunctionDescriptor {
    pub fn new<F>(name: impl AsRef<str>, parameters: Vec<Parameter>, body: F) -> Self
    where
        F: Fn(Call<'_>) -> Result<Value, InjectorError> + Send + Sync + 'static,
    {
        let name = trim_name(name.as_ref());
        Self {
            key: TypeKey::new(name),
            name: name.to_string(),
            signature: Signature::new(parameters),
            body: Arc::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn body(&self) -> &Body {
        &self.body
    }
}

impl fmt::Debug for FunctionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDescriptor")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .finish()
    }
}

/// Everything the injector needs to know about a class
#[derive(Clone)]
pub struct ClassDescriptor {
    name: String,
    key: TypeKey,
    kind: ClassKind,
    parent: Option<String>,
    interfaces: Vec<String>,
    constructor: Option<Constructor>,
    default_factory: Option<Factory>,
    methods: HashMap<String, Method>,
}

impl ClassDescriptor {
    fn with_kind(name: &str, kind: ClassKind) -> Self {
        let name = trim_name(name);
        Self {
            key: TypeKey::new(name),
            name: name.to_string(),
            kind,
            parent: None,
            interfaces: Vec::new(),
            constructor: None,
            default_factory: None,
            methods: HashMap::new(),
        }
    }

    /// Concrete class; give it a [`Constructor`] or a no-argument builder
    pub fn class(name: impl AsRef<str>) -> Self {
        Self::with_kind(name.as_ref(), ClassKind::Concrete)
    }

    pub fn interface(name: impl AsRef<str>) -> Self {
        Self::with_kind(name.as_ref(), ClassKind::Interface)
    }

    pub fn abstract_class(name: impl AsRef<str>) -> Self {
        Self::with_kind(name.as_ref(), ClassKind::Abstract)
    }

    /// Declare the constructor
    pub fn constructor(mut self, constructor: Constructor) -> Self {
        self.constructor = Some(constructor);
        self
    }

    /// Instantiate without a declared constructor
    pub fn without_constructor<T, F>(mut self, build: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.default_factory = Some(Arc::new(move |_: &Arguments| {
            Ok(Arc::new(build()) as Arc<dyn Any + Send + Sync>)
        }));
        self
    }

    /// Declare the parent class (or parent interface, for interfaces)
    pub fn extends(mut self, parent: impl AsRef<str>) -> Self {
        self.parent = Some(trim_name(parent.as_ref()).to_string());
        self
    }

    pub fn implements(mut self, interface: impl AsRef<str>) -> Self {
        self.interfaces
            .push(trim_name(interface.as_ref()).to_string());
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.methods.insert(method.name.to_lowercase(), method);
        self
    }

    /// Make instances callable through the call operator
    pub fn call_operator<F>(self, parameters: Vec<Parameter>, body: F) -> Self
    where
        F: Fn(Call<'_>) -> Result<Value, InjectorError> + Send + Sync + 'static,
    {
        self.method(Method::instance(CALL_OPERATOR, parameters, body))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    pub fn constructor_info(&self) -> Option<&Constructor> {
        self.constructor.as_ref()
    }

    /// Concrete, with either a declared constructor or a no-argument builder
    pub fn is_instantiable(&self) -> bool {
        self.kind.is_concrete() && (self.constructor.is_some() || self.default_factory.is_some())
    }

    /// Method declared directly on this class (names are case-insensitive)
    pub fn declared_method(&self, name: &str) -> Option<&Method> {
        self.methods.get(&name.to_lowercase())
    }

    pub fn has_call_operator(&self) -> bool {
        self.declared_method(CALL_OPERATOR).is_some()
    }

    /// Signature used to build instances; empty without a declared constructor
    pub fn constructor_signature(&self) -> Signature {
        self.constructor
            .as_ref()
            .map(|c| c.signature.clone())
            .unwrap_or_default()
    }

    /// Build an instance from already resolved constructor arguments
    pub fn instantiate(&self, args: &Arguments) -> Result<Object, InjectorError> {
        let factory = match (&self.constructor, &self.default_factory) {
            (Some(constructor), _) if !constructor.is_public() => {
                return Err(InjectorError::NonPublicConstructor {
                    type_name: self.name.clone(),
                })
            }
            (Some(constructor), _) => &constructor.factory,
            (None, Some(factory)) => factory,
            (None, None) => {
                return Err(InjectorError::NeedsDefinition {
                    type_name: self.name.clone(),
                    parameter: None,
                })
            }
        };
        let instance = factory(args)?;
        Ok(Object::from_arc(&self.name, instance))
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&str> = self.methods.values().map(Method::name).collect();
        methods.sort_unstable();
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("parent", &self.parent)
            .field("interfaces", &self.interfaces)
            .field("constructor", &self.constructor)
            .field("methods", &methods)
            .finish()
    }
}
