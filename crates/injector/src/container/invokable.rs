use std::fmt;
use std::sync::Arc;

use crate::container::definition::Definition;
use crate::container::injector::Injector;
use crate::container::key::{trim_name, TypeKey, NAMESPACE_SEPARATOR};
use crate::container::value::{Arguments, Object, Value};
use crate::errors::InjectorError;
use crate::reflection::{
    ClassDescriptor, FunctionDescriptor, Method, Parameter, Reflector, Signature, CALL_OPERATOR,
};

/// Marker for an explicit call to an ancestor's implementation
const PARENT_SEGMENT: &str = "parent::";

/// Everything a callable body gets when it runs
pub struct Call<'a> {
    /// The injector running the call
    pub injector: &'a Injector,
    /// Bound instance for instance methods and call-operator objects
    pub receiver: Option<&'a Object>,
    /// Resolved arguments in declaration order
    pub args: Arguments,
}

impl Call<'_> {
    /// Get the receiver as a concrete Rust type
    pub fn receiver<T: std::any::Any + Send + Sync>(&self) -> Result<Arc<T>, InjectorError> {
        match self.receiver {
            Some(receiver) => receiver.expect_type::<T>(),
            None => Err(InjectorError::type_mismatch(
                "method receiver",
                std::any::type_name::<T>(),
                "no receiver",
            )),
        }
    }
}

/// Type-erased callable body shared by functions, methods and closures
pub type Body = Arc<dyn Fn(Call<'_>) -> Result<Value, InjectorError> + Send + Sync>;

/// An anonymous callable with a declared signature
#[derive(Clone)]
pub struct Closure {
    signature: Signature,
    body: Body,
}

impl Closure {
    pub fn new<F>(parameters: Vec<Parameter>, body: F) -> Self
    where
        F: Fn(Call<'_>) -> Result<Value, InjectorError> + Send + Sync + 'static,
    {
        Self {
            signature: Signature::new(parameters),
            body: Arc::new(body),
        }
    }

    /// Closure without parameters
    pub fn from_fn<F>(body: F) -> Self
    where
        F: Fn(Call<'_>) -> Result<Value, InjectorError> + Send + Sync + 'static,
    {
        Self::new(Vec::new(), body)
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("signature", &self.signature)
            .finish()
    }
}

/// Left-hand side of a method reference
#[derive(Debug, Clone)]
pub enum Receiver {
    /// A class name; instance methods get a freshly made receiver
    Class(String),
    /// An existing instance
    Object(Object),
}

impl From<&str> for Receiver {
    fn from(name: &str) -> Self {
        Receiver::Class(name.to_string())
    }
}

impl From<String> for Receiver {
    fn from(name: String) -> Self {
        Receiver::Class(name)
    }
}

impl From<Object> for Receiver {
    fn from(object: Object) -> Self {
        Receiver::Object(object)
    }
}

/// Every form of "something that can be called"
#[derive(Debug, Clone)]
pub enum Invokable {
    /// `"function"`, `"Class"` (call operator), `"Class::method"` or
    /// `"Class::parent::method"`
    Name(String),
    /// `(class or object, method)`; the method may be `"parent::method"`
    Method(Receiver, String),
    /// Anonymous callable
    Closure(Closure),
    /// Instance whose class defines the call operator
    Object(Object),
}

impl Invokable {
    /// Method reference on a class name or an instance
    pub fn method(receiver: impl Into<Receiver>, method: impl Into<String>) -> Self {
        Invokable::Method(receiver.into(), method.into())
    }

    /// Human-readable description for logs and errors
    pub fn describe(&self) -> String {
        match self {
            Invokable::Name(name) => name.clone(),
            Invokable::Method(Receiver::Class(class), method) => format!("{}::{}", class, method),
            Invokable::Method(Receiver::Object(object), method) => {
                format!("{}->{}", object.class_name(), method)
            }
            Invokable::Closure(_) => "{closure}".to_string(),
            Invokable::Object(object) => format!("{} instance", object.class_name()),
        }
    }
}

impl From<&str> for Invokable {
    fn from(name: &str) -> Self {
        Invokable::Name(name.to_string())
    }
}

impl From<String> for Invokable {
    fn from(name: String) -> Self {
        Invokable::Name(name)
    }
}

impl From<Closure> for Invokable {
    fn from(closure: Closure) -> Self {
        Invokable::Closure(closure)
    }
}

impl From<Object> for Invokable {
    fn from(object: Object) -> Self {
        Invokable::Object(object)
    }
}

impl<R: Into<Receiver>, M: Into<String>> From<(R, M)> for Invokable {
    fn from((receiver, method): (R, M)) -> Self {
        Invokable::method(receiver, method)
    }
}

/// Canonical form of an invokable, before any receiver is instantiated
#[derive(Debug, Clone)]
pub(crate) enum Target {
    Function(Arc<FunctionDescriptor>),
    Method {
        class_name: String,
        method: Method,
        receiver: Option<Object>,
    },
    Closure(Closure),
}

/// Maps every [`Invokable`] form onto a [`Target`] using reflection only
pub(crate) struct Normalizer<'a> {
    reflector: &'a dyn Reflector,
}

impl<'a> Normalizer<'a> {
    pub(crate) fn new(reflector: &'a dyn Reflector) -> Self {
        Self { reflector }
    }

    pub(crate) fn normalize(&self, invokable: &Invokable) -> Result<Target, InjectorError> {
        match invokable {
            Invokable::Name(name) => self.normalize_name(name),
            Invokable::Method(Receiver::Class(class), method) => {
                self.normalize_class_method(class, method)
            }
            Invokable::Method(Receiver::Object(object), method) => {
                self.normalize_object_method(object, method)
            }
            Invokable::Closure(closure) => Ok(Target::Closure(closure.clone())),
            Invokable::Object(object) => self.normalize_object_method(object, CALL_OPERATOR),
        }
    }

    fn normalize_name(&self, name: &str) -> Result<Target, InjectorError> {
        let trimmed = trim_name(name);
        if trimmed.is_empty() {
            return Err(InjectorError::not_invokable(name, "empty name"));
        }

        let key = TypeKey::new(trimmed);
        if let Some(function) = self.reflector.function(&key) {
            return Ok(Target::Function(function));
        }

        if let Some(class) = self.reflector.class(&key) {
            return self.bind_class_method(&class, CALL_OPERATOR, None);
        }

        if let Some((class, method)) = split_parent(trimmed) {
            return self.normalize_parent_method(class, method, None);
        }

        match trimmed.rsplit_once(NAMESPACE_SEPARATOR) {
            Some((class, method)) => self.normalize_class_method(class, method),
            None => Err(InjectorError::not_invokable(
                name,
                "no function or class with this name exists",
            )),
        }
    }

    fn normalize_class_method(&self, class: &str, method: &str) -> Result<Target, InjectorError> {
        if let Some(parent_method) = strip_parent(method) {
            return self.normalize_parent_method(class, parent_method, None);
        }
        let descriptor = self.class(class)?;
        self.bind_class_method(&descriptor, method, None)
    }

    fn normalize_object_method(
        &self,
        object: &Object,
        method: &str,
    ) -> Result<Target, InjectorError> {
        if let Some(parent_method) = strip_parent(method) {
            return self.normalize_parent_method(
                object.class_name(),
                parent_method,
                Some(object.clone()),
            );
        }
        let found = self
            .reflector
            .find_method(object.class_key(), method)
            .ok_or_else(|| missing_method(object.class_name(), method))?;
        Ok(Target::Method {
            class_name: object.class_name().to_string(),
            method: found,
            receiver: Some(object.clone()),
        })
    }

    fn normalize_parent_method(
        &self,
        class: &str,
        method: &str,
        receiver: Option<Object>,
    ) -> Result<Target, InjectorError> {
        let descriptor = self.class(class)?;
        let parent = descriptor.parent().ok_or_else(|| {
            InjectorError::not_invokable(
                format!("{}::{}{}", class, PARENT_SEGMENT, method),
                format!("class '{}' has no parent", descriptor.name()),
            )
        })?;
        let found = self
            .reflector
            .find_method(&TypeKey::new(parent), method)
            .ok_or_else(|| missing_method(parent, method))?;
        Ok(Target::Method {
            class_name: descriptor.name().to_string(),
            method: found,
            receiver,
        })
    }

    fn bind_class_method(
        &self,
        class: &ClassDescriptor,
        method: &str,
        receiver: Option<Object>,
    ) -> Result<Target, InjectorError> {
        let found = self
            .reflector
            .find_method(class.key(), method)
            .ok_or_else(|| missing_method(class.name(), method))?;
        Ok(Target::Method {
            class_name: class.name().to_string(),
            method: found,
            receiver,
        })
    }

    fn class(&self, name: &str) -> Result<Arc<ClassDescriptor>, InjectorError> {
        self.reflector
            .class(&TypeKey::new(name))
            .ok_or_else(|| InjectorError::not_invokable(name, "class does not exist"))
    }
}

fn missing_method(class: &str, method: &str) -> InjectorError {
    if method.eq_ignore_ascii_case(CALL_OPERATOR) {
        InjectorError::not_invokable(class, "class does not define a call operator")
    } else {
        InjectorError::not_invokable(
            format!("{}::{}", class, method),
            "method does not exist",
        )
    }
}

fn strip_parent(method: &str) -> Option<&str> {
    let head = method.get(..PARENT_SEGMENT.len())?;
    head.eq_ignore_ascii_case(PARENT_SEGMENT)
        .then(|| &method[PARENT_SEGMENT.len()..])
}

fn split_parent(name: &str) -> Option<(&str, &str)> {
    let needle = format!("{}{}", NAMESPACE_SEPARATOR, PARENT_SEGMENT);
    let index = name.to_ascii_lowercase().find(&needle)?;
    Some((&name[..index], &name[index + needle.len()..]))
}

/// A normalized callable: optional receiver, signature and body
#[derive(Clone)]
pub struct Executable {
    name: String,
    receiver: Option<Object>,
    signature: Signature,
    body: Body,
}

impl Executable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn receiver(&self) -> Option<&Object> {
        self.receiver.as_ref()
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Call with explicit positional arguments
    pub fn invoke(&self, injector: &Injector, args: Arguments) -> Result<Value, InjectorError> {
        (self.body)(Call {
            injector,
            receiver: self.receiver.as_ref(),
            args,
        })
    }

    /// Resolve every parameter through the injector, then call
    pub fn call(
        &self,
        injector: &Injector,
        overrides: &Definition,
    ) -> Result<Value, InjectorError> {
        let args = injector.provision_arguments(&self.signature, overrides, None, &self.name)?;
        self.invoke(injector, args)
    }
}

impl fmt::Debug for Executable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executable")
            .field("name", &self.name)
            .field("receiver", &self.receiver)
            .field("signature", &self.signature)
            .finish()
    }
}

impl Injector {
    /// Normalize any supported invokable into an [`Executable`]
    ///
    /// Instance methods referenced by class name get a receiver built with
    /// [`Injector::make`].
    pub fn build_executable(
        &self,
        invokable: impl Into<Invokable>,
    ) -> Result<Executable, InjectorError> {
        let invokable = invokable.into();
        let target = Normalizer::new(self.reflector()).normalize(&invokable)?;
        self.materialize(target)
    }

    /// Build and call an invokable, resolving all of its parameters
    pub fn execute(&self, invokable: impl Into<Invokable>) -> Result<Value, InjectorError> {
        self.execute_with(invokable, &Definition::new())
    }

    /// Build and call an invokable with per-call argument overrides
    pub fn execute_with(
        &self,
        invokable: impl Into<Invokable>,
        overrides: &Definition,
    ) -> Result<Value, InjectorError> {
        let invokable = invokable.into();
        self.transaction(|| {
            let executable = self.build_executable(invokable)?;
            tracing::trace!("Executing '{}'", executable.name());
            executable.call(self, overrides)
        })
    }

    fn materialize(&self, target: Target) -> Result<Executable, InjectorError> {
        match target {
            Target::Function(function) => Ok(Executable {
                name: function.name().to_string(),
                receiver: None,
                signature: function.signature().clone(),
                body: function.body().clone(),
            }),
            Target::Method {
                class_name,
                method,
                receiver,
            } => {
                let receiver = match receiver {
                    Some(object) => Some(object),
                    None if method.is_static() => None,
                    None => Some(self.make(&class_name)?),
                };
                Ok(Executable {
                    name: format!("{}::{}", class_name, method.name()),
                    receiver,
                    signature: method.signature().clone(),
                    body: method.body().clone(),
                })
            }
            Target::Closure(closure) => Ok(Executable {
                name: "{closure}".to_string(),
                receiver: None,
                signature: closure.signature,
                body: closure.body,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_helpers() {
        assert_eq!(strip_parent("parent::execute"), Some("execute"));
        assert_eq!(strip_parent("Parent::execute"), Some("execute"));
        assert_eq!(strip_parent("execute"), None);
        assert_eq!(
            split_parent("app::Child::parent::execute"),
            Some(("app::Child", "execute"))
        );
        assert_eq!(split_parent("app::Child::execute"), None);
    }

    #[test]
    fn test_conversions() {
        assert!(matches!(Invokable::from("app::now"), Invokable::Name(_)));
        assert!(matches!(
            Invokable::from(("app::Clock", "now")),
            Invokable::Method(Receiver::Class(_), _)
        ));
        let object = Object::new("app::Clock", ());
        assert!(matches!(
            Invokable::from((object.clone(), "now")),
            Invokable::Method(Receiver::Object(_), _)
        ));
        assert_eq!(Invokable::from((object, "now")).describe(), "app::Clock->now");
        assert_eq!(
            Invokable::from(Closure::from_fn(|_| Ok(Value::null()))).describe(),
            "{closure}"
        );
    }
}
