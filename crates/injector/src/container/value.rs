use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::container::key::{trim_name, TypeKey};
use crate::errors::InjectorError;

/// Literal values injected verbatim (strings, numbers, arrays, maps, null)
pub type Literal = serde_json::Value;

/// A constructed instance tagged with the class it was built as
///
/// Cloning an `Object` clones the handle, not the instance: clones share
/// identity, which is what shared (singleton) resolution hands out.
#[derive(Clone)]
pub struct Object {
    class_name: Arc<str>,
    class_key: TypeKey,
    instance: Arc<dyn Any + Send + Sync>,
}

impl Object {
    /// Wrap a value as an instance of `class_name`
    pub fn new<T: Any + Send + Sync>(class_name: impl AsRef<str>, value: T) -> Self {
        Self::from_arc(class_name, Arc::new(value))
    }

    /// Wrap an already shared instance
    pub fn from_arc(class_name: impl AsRef<str>, instance: Arc<dyn Any + Send + Sync>) -> Self {
        let class_name = trim_name(class_name.as_ref());
        Self {
            class_key: TypeKey::new(class_name),
            class_name: Arc::from(class_name),
            instance,
        }
    }

    /// Class name as it was spelled when the object was built
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Normalized class key
    pub fn class_key(&self) -> &TypeKey {
        &self.class_key
    }

    /// Check the class of this object
    pub fn is_instance_of(&self, class_name: &str) -> bool {
        self.class_key == TypeKey::new(class_name)
    }

    /// Check the Rust type behind this object
    pub fn is<T: Any>(&self) -> bool {
        self.instance.is::<T>()
    }

    /// Borrow the instance as a concrete Rust type
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.instance.downcast_ref::<T>()
    }

    /// Get a shared handle to the instance as a concrete Rust type
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.instance.clone().downcast::<T>().ok()
    }

    /// Like [`Object::downcast`], failing with a `TypeMismatch` error
    pub fn expect_type<T: Any + Send + Sync>(&self) -> Result<Arc<T>, InjectorError> {
        self.downcast::<T>().ok_or_else(|| {
            InjectorError::type_mismatch(
                format!("object of class '{}'", self.class_name),
                std::any::type_name::<T>(),
                "a different Rust type",
            )
        })
    }

    /// Identity comparison: both handles point at the same instance
    pub fn same(&self, other: &Object) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.instance) as *const (),
            Arc::as_ptr(&other.instance) as *const (),
        )
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("class", &self.class_name)
            .field("instance", &(Arc::as_ptr(&self.instance) as *const ()))
            .finish()
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

/// Anything the injector can inject, return or pass as an argument
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Plain data injected verbatim
    Literal(Literal),
    /// A constructed instance
    Object(Object),
}

impl Value {
    /// The null value
    pub fn null() -> Self {
        Value::Literal(Literal::Null)
    }

    /// Check for null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Literal(Literal::Null))
    }

    /// Borrow the object, if this is one
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            Value::Literal(_) => None,
        }
    }

    /// Take the object, if this is one
    pub fn into_object(self) -> Option<Object> {
        match self {
            Value::Object(object) => Some(object),
            Value::Literal(_) => None,
        }
    }

    /// Borrow the literal, if this is one
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Value::Literal(literal) => Some(literal),
            Value::Object(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_literal().and_then(Literal::as_str)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_literal().and_then(Literal::as_i64)
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_literal().and_then(Literal::as_f64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_literal().and_then(Literal::as_bool)
    }

    /// Get a shared handle to the object as a concrete Rust type
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.as_object().and_then(Object::downcast::<T>)
    }

    /// Short description of what kind of value this is, for error messages
    pub fn describe(&self) -> String {
        match self {
            Value::Object(object) => format!("object '{}'", object.class_name()),
            Value::Literal(Literal::Null) => "null".to_string(),
            Value::Literal(Literal::Bool(_)) => "bool".to_string(),
            Value::Literal(Literal::Number(_)) => "number".to_string(),
            Value::Literal(Literal::String(_)) => "string".to_string(),
            Value::Literal(Literal::Array(_)) => "array".to_string(),
            Value::Literal(Literal::Object(_)) => "map".to_string(),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::null()
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Value::Object(object)
    }
}

impl From<Literal> for Value {
    fn from(literal: Literal) -> Self {
        Value::Literal(literal)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Literal(Literal::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Literal(Literal::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Literal(Literal::from(value))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Literal(Literal::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Literal(Literal::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Literal(Literal::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Literal(Literal::from(value))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

/// Resolved arguments, in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: Vec<Value>,
}

impl Arguments {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.values
    }

    /// Get the argument at `index`, failing when it is missing
    pub fn value(&self, index: usize) -> Result<&Value, InjectorError> {
        self.values.get(index).ok_or_else(|| {
            InjectorError::type_mismatch(format!("argument #{}", index), "a value", "nothing")
        })
    }

    /// Get the object argument at `index` as a concrete Rust type
    pub fn object<T: Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>, InjectorError> {
        let value = self.value(index)?;
        value.downcast::<T>().ok_or_else(|| {
            InjectorError::type_mismatch(
                format!("argument #{}", index),
                std::any::type_name::<T>(),
                value.describe(),
            )
        })
    }

    /// Like [`Arguments::object`], mapping null to `None`
    pub fn optional_object<T: Any + Send + Sync>(
        &self,
        index: usize,
    ) -> Result<Option<Arc<T>>, InjectorError> {
        match self.values.get(index) {
            None => Ok(None),
            Some(value) if value.is_null() => Ok(None),
            Some(_) => self.object::<T>(index).map(Some),
        }
    }

    pub fn str(&self, index: usize) -> Result<&str, InjectorError> {
        let value = self.value(index)?;
        value.as_str().ok_or_else(|| mismatch(index, "string", value))
    }

    pub fn i64(&self, index: usize) -> Result<i64, InjectorError> {
        let value = self.value(index)?;
        value.as_i64().ok_or_else(|| mismatch(index, "integer", value))
    }

    pub fn f64(&self, index: usize) -> Result<f64, InjectorError> {
        let value = self.value(index)?;
        value.as_f64().ok_or_else(|| mismatch(index, "float", value))
    }

    pub fn bool(&self, index: usize) -> Result<bool, InjectorError> {
        let value = self.value(index)?;
        value.as_bool().ok_or_else(|| mismatch(index, "bool", value))
    }
}

fn mismatch(index: usize, expected: &str, found: &Value) -> InjectorError {
    InjectorError::type_mismatch(format!("argument #{}", index), expected, found.describe())
}

impl From<Vec<Value>> for Arguments {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

impl FromIterator<Value> for Arguments {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for Arguments {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}
