use std::collections::HashMap;
use std::sync::Arc;

use crate::container::injectable::Injectable;
use crate::container::key::TypeKey;
use crate::reflection::descriptor::{ClassDescriptor, FunctionDescriptor};
use crate::reflection::Reflector;

/// In-memory [`Reflector`] built from explicit descriptors
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    classes: HashMap<TypeKey, Arc<ClassDescriptor>>,
    functions: HashMap<TypeKey, Arc<FunctionDescriptor>>,
}

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class, replacing any class with the same key
    pub fn register(&mut self, class: ClassDescriptor) -> &mut Self {
        if self.classes.contains_key(class.key()) {
            tracing::warn!("Replacing class descriptor for '{}'", class.name());
        }
        self.classes.insert(class.key().clone(), Arc::new(class));
        self
    }

    /// Register a free function, replacing any function with the same key
    pub fn register_function(&mut self, function: FunctionDescriptor) -> &mut Self {
        self.functions
            .insert(function.key().clone(), Arc::new(function));
        self
    }

    /// Register a type that describes itself
    pub fn add<T: Injectable>(&mut self) -> &mut Self {
        self.register(T::descriptor())
    }

    /// Builder form of [`TypeRegistry::register`]
    pub fn with_class(mut self, class: ClassDescriptor) -> Self {
        self.register(class);
        self
    }

    /// Builder form of [`TypeRegistry::register_function`]
    pub fn with_function(mut self, function: FunctionDescriptor) -> Self {
        self.register_function(function);
        self
    }

    /// Builder form of [`TypeRegistry::add`]
    pub fn with<T: Injectable>(mut self) -> Self {
        self.add::<T>();
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(&TypeKey::new(name))
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.functions.is_empty()
    }
}

impl Reflector for TypeRegistry {
    fn class(&self, key: &TypeKey) -> Option<Arc<ClassDescriptor>> {
        self.classes.get(key).cloned()
    }

    fn function(&self, key: &TypeKey) -> Option<Arc<FunctionDescriptor>> {
        self.functions.get(key).cloned()
    }
}
