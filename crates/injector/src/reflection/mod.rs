//! Type introspection consumed by the injector
//!
//! Rust has no runtime reflection, so the injector asks a [`Reflector`] for
//! what it needs: whether a type exists, whether it can be instantiated, its
//! constructor signature, its methods and its supertypes. [`TypeRegistry`] is
//! the in-memory implementation fed with [`ClassDescriptor`]s, and
//! [`CachingReflector`] memoizes any reflector.

pub mod cache;
pub mod descriptor;
pub mod registry;

pub use cache::CachingReflector;
pub use descriptor::{
    ClassDescriptor, ClassKind, Constructor, ConstructorSignature, Factory, FunctionDescriptor,
    Method, Parameter, Signature, Visibility, CALL_OPERATOR,
};
pub use registry::TypeRegistry;

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use crate::container::key::TypeKey;

/// Source of class and function metadata
pub trait Reflector {
    /// Look up a class, interface or abstract class
    fn class(&self, key: &TypeKey) -> Option<Arc<ClassDescriptor>>;

    /// Look up a free function
    fn function(&self, key: &TypeKey) -> Option<Arc<FunctionDescriptor>>;

    /// Every parent class and implemented interface of `key`, breadth first
    ///
    /// `key` itself is not included. Unknown supertypes are still reported so
    /// that bindings registered against them apply.
    fn supertypes(&self, key: &TypeKey) -> Vec<TypeKey> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        let mut supertypes = Vec::new();
        seen.insert(key.clone());
        queue.push_back(key.clone());

        while let Some(current) = queue.pop_front() {
            let Some(class) = self.class(&current) else {
                continue;
            };
            let direct = class
                .parent()
                .into_iter()
                .chain(class.interfaces().iter().map(String::as_str));
            for name in direct {
                let supertype = TypeKey::new(name);
                if seen.insert(supertype.clone()) {
                    supertypes.push(supertype.clone());
                    queue.push_back(supertype);
                }
            }
        }

        supertypes
    }

    /// Find a method on `key` or, failing that, on its parent chain
    fn find_method(&self, key: &TypeKey, method: &str) -> Option<descriptor::Method> {
        let mut seen = HashSet::new();
        let mut current = self.class(key);
        while let Some(class) = current {
            if !seen.insert(class.key().clone()) {
                return None;
            }
            if let Some(found) = class.declared_method(method) {
                return Some(found.clone());
            }
            current = class.parent().and_then(|parent| self.class(&TypeKey::new(parent)));
        }
        None
    }
}

impl<R: Reflector + ?Sized> Reflector for Box<R> {
    fn class(&self, key: &TypeKey) -> Option<Arc<ClassDescriptor>> {
        (**self).class(key)
    }

    fn function(&self, key: &TypeKey) -> Option<Arc<FunctionDescriptor>> {
        (**self).function(key)
    }

    fn supertypes(&self, key: &TypeKey) -> Vec<TypeKey> {
        (**self).supertypes(key)
    }

    fn find_method(&self, key: &TypeKey, method: &str) -> Option<descriptor::Method> {
        (**self).find_method(key, method)
    }
}

impl<R: Reflector + ?Sized> Reflector for Arc<R> {
    fn class(&self, key: &TypeKey) -> Option<Arc<ClassDescriptor>> {
        (**self).class(key)
    }

    fn function(&self, key: &TypeKey) -> Option<Arc<FunctionDescriptor>> {
        (**self).function(key)
    }

    fn supertypes(&self, key: &TypeKey) -> Vec<TypeKey> {
        (**self).supertypes(key)
    }

    fn find_method(&self, key: &TypeKey, method: &str) -> Option<descriptor::Method> {
        (**self).find_method(key, method)
    }
}
