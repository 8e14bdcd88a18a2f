use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::container::key::TypeKey;
use crate::reflection::descriptor::{ClassDescriptor, FunctionDescriptor};
use crate::reflection::Reflector;

/// Memoizing [`Reflector`] wrapper
///
/// Descriptors are immutable for the lifetime of a registered type, so every
/// answer (including "not found") is cached after the first lookup.
pub struct CachingReflector<R> {
    inner: R,
    classes: RefCell<HashMap<TypeKey, Option<Arc<ClassDescriptor>>>>,
    functions: RefCell<HashMap<TypeKey, Option<Arc<FunctionDescriptor>>>>,
    supertypes: RefCell<HashMap<TypeKey, Arc<[TypeKey]>>>,
    misses: Cell<usize>,
}

impl<R: Reflector> CachingReflector<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            classes: RefCell::new(HashMap::new()),
            functions: RefCell::new(HashMap::new()),
            supertypes: RefCell::new(HashMap::new()),
            misses: Cell::new(0),
        }
    }

    /// The wrapped reflector
    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Number of lookups forwarded to the wrapped reflector
    pub fn misses(&self) -> usize {
        self.misses.get()
    }

    /// Drop every cached answer
    pub fn clear(&self) {
        self.classes.borrow_mut().clear();
        self.functions.borrow_mut().clear();
        self.supertypes.borrow_mut().clear();
    }

    fn record_miss(&self, what: &str, key: &TypeKey) {
        self.misses.set(self.misses.get() + 1);
        tracing::trace!("Reflection cache miss for {} '{}'", what, key);
    }
}

impl<R: Reflector> Reflector for CachingReflector<R> {
    fn class(&self, key: &TypeKey) -> Option<Arc<ClassDescriptor>> {
        if let Some(cached) = self.classes.borrow().get(key) {
            return cached.clone();
        }
        self.record_miss("class", key);
        let class = self.inner.class(key);
        self.classes.borrow_mut().insert(key.clone(), class.clone());
        class
    }

    fn function(&self, key: &TypeKey) -> Option<Arc<FunctionDescriptor>> {
        if let Some(cached) = self.functions.borrow().get(key) {
            return cached.clone();
        }
        self.record_miss("function", key);
        let function = self.inner.function(key);
        self.functions
            .borrow_mut()
            .insert(key.clone(), function.clone());
        function
    }

    fn supertypes(&self, key: &TypeKey) -> Vec<TypeKey> {
        if let Some(cached) = self.supertypes.borrow().get(key) {
            return cached.to_vec();
        }
        // Walks through `self.class` so the per-class lookups are cached too
        let walker = SupertypeWalker { cache: self };
        let supertypes = Reflector::supertypes(&walker, key);
        self.supertypes
            .borrow_mut()
            .insert(key.clone(), Arc::from(supertypes.clone()));
        supertypes
    }
}

/// Runs the provided `supertypes` walk against the caching lookups
struct SupertypeWalker<'a, R> {
    cache: &'a CachingReflector<R>,
}

impl<R: Reflector> Reflector for SupertypeWalker<'_, R> {
    fn class(&self, key: &TypeKey) -> Option<Arc<ClassDescriptor>> {
        self.cache.class(key)
    }

    fn function(&self, key: &TypeKey) -> Option<Arc<FunctionDescriptor>> {
        self.cache.function(key)
    }
}

impl<R: fmt::Debug> fmt::Debug for CachingReflector<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachingReflector")
            .field("inner", &self.inner)
            .field("cached_classes", &self.classes.borrow().len())
            .field("cached_functions", &self.functions.borrow().len())
            .field("misses", &self.misses.get())
            .finish()
    }
}
