use std::cell::{Cell, RefCell};
use std::fmt;
use std::sync::Arc;

use crate::container::bindings::{BindingSummary, Bindings, Preparation};
use crate::container::definition::Definition;
use crate::container::invokable::Invokable;
use crate::container::key::TypeKey;
use crate::container::resolver::ResolutionPath;
use crate::container::value::{Object, Value};
use crate::errors::InjectorError;
use crate::reflection::{CachingReflector, Reflector, TypeRegistry};

/// Reflective dependency injector
///
/// Registration takes `&mut self` and chains; resolution takes `&self` and
/// only touches interior caches, so an `Injector` is meant to be owned by one
/// thread. The instances it builds are `Send + Sync`.
pub struct Injector {
    /// Memoized type metadata
    reflector: Box<dyn Reflector>,
    /// Aliases, shares, definitions, delegates and preparations
    pub(crate) bindings: Bindings,
    /// Types under construction on the current call path
    pub(crate) frame: RefCell<ResolutionPath>,
    /// Nesting of open `make`/`execute` transactions
    pub(crate) depth: Cell<usize>,
}

impl Injector {
    /// Create an injector reading type metadata from `reflector`
    pub fn new<R: Reflector + 'static>(reflector: R) -> Self {
        Self {
            reflector: Box::new(CachingReflector::new(reflector)),
            bindings: Bindings::new(),
            frame: RefCell::new(ResolutionPath::new()),
            depth: Cell::new(0),
        }
    }

    /// Create an injector over an in-memory registry
    pub fn with_registry(registry: TypeRegistry) -> Self {
        Self::new(registry)
    }

    /// Type metadata source
    pub fn reflector(&self) -> &dyn Reflector {
        self.reflector.as_ref()
    }

    /// Registered bindings
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Resolve `original` as `target` from now on
    pub fn alias(&mut self, original: &str, target: &str) -> Result<&mut Self, InjectorError> {
        self.bindings.alias(original, target)?;
        tracing::debug!("Aliased '{}' to '{}'", original, target);
        Ok(self)
    }

    /// Share a type by name, or a ready-made instance
    ///
    /// Sharing a name marks it; the first successful `make` caches the
    /// instance. Instances built before the call are not adopted.
    pub fn share(&mut self, value: impl Into<Value>) -> Result<&mut Self, InjectorError> {
        let key = self.bindings.share(self.reflector.as_ref(), value.into())?;
        tracing::debug!("Shared '{}'", key);
        Ok(self)
    }

    /// Set the constructor definition for a type
    pub fn define(&mut self, name: &str, definition: Definition) -> &mut Self {
        tracing::debug!("Defined {} parameter(s) for '{}'", definition.len(), name);
        self.bindings.define(name, definition);
        self
    }

    /// Set a fallback value for untyped parameters called `name`
    pub fn define_param(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        self.bindings.define_param(name, value.into());
        self
    }

    /// Build `name` by executing `invokable` instead of its constructor
    pub fn delegate(
        &mut self,
        name: &str,
        invokable: impl Into<Invokable>,
    ) -> Result<&mut Self, InjectorError> {
        let invokable = invokable.into();
        let description = invokable.describe();
        self.bindings
            .delegate(self.reflector.as_ref(), name, invokable)?;
        tracing::debug!("Delegated '{}' to '{}'", name, description);
        Ok(self)
    }

    /// Run `preparation` on every instance built as `name` or one of its subtypes
    pub fn prepare<F>(&mut self, name: &str, preparation: F) -> &mut Self
    where
        F: Fn(&Object, &Injector) -> Result<(), InjectorError> + Send + Sync + 'static,
    {
        let preparation: Preparation = Arc::new(preparation);
        self.bindings.prepare(name, preparation);
        self
    }

    /// Check if `name` is shared after alias resolution
    pub fn is_shared(&self, name: &str) -> bool {
        self.bindings
            .resolve_alias(name)
            .map(|chain| chain.keys().iter().any(|k| self.bindings.is_shared_key(k)))
            .unwrap_or(false)
    }

    pub fn has_alias(&self, name: &str) -> bool {
        self.bindings.has_alias_key(&TypeKey::new(name))
    }

    pub fn has_delegate(&self, name: &str) -> bool {
        self.bindings.delegate_for(&TypeKey::new(name)).is_some()
    }

    /// Definition registered for `name`
    pub fn definition_for(&self, name: &str) -> Option<&Definition> {
        self.bindings.definition(&TypeKey::new(name))
    }

    /// Summarize every registered binding
    pub fn inspect(&self) -> BindingSummary {
        self.bindings.summary()
    }
}

impl Default for Injector {
    fn default() -> Self {
        Self::with_registry(TypeRegistry::new())
    }
}

impl fmt::Debug for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("bindings", &self.bindings)
            .field("frame", &self.frame.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::reflection::ClassDescriptor;

    fn injector() -> Injector {
        Injector::with_registry(
            TypeRegistry::new()
                .with_class(ClassDescriptor::interface("app::Transport"))
                .with_class(
                    ClassDescriptor::class("app::Tcp")
                        .implements("app::Transport")
                        .without_constructor(|| ()),
                ),
        )
    }

    #[test]
    fn test_registration_chains() {
        let mut injector = injector();
        injector
            .alias("app::Transport", "app::Tcp")
            .unwrap()
            .define("app::Tcp", Definition::new().raw("port", 25))
            .define_param("retries", 3)
            .prepare("app::Transport", |_, _| Ok(()));

        assert!(injector.has_alias("::app::transport"));
        assert!(injector.definition_for("APP::TCP").is_some());
        let summary = injector.inspect();
        assert_eq!(summary.params, vec!["retries".to_string()]);
        assert_eq!(summary.preparations, vec![TypeKey::new("app::Transport")]);
    }

    #[test]
    fn test_is_shared_follows_aliases() {
        let mut injector = injector();
        injector.alias("app::Transport", "app::Tcp").unwrap();
        injector.share("app::Transport").unwrap();

        assert!(injector.is_shared("app::Transport"));
        assert!(injector.is_shared("app::Tcp"));
        assert!(!injector.is_shared("app::Udp"));
    }

    #[test]
    fn test_share_rejects_numbers() {
        let mut injector = injector();
        let error = injector.share(42).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_delegate_must_normalize() {
        let mut injector = injector();
        let error = injector
            .delegate("app::Tcp", "app::Tcp::build")
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidDelegate);
        assert!(!injector.has_delegate("app::Tcp"));
    }
}
