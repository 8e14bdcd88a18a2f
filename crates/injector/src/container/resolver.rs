use std::cell::RefCell;
use std::collections::HashSet;

use crate::container::bindings::AliasChain;
use crate::container::definition::Definition;
use crate::container::injector::Injector;
use crate::container::invokable::Invokable;
use crate::container::key::TypeKey;
use crate::container::value::{Arguments, Object, Value};
use crate::errors::InjectorError;

/// Types under construction, in the order they were entered
#[derive(Debug, Clone, Default)]
pub struct ResolutionPath {
    entries: Vec<(TypeKey, String)>,
}

impl ResolutionPath {
    /// Create a new resolution path
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a type to the resolution path
    pub fn push(&mut self, key: TypeKey, name: impl Into<String>) {
        self.entries.push((key, name.into()));
    }

    /// Remove the last type from the resolution path
    pub fn pop(&mut self) -> Option<TypeKey> {
        self.entries.pop().map(|(key, _)| key)
    }

    /// Check if the path contains a type (for cycle detection)
    pub fn contains(&self, key: &TypeKey) -> bool {
        self.entries.iter().any(|(entry, _)| entry == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the path as a string for error messages
    pub fn path_string(&self) -> String {
        self.entries
            .iter()
            .map(|(_, name)| name.as_str())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

/// Keeps a type on the resolution path until dropped
pub(crate) struct FrameGuard<'a> {
    frame: &'a RefCell<ResolutionPath>,
}

impl<'a> FrameGuard<'a> {
    pub(crate) fn enter(
        frame: &'a RefCell<ResolutionPath>,
        key: &TypeKey,
        name: &str,
    ) -> Result<Self, InjectorError> {
        let mut path = frame.borrow_mut();
        if path.contains(key) {
            let mut cycle = path.clone();
            cycle.push(key.clone(), name);
            return Err(InjectorError::CyclicDependency {
                type_name: name.to_string(),
                path: cycle.path_string(),
            });
        }
        path.push(key.clone(), name);
        Ok(Self { frame })
    }
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        self.frame.borrow_mut().pop();
    }
}

impl Injector {
    /// Build (or fetch the shared instance of) `name`
    pub fn make(&self, name: &str) -> Result<Object, InjectorError> {
        self.make_with(name, &Definition::new())
    }

    /// Build `name` with per-call overrides for its constructor parameters
    ///
    /// Overrides apply to this constructor only and are ignored when a shared
    /// instance already exists.
    pub fn make_with(&self, name: &str, overrides: &Definition) -> Result<Object, InjectorError> {
        self.transaction(|| self.resolve_instance(name, overrides))
    }

    /// Run `resolve`, discarding the shared instances it cached when it fails
    pub(crate) fn transaction<T>(
        &self,
        resolve: impl FnOnce() -> Result<T, InjectorError>,
    ) -> Result<T, InjectorError> {
        let checkpoint = self.bindings.shares.checkpoint();
        self.depth.set(self.depth.get() + 1);
        let result = resolve();
        self.depth.set(self.depth.get() - 1);

        // Only the outermost transaction may forget what it cached
        match &result {
            Err(_) => self.bindings.shares.rollback(checkpoint),
            Ok(_) if self.depth.get() == 0 => self.bindings.shares.commit(),
            Ok(_) => {}
        }
        result
    }

    fn resolve_instance(
        &self,
        name: &str,
        overrides: &Definition,
    ) -> Result<Object, InjectorError> {
        let chain = self.bindings.resolve_alias(name)?;
        let key = chain.terminal();

        if let Some(instance) = self.bindings.shares.instance(key) {
            tracing::trace!("Returning shared instance of '{}'", chain.name());
            return Ok(instance);
        }

        let _guard = FrameGuard::enter(&self.frame, key, chain.name())?;

        let instance = match self.bindings.delegate_for(key) {
            Some(delegate) => self.build_from_delegate(&chain, delegate)?,
            None => self.build_from_reflection(&chain, overrides)?,
        };

        self.run_preparations(&chain, &instance)?;

        if chain
            .keys()
            .iter()
            .any(|k| self.bindings.is_shared_key(k))
        {
            tracing::debug!("Caching shared instance of '{}'", chain.name());
            self.bindings.shares.store_resolved(key.clone(), instance.clone());
        }

        Ok(instance)
    }

    fn build_from_delegate(
        &self,
        chain: &AliasChain,
        delegate: &Invokable,
    ) -> Result<Object, InjectorError> {
        tracing::debug!(
            "Invoking delegate '{}' for '{}'",
            delegate.describe(),
            chain.name()
        );
        let failure = |source: InjectorError| InjectorError::DelegationFailure {
            type_name: chain.name().to_string(),
            source: Box::new(source),
        };

        match self.execute(delegate.clone()).map_err(failure)? {
            Value::Object(instance) => Ok(instance),
            other => Err(failure(InjectorError::type_mismatch(
                "delegate result",
                "object",
                other.describe(),
            ))),
        }
    }

    fn build_from_reflection(
        &self,
        chain: &AliasChain,
        overrides: &Definition,
    ) -> Result<Object, InjectorError> {
        let key = chain.terminal();
        let class = self
            .reflector()
            .class(key)
            .ok_or_else(|| InjectorError::ClassLoadFailure {
                type_name: chain.name().to_string(),
            })?;

        if !class.is_instantiable() {
            return Err(InjectorError::NeedsDefinition {
                type_name: class.name().to_string(),
                parameter: None,
            });
        }

        let args = match class.constructor_info() {
            Some(constructor) if !constructor.is_public() => {
                return Err(InjectorError::NonPublicConstructor {
                    type_name: class.name().to_string(),
                })
            }
            Some(constructor) => self.provision_arguments(
                constructor.signature(),
                overrides,
                self.bindings.definition(key),
                class.name(),
            )?,
            None => Arguments::default(),
        };

        let instance = class.instantiate(&args)?;
        tracing::debug!("Constructed '{}' with {} argument(s)", class.name(), args.len());
        Ok(instance)
    }

    /// Interface-level preparations first, concrete-level last
    fn run_preparations(&self, chain: &AliasChain, instance: &Object) -> Result<(), InjectorError> {
        if !self.bindings.has_preparations() {
            return Ok(());
        }

        let class_key = instance.class_key();
        let mut keys: Vec<TypeKey> = chain.sources().to_vec();
        keys.extend(self.reflector().supertypes(class_key));
        if chain.terminal() != class_key {
            keys.push(chain.terminal().clone());
        }
        keys.push(class_key.clone());

        let mut seen = HashSet::new();
        for key in keys {
            if !seen.insert(key.clone()) {
                continue;
            }
            for preparation in self.bindings.preparations(&key) {
                preparation(instance, self)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_resolution_path_string() {
        let mut path = ResolutionPath::new();
        path.push(TypeKey::new("app::A"), "app::A");
        path.push(TypeKey::new("app::B"), "app::B");
        assert!(path.contains(&TypeKey::new("APP::A")));
        assert_eq!(path.path_string(), "app::A -> app::B");
        assert_eq!(path.pop(), Some(TypeKey::new("app::B")));
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn test_frame_guard_releases_on_drop() {
        let frame = RefCell::new(ResolutionPath::new());
        let key = TypeKey::new("app::A");
        {
            let _guard = FrameGuard::enter(&frame, &key, "app::A").unwrap();
            let error = FrameGuard::enter(&frame, &key, "app::A").err().unwrap();
            assert_eq!(error.kind(), ErrorKind::CyclicDependency);
            assert!(error.to_string().ends_with("app::A -> app::A"));
        }
        assert!(frame.borrow().is_empty());
    }
}
