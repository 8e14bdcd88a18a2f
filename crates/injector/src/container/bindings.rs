use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::container::definition::Definition;
use crate::container::injector::Injector;
use crate::container::invokable::{Invokable, Normalizer};
use crate::container::key::{trim_name, TypeKey};
use crate::container::value::{Object, Value};
use crate::errors::InjectorError;
use crate::reflection::Reflector;

/// Post-construction mutator
pub type Preparation = Arc<dyn Fn(&Object, &Injector) -> Result<(), InjectorError> + Send + Sync>;

/// Result of following an alias chain
///
/// `keys[0]` is the requested key and the last entry is the terminal key.
#[derive(Debug, Clone)]
pub(crate) struct AliasChain {
    keys: Vec<TypeKey>,
    names: Vec<String>,
}

impl AliasChain {
    /// Terminal key to build
    pub(crate) fn terminal(&self) -> &TypeKey {
        self.keys.last().unwrap_or(&self.keys[0])
    }

    /// Terminal name as it was registered
    pub(crate) fn name(&self) -> &str {
        self.names.last().map(String::as_str).unwrap_or_default()
    }

    /// Name that was requested
    pub(crate) fn requested(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or_default()
    }

    pub(crate) fn is_aliased(&self) -> bool {
        self.keys.len() > 1
    }

    /// Every key traversed before the terminal
    pub(crate) fn sources(&self) -> &[TypeKey] {
        &self.keys[..self.keys.len() - 1]
    }

    pub(crate) fn keys(&self) -> &[TypeKey] {
        &self.keys
    }
}

/// Shared markers and their cached instances
#[derive(Debug, Clone, Default)]
pub(crate) struct ShareSet {
    entries: RefCell<HashMap<TypeKey, Option<Object>>>,
    /// Keys cached by the resolution in progress, oldest first
    journal: RefCell<Vec<TypeKey>>,
}

impl ShareSet {
    /// Mark `key` shared, keeping any cached instance
    pub(crate) fn mark(&self, key: TypeKey) {
        self.entries.borrow_mut().entry(key).or_insert(None);
    }

    pub(crate) fn store(&self, key: TypeKey, instance: Object) {
        self.entries.borrow_mut().insert(key, Some(instance));
    }

    /// Cache an instance built during resolution, so it can be rolled back
    pub(crate) fn store_resolved(&self, key: TypeKey, instance: Object) {
        self.journal.borrow_mut().push(key.clone());
        self.store(key, instance);
    }

    pub(crate) fn checkpoint(&self) -> usize {
        self.journal.borrow().len()
    }

    /// Drop every instance cached since `checkpoint`, keeping the share markers
    pub(crate) fn rollback(&self, checkpoint: usize) {
        let discarded = self.journal.borrow_mut().split_off(checkpoint);
        let mut entries = self.entries.borrow_mut();
        for key in discarded {
            tracing::debug!("Discarding shared instance of '{}' after failed resolution", key);
            if let Some(entry) = entries.get_mut(&key) {
                *entry = None;
            }
        }
    }

    /// Forget the journal once the outermost resolution succeeded
    pub(crate) fn commit(&self) {
        self.journal.borrow_mut().clear();
    }

    pub(crate) fn is_shared(&self, key: &TypeKey) -> bool {
        self.entries.borrow().contains_key(key)
    }

    pub(crate) fn instance(&self, key: &TypeKey) -> Option<Object> {
        self.entries.borrow().get(key).cloned().flatten()
    }

    /// Remove the marker and return the cached instance, if any
    pub(crate) fn take(&self, key: &TypeKey) -> Option<Option<Object>> {
        self.entries.borrow_mut().remove(key)
    }

    fn keys(&self) -> Vec<TypeKey> {
        self.entries.borrow().keys().cloned().collect()
    }

    fn instance_count(&self) -> usize {
        self.entries.borrow().values().filter(|v| v.is_some()).count()
    }
}

/// Registered configuration consulted by the resolver
#[derive(Clone, Default)]
pub struct Bindings {
    aliases: HashMap<TypeKey, String>,
    pub(crate) shares: ShareSet,
    definitions: HashMap<TypeKey, Definition>,
    params: HashMap<String, Value>,
    delegates: HashMap<TypeKey, Invokable>,
    preparations: HashMap<TypeKey, Vec<Preparation>>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Follow the alias chain starting at `name`
    pub(crate) fn resolve_alias(&self, name: &str) -> Result<AliasChain, InjectorError> {
        let mut current = trim_name(name).to_string();
        let mut key = TypeKey::new(&current);
        let mut seen = HashSet::from([key.clone()]);
        let mut chain = AliasChain {
            keys: vec![key.clone()],
            names: vec![current.clone()],
        };

        while let Some(target) = self.aliases.get(&key) {
            current = trim_name(target).to_string();
            key = TypeKey::new(&current);
            chain.names.push(current.clone());
            if !seen.insert(key.clone()) {
                return Err(InjectorError::CyclicAlias {
                    type_name: chain.requested().to_string(),
                    chain: chain.names.join(" -> "),
                });
            }
            chain.keys.push(key.clone());
        }

        Ok(chain)
    }

    /// Register `original` as an alias of `target`
    pub(crate) fn alias(&mut self, original: &str, target: &str) -> Result<(), InjectorError> {
        let original_name = trim_name(original);
        let target_name = trim_name(target);
        if original_name.is_empty() || target_name.is_empty() {
            return Err(InjectorError::NonEmptyStringAlias {
                original: original.to_string(),
                target: target.to_string(),
            });
        }

        let original_key = TypeKey::new(original_name);
        let terminal = self.resolve_alias(target_name)?;

        if let Some(instance) = self.shares.instance(&original_key) {
            // The terminal keeps one instance; a different cached one conflicts
            let conflicting = self
                .shares
                .instance(terminal.terminal())
                .is_some_and(|existing| !existing.same(&instance));
            if instance.class_key() != terminal.terminal() || conflicting {
                return Err(InjectorError::SharedCannotAlias {
                    type_name: original_name.to_string(),
                    alias_target: target_name.to_string(),
                });
            }
        }

        // Markers and instances follow the alias to its terminal
        if let Some(entry) = self.shares.take(&original_key) {
            match entry {
                Some(instance) => self.shares.store(terminal.terminal().clone(), instance),
                None => self.shares.mark(terminal.terminal().clone()),
            }
        }

        if let Some(previous) = self.aliases.get(&original_key) {
            tracing::warn!(
                "Overwriting alias '{}' => '{}' with '{}'",
                original_name,
                previous,
                target_name
            );
        }
        self.aliases.insert(original_key, target_name.to_string());
        Ok(())
    }

    /// Share by type name or by instance
    pub(crate) fn share(
        &mut self,
        reflector: &dyn Reflector,
        value: Value,
    ) -> Result<TypeKey, InjectorError> {
        match value {
            Value::Object(object) => self.share_instance(object),
            Value::Literal(literal) => {
                let name = literal.as_str().map(trim_name).unwrap_or_default();
                if name.is_empty() {
                    return Err(InjectorError::invalid_argument(format!(
                        "share expects a non-empty type name or an object, got {}",
                        literal
                    )));
                }
                self.share_class(reflector, name)
            }
        }
    }

    fn share_class(
        &mut self,
        reflector: &dyn Reflector,
        name: &str,
    ) -> Result<TypeKey, InjectorError> {
        let chain = self.resolve_alias(name)?;
        let key = TypeKey::new(name);
        if chain.is_aliased() && reflector.class(&key).is_some_and(|c| c.kind().is_concrete()) {
            return Err(InjectorError::AliasedCannotShare {
                type_name: name.to_string(),
                alias_target: chain.name().to_string(),
            });
        }
        self.shares.mark(chain.terminal().clone());
        Ok(chain.terminal().clone())
    }

    fn share_instance(&mut self, object: Object) -> Result<TypeKey, InjectorError> {
        let key = object.class_key().clone();
        if let Some(target) = self.aliases.get(&key) {
            return Err(InjectorError::AliasedCannotShare {
                type_name: object.class_name().to_string(),
                alias_target: target.clone(),
            });
        }
        self.shares.store(key.clone(), object);
        Ok(key)
    }

    pub(crate) fn define(&mut self, name: &str, definition: Definition) {
        let key = TypeKey::new(name);
        if self.definitions.contains_key(&key) {
            tracing::warn!("Overwriting definition for '{}'", trim_name(name));
        }
        self.definitions.insert(key, definition);
    }

    pub(crate) fn define_param(&mut self, name: &str, value: Value) {
        self.params.insert(name.to_string(), value);
    }

    /// Register a delegate after checking it normalizes
    pub(crate) fn delegate(
        &mut self,
        reflector: &dyn Reflector,
        name: &str,
        invokable: Invokable,
    ) -> Result<(), InjectorError> {
        Normalizer::new(reflector)
            .normalize(&invokable)
            .map_err(|source| InjectorError::InvalidDelegate {
                type_name: trim_name(name).to_string(),
                source: Box::new(source),
            })?;
        self.delegates.insert(TypeKey::new(name), invokable);
        Ok(())
    }

    pub(crate) fn prepare(&mut self, name: &str, preparation: Preparation) {
        self.preparations
            .entry(TypeKey::new(name))
            .or_default()
            .push(preparation);
    }

    pub(crate) fn definition(&self, key: &TypeKey) -> Option<&Definition> {
        self.definitions.get(key)
    }

    pub(crate) fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    pub(crate) fn delegate_for(&self, key: &TypeKey) -> Option<&Invokable> {
        self.delegates.get(key)
    }

    pub(crate) fn preparations(&self, key: &TypeKey) -> &[Preparation] {
        self.preparations.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub(crate) fn has_preparations(&self) -> bool {
        !self.preparations.is_empty()
    }

    pub(crate) fn is_shared_key(&self, key: &TypeKey) -> bool {
        self.shares.is_shared(key)
    }

    pub(crate) fn has_alias_key(&self, key: &TypeKey) -> bool {
        self.aliases.contains_key(key)
    }

    /// Snapshot of what is registered
    pub fn summary(&self) -> BindingSummary {
        BindingSummary {
            aliases: sorted(self.aliases.keys().cloned()),
            shares: sorted(self.shares.keys().into_iter()),
            shared_instances: self.shares.instance_count(),
            definitions: sorted(self.definitions.keys().cloned()),
            params: {
                let mut params: Vec<String> = self.params.keys().cloned().collect();
                params.sort();
                params
            },
            delegates: sorted(self.delegates.keys().cloned()),
            preparations: sorted(self.preparations.keys().cloned()),
        }
    }
}

fn sorted(keys: impl Iterator<Item = TypeKey>) -> Vec<TypeKey> {
    let mut keys: Vec<TypeKey> = keys.collect();
    keys.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    keys
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bindings")
            .field("aliases", &self.aliases)
            .field("shares", &self.shares)
            .field("definitions", &self.definitions)
            .field("params", &self.params)
            .field("delegates", &self.delegates)
            .field("preparations", &self.preparations.len())
            .finish()
    }
}

/// Diagnostic view of the registered bindings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindingSummary {
    pub aliases: Vec<TypeKey>,
    pub shares: Vec<TypeKey>,
    pub shared_instances: usize,
    pub definitions: Vec<TypeKey>,
    pub params: Vec<String>,
    pub delegates: Vec<TypeKey>,
    pub preparations: Vec<TypeKey>,
}

impl BindingSummary {
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
            && self.shares.is_empty()
            && self.definitions.is_empty()
            && self.params.is_empty()
            && self.delegates.is_empty()
            && self.preparations.is_empty()
    }
}

impl fmt::Display for BindingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Bindings:")?;
        writeln!(f, "  aliases: {}", self.aliases.len())?;
        writeln!(
            f,
            "  shares: {} ({} instantiated)",
            self.shares.len(),
            self.shared_instances
        )?;
        writeln!(f, "  definitions: {}", self.definitions.len())?;
        writeln!(f, "  params: {}", self.params.len())?;
        writeln!(f, "  delegates: {}", self.delegates.len())?;
        write!(f, "  preparations: {}", self.preparations.len())
    }
}
