use std::collections::{BTreeMap, HashMap};

use crate::container::invokable::Invokable;
use crate::container::value::Value;
use crate::errors::InjectorError;

/// Prefix marking a definition key as a raw value (`":host"`)
pub const RAW_PREFIX: char = ':';

/// Prefix marking a definition key as a delegate name (`"+clock"`)
pub const DELEGATE_PREFIX: char = '+';

/// How a single parameter gets its value
#[derive(Debug, Clone)]
pub enum Argument {
    /// Construct this type and inject the instance
    Class(String),
    /// Inject the value verbatim, never resolving it as a type
    Raw(Value),
    /// Execute the invokable and inject its result
    Delegate(Invokable),
    /// Construct this type using an inline definition
    Define(String, Definition),
}

/// Explicit parameter values for one constructor or invocation
///
/// Definitions registered for a type apply only to that type's own
/// constructor. They are never handed down to its dependencies.
#[derive(Debug, Clone, Default)]
pub struct Definition {
    named: HashMap<String, Argument>,
    positional: BTreeMap<usize, Value>,
}

impl Definition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject an instance of `type_name` into `param`
    pub fn class(mut self, param: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.named
            .insert(param.into(), Argument::Class(type_name.into()));
        self
    }

    /// Inject `value` into `param` verbatim
    pub fn raw(mut self, param: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.insert(param.into(), Argument::Raw(value.into()));
        self
    }

    /// Inject the result of executing `invokable` into `param`
    pub fn delegate(mut self, param: impl Into<String>, invokable: impl Into<Invokable>) -> Self {
        self.named
            .insert(param.into(), Argument::Delegate(invokable.into()));
        self
    }

    /// Inject an instance of `type_name` built with `definition` into `param`
    pub fn define(
        mut self,
        param: impl Into<String>,
        type_name: impl Into<String>,
        definition: Definition,
    ) -> Self {
        self.named
            .insert(param.into(), Argument::Define(type_name.into(), definition));
        self
    }

    /// Inject `value` verbatim at parameter position `index`
    ///
    /// Positional values win over named entries for the same parameter.
    pub fn at(mut self, index: usize, value: impl Into<Value>) -> Self {
        self.positional.insert(index, value.into());
        self
    }

    /// Insert an entry using the prefixed key convention
    ///
    /// `":name"` is a raw value and `"+name"` must be a string naming an
    /// invokable to execute. A bare `"name"` holding a string names the type
    /// to construct; any other bare value is stored raw.
    pub fn insert(&mut self, key: &str, value: Value) -> Result<(), InjectorError> {
        if let Some(param) = key.strip_prefix(RAW_PREFIX) {
            self.named.insert(param.to_string(), Argument::Raw(value));
            return Ok(());
        }

        let (param, argument) = match key.strip_prefix(DELEGATE_PREFIX) {
            Some(param) => {
                let name = value.as_str().ok_or_else(|| {
                    InjectorError::invalid_argument(format!(
                        "delegate '{}' must name an invokable, found {}",
                        key,
                        value.describe()
                    ))
                })?;
                (param, Argument::Delegate(Invokable::from(name)))
            }
            None => match value.as_str() {
                Some(name) => (key, Argument::Class(name.to_string())),
                None => (key, Argument::Raw(value)),
            },
        };
        self.named.insert(param.to_string(), argument);
        Ok(())
    }

    /// Named entry for `param`
    pub fn get(&self, param: &str) -> Option<&Argument> {
        self.named.get(param)
    }

    /// Positional entry for `index`
    pub fn positional(&self, index: usize) -> Option<&Value> {
        self.positional.get(&index)
    }

    pub fn len(&self) -> usize {
        self.named.len() + self.positional.len()
    }

    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.positional.is_empty()
    }

    /// Names of every named entry, sorted
    pub fn params(&self) -> Vec<&str> {
        let mut params: Vec<&str> = self.named.keys().map(String::as_str).collect();
        params.sort_unstable();
        params
    }
}
