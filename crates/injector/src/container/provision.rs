//! Parameter provisioning shared by constructors and invokables
//!
//! Each parameter takes the first value found in this order: per-call
//! override (position, then name), registered definition (position, then
//! name), type hint, untyped fallbacks.

use crate::container::definition::{Argument, Definition};
use crate::container::injector::Injector;
use crate::container::value::{Arguments, Value};
use crate::errors::InjectorError;
use crate::reflection::{Parameter, Signature};

impl Injector {
    /// Resolve every parameter of `signature`
    ///
    /// `definition` is the definition registered for the type being built;
    /// invokables have none.
    pub(crate) fn provision_arguments(
        &self,
        signature: &Signature,
        overrides: &Definition,
        definition: Option<&Definition>,
        owner: &str,
    ) -> Result<Arguments, InjectorError> {
        signature
            .parameters()
            .iter()
            .enumerate()
            .map(|(index, parameter)| {
                self.provision_parameter(index, parameter, overrides, definition, owner)
            })
            .collect()
    }

    fn provision_parameter(
        &self,
        index: usize,
        parameter: &Parameter,
        overrides: &Definition,
        definition: Option<&Definition>,
        owner: &str,
    ) -> Result<Value, InjectorError> {
        for source in std::iter::once(overrides).chain(definition) {
            if let Some(value) = source.positional(index) {
                return Ok(value.clone());
            }
            if let Some(argument) = source.get(parameter.name()) {
                return self.resolve_argument(argument);
            }
        }

        match parameter.type_hint() {
            Some(type_name) => self.provision_typed(parameter, type_name),
            None => self.provision_untyped(parameter, owner),
        }
    }

    fn resolve_argument(&self, argument: &Argument) -> Result<Value, InjectorError> {
        match argument {
            Argument::Raw(value) => Ok(value.clone()),
            Argument::Class(type_name) => self.make(type_name).map(Value::Object),
            Argument::Delegate(invokable) => self.execute(invokable.clone()),
            Argument::Define(type_name, definition) => {
                self.make_with(type_name, definition).map(Value::Object)
            }
        }
    }

    fn provision_typed(
        &self,
        parameter: &Parameter,
        type_name: &str,
    ) -> Result<Value, InjectorError> {
        let chain = self.bindings.resolve_alias(type_name)?;
        let terminal = chain.terminal();
        let delegated = self.bindings.delegate_for(terminal).is_some();

        if let Some(default) = parameter.default() {
            let bound = chain.is_aliased()
                || delegated
                || chain.keys().iter().any(|k| self.bindings.is_shared_key(k));
            return if bound {
                self.make(type_name).map(Value::Object)
            } else {
                Ok(default.clone())
            };
        }

        if delegated || self.bindings.shares.instance(terminal).is_some() {
            return self.make(type_name).map(Value::Object);
        }

        match self.reflector().class(terminal) {
            Some(class) if !class.kind().is_concrete() => {
                if parameter.is_nullable() {
                    Ok(Value::null())
                } else {
                    Err(InjectorError::NeedsDefinition {
                        type_name: class.name().to_string(),
                        parameter: Some(parameter.name().to_string()),
                    })
                }
            }
            // Unknown types fall through so the real load failure surfaces
            _ => self.make(type_name).map(Value::Object),
        }
    }

    fn provision_untyped(
        &self,
        parameter: &Parameter,
        owner: &str,
    ) -> Result<Value, InjectorError> {
        if let Some(value) = self.bindings.param(parameter.name()) {
            return Ok(value.clone());
        }
        if let Some(default) = parameter.default() {
            return Ok(default.clone());
        }
        if parameter.allows_null() {
            return Ok(Value::null());
        }
        Err(InjectorError::UndefinedParam {
            type_name: owner.to_string(),
            parameter: parameter.name().to_string(),
        })
    }
}
