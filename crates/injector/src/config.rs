//! Declarative bindings manifest
//!
//! ```yaml
//! aliases:
//!   app::Mailer: app::SmtpMailer
//! shares:
//!   - app::Database
//! definitions:
//!   app::SmtpMailer:
//!     ":host": localhost
//!     transport: app::Tcp
//! params:
//!   retries: 3
//! delegates:
//!   app::Clock: app::ClockFactory
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::container::definition::{Definition, DELEGATE_PREFIX, RAW_PREFIX};
use crate::container::injector::Injector;
use crate::container::invokable::Invokable;
use crate::container::value::Value;
use crate::errors::InjectorError;

/// Bindings loaded from YAML or JSON
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InjectorConfig {
    /// Original type name to target type name
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    /// Type names to share
    #[serde(default)]
    pub shares: Vec<String>,
    /// Per-type constructor definitions using prefixed parameter keys
    #[serde(default)]
    pub definitions: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
    /// Fallback values for untyped parameters
    #[serde(default)]
    pub params: BTreeMap<String, serde_json::Value>,
    /// Type name to the name of the invokable that builds it
    #[serde(default)]
    pub delegates: BTreeMap<String, String>,
}

impl InjectorConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, InjectorError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self, InjectorError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a manifest, picking the format from the file extension
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, InjectorError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");

        match extension.to_lowercase().as_str() {
            "json" => Self::from_json_str(&content),
            "yaml" | "yml" => Self::from_yaml_str(&content),
            other => Err(InjectorError::configuration(format!(
                "Unsupported manifest format '{}' for {}",
                other,
                path.display()
            ))),
        }
    }

    pub fn to_yaml(&self) -> Result<String, InjectorError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn to_json(&self) -> Result<String, InjectorError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
            && self.shares.is_empty()
            && self.definitions.is_empty()
            && self.params.is_empty()
            && self.delegates.is_empty()
    }

    /// Check names and definition entries before anything is applied
    pub fn validate(&self) -> Result<(), InjectorError> {
        for (original, target) in &self.aliases {
            require_name("alias", original)?;
            require_name(&format!("alias target for '{}'", original), target)?;
        }

        for name in &self.shares {
            require_name("shared type", name)?;
        }

        for (type_name, entries) in &self.definitions {
            require_name("defined type", type_name)?;
            for (key, value) in entries {
                validate_definition_entry(type_name, key, value)?;
            }
        }

        for name in self.params.keys() {
            require_name("param", name)?;
        }

        for (type_name, target) in &self.delegates {
            require_name("delegated type", type_name)?;
            require_name(&format!("delegate for '{}'", type_name), target)?;
        }

        Ok(())
    }

    /// Build the [`Definition`] for one entry of `definitions`
    pub fn definition(
        entries: &BTreeMap<String, serde_json::Value>,
    ) -> Result<Definition, InjectorError> {
        let mut definition = Definition::new();
        for (key, value) in entries {
            definition.insert(key, Value::Literal(value.clone()))?;
        }
        Ok(definition)
    }
}

fn require_name(what: &str, name: &str) -> Result<(), InjectorError> {
    if name.trim().is_empty() {
        return Err(InjectorError::configuration(format!(
            "{} name must not be blank",
            what
        )));
    }
    Ok(())
}

fn validate_definition_entry(
    type_name: &str,
    key: &str,
    value: &serde_json::Value,
) -> Result<(), InjectorError> {
    if let Some(param) = key.strip_prefix(RAW_PREFIX) {
        return require_name(&format!("parameter of '{}'", type_name), param);
    }

    let param = key.strip_prefix(DELEGATE_PREFIX).unwrap_or(key);
    require_name(&format!("parameter of '{}'", type_name), param)?;
    match value.as_str() {
        Some(name) if !name.trim().is_empty() => Ok(()),
        _ => Err(InjectorError::configuration(format!(
            "definition '{}' of '{}' must name a type or invokable \
             (prefix the key with '{}' for raw values)",
            key, type_name, RAW_PREFIX
        ))),
    }
}

impl Injector {
    /// Validate `config` and apply it: aliases, shares, definitions, params, delegates
    ///
    /// Either every entry is applied or, on the first error, none is.
    pub fn configure(&mut self, config: &InjectorConfig) -> Result<&mut Self, InjectorError> {
        config.validate()?;

        let snapshot = self.bindings.clone();
        if let Err(error) = self.apply(config) {
            tracing::debug!("Manifest rejected, restoring previous bindings: {}", error);
            self.bindings = snapshot;
            return Err(error);
        }

        tracing::debug!(
            "Applied manifest: {} alias(es), {} share(s), {} definition(s), {} param(s), \
             {} delegate(s)",
            config.aliases.len(),
            config.shares.len(),
            config.definitions.len(),
            config.params.len(),
            config.delegates.len()
        );
        Ok(self)
    }

    fn apply(&mut self, config: &InjectorConfig) -> Result<(), InjectorError> {
        for (original, target) in &config.aliases {
            self.alias(original, target)?;
        }
        for name in &config.shares {
            self.share(name.as_str())?;
        }
        for (type_name, entries) in &config.definitions {
            self.define(type_name, InjectorConfig::definition(entries)?);
        }
        for (name, value) in &config.params {
            self.define_param(name, Value::Literal(value.clone()));
        }
        for (type_name, target) in &config.delegates {
            self.delegate(type_name, Invokable::from(target.as_str()))?;
        }
        Ok(())
    }
}
