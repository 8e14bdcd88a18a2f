use std::fmt;
use thiserror::Error;

/// Machine-checkable tag for every [`InjectorError`] variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NeedsDefinition,
    UndefinedParam,
    CyclicDependency,
    CyclicAlias,
    NonPublicConstructor,
    ClassLoadFailure,
    AliasedCannotShare,
    SharedCannotAlias,
    NonEmptyStringAlias,
    InvalidArgument,
    InvalidDelegate,
    DelegationFailure,
    NotInvokable,
    TypeMismatch,
    Failure,
    Configuration,
}

impl ErrorKind {
    /// Get the kind as a stable snake_case code
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NeedsDefinition => "needs_definition",
            ErrorKind::UndefinedParam => "undefined_param",
            ErrorKind::CyclicDependency => "cyclic_dependency",
            ErrorKind::CyclicAlias => "cyclic_alias",
            ErrorKind::NonPublicConstructor => "non_public_constructor",
            ErrorKind::ClassLoadFailure => "class_load_failure",
            ErrorKind::AliasedCannotShare => "aliased_cannot_share",
            ErrorKind::SharedCannotAlias => "shared_cannot_alias",
            ErrorKind::NonEmptyStringAlias => "non_empty_string_alias",
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::InvalidDelegate => "invalid_delegate",
            ErrorKind::DelegationFailure => "delegation_failure",
            ErrorKind::NotInvokable => "not_invokable",
            ErrorKind::TypeMismatch => "type_mismatch",
            ErrorKind::Failure => "failure",
            ErrorKind::Configuration => "configuration",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for every injector operation
#[derive(Debug, Error)]
pub enum InjectorError {
    #[error(
        "Injection definition required for non-concrete type '{type_name}'{}",
        parameter_suffix(.parameter)
    )]
    NeedsDefinition {
        type_name: String,
        parameter: Option<String>,
    },

    #[error("No definition available to provision parameter '{parameter}' of '{type_name}'")]
    UndefinedParam { type_name: String, parameter: String },

    #[error("Cyclic dependency detected while provisioning '{type_name}': {path}")]
    CyclicDependency { type_name: String, path: String },

    #[error("Cyclic alias detected for '{type_name}': {chain}")]
    CyclicAlias { type_name: String, chain: String },

    #[error("Cannot instantiate '{type_name}': constructor is not public")]
    NonPublicConstructor { type_name: String },

    #[error("Could not load class '{type_name}'")]
    ClassLoadFailure { type_name: String },

    #[error("Cannot share '{type_name}': it is already aliased to '{alias_target}'")]
    AliasedCannotShare {
        type_name: String,
        alias_target: String,
    },

    #[error(
        "Cannot alias '{type_name}' to '{alias_target}': a conflicting shared instance exists"
    )]
    SharedCannotAlias {
        type_name: String,
        alias_target: String,
    },

    #[error("Alias names must be non-empty strings (got '{original}' => '{target}')")]
    NonEmptyStringAlias { original: String, target: String },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Invalid delegate for '{type_name}': {source}")]
    InvalidDelegate {
        type_name: String,
        #[source]
        source: Box<InjectorError>,
    },

    #[error("Delegate for '{type_name}' failed: {source}")]
    DelegationFailure {
        type_name: String,
        #[source]
        source: Box<InjectorError>,
    },

    #[error("Invalid invokable '{target}': {message}")]
    NotInvokable { target: String, message: String },

    #[error("Type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        context: String,
        expected: String,
        found: String,
    },

    #[error("{message}")]
    Failure { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

fn parameter_suffix(parameter: &Option<String>) -> String {
    match parameter {
        Some(name) => format!(" (parameter '{}')", name),
        None => String::new(),
    }
}

impl InjectorError {
    /// Get the machine-checkable kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NeedsDefinition { .. } => ErrorKind::NeedsDefinition,
            Self::UndefinedParam { .. } => ErrorKind::UndefinedParam,
            Self::CyclicDependency { .. } => ErrorKind::CyclicDependency,
            Self::CyclicAlias { .. } => ErrorKind::CyclicAlias,
            Self::NonPublicConstructor { .. } => ErrorKind::NonPublicConstructor,
            Self::ClassLoadFailure { .. } => ErrorKind::ClassLoadFailure,
            Self::AliasedCannotShare { .. } => ErrorKind::AliasedCannotShare,
            Self::SharedCannotAlias { .. } => ErrorKind::SharedCannotAlias,
            Self::NonEmptyStringAlias { .. } => ErrorKind::NonEmptyStringAlias,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::InvalidDelegate { .. } => ErrorKind::InvalidDelegate,
            Self::DelegationFailure { .. } => ErrorKind::DelegationFailure,
            Self::NotInvokable { .. } => ErrorKind::NotInvokable,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::Failure { .. } => ErrorKind::Failure,
            Self::Configuration { .. } | Self::Io(_) | Self::Yaml(_) | Self::Json(_) => {
                ErrorKind::Configuration
            }
        }
    }

    /// Check the kind of this error
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind() == kind
    }

    /// Create an error raised by user code (constructors, methods, closures, preparations)
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a new not-invokable error
    pub fn not_invokable(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotInvokable {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create a new type mismatch error
    pub fn type_mismatch(
        context: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            context: context.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Name of the type the error is about, when there is one
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Self::NeedsDefinition { type_name, .. }
            | Self::UndefinedParam { type_name, .. }
            | Self::CyclicDependency { type_name, .. }
            | Self::CyclicAlias { type_name, .. }
            | Self::NonPublicConstructor { type_name }
            | Self::ClassLoadFailure { type_name }
            | Self::AliasedCannotShare { type_name, .. }
            | Self::SharedCannotAlias { type_name, .. }
            | Self::InvalidDelegate { type_name, .. }
            | Self::DelegationFailure { type_name, .. } => Some(type_name),
            _ => None,
        }
    }

    /// Name of the parameter the error is about, when there is one
    pub fn parameter(&self) -> Option<&str> {
        match self {
            Self::NeedsDefinition { parameter, .. } => parameter.as_deref(),
            Self::UndefinedParam { parameter, .. } => Some(parameter),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_kind_tags() {
        let error = InjectorError::UndefinedParam {
            type_name: "app::Mailer".to_string(),
            parameter: "host".to_string(),
        };
        assert_eq!(error.kind(), ErrorKind::UndefinedParam);
        assert_eq!(error.type_name(), Some("app::Mailer"));
        assert_eq!(error.parameter(), Some("host"));
        assert!(error.is(ErrorKind::UndefinedParam));
    }

    #[test]
    fn test_needs_definition_message() {
        let bare = InjectorError::NeedsDefinition {
            type_name: "app::Transport".to_string(),
            parameter: None,
        };
        assert_eq!(
            bare.to_string(),
            "Injection definition required for non-concrete type 'app::Transport'"
        );

        let scoped = InjectorError::NeedsDefinition {
            type_name: "app::Transport".to_string(),
            parameter: Some("transport".to_string()),
        };
        assert!(scoped.to_string().ends_with("(parameter 'transport')"));
    }

    #[test]
    fn test_delegation_failure_keeps_source() {
        let error = InjectorError::DelegationFailure {
            type_name: "app::Clock".to_string(),
            source: Box::new(InjectorError::failure("clock offline")),
        };
        let source = error.source().expect("source");
        assert_eq!(source.to_string(), "clock offline");
    }

    #[test]
    fn test_configuration_kinds() {
        let io = InjectorError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        assert_eq!(io.kind(), ErrorKind::Configuration);
        assert_eq!(ErrorKind::Configuration.to_string(), "configuration");
    }
}
