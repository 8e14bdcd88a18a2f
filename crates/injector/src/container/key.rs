use std::fmt;

/// Namespace separator used in type names (`app::mail::Mailer`)
pub const NAMESPACE_SEPARATOR: &str = "::";

/// Canonical identifier for a type name
///
/// Two spellings of the same type compare equal: surrounding whitespace and a
/// leading namespace separator are stripped and the name is lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(String);

impl TypeKey {
    /// Normalize a type name into a key
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(normalize(name.as_ref()))
    }

    /// Get the normalized key as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether the key is blank
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Strip whitespace and the leading separator, keeping the original case
pub(crate) fn trim_name(name: &str) -> &str {
    let trimmed = name.trim();
    trimmed
        .strip_prefix(NAMESPACE_SEPARATOR)
        .unwrap_or(trimmed)
}

fn normalize(name: &str) -> String {
    trim_name(name).to_lowercase()
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TypeKey {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&String> for TypeKey {
    fn from(name: &String) -> Self {
        Self::new(name)
    }
}

impl AsRef<str> for TypeKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
