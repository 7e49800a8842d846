//! Syntactic validation of local names, namespace prefixes and URIs.
//!
//! All checks are pure. Identity names are otherwise free-form: the rules
//! only exclude characters that would break prefixed-name parsing or the
//! exported documents.

use std::fmt;

use crate::error::ValidationError;

/// Characters that are never allowed in a local name.
const LOCAL_NAME_FORBIDDEN: &[char] = &[':', '<', '>'];

/// Characters that are never allowed in a namespace prefix.
const PREFIX_FORBIDDEN: &[char] = &['/', '\\', ':'];

fn reject_blank(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(())
}

fn reject_chars(
    field: &'static str,
    value: &str,
    forbidden: impl Fn(char) -> bool,
) -> Result<(), ValidationError> {
    match value.chars().find(|&c| forbidden(c)) {
        Some(ch) => Err(ValidationError::IllegalCharacter {
            field,
            value: value.to_owned(),
            ch,
        }),
        None => Ok(()),
    }
}

/// Validates a model, class or property local name.
///
/// # Errors
///
/// Returns [`ValidationError::Empty`] for an empty or blank name and
/// [`ValidationError::IllegalCharacter`] for `:`, whitespace, `<` or `>`.
pub fn validate_local_name(field: &'static str, name: &str) -> Result<(), ValidationError> {
    reject_blank(field, name)?;
    reject_chars(field, name, |c| {
        c.is_whitespace() || LOCAL_NAME_FORBIDDEN.contains(&c)
    })
}

/// Validates a namespace prefix.
///
/// # Errors
///
/// Returns [`ValidationError::Empty`] for an empty prefix and
/// [`ValidationError::IllegalCharacter`] for whitespace, path separators
/// or `:`.
pub fn validate_prefix(prefix: &str) -> Result<(), ValidationError> {
    reject_blank("namespacePrefix", prefix)?;
    reject_chars("namespacePrefix", prefix, |c| {
        c.is_whitespace() || PREFIX_FORBIDDEN.contains(&c)
    })
}

/// Validates a namespace URI.
///
/// # Errors
///
/// Returns [`ValidationError::Empty`] for an empty URI and
/// [`ValidationError::IllegalCharacter`] for whitespace or `\`.
pub fn validate_uri(uri: &str) -> Result<(), ValidationError> {
    reject_blank("namespaceUri", uri)?;
    reject_chars("namespaceUri", uri, |c| c.is_whitespace() || c == '\\')
}

/// A `prefix:localName` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    /// Namespace prefix.
    pub prefix: String,
    /// Local name within the namespace.
    pub local: String,
}

impl QualifiedName {
    /// Builds a qualified name from its parts without validation.
    #[must_use]
    pub fn new(prefix: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            local: local.into(),
        }
    }

    /// Parses `prefix:local`. Both halves must be non-empty and the local
    /// half must not contain another `:`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MalformedQualifiedName`] otherwise.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let malformed = || ValidationError::MalformedQualifiedName(s.to_owned());
        let (prefix, local) = s.split_once(':').ok_or_else(malformed)?;
        if prefix.trim().is_empty() || local.trim().is_empty() || local.contains(':') {
            return Err(malformed());
        }
        Ok(Self::new(prefix, local))
    }

    /// Returns true if `s` contains a prefix separator.
    #[must_use]
    pub fn is_qualified(s: &str) -> bool {
        s.contains(':')
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.prefix, self.local)
    }
}
