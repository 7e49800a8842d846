//! Core catalog model types.
//!
//! These types describe the built-in content model vocabulary as typed Rust
//! data: namespaces, built-in classes (types and aspects) and property data
//! types. All instances are built as owned `Vec`s of `'static` records. The
//! top-level entry point is [`Catalog::standard()`](crate::Catalog::standard).

use std::fmt;

/// The two disjoint kinds of class definition.
///
/// A type's parent must be a type and an aspect's parent must be an aspect;
/// a type and an aspect never share a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ClassKind {
    /// A primary content type (`cm:content`, `cm:folder`, ...).
    Type,
    /// A mix-in that can be applied to content of any type (`cm:titled`, ...).
    Aspect,
}

impl ClassKind {
    /// Returns the lowercase name used in messages and exports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ClassKind::Type => "type",
            ClassKind::Aspect => "aspect",
        }
    }
}

impl fmt::Display for ClassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a literal default value is checked against a data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueCheck {
    /// Any string is accepted (text, references, locales, ...).
    Any,
    /// A signed 64-bit integer literal.
    Integer,
    /// A floating point literal.
    Float,
    /// `true` or `false`, case-insensitive.
    Boolean,
    /// An ISO-8601 calendar date (`2024-01-31`).
    Date,
    /// An RFC 3339 timestamp, or a local ISO-8601 date-time without offset.
    DateTime,
}

impl ValueCheck {
    /// Returns true if `value` is a well-formed literal for this check.
    #[must_use]
    pub fn accepts(self, value: &str) -> bool {
        let value = value.trim();
        match self {
            ValueCheck::Any => true,
            ValueCheck::Integer => value.parse::<i64>().is_ok(),
            ValueCheck::Float => value.parse::<f64>().is_ok(),
            ValueCheck::Boolean => {
                value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false")
            }
            ValueCheck::Date => chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok(),
            ValueCheck::DateTime => {
                chrono::DateTime::parse_from_rfc3339(value).is_ok()
                    || chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                        .is_ok()
            }
        }
    }
}

/// A built-in namespace (e.g., `cm`, `sys`, `d`).
#[derive(Debug, Clone)]
pub struct Namespace {
    /// The prefix used in prefixed names (e.g., `"cm"`).
    pub prefix: &'static str,
    /// The full namespace URI.
    pub uri: &'static str,
    /// Human-readable label.
    pub label: &'static str,
    /// Description of the namespace.
    pub comment: &'static str,
}

/// A built-in type or aspect definition.
#[derive(Debug, Clone)]
pub struct BuiltinClass {
    /// Local name within the namespace (e.g., `"content"`).
    pub name: &'static str,
    /// Type or aspect.
    pub kind: ClassKind,
    /// Prefixed name of the parent class, if any (e.g., `"cm:cmobject"`).
    pub parent: Option<&'static str>,
    /// Human-readable label.
    pub label: &'static str,
    /// Description.
    pub comment: &'static str,
}

/// A property data type (e.g., `d:text`).
#[derive(Debug, Clone)]
pub struct DataType {
    /// Local name within the namespace (e.g., `"text"`).
    pub name: &'static str,
    /// Human-readable label.
    pub label: &'static str,
    /// How default values of this type are checked.
    pub check: ValueCheck,
}

/// A complete namespace module: namespace metadata + classes + data types.
#[derive(Debug, Clone)]
pub struct NamespaceModule {
    /// Namespace metadata.
    pub namespace: Namespace,
    /// All built-in types and aspects defined in this namespace.
    pub classes: Vec<BuiltinClass>,
    /// All property data types defined in this namespace.
    pub data_types: Vec<DataType>,
}

/// An owned `(uri, prefix)` pair handed out by a catalog oracle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespaceBinding {
    /// Namespace URI.
    pub uri: String,
    /// Namespace prefix.
    pub prefix: String,
}

/// The complete built-in catalog.
#[derive(Debug)]
pub struct Catalog {
    /// Catalog version (e.g., `"1.0"`).
    pub version: &'static str,
    /// All namespace modules in dependency order.
    pub modules: Vec<NamespaceModule>,
}

impl Catalog {
    /// Looks up a namespace module by its prefix. Returns `None` if not found.
    #[must_use]
    pub fn module_by_prefix(&self, prefix: &str) -> Option<&NamespaceModule> {
        self.modules.iter().find(|m| m.namespace.prefix == prefix)
    }

    /// Looks up a namespace module by its URI. Returns `None` if not found.
    #[must_use]
    pub fn module_by_uri(&self, uri: &str) -> Option<&NamespaceModule> {
        self.modules.iter().find(|m| m.namespace.uri == uri)
    }

    /// Looks up a built-in class by prefix and local name.
    #[must_use]
    pub fn find_class(&self, prefix: &str, local: &str) -> Option<&BuiltinClass> {
        self.module_by_prefix(prefix)?
            .classes
            .iter()
            .find(|c| c.name == local)
    }

    /// Looks up a data type by prefix and local name.
    #[must_use]
    pub fn find_data_type(&self, prefix: &str, local: &str) -> Option<&DataType> {
        self.module_by_prefix(prefix)?
            .data_types
            .iter()
            .find(|d| d.name == local)
    }

    /// Returns the total number of built-in classes across all namespaces.
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.modules.iter().map(|m| m.classes.len()).sum()
    }

    /// Returns the total number of data types across all namespaces.
    #[must_use]
    pub fn data_type_count(&self) -> usize {
        self.modules.iter().map(|m| m.data_types.len()).sum()
    }
}

/// Standard namespace URI constants used across all namespace modules.
pub mod uris {
    /// System model namespace.
    pub const NS_SYS: &str = "http://www.alfresco.org/model/system/1.0";
    /// Content model namespace.
    pub const NS_CM: &str = "http://www.alfresco.org/model/content/1.0";
    /// Dictionary (data type) namespace.
    pub const NS_D: &str = "http://www.alfresco.org/model/dictionary/1.0";

    /// Prefixed name of the default property data type.
    pub const D_TEXT: &str = "d:text";
    /// Prefixed name of the boolean data type.
    pub const D_BOOLEAN: &str = "d:boolean";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_check() {
        assert!(ValueCheck::Integer.accepts("42"));
        assert!(ValueCheck::Integer.accepts(" -7 "));
        assert!(!ValueCheck::Integer.accepts("4.2"));
        assert!(!ValueCheck::Integer.accepts("forty"));
    }

    #[test]
    fn boolean_check_is_case_insensitive() {
        assert!(ValueCheck::Boolean.accepts("TRUE"));
        assert!(ValueCheck::Boolean.accepts("false"));
        assert!(!ValueCheck::Boolean.accepts("yes"));
    }

    #[test]
    fn date_and_datetime_checks() {
        assert!(ValueCheck::Date.accepts("2024-02-29"));
        assert!(!ValueCheck::Date.accepts("2023-02-29"));
        assert!(ValueCheck::DateTime.accepts("2024-01-31T10:15:00Z"));
        assert!(ValueCheck::DateTime.accepts("2024-01-31T10:15:00.250"));
        assert!(!ValueCheck::DateTime.accepts("2024-01-31"));
    }

    #[test]
    fn kind_display() {
        assert_eq!(ClassKind::Type.to_string(), "type");
        assert_eq!(ClassKind::Aspect.to_string(), "aspect");
    }
}
