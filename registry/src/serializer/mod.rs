//! Export of a single model as a standalone ontology document.
//!
//! Two formats are supported:
//! - **Turtle** ([`turtle`]) for RDF tooling
//! - **JSON-LD** ([`jsonld`]) for web clients
//!
//! Both render the same [`ModelDocument`], built under the read lock so
//! that every prefixed name reflects the namespaces at export time.

pub mod jsonld;
pub mod turtle;

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constraint::Constraint;
use crate::error::{NotFound, Result};
use crate::namespace::Namespace;
use crate::registry::ModelRegistry;
use crate::types::{ClassDef, Model};

/// Vocabulary for the annotations the standard vocabularies lack.
pub const CMM_NS: &str = "http://www.alfresco.org/model/custommodelmanagement/1.0#";

/// Output format of [`ModelRegistry::export`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Turtle 1.1.
    Turtle,
    /// JSON-LD 1.1, pretty-printed.
    JsonLd,
}

/// Returned when parsing an unknown format name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown export format '{0}' (expected turtle or jsonld)")]
pub struct UnknownFormat(pub String);

impl FromStr for ExportFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "turtle" | "ttl" => Ok(Self::Turtle),
            "jsonld" | "json-ld" => Ok(Self::JsonLd),
            _ => Err(UnknownFormat(s.to_owned())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Turtle => "turtle",
            Self::JsonLd => "jsonld",
        })
    }
}

/// Everything needed to render one model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDocument {
    /// The exported model.
    pub model: Model,
    /// Its model-level constraints, ordered by name.
    pub constraints: Vec<Constraint>,
    /// Its classes, ordered by name.
    pub classes: Vec<ClassDef>,
    /// Namespaces the classes' parents live in, other than the model's own.
    pub imports: Vec<Namespace>,
    /// Prefix → URI for every prefix the document mentions.
    pub prefixes: BTreeMap<String, String>,
}

impl ModelDocument {
    /// Expands `prefix:local` to a full IRI. Unknown prefixes are kept as
    /// written.
    #[must_use]
    pub fn expand(&self, prefixed: &str) -> String {
        match prefixed.split_once(':') {
            Some((prefix, local)) => match self.prefixes.get(prefix) {
                Some(uri) => join_iri(uri, local),
                None => prefixed.to_owned(),
            },
            None => join_iri(&self.model.namespace_uri, prefixed),
        }
    }

    /// IRI of the model's namespace as an ontology.
    #[must_use]
    pub fn ontology_iri(&self) -> &str {
        &self.model.namespace_uri
    }

    /// IRI of a property, scoped by its class. Local names never contain
    /// `:`, so distinct (class, property) pairs never share an IRI.
    #[must_use]
    pub fn property_iri(&self, class: &str, property: &str) -> String {
        join_iri(&self.model.namespace_uri, &format!("{class}:{property}"))
    }

    /// IRI of a model-level or inline constraint. Constraint names are
    /// unique per model and the `constraint::` marker keeps them apart
    /// from class and property IRIs.
    #[must_use]
    pub fn constraint_iri(&self, name: &str) -> String {
        join_iri(&self.model.namespace_uri, &format!("constraint::{name}"))
    }
}

/// Parameters as `name=value` literals, one per simple value or list
/// entry, in declaration order.
pub(crate) fn parameter_literals(constraint: &Constraint) -> Vec<String> {
    constraint
        .parameters
        .iter()
        .flat_map(|p| {
            p.simple_value
                .iter()
                .chain(p.list_value.iter())
                .map(move |value| format!("{}={value}", p.name))
        })
        .collect()
}

/// Percent-encodes the characters a Turtle `IRIREF` may not contain:
/// everything up to and including space, plus `<>"{}|^\` and the backtick.
#[must_use]
pub fn escape_iri(iri: &str) -> Cow<'_, str> {
    fn illegal(c: char) -> bool {
        c <= ' ' || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\')
    }
    if !iri.chars().any(illegal) {
        return Cow::Borrowed(iri);
    }
    let mut out = String::with_capacity(iri.len() + 8);
    for c in iri.chars() {
        if illegal(c) {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                let _ = write!(out, "%{byte:02X}");
            }
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// Joins a namespace URI and a local name, inserting `#` unless the URI
/// already ends in a separator.
#[must_use]
pub fn join_iri(uri: &str, local: &str) -> String {
    if uri.ends_with('#') || uri.ends_with('/') {
        format!("{uri}{local}")
    } else {
        format!("{uri}#{local}")
    }
}

impl ModelRegistry {
    /// Collects the document for `model`.
    ///
    /// # Errors
    ///
    /// [`NotFound::Model`].
    pub fn document(&self, model: &str) -> Result<ModelDocument> {
        self.read(|state| -> Result<ModelDocument> {
            let view = state
                .model_view(model)
                .ok_or_else(|| NotFound::Model(model.to_owned()))?;
            let classes: Vec<ClassDef> = state
                .classes
                .classes_of(model)
                .map(|entry| state.class_view(entry))
                .collect();
            let constraints = state
                .record(model)?
                .constraints
                .values()
                .map(|stored| state.constraint_view(model, stored))
                .collect();

            let mut prefixes = BTreeMap::new();
            prefixes.insert(view.namespace_prefix.clone(), view.namespace_uri.clone());
            let mut imports = BTreeMap::new();
            let parent_prefixes = classes
                .iter()
                .filter_map(|c| c.parent_name.as_deref())
                .filter_map(|p| p.split_once(':').map(|(prefix, _)| prefix));
            for prefix in parent_prefixes {
                if prefix == view.namespace_prefix {
                    continue;
                }
                if let Some(uri) = namespace_uri(state, prefix) {
                    imports.insert(prefix.to_owned(), uri.clone());
                    prefixes.insert(prefix.to_owned(), uri);
                }
            }
            let type_prefixes = classes
                .iter()
                .flat_map(|c| c.properties.iter())
                .filter_map(|p| p.data_type.split_once(':').map(|(prefix, _)| prefix));
            for prefix in type_prefixes {
                if let Some(uri) = namespace_uri(state, prefix) {
                    prefixes.insert(prefix.to_owned(), uri);
                }
            }

            Ok(ModelDocument {
                model: view,
                constraints,
                classes,
                imports: imports
                    .into_iter()
                    .map(|(prefix, uri)| Namespace::new(uri, prefix))
                    .collect(),
                prefixes,
            })
        })
    }

    /// Renders `model` in the requested format.
    ///
    /// # Errors
    ///
    /// [`NotFound::Model`].
    pub fn export(&self, model: &str, format: ExportFormat) -> Result<String> {
        let document = self.document(model)?;
        tracing::debug!(model, %format, classes = document.classes.len(), "exporting model");
        Ok(match format {
            ExportFormat::Turtle => turtle::to_turtle(&document),
            ExportFormat::JsonLd => jsonld::to_json_ld_string(&document),
        })
    }
}

fn namespace_uri(state: &crate::registry::RegistryState, prefix: &str) -> Option<String> {
    use crate::namespace::NamespaceOwner;
    match state.namespaces.owner_of_prefix(prefix)? {
        NamespaceOwner::Model(owner) => state.namespaces.get(owner).map(|ns| ns.uri.clone()),
        NamespaceOwner::BuiltIn => state.catalog.namespace_uri(prefix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NewClass, NewModel, NewProperty};

    fn registry() -> ModelRegistry {
        let r = ModelRegistry::standard();
        r.create_model(NewModel::new("base", "http://acme.com/model/base/1.0", "b"))
            .unwrap();
        r.create_model(NewModel::new("hr", "http://acme.com/model/hr/1.0#", "hr"))
            .unwrap();
        r.create_class("base", NewClass::type_("doc").parent("cm:content"))
            .unwrap();
        r.create_class(
            "hr",
            NewClass::type_("contract")
                .parent("b:doc")
                .property(NewProperty::new("salary").data_type("d:double")),
        )
        .unwrap();
        r.create_class("hr", NewClass::aspect("signed").parent("cm:titled"))
            .unwrap();
        r
    }

    #[test]
    fn format_names() {
        assert_eq!("TTL".parse::<ExportFormat>(), Ok(ExportFormat::Turtle));
        assert_eq!("json-ld".parse::<ExportFormat>(), Ok(ExportFormat::JsonLd));
        assert!("xml".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn join_iri_respects_separators() {
        assert_eq!(join_iri("http://x/1.0", "a"), "http://x/1.0#a");
        assert_eq!(join_iri("http://x/1.0#", "a"), "http://x/1.0#a");
        assert_eq!(join_iri("http://x/", "a"), "http://x/a");
    }

    #[test]
    fn escape_iri_encodes_only_illegal_characters() {
        assert!(matches!(escape_iri("http://x/a#b%20c"), Cow::Borrowed(_)));
        assert_eq!(escape_iri("http://x/a>b"), "http://x/a%3Eb");
        assert_eq!(escape_iri("a b\"{c}|^`\\\n"), "a%20b%22%7Bc%7D%7C%5E%60%5C%0A");
    }

    #[test]
    fn property_iris_are_scoped_by_class() {
        let doc = registry().document("hr").unwrap();
        assert_eq!(
            doc.property_iri("contract", "salary"),
            "http://acme.com/model/hr/1.0#contract:salary"
        );
        assert_ne!(doc.property_iri("a", "b"), doc.property_iri("b", "a"));
    }

    #[test]
    fn document_collects_imports_and_prefixes() {
        let doc = registry().document("hr").unwrap();
        let imported: Vec<&str> = doc.imports.iter().map(|ns| ns.prefix.as_str()).collect();
        assert_eq!(imported, vec!["b", "cm"]);
        assert!(doc.prefixes.contains_key("d"));
        assert!(doc.prefixes.contains_key("hr"));
        assert_eq!(
            doc.expand("b:doc"),
            "http://acme.com/model/base/1.0#doc"
        );
        assert_eq!(doc.expand("contract"), "http://acme.com/model/hr/1.0#contract");
    }

    #[test]
    fn unknown_model() {
        assert!(registry().export("nope", ExportFormat::Turtle).is_err());
    }

    #[test]
    fn constraint_iris_and_parameter_literals() {
        use crate::constraint::{ConstraintParameter, ConstraintType, NewConstraint};

        let r = registry();
        r.create_constraint(
            "hr",
            NewConstraint::new("colours", ConstraintType::List)
                .parameter(ConstraintParameter::list("allowedValues", ["red", "blue"]))
                .parameter(ConstraintParameter::simple("caseSensitive", "false")),
        )
        .unwrap();
        let doc = r.document("hr").unwrap();
        assert_eq!(doc.constraints.len(), 1);
        assert_eq!(
            doc.constraint_iri("colours"),
            "http://acme.com/model/hr/1.0#constraint::colours"
        );
        assert_ne!(doc.constraint_iri("a"), doc.property_iri("constraint", "a"));
        assert_eq!(
            parameter_literals(&doc.constraints[0]),
            vec!["allowedValues=red", "allowedValues=blue", "caseSensitive=false"]
        );
    }
}
