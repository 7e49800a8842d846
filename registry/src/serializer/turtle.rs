//! Turtle 1.1 serializer for one custom model.
//!
//! The model becomes an `owl:Ontology` importing the namespaces its parents
//! come from. Classes are `owl:Class` and properties `owl:DatatypeProperty`.
//! Constraints are `cmm:Constraint` nodes linked from the properties that
//! use them.

use super::{escape_iri, parameter_literals, ModelDocument, CMM_NS};
use crate::constraint::Constraint;
use crate::types::{ClassDef, Property};

/// Serializes a model document to a Turtle string.
#[must_use]
pub fn to_turtle(doc: &ModelDocument) -> String {
    let mut out = String::with_capacity(4 * 1024);

    out.push_str("@prefix owl:  <http://www.w3.org/2002/07/owl#> .\n");
    out.push_str("@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .\n");
    out.push_str("@prefix xsd:  <http://www.w3.org/2001/XMLSchema#> .\n");
    out.push_str(&format!("@prefix cmm:  <{CMM_NS}> .\n"));
    for (prefix, uri) in &doc.prefixes {
        out.push_str(&format!("@prefix {prefix}: {} .\n", iri(&prefix_iri(uri))));
    }
    out.push('\n');

    let model = &doc.model;
    let imports: String = doc
        .imports
        .iter()
        .map(|ns| format!("  owl:imports {} ;\n", iri(&ns.uri)))
        .collect();
    let mut annotations = String::new();
    if let Some(description) = &model.description {
        annotations.push_str(&format!("  rdfs:comment {} ;\n", turtle_string(description)));
    }
    if let Some(author) = &model.author {
        annotations.push_str(&format!("  cmm:author {} ;\n", turtle_string(author)));
    }
    out.push_str(&format!(
        "{}\n  a owl:Ontology ;\n  rdfs:label {} ;\n{}{}  cmm:status \"{}\" .\n\n",
        iri(doc.ontology_iri()),
        turtle_string(&model.name),
        annotations,
        imports,
        model.status.to_string().to_uppercase()
    ));

    for constraint in &doc.constraints {
        out.push_str(&constraint_to_turtle(doc, constraint));
    }
    for class in &doc.classes {
        out.push_str(&class_to_turtle(doc, class));
        for prop in &class.properties {
            out.push_str(&property_to_turtle(doc, class, prop));
            for constraint in &prop.constraints {
                out.push_str(&constraint_to_turtle(doc, constraint));
            }
        }
    }

    out
}

fn class_to_turtle(doc: &ModelDocument, class: &ClassDef) -> String {
    let mut body = String::new();
    if let Some(title) = &class.title {
        body.push_str(&format!("  rdfs:label {} ;\n", turtle_string(title)));
    }
    if let Some(description) = &class.description {
        body.push_str(&format!("  rdfs:comment {} ;\n", turtle_string(description)));
    }
    if let Some(parent) = &class.parent_name {
        body.push_str(&format!("  rdfs:subClassOf {} ;\n", iri(&doc.expand(parent))));
    }
    format!(
        "{}\n  a owl:Class ;\n{}  cmm:kind \"{}\" .\n\n",
        iri(&doc.expand(&class.name)),
        body,
        class.kind
    )
}

fn property_to_turtle(doc: &ModelDocument, class: &ClassDef, prop: &Property) -> String {
    let mut body = String::new();
    if let Some(title) = &prop.title {
        body.push_str(&format!("  rdfs:label {} ;\n", turtle_string(title)));
    }
    if let Some(description) = &prop.description {
        body.push_str(&format!("  rdfs:comment {} ;\n", turtle_string(description)));
    }
    if let Some(default) = &prop.default_value {
        body.push_str(&format!("  cmm:defaultValue {} ;\n", turtle_string(default)));
    }
    for name in prop.constraint_names() {
        body.push_str(&format!("  cmm:constraint {} ;\n", iri(&doc.constraint_iri(name))));
    }
    let kind = if prop.multi_valued {
        "owl:DatatypeProperty"
    } else {
        "owl:DatatypeProperty , owl:FunctionalProperty"
    };
    format!(
        "{}\n  a {} ;\n{}  rdfs:domain {} ;\n  rdfs:range {} ;\n  cmm:mandatory \"{}\"^^xsd:boolean .\n\n",
        iri(&doc.property_iri(&class.name, &prop.name)),
        kind,
        body,
        iri(&doc.expand(&class.name)),
        iri(&doc.expand(&prop.data_type)),
        prop.mandatory
    )
}

fn constraint_to_turtle(doc: &ModelDocument, constraint: &Constraint) -> String {
    let mut body = String::new();
    if let Some(title) = &constraint.title {
        body.push_str(&format!("  rdfs:label {} ;\n", turtle_string(title)));
    }
    if let Some(description) = &constraint.description {
        body.push_str(&format!("  rdfs:comment {} ;\n", turtle_string(description)));
    }
    for literal in parameter_literals(constraint) {
        body.push_str(&format!("  cmm:parameter {} ;\n", turtle_string(&literal)));
    }
    format!(
        "{}\n  a cmm:Constraint ;\n  cmm:name {} ;\n{}  cmm:constraintType {} .\n\n",
        iri(&doc.constraint_iri(&constraint.name)),
        turtle_string(&constraint.prefixed_name),
        body,
        turtle_string(constraint.constraint_type.as_str())
    )
}

/// Namespace IRI as used in a `@prefix` line, so that `prefix:local`
/// expands to the same IRI as [`super::join_iri`].
fn prefix_iri(uri: &str) -> String {
    if uri.ends_with('#') || uri.ends_with('/') {
        uri.to_owned()
    } else {
        format!("{uri}#")
    }
}

/// An `IRIREF` token.
fn iri(s: &str) -> String {
    format!("<{}>", escape_iri(s))
}

fn turtle_string(s: &str) -> String {
    let escaped = s
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r");
    format!("\"{escaped}\"")
}
