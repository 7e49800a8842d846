//! JSON-LD 1.1 serializer for one custom model.
//!
//! Produces a single document with an `@context` holding every prefix the
//! model uses and an `@graph` with the ontology node, the model's
//! constraints, then each class with its properties and their inline
//! constraints.

use serde_json::{json, Map, Value};

use super::{escape_iri, parameter_literals, ModelDocument, CMM_NS};
use crate::constraint::Constraint;
use crate::types::{ClassDef, Property};

/// Serializes a model document to a JSON-LD `Value`.
#[must_use]
pub fn to_json_ld(doc: &ModelDocument) -> Value {
    json!({
        "@context": build_context(doc),
        "@graph": build_graph(doc)
    })
}

/// Pretty-printed form of [`to_json_ld`].
#[must_use]
pub fn to_json_ld_string(doc: &ModelDocument) -> String {
    format!("{:#}", to_json_ld(doc))
}

fn build_context(doc: &ModelDocument) -> Value {
    let mut ctx = Map::new();
    ctx.insert("owl".to_owned(), json!("http://www.w3.org/2002/07/owl#"));
    ctx.insert("rdfs".to_owned(), json!("http://www.w3.org/2000/01/rdf-schema#"));
    ctx.insert("xsd".to_owned(), json!("http://www.w3.org/2001/XMLSchema#"));
    ctx.insert("cmm".to_owned(), json!(CMM_NS));
    for prefix in doc.prefixes.keys() {
        ctx.insert(prefix.clone(), json!(id(&doc.expand(&format!("{prefix}:")))));
    }
    Value::Object(ctx)
}

fn build_graph(doc: &ModelDocument) -> Value {
    let model = &doc.model;
    let mut nodes = Vec::with_capacity(1 + doc.classes.len());

    let mut ontology = json!({
        "@id": id(doc.ontology_iri()),
        "@type": "owl:Ontology",
        "rdfs:label": model.name,
        "cmm:status": model.status.to_string().to_uppercase()
    });
    if let Some(description) = &model.description {
        ontology["rdfs:comment"] = json!(description);
    }
    if let Some(author) = &model.author {
        ontology["cmm:author"] = json!(author);
    }
    let imports: Vec<Value> = doc
        .imports
        .iter()
        .map(|ns| json!({ "@id": id(&ns.uri) }))
        .collect();
    if !imports.is_empty() {
        ontology["owl:imports"] = Value::Array(imports);
    }
    nodes.push(ontology);

    for constraint in &doc.constraints {
        nodes.push(constraint_to_json(doc, constraint));
    }
    for class in &doc.classes {
        nodes.push(class_to_json(doc, class));
        for prop in &class.properties {
            nodes.push(property_to_json(doc, class, prop));
            for constraint in &prop.constraints {
                nodes.push(constraint_to_json(doc, constraint));
            }
        }
    }

    Value::Array(nodes)
}

fn class_to_json(doc: &ModelDocument, class: &ClassDef) -> Value {
    let mut node = json!({
        "@id": id(&doc.expand(&class.name)),
        "@type": "owl:Class",
        "cmm:kind": class.kind.as_str()
    });
    if let Some(title) = &class.title {
        node["rdfs:label"] = json!(title);
    }
    if let Some(description) = &class.description {
        node["rdfs:comment"] = json!(description);
    }
    if let Some(parent) = &class.parent_name {
        node["rdfs:subClassOf"] = json!({ "@id": id(&doc.expand(parent)) });
    }
    node
}

fn id(iri: &str) -> String {
    escape_iri(iri).into_owned()
}

fn property_to_json(doc: &ModelDocument, class: &ClassDef, prop: &Property) -> Value {
    let type_ = if prop.multi_valued {
        json!("owl:DatatypeProperty")
    } else {
        json!(["owl:DatatypeProperty", "owl:FunctionalProperty"])
    };
    let mut node = json!({
        "@id": id(&doc.property_iri(&class.name, &prop.name)),
        "@type": type_,
        "rdfs:domain": { "@id": id(&doc.expand(&class.name)) },
        "rdfs:range": { "@id": id(&doc.expand(&prop.data_type)) },
        "cmm:mandatory": prop.mandatory
    });
    if let Some(title) = &prop.title {
        node["rdfs:label"] = json!(title);
    }
    if let Some(description) = &prop.description {
        node["rdfs:comment"] = json!(description);
    }
    if let Some(default) = &prop.default_value {
        node["cmm:defaultValue"] = json!(default);
    }
    let constraints: Vec<Value> = prop
        .constraint_names()
        .map(|name| json!({ "@id": id(&doc.constraint_iri(name)) }))
        .collect();
    if !constraints.is_empty() {
        node["cmm:constraint"] = Value::Array(constraints);
    }
    node
}

fn constraint_to_json(doc: &ModelDocument, constraint: &Constraint) -> Value {
    let mut node = json!({
        "@id": id(&doc.constraint_iri(&constraint.name)),
        "@type": "cmm:Constraint",
        "cmm:name": constraint.prefixed_name,
        "cmm:constraintType": constraint.constraint_type.as_str(),
        "cmm:parameter": parameter_literals(constraint)
    });
    if let Some(title) = &constraint.title {
        node["rdfs:label"] = json!(title);
    }
    if let Some(description) = &constraint.description {
        node["rdfs:comment"] = json!(description);
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ModelRegistry;
    use crate::types::{NewClass, NewModel, NewProperty};

    fn document() -> ModelDocument {
        let r = ModelRegistry::standard();
        r.create_model(NewModel::new("hr", "http://acme.com/model/hr/1.0", "hr").author("ops"))
            .unwrap();
        r.create_class(
            "hr",
            NewClass::aspect("reviewed")
                .parent("cm:titled")
                .property(NewProperty::new("score").data_type("d:int").default_value("3")),
        )
        .unwrap();
        r.create_class("hr", NewClass::aspect("audited").parent("hr:reviewed"))
            .unwrap();
        r.document("hr").unwrap()
    }

    #[test]
    fn has_context_and_graph() {
        let json = to_json_ld(&document());
        assert!(json.get("@context").is_some());
        assert!(json.get("@graph").is_some());
        assert_eq!(json["@context"]["hr"], "http://acme.com/model/hr/1.0#");
        assert_eq!(json["@context"]["cmm"], CMM_NS);
    }

    #[test]
    fn graph_order_and_content() {
        let json = to_json_ld(&document());
        let graph = json["@graph"].as_array().unwrap();
        assert_eq!(graph[0]["@type"], "owl:Ontology");
        assert_eq!(graph[0]["cmm:author"], "ops");
        assert_eq!(graph[0]["owl:imports"].as_array().unwrap().len(), 1);

        let audited = graph
            .iter()
            .find(|n| n["@id"] == "http://acme.com/model/hr/1.0#audited")
            .unwrap();
        assert_eq!(audited["cmm:kind"], "aspect");
        assert_eq!(
            audited["rdfs:subClassOf"]["@id"],
            "http://acme.com/model/hr/1.0#reviewed"
        );

        let score = graph
            .iter()
            .find(|n| n["@id"] == "http://acme.com/model/hr/1.0#reviewed:score")
            .unwrap();
        assert_eq!(score["cmm:defaultValue"], "3");
        assert_eq!(score["cmm:mandatory"], false);
    }

    #[test]
    fn string_form_parses_back() {
        let text = to_json_ld_string(&document());
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, to_json_ld(&document()));
    }

    #[test]
    fn ids_are_valid_iris() {
        let r = ModelRegistry::standard();
        r.create_model(NewModel::new("q", "http://x/\"q\"|1", "q")).unwrap();
        r.create_class("q", NewClass::type_("t").parent("cm:content"))
            .unwrap();
        let json = to_json_ld(&r.document("q").unwrap());
        assert_eq!(json["@graph"][0]["@id"], "http://x/%22q%22%7C1");
        assert_eq!(json["@graph"][1]["@id"], "http://x/%22q%22%7C1#t");
        assert_eq!(json["@context"]["q"], "http://x/%22q%22%7C1#");
    }

    #[test]
    fn constraint_nodes_follow_the_ontology() {
        use crate::constraint::{ConstraintParameter, ConstraintType, NewConstraint};

        let r = ModelRegistry::standard();
        r.create_model(NewModel::new("m", "http://acme.com/m#", "m")).unwrap();
        r.create_constraint(
            "m",
            NewConstraint::new("pct", ConstraintType::MinMax)
                .title("Percentage")
                .parameter(ConstraintParameter::simple("minValue", "0"))
                .parameter(ConstraintParameter::simple("maxValue", "100")),
        )
        .unwrap();
        r.create_class(
            "m",
            NewClass::aspect("scored")
                .parent("cm:titled")
                .property(NewProperty::new("score").data_type("d:int").constraint_ref("m:pct")),
        )
        .unwrap();
        let json = to_json_ld(&r.document("m").unwrap());
        let graph = json["@graph"].as_array().unwrap();

        assert_eq!(graph[1]["@id"], "http://acme.com/m#constraint::pct");
        assert_eq!(graph[1]["@type"], "cmm:Constraint");
        assert_eq!(graph[1]["cmm:constraintType"], "MINMAX");
        assert_eq!(graph[1]["rdfs:label"], "Percentage");
        assert_eq!(graph[1]["cmm:parameter"], json!(["minValue=0", "maxValue=100"]));

        let score = graph
            .iter()
            .find(|n| n["@id"] == "http://acme.com/m#scored:score")
            .unwrap();
        assert_eq!(
            score["cmm:constraint"],
            json!([{ "@id": "http://acme.com/m#constraint::pct" }])
        );
    }
}
