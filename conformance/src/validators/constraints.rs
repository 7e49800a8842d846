//! Constraint validator.
//!
//! Validates the constraints of a snapshot:
//! - Constraint names are well-formed and unique per model, counting the
//!   inline constraints of every property
//! - Parameters suit the constraint type
//! - Every `constraintRefs` entry names a constraint of the owning model
//! - Each constraint suits the data type of the property using it, and the
//!   property's default value satisfies it

use std::collections::{BTreeMap, BTreeSet};

use cmm_catalog::BuiltinCatalog;
use cmm_registry::names::validate_local_name;
use cmm_registry::{Constraint, ModelSnapshot, QualifiedName, RegistrySnapshot};

use crate::report::{ConformanceReport, TestResult};

const VALIDATOR: &str = "registry/constraints";

/// Validates constraint declarations, references and usage.
pub fn validate(snapshot: &RegistrySnapshot, catalog: &dyn BuiltinCatalog) -> ConformanceReport {
    let mut report = ConformanceReport::new();
    let mut declarations = Vec::new();
    let mut references = Vec::new();
    let mut usage = Vec::new();
    let mut count = 0;

    for entry in &snapshot.models {
        count += check_declarations(entry, &mut declarations);
        check_usage(entry, catalog, &mut references, &mut usage);
    }

    report.push(TestResult::from_violations(
        VALIDATOR,
        format!("All {count} constraints are unique with valid parameters"),
        "Malformed, duplicate or misconfigured constraints",
        declarations,
    ));
    report.push(TestResult::from_violations(
        VALIDATOR,
        "Every constraint reference names a constraint of its model",
        "Unresolvable constraint references",
        references,
    ));
    report.push(TestResult::from_violations(
        VALIDATOR,
        "Every constraint suits its property's data type and default",
        "Constraints applied to unsuitable properties",
        usage,
    ));
    report
}

/// Model-level and inline constraints of one model, with where each is declared.
fn declared(entry: &ModelSnapshot) -> Vec<(String, &Constraint)> {
    let model = &entry.model.name;
    let model_level = entry.constraints.iter().map(|c| (model.clone(), c));
    let inline = entry.classes.iter().flat_map(|class| {
        class.properties.iter().flat_map(move |prop| {
            prop.constraints
                .iter()
                .map(move |c| (format!("{model}:{}.{}", class.name, prop.name), c))
        })
    });
    model_level.chain(inline).collect()
}

fn check_declarations(entry: &ModelSnapshot, violations: &mut Vec<String>) -> usize {
    let constraints = declared(entry);
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for (at, constraint) in &constraints {
        if let Err(err) = validate_local_name("constraint name", &constraint.name) {
            violations.push(format!("Constraint '{}' in {at}: {err}", constraint.name));
        }
        if !seen.insert(constraint.name.as_str()) {
            violations.push(format!(
                "Constraint name '{}' declared more than once in '{}'",
                constraint.name, entry.model.name
            ));
        }
        if let Err(err) = constraint.validate_parameters() {
            violations.push(format!("{at}: {err}"));
        }
    }
    constraints.len()
}

fn check_usage(
    entry: &ModelSnapshot,
    catalog: &dyn BuiltinCatalog,
    references: &mut Vec<String>,
    usage: &mut Vec<String>,
) {
    let model = &entry.model;
    let by_name: BTreeMap<&str, &Constraint> = entry
        .constraints
        .iter()
        .map(|c| (c.name.as_str(), c))
        .collect();

    for class in &entry.classes {
        for prop in &class.properties {
            let at = format!("{}:{}.{}", model.name, class.name, prop.name);
            let mut applied: Vec<&Constraint> = prop.constraints.iter().collect();
            for reference in &prop.constraint_refs {
                let resolved = QualifiedName::parse(reference)
                    .ok()
                    .filter(|name| name.prefix == model.namespace_prefix)
                    .and_then(|name| by_name.get(name.local.as_str()).copied());
                match resolved {
                    Some(constraint) => applied.push(constraint),
                    None => references.push(format!("{at}: constraint '{reference}' is not defined")),
                }
            }
            if applied.is_empty() {
                continue;
            }

            // Unknown data types are reported by the class validator.
            let Some(check) = QualifiedName::parse(&prop.data_type)
                .ok()
                .and_then(|dt| catalog.resolve_data_type(&dt.prefix, &dt.local))
            else {
                continue;
            };
            for constraint in applied {
                if let Err(err) = constraint.check_usage(&prop.data_type, check) {
                    usage.push(format!("{at}: {err}"));
                }
                if let Some(default) = &prop.default_value {
                    if constraint.is_violated_by(default) {
                        usage.push(format!(
                            "{at}: default '{default}' violates constraint '{}'",
                            constraint.name
                        ));
                    }
                }
            }
        }
    }
}
