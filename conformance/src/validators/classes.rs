//! Class validator.
//!
//! Validates the classes of a snapshot:
//! - Class names are well-formed and unique across every model
//! - Each class is listed under its owning model with a matching prefixed name
//! - Property names are well-formed and unique per class
//! - Property data types are qualified, known, and accept the default value
//! - Parents resolve to an existing class of the same kind

use std::collections::{BTreeMap, BTreeSet};

use cmm_catalog::{BuiltinCatalog, ClassKind};
use cmm_registry::names::validate_local_name;
use cmm_registry::{ClassDef, QualifiedName, RegistrySnapshot};

use crate::report::{ConformanceReport, TestResult};

const VALIDATOR: &str = "registry/classes";

/// Validates class names, properties and parent references.
pub fn validate(snapshot: &RegistrySnapshot, catalog: &dyn BuiltinCatalog) -> ConformanceReport {
    let mut report = ConformanceReport::new();
    let classes: Vec<(&str, &ClassDef)> = snapshot
        .models
        .iter()
        .flat_map(|entry| {
            entry
                .classes
                .iter()
                .map(move |class| (entry.model.name.as_str(), class))
        })
        .collect();

    check_names(snapshot, &classes, &mut report);
    check_properties(&classes, catalog, &mut report);
    check_parents(snapshot, &classes, catalog, &mut report);

    report
}

fn check_names(
    snapshot: &RegistrySnapshot,
    classes: &[(&str, &ClassDef)],
    report: &mut ConformanceReport,
) {
    let prefixes: BTreeMap<&str, &str> = snapshot
        .models
        .iter()
        .map(|e| (e.model.name.as_str(), e.model.namespace_prefix.as_str()))
        .collect();

    let mut violations = Vec::new();
    let mut seen: BTreeMap<&str, &str> = BTreeMap::new();
    let mut drift = Vec::new();
    for (owner, class) in classes {
        if let Err(err) = validate_local_name("class name", &class.name) {
            violations.push(format!("Class '{}' in '{owner}': {err}", class.name));
        }
        if let Some(first) = seen.insert(&class.name, owner) {
            violations.push(format!(
                "Class name '{}' used in '{first}' and '{owner}'",
                class.name
            ));
        }
        if class.model != *owner {
            drift.push(format!(
                "Class '{}' listed under '{owner}' but names '{}' as its model",
                class.name, class.model
            ));
        }
        if let Some(prefix) = prefixes.get(owner) {
            let expected = format!("{prefix}:{}", class.name);
            if class.prefixed_name != expected {
                drift.push(format!(
                    "Class '{}' has prefixed name '{}', expected '{expected}'",
                    class.name, class.prefixed_name
                ));
            }
        }
    }
    report.push(TestResult::from_violations(
        VALIDATOR,
        format!("All {} class names are well-formed and unique", classes.len()),
        "Malformed or duplicate class names",
        violations,
    ));
    if !drift.is_empty() {
        // Derived fields are recomputed on restore, so drift is not fatal.
        report.push(TestResult::warn_with_details(
            VALIDATOR,
            "Stored ownership or prefixed names disagree with the model table",
            drift,
        ));
    }
}

fn check_properties(
    classes: &[(&str, &ClassDef)],
    catalog: &dyn BuiltinCatalog,
    report: &mut ConformanceReport,
) {
    let mut violations = Vec::new();
    let mut count = 0;
    for (_, class) in classes {
        let mut names = BTreeSet::new();
        for prop in &class.properties {
            count += 1;
            let at = format!("{}.{}", class.name, prop.name);
            if let Err(err) = validate_local_name("property name", &prop.name) {
                violations.push(format!("{at}: {err}"));
            }
            if !names.insert(prop.name.as_str()) {
                violations.push(format!("{at}: declared more than once"));
            }
            let Ok(data_type) = QualifiedName::parse(&prop.data_type) else {
                violations.push(format!("{at}: unqualified data type '{}'", prop.data_type));
                continue;
            };
            match catalog.resolve_data_type(&data_type.prefix, &data_type.local) {
                None => violations.push(format!("{at}: unknown data type '{data_type}'")),
                Some(check) => {
                    if let Some(default) = &prop.default_value {
                        if !check.accepts(default) {
                            violations.push(format!(
                                "{at}: default '{default}' is not a valid {data_type}"
                            ));
                        }
                    }
                }
            }
        }
    }
    report.push(TestResult::from_violations(
        VALIDATOR,
        format!("All {count} properties are unique with known data types"),
        "Invalid property declarations",
        violations,
    ));
}

fn check_parents(
    snapshot: &RegistrySnapshot,
    classes: &[(&str, &ClassDef)],
    catalog: &dyn BuiltinCatalog,
    report: &mut ConformanceReport,
) {
    let owner_by_prefix: BTreeMap<&str, &str> = snapshot
        .models
        .iter()
        .map(|e| (e.model.namespace_prefix.as_str(), e.model.name.as_str()))
        .collect();
    let by_name: BTreeMap<&str, (&str, ClassKind)> = classes
        .iter()
        .map(|(owner, class)| (class.name.as_str(), (*owner, class.kind)))
        .collect();

    let mut violations = Vec::new();
    for (owner, class) in classes {
        let Some(parent) = &class.parent_name else {
            continue;
        };
        let Ok(name) = QualifiedName::parse(parent) else {
            violations.push(format!("{owner}:{} has malformed parent '{parent}'", class.name));
            continue;
        };
        let found = match owner_by_prefix.get(name.prefix.as_str()) {
            Some(parent_owner) => by_name
                .get(name.local.as_str())
                .filter(|(o, _)| o == parent_owner)
                .map(|(_, kind)| *kind),
            None => catalog.resolve_class(&name.prefix, &name.local),
        };
        match found {
            None => violations.push(format!(
                "{owner}:{} has unknown parent '{parent}'",
                class.name
            )),
            Some(kind) if kind != class.kind => violations.push(format!(
                "{owner}:{} is a {} but its parent '{parent}' is a {kind}",
                class.name, class.kind
            )),
            Some(_) => {}
        }
    }
    report.push(TestResult::from_violations(
        VALIDATOR,
        "Every parent resolves to a class of the same kind",
        "Unresolvable or mismatched parents",
        violations,
    ));
}
