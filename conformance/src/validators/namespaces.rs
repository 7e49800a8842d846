//! Namespace validator.
//!
//! Validates the model table of a snapshot:
//! - Model names, namespace URIs and prefixes are well-formed
//! - No two models share a name, URI or prefix
//! - No model claims a built-in URI or prefix

use std::collections::BTreeMap;

use cmm_catalog::BuiltinCatalog;
use cmm_registry::names::{validate_local_name, validate_prefix, validate_uri};
use cmm_registry::RegistrySnapshot;

use crate::report::{ConformanceReport, TestResult};

const VALIDATOR: &str = "registry/namespaces";

/// Validates model names and namespaces.
pub fn validate(snapshot: &RegistrySnapshot, catalog: &dyn BuiltinCatalog) -> ConformanceReport {
    let mut report = ConformanceReport::new();
    let models = snapshot.models.iter().map(|entry| &entry.model);

    let mut malformed = Vec::new();
    for model in models.clone() {
        let checks = [
            validate_local_name("model name", &model.name),
            validate_uri(&model.namespace_uri),
            validate_prefix(&model.namespace_prefix),
        ];
        for err in checks.into_iter().filter_map(Result::err) {
            malformed.push(format!("Model '{}': {err}", model.name));
        }
    }
    report.push(TestResult::from_violations(
        VALIDATOR,
        format!("All {} model names and namespaces are well-formed", snapshot.models.len()),
        "Malformed model names or namespaces",
        malformed,
    ));

    let mut duplicates = Vec::new();
    let mut names: BTreeMap<&str, usize> = BTreeMap::new();
    let mut uris: BTreeMap<&str, &str> = BTreeMap::new();
    let mut prefixes: BTreeMap<&str, &str> = BTreeMap::new();
    for model in models.clone() {
        *names.entry(&model.name).or_default() += 1;
        if let Some(first) = uris.insert(&model.namespace_uri, &model.name) {
            duplicates.push(format!(
                "URI {} used by '{first}' and '{}'",
                model.namespace_uri, model.name
            ));
        }
        if let Some(first) = prefixes.insert(&model.namespace_prefix, &model.name) {
            duplicates.push(format!(
                "Prefix '{}' used by '{first}' and '{}'",
                model.namespace_prefix, model.name
            ));
        }
    }
    duplicates.extend(
        names
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(name, count)| format!("Model name '{name}' appears {count} times")),
    );
    report.push(TestResult::from_violations(
        VALIDATOR,
        "Model names, URIs and prefixes are unique",
        "Duplicate model names or namespaces",
        duplicates,
    ));

    let builtins = catalog.namespaces();
    let mut reserved = Vec::new();
    for model in models {
        for ns in &builtins {
            if ns.uri == model.namespace_uri {
                reserved.push(format!("Model '{}' claims built-in URI {}", model.name, ns.uri));
            }
            if ns.prefix == model.namespace_prefix {
                reserved.push(format!(
                    "Model '{}' claims built-in prefix '{}'",
                    model.name, ns.prefix
                ));
            }
        }
    }
    report.push(TestResult::from_violations(
        VALIDATOR,
        format!("No model claims one of the {} built-in namespaces", builtins.len()),
        "Models claim built-in namespaces",
        reserved,
    ));

    report
}
