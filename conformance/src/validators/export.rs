//! Replay and export validator.
//!
//! Replays the snapshot into a fresh registry, which applies every live
//! rule at once, then exports each model and checks the output:
//! - Turtle has the standard prefixes and an `owl:Ontology` node
//! - JSON-LD parses and carries `@context` and `@graph`

use std::sync::Arc;

use cmm_catalog::BuiltinCatalog;
use cmm_registry::{ExportFormat, ModelRegistry, RegistryConfig, RegistrySnapshot};
use serde_json::Value;

use crate::report::{ConformanceReport, TestResult};

const VALIDATOR: &str = "registry/export";

/// Restores `snapshot` and validates the export of every model.
pub fn validate(
    snapshot: &RegistrySnapshot,
    catalog: Arc<dyn BuiltinCatalog>,
    config: RegistryConfig,
) -> ConformanceReport {
    let mut report = ConformanceReport::new();

    let registry = match ModelRegistry::restore(snapshot, catalog, config) {
        Ok(registry) => registry,
        Err(err) => {
            report.push(TestResult::fail(
                VALIDATOR,
                format!("Snapshot does not replay: {err}"),
            ));
            return report;
        }
    };
    report.push(TestResult::pass(
        VALIDATOR,
        format!(
            "Snapshot replays cleanly ({} models, {} classes)",
            snapshot.models.len(),
            snapshot.class_count()
        ),
    ));
    if registry.snapshot() != *snapshot {
        report.push(TestResult::warn_with_details(
            VALIDATOR,
            "Replayed registry differs from the stored snapshot",
            vec!["derived fields or ordering were normalised on replay".to_owned()],
        ));
    }

    let mut issues = Vec::new();
    for entry in &snapshot.models {
        let name = &entry.model.name;
        match registry.export(name, ExportFormat::Turtle) {
            Ok(turtle) => issues.extend(turtle_issues(&turtle).map(|i| format!("{name}.ttl: {i}"))),
            Err(err) => issues.push(format!("{name}.ttl: {err}")),
        }
        match registry.export(name, ExportFormat::JsonLd) {
            Ok(json) => issues.extend(json_ld_issues(&json).map(|i| format!("{name}.jsonld: {i}"))),
            Err(err) => issues.push(format!("{name}.jsonld: {err}")),
        }
    }
    report.push(TestResult::from_violations(
        VALIDATOR,
        format!("All {} models export as Turtle and JSON-LD", snapshot.models.len()),
        "Export structure issues",
        issues,
    ));

    report
}

fn turtle_issues(content: &str) -> impl Iterator<Item = &'static str> {
    let checks = [
        (content.contains("@prefix owl:"), "missing owl: prefix"),
        (content.contains("@prefix rdfs:"), "missing rdfs: prefix"),
        (content.contains("a owl:Ontology"), "no owl:Ontology node"),
    ];
    checks.into_iter().filter(|(ok, _)| !ok).map(|(_, issue)| issue)
}

fn json_ld_issues(content: &str) -> impl Iterator<Item = &'static str> {
    let parsed: Option<Value> = serde_json::from_str(content).ok();
    let checks = match &parsed {
        None => vec![(false, "not valid JSON")],
        Some(doc) => vec![
            (doc.get("@context").is_some(), "missing @context"),
            (
                doc.get("@graph").is_some_and(Value::is_array),
                "missing @graph array",
            ),
        ],
    };
    checks.into_iter().filter(|(ok, _)| !ok).map(|(_, issue)| issue)
}
