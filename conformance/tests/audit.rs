//! Audits of valid and deliberately corrupted snapshots.

use std::sync::Arc;

use cmm_conformance::{run_all, ConformanceReport, Severity};
use cmm_registry::{
    Catalog, ConstraintParameter, ConstraintType, NewConstraint, NewProperty, RegistryConfig,
    RegistrySnapshot,
};
use cmm_test_helpers::hr_fixture;

fn audit(snapshot: &RegistrySnapshot) -> ConformanceReport {
    run_all(
        snapshot,
        Arc::new(Catalog::standard()),
        RegistryConfig::default(),
    )
}

fn failures(report: &ConformanceReport, validator: &str) -> Vec<String> {
    report
        .by_validator(validator)
        .filter(|r| r.is_failure())
        .flat_map(|r| r.details.iter().cloned().chain([r.message.clone()]))
        .collect()
}

#[test]
fn registry_snapshot_passes() {
    let registry = hr_fixture();
    registry.activate_model("base").unwrap();
    let report = audit(&registry.snapshot());
    let failed: Vec<_> = report.results.iter().filter(|r| r.is_failure()).collect();
    assert!(failed.is_empty(), "Unexpected failures: {failed:#?}");
    assert_eq!(report.warning_count(), 0);
}

#[test]
fn empty_snapshot_passes() {
    assert!(audit(&RegistrySnapshot::default()).all_passed());
}

#[test]
fn duplicate_and_builtin_namespaces_fail() {
    let mut snapshot = hr_fixture().snapshot();
    snapshot.models[1].model.namespace_prefix = "base".into();
    snapshot.models[0].model.namespace_uri = Catalog::standard()
        .module_by_prefix("cm")
        .unwrap()
        .namespace
        .uri
        .to_owned();

    let report = audit(&snapshot);
    let found = failures(&report, "registry/namespaces");
    assert!(found.iter().any(|f| f.contains("Prefix 'base'")), "{found:?}");
    assert!(found.iter().any(|f| f.contains("built-in URI")), "{found:?}");
    assert!(!failures(&report, "registry/export").is_empty());
}

#[test]
fn bad_properties_and_parents_fail() {
    let mut snapshot = hr_fixture().snapshot();
    let base = &mut snapshot.models[0];
    let document = base
        .classes
        .iter_mut()
        .find(|c| c.name == "document")
        .unwrap();
    document.properties[0].data_type = "text".into();
    let audited = base
        .classes
        .iter_mut()
        .find(|c| c.name == "audited")
        .unwrap();
    audited.parent_name = Some("cm:folder".into());

    let found = failures(&audit(&snapshot), "registry/classes");
    assert!(found.iter().any(|f| f.contains("unqualified data type")), "{found:?}");
    assert!(found.iter().any(|f| f.contains("is a aspect but its parent")), "{found:?}");
}

#[test]
fn model_cycles_are_reported() {
    let mut snapshot = hr_fixture().snapshot();
    // base:document now inherits from hr:contract, which inherits from it.
    let document = snapshot.models[0]
        .classes
        .iter_mut()
        .find(|c| c.name == "document")
        .unwrap();
    document.parent_name = Some("hr:contract".into());

    let report = audit(&snapshot);
    let found = failures(&report, "registry/graph");
    assert!(found.iter().any(|f| f == "base -> hr -> base"), "{found:?}");
    assert!(found.iter().any(|f| f.contains("inherits from itself")), "{found:?}");
    assert!(report
        .results
        .iter()
        .any(|r| r.validator == "registry/export" && r.severity == Severity::Failure));
}

#[test]
fn broken_constraints_are_reported() {
    let registry = hr_fixture();
    registry
        .create_constraint(
            "hr",
            NewConstraint::new("grade", ConstraintType::MinMax)
                .parameter(ConstraintParameter::simple("maxValue", "9")),
        )
        .unwrap();
    registry
        .add_property(
            "hr",
            "contract",
            NewProperty::new("grade")
                .data_type("d:int")
                .default_value("5")
                .constraint_ref("hr:grade"),
        )
        .unwrap();
    let clean = audit(&registry.snapshot());
    assert!(failures(&clean, "registry/constraints").is_empty());
    assert_eq!(clean.by_validator("registry/constraints").count(), 3);

    let mut snapshot = registry.snapshot();
    let hr = &mut snapshot.models[1];
    hr.constraints[0].parameters[0].simple_value = Some("nine".into());
    let contract = hr.classes.iter_mut().find(|c| c.name == "contract").unwrap();
    let grade = contract.properties.iter_mut().find(|p| p.name == "grade").unwrap();
    grade.constraint_refs.push("base:grade".into());
    grade.data_type = "d:text".into();

    let report = audit(&snapshot);
    let found = failures(&report, "registry/constraints");
    assert!(found.iter().any(|f| f.contains("maxValue")), "{found:?}");
    assert!(
        found.iter().any(|f| f.contains("constraint 'base:grade' is not defined")),
        "{found:?}"
    );
    assert!(found.iter().any(|f| f.starts_with("hr:contract.grade:")), "{found:?}");
    assert!(!failures(&report, "registry/export").is_empty());
}
