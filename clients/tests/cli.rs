//! State file and script handling against a scratch directory.

use std::fs;

use cmm_clients::{commands, state, CliConfig};
use cmm_registry::{ExportFormat, ModelStatus, RegistryConfig};
use cmm_test_helpers::hr_fixture;
use tempfile::TempDir;

#[test]
fn missing_state_is_empty_registry() {
    let dir = TempDir::new().unwrap();
    let registry = state::load(&dir.path().join("none.json"), &RegistryConfig::default()).unwrap();
    assert!(registry.snapshot().models.is_empty());
}

#[test]
fn saved_state_loads_identically() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("registry.json");
    let registry = hr_fixture();
    registry.activate_model("base").unwrap();

    state::save(&registry, &path).unwrap();
    assert!(!path.with_extension("json.tmp").exists());

    let loaded = state::load(&path, &RegistryConfig::default()).unwrap();
    assert_eq!(loaded.snapshot(), registry.snapshot());
    assert_eq!(loaded.get_model("base").unwrap().status, ModelStatus::Active);
    assert_eq!(loaded.dependents("base").unwrap(), vec!["hr".to_owned()]);
}

#[test]
fn failed_replace_removes_temporary_file() {
    let dir = TempDir::new().unwrap();
    // A non-empty directory where the state file should go cannot be
    // replaced by a rename.
    let path = dir.path().join("registry.json");
    fs::create_dir(&path).unwrap();
    fs::write(path.join("keep"), "x").unwrap();

    let err = state::save(&hr_fixture(), &path).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to replace"));
    assert!(!path.with_extension("json.tmp").exists());
    assert!(path.join("keep").exists());
}

#[test]
fn corrupt_state_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("registry.json");
    fs::write(&path, "{not json").unwrap();
    let err = state::load(&path, &RegistryConfig::default()).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse snapshot"));
}

#[test]
fn scripts_apply_in_order() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("01-model.json");
    let second = dir.path().join("02-classes.json");
    fs::write(
        &first,
        r#"{"op": "create_model", "model": {
            "name": "hr", "namespaceUri": "http://acme.com/hr", "namespacePrefix": "hr"
        }}"#,
    )
    .unwrap();
    fs::write(
        &second,
        r#"[
            {"op": "create_class", "model": "hr", "class": {
                "name": "employee", "kind": "type", "parentName": "cm:content"
            }},
            {"op": "update_model", "model": "hr", "patch": {"status": "ACTIVE"}}
        ]"#,
    )
    .unwrap();

    let registry = state::load(&dir.path().join("registry.json"), &RegistryConfig::default())
        .unwrap();
    let outcomes = commands::apply(&registry, &[&first, &second]).unwrap();
    let lines: Vec<_> = outcomes.iter().map(commands::describe).collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("type hr:employee"), "{lines:?}");
    assert_eq!(registry.get_model("hr").unwrap().status, ModelStatus::Active);

    let turtle = registry.export("hr", ExportFormat::Turtle).unwrap();
    assert!(turtle.contains("rdfs:subClassOf"));
}

#[test]
fn failed_script_keeps_earlier_operations() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("script.json");
    fs::write(
        &script,
        r#"[
            {"op": "create_model", "model": {
                "name": "hr", "namespaceUri": "http://acme.com/hr", "namespacePrefix": "hr"
            }},
            {"op": "delete_model", "model": "missing"}
        ]"#,
    )
    .unwrap();

    let registry = state::load(&dir.path().join("registry.json"), &RegistryConfig::default())
        .unwrap();
    let err = commands::apply(&registry, &[&script]).unwrap_err();
    assert!(format!("{err:#}").contains("script.json"));
    assert!(registry.get_model("hr").is_ok());
}

#[test]
fn config_file_feeds_registry_settings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cmm.toml");
    fs::write(&path, "[logging]\nfilter = \"debug\"\n").unwrap();
    let config = CliConfig::load(Some(&path)).unwrap();
    assert_eq!(config.logging.filter.as_deref(), Some("debug"));
    assert_eq!(config.registry, RegistryConfig::default());

    assert!(CliConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
}
