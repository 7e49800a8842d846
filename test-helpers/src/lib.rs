//! Fixtures shared by the registry, conformance and client test suites.
//!
//! Every helper panics on failure; they build known-good state and are
//! only meant for tests.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;

use cmm_registry::{
    EventSink, ModelRegistry, NewClass, NewModel, NewProperty, RecordingSink, RegistryEvent,
};

/// Namespace URI used by [`model`] for `name`.
#[must_use]
pub fn uri_for(name: &str) -> String {
    format!("http://example.com/model/{name}/1.0")
}

/// A model request with a URI and prefix derived from `name`.
#[must_use]
pub fn model(name: &str) -> NewModel {
    NewModel::new(name, uri_for(name), name)
}

/// A standard registry holding draft models named by `names`.
#[must_use]
pub fn registry_with(names: &[&str]) -> ModelRegistry {
    let registry = ModelRegistry::standard();
    for name in names {
        registry
            .create_model(model(name))
            .unwrap_or_else(|err| panic!("fixture model {name}: {err}"));
    }
    registry
}

/// A registry with a subscribed [`RecordingSink`].
#[must_use]
pub fn recorded_registry() -> (ModelRegistry, Arc<RecordingSink>) {
    let registry = ModelRegistry::standard();
    let sink = Arc::new(RecordingSink::new());
    registry.subscribe(Arc::clone(&sink) as Arc<dyn EventSink>);
    (registry, sink)
}

/// Names of the recorded events, in order.
#[must_use]
pub fn event_names(events: &[RegistryEvent]) -> Vec<String> {
    events
        .iter()
        .map(|event| {
            serde_json::to_value(event)
                .ok()
                .and_then(|v| v.get("event").and_then(|e| e.as_str()).map(str::to_owned))
                .unwrap_or_default()
        })
        .collect()
}

/// Two models where `hr` builds on `base`:
///
/// - `base`: type `document` (parent `cm:content`) with property `ref`,
///   aspect `audited` (parent `cm:auditable`)
/// - `hr`: type `contract` (parent `base:document`), aspect `signed`
///   (parent `base:audited`)
#[must_use]
pub fn hr_fixture() -> ModelRegistry {
    let registry = registry_with(&["base", "hr"]);
    registry
        .create_class(
            "base",
            NewClass::type_("document")
                .parent("cm:content")
                .property(NewProperty::new("ref").data_type("d:text")),
        )
        .unwrap();
    registry
        .create_class("base", NewClass::aspect("audited").parent("cm:auditable"))
        .unwrap();
    registry
        .create_class("hr", NewClass::type_("contract").parent("base:document"))
        .unwrap();
    registry
        .create_class("hr", NewClass::aspect("signed").parent("base:audited"))
        .unwrap();
    registry
}
