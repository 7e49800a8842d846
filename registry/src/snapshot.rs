//! Whole-registry snapshots.
//!
//! A snapshot is the list of models with their constraints and classes,
//! as JSON. Restoring
//! replays it through the normal mutation path into a fresh registry, so
//! a snapshot edited by hand is held to the same rules as live calls.

use std::sync::Arc;

use cmm_catalog::BuiltinCatalog;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigError, RegistryConfig};
use crate::constraint::{Constraint, NewConstraint};
use crate::error::{Conflict, RegistryError};
use crate::lifecycle::ModelStatus;
use crate::registry::ModelRegistry;
use crate::types::{ClassDef, Model, NewClass, NewModel, NewProperty};

/// One model, its constraints and its classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSnapshot {
    /// The model itself.
    #[serde(flatten)]
    pub model: Model,
    /// Model-level constraints, ordered by name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
    /// Its classes, ordered by name.
    #[serde(default)]
    pub classes: Vec<ClassDef>,
}

/// Every model in a registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// Models ordered by name.
    pub models: Vec<ModelSnapshot>,
}

/// Failure to load or replay a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The snapshot is not valid JSON for [`RegistrySnapshot`].
    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),

    /// The registry configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Replaying an entry failed.
    #[error("cannot restore '{entry}': {source}")]
    Replay {
        /// Model or `model/class` being replayed.
        entry: String,
        /// The registry's rejection.
        #[source]
        source: RegistryError,
    },
}

impl RegistrySnapshot {
    /// Parses a snapshot from JSON.
    ///
    /// # Errors
    ///
    /// [`SnapshotError::Json`].
    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// [`SnapshotError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Number of classes across all models.
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.models.iter().map(|m| m.classes.len()).sum()
    }
}

impl ModelRegistry {
    /// Captures every model and class under one read lock.
    #[must_use]
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.read(|state| RegistrySnapshot {
            models: state
                .models
                .keys()
                .filter_map(|name| state.model_view(name))
                .map(|model| {
                    let constraints = state
                        .models
                        .get(&model.name)
                        .into_iter()
                        .flat_map(|record| record.constraints.values())
                        .map(|stored| state.constraint_view(&model.name, stored))
                        .collect();
                    let classes = state
                        .classes
                        .classes_of(&model.name)
                        .map(|entry| state.class_view(entry))
                        .collect();
                    ModelSnapshot {
                        model,
                        constraints,
                        classes,
                    }
                })
                .collect(),
        })
    }

    /// Builds a registry from a snapshot.
    ///
    /// Models are created as drafts with their constraints, then classes
    /// are created parents first across all models, then models recorded
    /// as active are activated.
    ///
    /// # Errors
    ///
    /// - [`SnapshotError::Config`] if `config` is invalid for `catalog`.
    /// - [`SnapshotError::Replay`] for the first entry the registry
    ///   rejects, including classes whose parents never appear.
    pub fn restore(
        snapshot: &RegistrySnapshot,
        catalog: Arc<dyn BuiltinCatalog>,
        config: RegistryConfig,
    ) -> Result<Self, SnapshotError> {
        let registry = Self::with_config(catalog, config)?;

        for entry in &snapshot.models {
            let model = &entry.model;
            let request = NewModel {
                name: model.name.clone(),
                namespace_uri: model.namespace_uri.clone(),
                namespace_prefix: model.namespace_prefix.clone(),
                description: model.description.clone(),
                author: model.author.clone(),
            };
            registry
                .create_model(request)
                .map_err(|source| replay(&model.name, source))?;
            for constraint in &entry.constraints {
                registry
                    .create_constraint(&model.name, NewConstraint::from(constraint.clone()))
                    .map_err(|source| {
                        replay(&format!("{}/{}", model.name, constraint.name), source)
                    })?;
            }
        }

        let mut pending: Vec<&ClassDef> = snapshot
            .models
            .iter()
            .flat_map(|m| m.classes.iter())
            .collect();
        while !pending.is_empty() {
            let before = pending.len();
            let mut deferred = Vec::new();
            let mut last_error = None;
            for class in pending {
                match registry.create_class(&class.model, class_request(class)) {
                    Ok(_) => {}
                    Err(err @ RegistryError::Conflict(Conflict::UnknownParent(_))) => {
                        last_error = Some((class, err));
                        deferred.push(class);
                    }
                    Err(source) => {
                        return Err(replay(&format!("{}/{}", class.model, class.name), source))
                    }
                }
            }
            if deferred.len() == before {
                if let Some((class, source)) = last_error {
                    return Err(replay(&format!("{}/{}", class.model, class.name), source));
                }
            }
            pending = deferred;
        }

        for entry in &snapshot.models {
            if entry.model.status == ModelStatus::Active {
                registry
                    .activate_model(&entry.model.name)
                    .map_err(|source| replay(&entry.model.name, source))?;
            }
        }

        tracing::info!(
            models = snapshot.models.len(),
            constraints = snapshot.models.iter().map(|m| m.constraints.len()).sum::<usize>(),
            classes = snapshot.class_count(),
            "registry restored"
        );
        Ok(registry)
    }
}

fn class_request(class: &ClassDef) -> NewClass {
    NewClass {
        kind: class.kind,
        name: class.name.clone(),
        parent_name: class.parent_name.clone(),
        title: class.title.clone(),
        description: class.description.clone(),
        properties: class
            .properties
            .iter()
            .cloned()
            .map(NewProperty::from)
            .collect(),
    }
}

fn replay(entry: &str, source: RegistryError) -> SnapshotError {
    SnapshotError::Replay {
        entry: entry.to_owned(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmm_catalog::Catalog;

    fn populated() -> ModelRegistry {
        let r = ModelRegistry::standard();
        r.create_model(NewModel::new("a", "ua", "pa")).unwrap();
        r.create_model(NewModel::new("b", "ub", "pb").author("me"))
            .unwrap();
        r.create_class("b", NewClass::type_("root").parent("cm:content"))
            .unwrap();
        r.create_class("a", NewClass::type_("zeta").parent("pb:root"))
            .unwrap();
        // Sorts before its parent in the snapshot.
        r.create_class("a", NewClass::type_("alpha").parent("pa:zeta"))
            .unwrap();
        r.add_property("b", "root", NewProperty::new("n").data_type("d:int"))
            .unwrap();
        r.activate_model("a").unwrap();
        r
    }

    fn restore(snapshot: &RegistrySnapshot) -> Result<ModelRegistry, SnapshotError> {
        ModelRegistry::restore(
            snapshot,
            Arc::new(Catalog::standard()),
            RegistryConfig::default(),
        )
    }

    #[test]
    fn restore_reproduces_snapshot() {
        let original = populated();
        let snapshot = original.snapshot();
        assert_eq!(snapshot.class_count(), 3);

        let restored = restore(&snapshot).unwrap();
        assert_eq!(restored.snapshot(), snapshot);
        assert_eq!(restored.dependents("b").unwrap(), vec!["a".to_owned()]);
        assert_eq!(restored.get_model("a").unwrap().status, ModelStatus::Active);
    }

    #[test]
    fn json_form_round_trips() {
        let snapshot = populated().snapshot();
        let text = snapshot.to_json().unwrap();
        assert!(text.contains("\"namespacePrefix\": \"pa\""));
        assert_eq!(RegistrySnapshot::from_json(&text).unwrap(), snapshot);
    }

    #[test]
    fn missing_parent_is_reported() {
        let mut snapshot = populated().snapshot();
        snapshot.models[1].classes.retain(|c| c.name != "root");
        let err = restore(&snapshot).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::Replay {
                source: RegistryError::Conflict(Conflict::UnknownParent(_)),
                ..
            }
        ));
    }

    #[test]
    fn duplicate_prefix_is_reported() {
        let mut snapshot = populated().snapshot();
        snapshot.models[1].model.namespace_prefix = "pa".into();
        let err = restore(&snapshot).unwrap_err();
        assert!(matches!(err, SnapshotError::Replay { ref entry, .. } if entry == "b"));
    }

    #[test]
    fn constraints_survive_restore_and_rename() {
        use crate::constraint::{ConstraintParameter, ConstraintType};

        let original = populated();
        original
            .create_constraint(
                "b",
                NewConstraint::new("small", ConstraintType::MinMax)
                    .parameter(ConstraintParameter::simple("maxValue", "10")),
            )
            .unwrap();
        original
            .add_property(
                "b",
                "root",
                NewProperty::new("size")
                    .data_type("d:int")
                    .constraint_ref("pb:small")
                    .constraint(
                        NewConstraint::anonymous(ConstraintType::List)
                            .parameter(ConstraintParameter::list("allowedValues", ["1", "2"])),
                    ),
            )
            .unwrap();

        let snapshot = original.snapshot();
        assert_eq!(snapshot.models[1].constraints.len(), 1);
        let text = snapshot.to_json().unwrap();
        assert!(text.contains("\"constraintRefs\""));
        let restored = restore(&RegistrySnapshot::from_json(&text).unwrap()).unwrap();
        assert_eq!(restored.snapshot(), snapshot);

        // A snapshot referencing an undeclared constraint is refused.
        let mut broken = snapshot;
        broken.models[1].constraints.clear();
        let err = restore(&broken).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::Replay {
                source: RegistryError::Conflict(Conflict::ConstraintRefNotDefined { .. }),
                ..
            }
        ));
    }
}
