//! Draft / Active state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Conflict, RegistryError};
use crate::graph::DependencyGraph;

/// Lifecycle state of a model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ModelStatus {
    /// Editable; the initial state.
    #[default]
    Draft,
    /// Deployed; structural changes are frozen.
    Active,
}

impl ModelStatus {
    /// True for [`ModelStatus::Active`].
    #[must_use]
    pub fn is_active(self) -> bool {
        self == Self::Active
    }
}

impl fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Draft => "draft",
            Self::Active => "active",
        })
    }
}

/// A requested status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Draft → Active.
    Activate,
    /// Active → Draft.
    Deactivate,
}

impl Transition {
    /// The transition that leads from `current` to `target`, or `None`
    /// when they are equal.
    #[must_use]
    pub fn between(current: ModelStatus, target: ModelStatus) -> Option<Self> {
        match (current, target) {
            (ModelStatus::Draft, ModelStatus::Active) => Some(Self::Activate),
            (ModelStatus::Active, ModelStatus::Draft) => Some(Self::Deactivate),
            _ => None,
        }
    }
}

/// Checks a requested status change and returns the transition to apply.
///
/// Nothing is mutated here; the caller flips the flag once every other
/// part of the update has been validated.
///
/// # Errors
///
/// - [`RegistryError::InvalidStateTransition`] if `model` is already in
///   `target` (both directions).
/// - [`Conflict::DependentsExist`] when deactivating a model that another
///   model depends on, whatever that other model's status.
pub fn check_transition(
    model: &str,
    current: ModelStatus,
    target: ModelStatus,
    graph: &DependencyGraph,
) -> Result<Transition, RegistryError> {
    let Some(transition) = Transition::between(current, target) else {
        return Err(RegistryError::InvalidStateTransition {
            model: model.to_owned(),
            status: current,
        });
    };
    if transition == Transition::Deactivate && graph.has_incoming_edges(model) {
        return Err(Conflict::DependentsExist {
            model: model.to_owned(),
            dependents: graph.dependents(model),
        }
        .into());
    }
    Ok(transition)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_is_initial() {
        assert_eq!(ModelStatus::default(), ModelStatus::Draft);
    }

    #[test]
    fn serde_uses_uppercase() {
        assert_eq!(
            serde_json::to_string(&ModelStatus::Active).unwrap(),
            "\"ACTIVE\""
        );
        let s: ModelStatus = serde_json::from_str("\"DRAFT\"").unwrap();
        assert_eq!(s, ModelStatus::Draft);
    }

    #[test]
    fn redundant_transitions_rejected() {
        let g = DependencyGraph::new();
        for status in [ModelStatus::Draft, ModelStatus::Active] {
            let err = check_transition("m1", status, status, &g).unwrap_err();
            assert_eq!(
                err,
                RegistryError::InvalidStateTransition {
                    model: "m1".into(),
                    status,
                }
            );
        }
    }

    #[test]
    fn deactivation_guarded_by_incoming_edges() {
        let mut g = DependencyGraph::new();
        g.add_edge("m2", "m1").unwrap();

        let err = check_transition("m1", ModelStatus::Active, ModelStatus::Draft, &g).unwrap_err();
        assert_eq!(
            err,
            RegistryError::Conflict(Conflict::DependentsExist {
                model: "m1".into(),
                dependents: vec!["m2".into()],
            })
        );

        // The dependent itself has no incoming edges.
        assert_eq!(
            check_transition("m2", ModelStatus::Active, ModelStatus::Draft, &g),
            Ok(Transition::Deactivate)
        );
        // Activation is never guarded.
        assert_eq!(
            check_transition("m1", ModelStatus::Draft, ModelStatus::Active, &g),
            Ok(Transition::Activate)
        );
    }
}
