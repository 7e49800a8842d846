//! Registry error taxonomy.
//!
//! Every operation returns [`RegistryError`] synchronously. Nothing is
//! retried internally and no error leaves partial state behind.

use std::fmt;

use cmm_catalog::ClassKind;
use thiserror::Error;

use crate::lifecycle::ModelStatus;

/// Result alias used throughout the registry.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Coarse error classes exposed to the API layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller input is structurally wrong.
    Validation,
    /// Caller referenced a non-existent entity.
    NotFound,
    /// A state-dependent rule rejected the operation.
    Conflict,
}

/// Error returned by every registry operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Malformed name, URI, prefix or data type reference.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Unknown model, class or property.
    #[error("not found: {0}")]
    NotFound(#[from] NotFound),

    /// Duplicate, dependency or active-model rule violation.
    #[error("conflict: {0}")]
    Conflict(#[from] Conflict),

    /// Activating an active model or deactivating a draft one.
    #[error("invalid state transition: model '{model}' is already {status}")]
    InvalidStateTransition {
        /// Model the transition was requested for.
        model: String,
        /// The state the model is already in.
        status: ModelStatus,
    },
}

impl RegistryError {
    /// Returns the error class. Redundant transitions count as conflicts.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) | Self::InvalidStateTransition { .. } => ErrorKind::Conflict,
        }
    }

    /// Maps the error class onto an HTTP status code.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
        }
    }
}

/// Structural input errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A mandatory name was empty or blank.
    #[error("{field} must not be empty")]
    Empty {
        /// Which input field.
        field: &'static str,
    },

    /// A name contained a character that is never allowed in it.
    #[error("{field} '{value}' contains illegal character {ch:?}")]
    IllegalCharacter {
        /// Which input field.
        field: &'static str,
        /// The rejected value.
        value: String,
        /// The first offending character.
        ch: char,
    },

    /// A reference was not of the form `prefix:localName`.
    #[error("'{0}' is not a prefixed name of the form prefix:localName")]
    MalformedQualifiedName(String),

    /// A property data type was given without a prefix.
    #[error("data type '{0}' must be a prefixed name such as d:text")]
    UnqualifiedDataType(String),

    /// A property data type is not in the data type catalog.
    #[error("data type '{0}' is not defined")]
    UnknownDataType(String),

    /// A default value does not parse under its data type.
    #[error("default value '{value}' is not valid for data type {data_type}")]
    InvalidDefaultValue {
        /// The rejected default value.
        value: String,
        /// The property's data type.
        data_type: String,
    },

    /// Only one of `namespaceUri` / `namespacePrefix` was supplied.
    #[error("a namespace update requires both namespaceUri and namespacePrefix")]
    IncompleteNamespaceUpdate,

    /// A constraint was declared without a type.
    #[error("constraint '{0}' has no type")]
    MissingConstraintType(String),

    /// A constraint type is neither built in nor a qualified class name.
    #[error("'{0}' is not a constraint type (REGEX, LIST, MINMAX, LENGTH or a qualified class name)")]
    UnknownConstraintType(String),

    /// A parameter the constraint type needs is absent.
    #[error("constraint '{constraint}' requires parameter '{parameter}'")]
    MissingConstraintParameter {
        /// Constraint name.
        constraint: String,
        /// Required parameter.
        parameter: &'static str,
    },

    /// A parameter value is not valid for the constraint type.
    #[error("parameter '{parameter}' of constraint '{constraint}' has invalid value '{value}'")]
    InvalidConstraintParameter {
        /// Constraint name.
        constraint: String,
        /// Parameter name.
        parameter: String,
        /// The rejected value.
        value: String,
    },

    /// The constraint type cannot constrain the property's data type.
    #[error("{constraint_type} constraint '{constraint}' cannot be applied to {data_type}")]
    ConstraintNotApplicable {
        /// Constraint name.
        constraint: String,
        /// Its type.
        constraint_type: String,
        /// The property's data type.
        data_type: String,
    },

    /// A `LIST` value does not parse under the property's data type.
    #[error("allowed value '{value}' of constraint '{constraint}' is not valid for {data_type}")]
    InvalidAllowedValue {
        /// Constraint name.
        constraint: String,
        /// The rejected value.
        value: String,
        /// The property's data type.
        data_type: String,
    },

    /// An update tried to change an immutable identity name.
    #[error("{field} cannot be changed from '{current}' to '{requested}'")]
    ImmutableName {
        /// Which identity field.
        field: &'static str,
        /// The stored value.
        current: String,
        /// The value in the update.
        requested: String,
    },
}

/// Entities that can be missing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFound {
    /// No model with this name.
    #[error("model '{0}'")]
    Model(String),

    /// No class with this name in the given model.
    #[error("class '{name}' in model '{model}'")]
    Class {
        /// Model that was searched.
        model: String,
        /// Requested class name.
        name: String,
    },

    /// No class resolves from this local or prefixed name.
    #[error("class '{0}'")]
    ClassName(String),

    /// No constraint with this name in the given model.
    #[error("constraint '{name}' in model '{model}'")]
    Constraint {
        /// Model that was searched.
        model: String,
        /// Requested constraint name.
        name: String,
    },

    /// No property with this name in the given class.
    #[error("property '{property}' of class '{class}'")]
    Property {
        /// Owning class.
        class: String,
        /// Requested property name.
        property: String,
    },
}

/// State-dependent rule violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Conflict {
    /// Another model already has this name.
    #[error("model name '{0}' is already in use")]
    DuplicateModelName(String),

    /// Another model or a built-in namespace already uses this URI.
    #[error("namespace URI '{0}' is already in use")]
    DuplicateUri(String),

    /// Another model or a built-in namespace already uses this prefix.
    #[error("namespace prefix '{0}' is already in use")]
    DuplicatePrefix(String),

    /// A type or aspect with this local name exists somewhere in the registry.
    #[error("class name '{name}' is already in use in model '{owner}'")]
    DuplicateClassName {
        /// Rejected class name.
        name: String,
        /// Model owning the existing class.
        owner: String,
    },

    /// The class already declares a property with this name.
    #[error("property '{property}' already exists in class '{class}'")]
    DuplicateProperty {
        /// Owning class.
        class: String,
        /// Rejected property name.
        property: String,
    },

    /// The model already has a model-level or inline constraint with this
    /// name.
    #[error("constraint name '{name}' is already in use in model '{model}'")]
    DuplicateConstraint {
        /// Owning model.
        model: String,
        /// Rejected constraint name.
        name: String,
    },

    /// A property references a constraint its model does not declare.
    #[error("constraint '{reference}' is not defined in model '{model}'")]
    ConstraintRefNotDefined {
        /// Model of the property.
        model: String,
        /// The reference as given.
        reference: String,
    },

    /// A property's default value fails one of its constraints.
    #[error("default value '{value}' of property '{property}' violates constraint '{constraint}'")]
    DefaultValueViolatesConstraint {
        /// Property being created or updated.
        property: String,
        /// Failing constraint.
        constraint: String,
        /// The default value.
        value: String,
    },

    /// A type's parent resolved to an aspect or vice versa.
    #[error("{kind} '{class}' cannot extend '{parent}', which is {found}")]
    ParentKindMismatch {
        /// Class being created or updated.
        class: String,
        /// Kind of that class.
        kind: ClassKind,
        /// Requested parent.
        parent: String,
        /// Kind the parent actually has.
        found: ClassKind,
    },

    /// The parent reference names no known class.
    #[error("parent '{0}' does not exist")]
    UnknownParent(String),

    /// The new parent would close a loop in the model dependency graph.
    #[error("parent '{parent}' would make model '{model}' depend on '{depends_on}', which already depends on '{model}'")]
    CircularDependency {
        /// Requested parent.
        parent: String,
        /// Model gaining the dependency.
        model: String,
        /// Model owning the parent.
        depends_on: String,
    },

    /// The new parent would make a class its own ancestor.
    #[error("parent '{parent}' would make class '{class}' inherit from itself")]
    CircularInheritance {
        /// Class being re-parented.
        class: String,
        /// Requested parent.
        parent: String,
    },

    /// Other models still have classes extending this model's classes.
    #[error("model '{model}' is still referenced by model(s) {}", .dependents.join(", "))]
    DependentsExist {
        /// Model being deactivated or deleted.
        model: String,
        /// Models depending on it.
        dependents: Vec<String>,
    },

    /// Another class still names this class as its parent.
    #[error("class '{class}' is the parent of '{dependent}'")]
    HasDependents {
        /// Class being deleted.
        class: String,
        /// One class that extends it.
        dependent: String,
    },

    /// The operation is not allowed while the model is active.
    #[error("cannot {action} while model '{model}' is active")]
    ActiveModel {
        /// The active model.
        model: String,
        /// What was attempted.
        action: ActiveRestriction,
    },

    /// A structural property attribute cannot change while the model is active.
    #[error("cannot change {attribute} of property '{property}' while its model is active")]
    ActivePropertyChange {
        /// Property being updated.
        property: String,
        /// Attribute that would change.
        attribute: &'static str,
    },
}

/// Operations that are frozen while a model is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveRestriction {
    /// Changing the namespace URI or prefix.
    NamespaceChange,
    /// Changing the parent of a type or aspect.
    ParentChange,
    /// Deleting a type or aspect.
    DeleteClass,
    /// Deleting the model.
    DeleteModel,
}

impl fmt::Display for ActiveRestriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NamespaceChange => "change the namespace",
            Self::ParentChange => "change a class parent",
            Self::DeleteClass => "delete a class",
            Self::DeleteModel => "delete the model",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── kind / http_status ───────────────────────────────────────

    #[test]
    fn validation_maps_to_400() {
        let err = RegistryError::from(ValidationError::IncompleteNamespaceUpdate);
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = RegistryError::from(NotFound::Model("m1".into()));
        assert_eq!(err.http_status(), 404);
    }

    #[test]
    fn conflict_maps_to_409() {
        let err = RegistryError::from(Conflict::DuplicateUri("u1".into()));
        assert_eq!(err.http_status(), 409);
    }

    #[test]
    fn redundant_transitions_are_conflicts_both_ways() {
        for status in [ModelStatus::Active, ModelStatus::Draft] {
            let err = RegistryError::InvalidStateTransition {
                model: "m1".into(),
                status,
            };
            assert_eq!(err.kind(), ErrorKind::Conflict);
            assert_eq!(err.http_status(), 409);
        }
    }

    // ── Display ──────────────────────────────────────────────────

    #[test]
    fn display_dependents_exist() {
        let err = RegistryError::from(Conflict::DependentsExist {
            model: "m1".into(),
            dependents: vec!["m2".into(), "m3".into()],
        });
        assert_eq!(
            err.to_string(),
            "conflict: model 'm1' is still referenced by model(s) m2, m3"
        );
    }

    #[test]
    fn display_active_restriction() {
        let err = Conflict::ActiveModel {
            model: "m1".into(),
            action: ActiveRestriction::ParentChange,
        };
        assert_eq!(
            err.to_string(),
            "cannot change a class parent while model 'm1' is active"
        );
    }

    #[test]
    fn display_kind_mismatch() {
        let err = Conflict::ParentKindMismatch {
            class: "typ1".into(),
            kind: ClassKind::Type,
            parent: "p1:asp1".into(),
            found: ClassKind::Aspect,
        };
        assert_eq!(
            err.to_string(),
            "type 'typ1' cannot extend 'p1:asp1', which is aspect"
        );
    }

    #[test]
    fn constraint_errors_map_to_their_classes() {
        let err = RegistryError::from(ValidationError::UnknownConstraintType("NOPE".into()));
        assert_eq!(err.http_status(), 400);
        let err = RegistryError::from(Conflict::ConstraintRefNotDefined {
            model: "m1".into(),
            reference: "p2:c1".into(),
        });
        assert_eq!(err.http_status(), 409);
        assert_eq!(
            err.to_string(),
            "conflict: constraint 'p2:c1' is not defined in model 'm1'"
        );
        let err = RegistryError::from(NotFound::Constraint {
            model: "m1".into(),
            name: "c1".into(),
        });
        assert_eq!(err.http_status(), 404);
    }

    #[test]
    fn display_state_transition() {
        let err = RegistryError::InvalidStateTransition {
            model: "m1".into(),
            status: ModelStatus::Active,
        };
        assert_eq!(
            err.to_string(),
            "invalid state transition: model 'm1' is already active"
        );
    }
}
