//! Operation scripts.
//!
//! An operation is one registry call expressed as data, tagged by `op`:
//!
//! ```json
//! {"op": "create_class", "model": "hr", "class": {"kind": "type", "name": "employee"}}
//! ```
//!
//! Scripts are JSON arrays of operations, applied in order. A script
//! stops at the first rejected operation; earlier ones stay applied.

use serde::{Deserialize, Serialize};

use crate::constraint::{Constraint, NewConstraint};
use crate::error::Result;
use crate::registry::ModelRegistry;
use crate::types::{
    ClassDef, ClassPatch, Model, ModelPatch, NewClass, NewModel, NewProperty, PropertyPatch,
};

/// One registry mutation as data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// [`ModelRegistry::create_model`].
    CreateModel {
        /// The new model.
        model: NewModel,
    },
    /// [`ModelRegistry::update_model`].
    UpdateModel {
        /// Model name.
        model: String,
        /// Changes.
        patch: ModelPatch,
    },
    /// [`ModelRegistry::delete_model`].
    DeleteModel {
        /// Model name.
        model: String,
    },
    /// [`ModelRegistry::create_class`].
    CreateClass {
        /// Owning model.
        model: String,
        /// The new class.
        class: NewClass,
    },
    /// [`ModelRegistry::update_class`].
    UpdateClass {
        /// Owning model.
        model: String,
        /// Class name.
        class: String,
        /// Changes.
        patch: ClassPatch,
    },
    /// [`ModelRegistry::delete_class`].
    DeleteClass {
        /// Owning model.
        model: String,
        /// Class name.
        class: String,
    },
    /// [`ModelRegistry::create_constraint`].
    CreateConstraint {
        /// Owning model.
        model: String,
        /// The new constraint.
        constraint: NewConstraint,
    },
    /// [`ModelRegistry::add_property`].
    AddProperty {
        /// Owning model.
        model: String,
        /// Class name.
        class: String,
        /// The new property.
        property: NewProperty,
    },
    /// [`ModelRegistry::update_property`].
    UpdateProperty {
        /// Owning model.
        model: String,
        /// Class name.
        class: String,
        /// Property name.
        property: String,
        /// Changes.
        patch: PropertyPatch,
    },
    /// [`ModelRegistry::delete_property`].
    DeleteProperty {
        /// Owning model.
        model: String,
        /// Class name.
        class: String,
        /// Property name.
        property: String,
    },
}

impl Operation {
    /// The `op` tag, for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateModel { .. } => "create_model",
            Self::UpdateModel { .. } => "update_model",
            Self::DeleteModel { .. } => "delete_model",
            Self::CreateClass { .. } => "create_class",
            Self::UpdateClass { .. } => "update_class",
            Self::DeleteClass { .. } => "delete_class",
            Self::CreateConstraint { .. } => "create_constraint",
            Self::AddProperty { .. } => "add_property",
            Self::UpdateProperty { .. } => "update_property",
            Self::DeleteProperty { .. } => "delete_property",
        }
    }

    /// Model the operation targets.
    #[must_use]
    pub fn model(&self) -> &str {
        match self {
            Self::CreateModel { model } => &model.name,
            Self::UpdateModel { model, .. }
            | Self::DeleteModel { model }
            | Self::CreateClass { model, .. }
            | Self::UpdateClass { model, .. }
            | Self::DeleteClass { model, .. }
            | Self::CreateConstraint { model, .. }
            | Self::AddProperty { model, .. }
            | Self::UpdateProperty { model, .. }
            | Self::DeleteProperty { model, .. } => model,
        }
    }
}

/// What an applied operation returned.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum OperationOutcome {
    /// A model after the change.
    Model(Model),
    /// A class after the change.
    Class(ClassDef),
    /// A newly declared constraint.
    Constraint(Constraint),
    /// Name of a removed model or class.
    Deleted {
        /// The removed entry.
        name: String,
    },
}

/// Failure of a script: which operation, and why.
#[derive(Debug, thiserror::Error)]
#[error("operation {index} ({op}) failed: {source}")]
pub struct ScriptError {
    /// Zero-based position in the script.
    pub index: usize,
    /// `op` tag of the failed operation.
    pub op: &'static str,
    /// The registry's rejection.
    #[source]
    pub source: crate::error::RegistryError,
}

impl ModelRegistry {
    /// Applies one operation.
    ///
    /// # Errors
    ///
    /// Whatever the underlying call returns.
    pub fn apply(&self, operation: Operation) -> Result<OperationOutcome> {
        Ok(match operation {
            Operation::CreateModel { model } => OperationOutcome::Model(self.create_model(model)?),
            Operation::UpdateModel { model, patch } => {
                OperationOutcome::Model(self.update_model(&model, patch)?)
            }
            Operation::DeleteModel { model } => {
                self.delete_model(&model)?;
                OperationOutcome::Deleted { name: model }
            }
            Operation::CreateClass { model, class } => {
                OperationOutcome::Class(self.create_class(&model, class)?)
            }
            Operation::UpdateClass {
                model,
                class,
                patch,
            } => OperationOutcome::Class(self.update_class(&model, &class, patch)?),
            Operation::DeleteClass { model, class } => {
                self.delete_class(&model, &class)?;
                OperationOutcome::Deleted { name: class }
            }
            Operation::CreateConstraint { model, constraint } => {
                OperationOutcome::Constraint(self.create_constraint(&model, constraint)?)
            }
            Operation::AddProperty {
                model,
                class,
                property,
            } => OperationOutcome::Class(self.add_property(&model, &class, property)?),
            Operation::UpdateProperty {
                model,
                class,
                property,
                patch,
            } => OperationOutcome::Class(self.update_property(&model, &class, &property, patch)?),
            Operation::DeleteProperty {
                model,
                class,
                property,
            } => OperationOutcome::Class(self.delete_property(&model, &class, &property)?),
        })
    }

    /// Applies operations in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// [`ScriptError`] naming the failed operation. Operations before it
    /// stay applied.
    pub fn apply_all(
        &self,
        operations: impl IntoIterator<Item = Operation>,
    ) -> std::result::Result<Vec<OperationOutcome>, ScriptError> {
        operations
            .into_iter()
            .enumerate()
            .map(|(index, operation)| {
                let op = operation.name();
                self.apply(operation)
                    .map_err(|source| ScriptError { index, op, source })
            })
            .collect()
    }
}
