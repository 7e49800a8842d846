//! Model-level constraints.

use super::{ModelRegistry, Mutation, RegistryState};
use crate::constraint::{self, Constraint, NewConstraint};
use crate::error::{Conflict, NotFound, Result, ValidationError};
use crate::events::RegistryEvent;

impl ModelRegistry {
    /// Declares a named constraint in `model`. Allowed on active models.
    ///
    /// # Errors
    ///
    /// - [`NotFound::Model`].
    /// - [`ValidationError`] for a missing or bad name, a missing or
    ///   unknown type, or invalid parameters.
    /// - [`Conflict::DuplicateConstraint`] if the model already has a
    ///   model-level or inline constraint with the name.
    pub fn create_constraint(&self, model: &str, request: NewConstraint) -> Result<Constraint> {
        self.mutate("create_constraint", model, |state| {
            create(state, model, request)
        })
    }

    /// Returns one model-level constraint.
    ///
    /// # Errors
    ///
    /// [`NotFound::Model`] or [`NotFound::Constraint`].
    pub fn get_constraint(&self, model: &str, name: &str) -> Result<Constraint> {
        self.read(|state| -> Result<Constraint> {
            let stored = state
                .record(model)?
                .constraints
                .get(name)
                .ok_or_else(|| NotFound::Constraint {
                    model: model.to_owned(),
                    name: name.to_owned(),
                })?;
            Ok(state.constraint_view(model, stored))
        })
    }

    /// Lists the model-level constraints of `model` by name. Inline
    /// property constraints are not included.
    ///
    /// # Errors
    ///
    /// [`NotFound::Model`].
    pub fn list_constraints(&self, model: &str) -> Result<Vec<Constraint>> {
        self.read(|state| -> Result<Vec<Constraint>> {
            Ok(state
                .record(model)?
                .constraints
                .values()
                .map(|stored| state.constraint_view(model, stored))
                .collect())
        })
    }
}

fn create(
    state: &mut RegistryState,
    model: &str,
    request: NewConstraint,
) -> Result<Mutation<Constraint>> {
    let scope = state.constraint_scope(model, None)?;
    let name = request
        .name
        .clone()
        .ok_or(ValidationError::Empty {
            field: "constraint name",
        })?;
    if scope.declared.contains_key(&name) || scope.taken.contains(&name) {
        return Err(Conflict::DuplicateConstraint {
            model: model.to_owned(),
            name,
        }
        .into());
    }
    let built = constraint::build(request, name.clone(), scope.prefix)?;

    if let Some(record) = state.models.get_mut(model) {
        record.constraints.insert(name.clone(), built.clone());
    }
    Ok(Mutation::new(
        built,
        vec![RegistryEvent::ConstraintCreated {
            model: model.to_owned(),
            constraint: name,
        }],
    ))
}
