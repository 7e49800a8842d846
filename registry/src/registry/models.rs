//! Model mutations: create, update (namespace, status, metadata), delete.

use std::collections::BTreeMap;

use super::{ModelRecord, ModelRegistry, Mutation, RegistryState};
use crate::error::{ActiveRestriction, Conflict, NotFound, Result, ValidationError};
use crate::events::RegistryEvent;
use crate::lifecycle::{check_transition, ModelStatus, Transition};
use crate::names;
use crate::namespace::Namespace;
use crate::types::{Model, ModelPatch, NewModel};

impl ModelRegistry {
    /// Creates a draft model and registers its namespace.
    ///
    /// # Errors
    ///
    /// - [`ValidationError`] for a malformed name, URI or prefix.
    /// - [`Conflict::DuplicateModelName`], [`Conflict::DuplicateUri`] or
    ///   [`Conflict::DuplicatePrefix`]; built-in namespaces count as taken.
    pub fn create_model(&self, request: NewModel) -> Result<Model> {
        let name = request.name.clone();
        self.mutate("create_model", &name, |state| create(state, request))
    }

    /// Applies a partial update.
    ///
    /// Namespace and status rules are both checked against the status the
    /// model has before the update.
    ///
    /// # Errors
    ///
    /// - [`NotFound::Model`].
    /// - [`ValidationError::ImmutableName`] if the patch renames the model.
    /// - [`ValidationError::IncompleteNamespaceUpdate`] if only one of URI
    ///   and prefix is supplied.
    /// - [`Conflict::ActiveModel`] for a namespace change on an active model.
    /// - [`Conflict::DuplicateUri`] / [`Conflict::DuplicatePrefix`].
    /// - [`RegistryError::InvalidStateTransition`](crate::RegistryError::InvalidStateTransition)
    ///   if the model is already in the requested status.
    /// - [`Conflict::DependentsExist`] when deactivating a model others
    ///   depend on.
    pub fn update_model(&self, name: &str, patch: ModelPatch) -> Result<Model> {
        self.mutate("update_model", name, |state| update(state, name, patch))
    }

    /// Draft → Active.
    ///
    /// # Errors
    ///
    /// [`NotFound::Model`], or
    /// [`RegistryError::InvalidStateTransition`](crate::RegistryError::InvalidStateTransition)
    /// if already active.
    pub fn activate_model(&self, name: &str) -> Result<Model> {
        self.update_model(name, ModelPatch::default().status(ModelStatus::Active))
    }

    /// Active → Draft.
    ///
    /// # Errors
    ///
    /// [`NotFound::Model`], [`Conflict::DependentsExist`] while any other
    /// model has a class extending one of this model's classes, or
    /// [`RegistryError::InvalidStateTransition`](crate::RegistryError::InvalidStateTransition)
    /// if already draft.
    pub fn deactivate_model(&self, name: &str) -> Result<Model> {
        self.update_model(name, ModelPatch::default().status(ModelStatus::Draft))
    }

    /// Deletes a draft model together with its classes.
    ///
    /// # Errors
    ///
    /// - [`NotFound::Model`].
    /// - [`Conflict::ActiveModel`] if the model is active.
    /// - [`Conflict::DependentsExist`] while another model extends one of
    ///   its classes.
    pub fn delete_model(&self, name: &str) -> Result<()> {
        self.mutate("delete_model", name, |state| delete(state, name))
    }
}

fn create(state: &mut RegistryState, request: NewModel) -> Result<Mutation<Model>> {
    names::validate_local_name("model name", &request.name)?;
    names::validate_uri(&request.namespace_uri)?;
    names::validate_prefix(&request.namespace_prefix)?;
    if state.models.contains_key(&request.name) {
        return Err(Conflict::DuplicateModelName(request.name).into());
    }

    state.namespaces.register(
        &request.name,
        Namespace::new(request.namespace_uri, request.namespace_prefix),
    )?;
    state.models.insert(
        request.name.clone(),
        ModelRecord {
            status: ModelStatus::Draft,
            description: request.description,
            author: request.author,
            constraints: BTreeMap::new(),
        },
    );

    let model = view(state, &request.name)?;
    Ok(Mutation::new(
        model,
        vec![RegistryEvent::ModelCreated {
            model: request.name,
        }],
    ))
}

fn update(state: &mut RegistryState, name: &str, patch: ModelPatch) -> Result<Mutation<Model>> {
    let before = state.record(name)?.status;
    if let Some(requested) = &patch.name {
        if requested != name {
            return Err(ValidationError::ImmutableName {
                field: "model name",
                current: name.to_owned(),
                requested: requested.clone(),
            }
            .into());
        }
    }

    let change = state.namespaces.plan_rename(
        name,
        before,
        patch.namespace_uri.as_deref(),
        patch.namespace_prefix.as_deref(),
    )?;
    let transition = patch
        .status
        .map(|target| check_transition(name, before, target, &state.graph))
        .transpose()?;

    // Everything is validated; commit.
    let mut events = Vec::new();
    if let Some(change) = change {
        state.namespaces.apply(&change);
        events.push(RegistryEvent::NamespaceChanged {
            model: name.to_owned(),
            old_prefix: change.old.prefix,
            new_prefix: change.new.prefix,
            old_uri: change.old.uri,
            new_uri: change.new.uri,
        });
    }
    let touches_metadata = patch.touches_metadata();
    if let Some(record) = state.models.get_mut(name) {
        if let Some(description) = patch.description {
            record.description = Some(description);
        }
        if let Some(author) = patch.author {
            record.author = Some(author);
        }
        match transition {
            Some(Transition::Activate) => {
                record.status = ModelStatus::Active;
                events.push(RegistryEvent::ModelActivated {
                    model: name.to_owned(),
                });
            }
            Some(Transition::Deactivate) => {
                record.status = ModelStatus::Draft;
                events.push(RegistryEvent::ModelDeactivated {
                    model: name.to_owned(),
                });
            }
            None => {}
        }
    }
    if touches_metadata {
        events.push(RegistryEvent::ModelUpdated {
            model: name.to_owned(),
        });
    }

    Ok(Mutation::new(view(state, name)?, events))
}

fn delete(state: &mut RegistryState, name: &str) -> Result<Mutation<()>> {
    if state.record(name)?.status.is_active() {
        return Err(Conflict::ActiveModel {
            model: name.to_owned(),
            action: ActiveRestriction::DeleteModel,
        }
        .into());
    }
    if state.graph.has_incoming_edges(name) {
        return Err(Conflict::DependentsExist {
            model: name.to_owned(),
            dependents: state.graph.dependents(name),
        }
        .into());
    }

    let removed = state.classes.remove_all_of(name);
    state.graph.remove_node(name);
    state.namespaces.unregister(name);
    state.models.remove(name);
    tracing::debug!(model = name, classes = removed.len(), "model classes removed");

    Ok(Mutation::new(
        (),
        vec![RegistryEvent::ModelDeleted {
            model: name.to_owned(),
        }],
    ))
}

fn view(state: &RegistryState, name: &str) -> Result<Model> {
    state
        .model_view(name)
        .ok_or_else(|| NotFound::Model(name.to_owned()).into())
}
