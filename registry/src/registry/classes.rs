//! Type and aspect mutations.
//!
//! Parent references cross model boundaries through the dependency graph:
//! a class of model A extending a class of model B adds one link A → B.
//! Built-in parents add nothing.

use std::collections::BTreeSet;

use cmm_catalog::ClassKind;

use super::{ModelRegistry, Mutation, RegistryState};
use crate::class_index::{ClassEntry, ParentRef};
use crate::error::{ActiveRestriction, Conflict, Result, ValidationError};
use crate::events::RegistryEvent;
use crate::names::{self, QualifiedName};
use crate::property;
use crate::resolver::ResolvedRef;
use crate::types::{ClassDef, ClassPatch, NewClass};

impl ModelRegistry {
    /// Creates a type or aspect in `model`.
    ///
    /// # Errors
    ///
    /// - [`NotFound::Model`](crate::NotFound::Model).
    /// - [`ValidationError`] for a bad class or property name, a malformed
    ///   parent reference or a bad property data type.
    /// - [`Conflict::DuplicateClassName`] if any class in any model has the
    ///   name, [`Conflict::DuplicateProperty`] for repeated properties.
    /// - [`Conflict::UnknownParent`], [`Conflict::ParentKindMismatch`] or
    ///   [`Conflict::CircularDependency`] for the parent.
    pub fn create_class(&self, model: &str, request: NewClass) -> Result<ClassDef> {
        self.mutate("create_class", model, |state| create(state, model, request))
    }

    /// Updates title, description or parent of a class.
    ///
    /// # Errors
    ///
    /// - [`NotFound`](crate::NotFound) for the model or class.
    /// - [`ValidationError::ImmutableName`] if the patch renames the class.
    /// - [`Conflict::ActiveModel`] for a parent change while the model is
    ///   active.
    /// - [`Conflict::UnknownParent`], [`Conflict::ParentKindMismatch`],
    ///   [`Conflict::CircularInheritance`] or
    ///   [`Conflict::CircularDependency`] for the new parent.
    pub fn update_class(&self, model: &str, name: &str, patch: ClassPatch) -> Result<ClassDef> {
        self.mutate("update_class", model, |state| {
            update(state, model, name, patch)
        })
    }

    /// Deletes a class of a draft model that no class extends.
    ///
    /// # Errors
    ///
    /// - [`NotFound`](crate::NotFound) for the model or class.
    /// - [`Conflict::ActiveModel`] if the model is active.
    /// - [`Conflict::HasDependents`] while any class, in any model, has it
    ///   as parent.
    pub fn delete_class(&self, model: &str, name: &str) -> Result<()> {
        self.mutate("delete_class", model, |state| delete(state, model, name))
    }
}

/// Resolves a parent reference for a class of `kind`.
fn resolve_parent(
    state: &RegistryState,
    class: &str,
    kind: ClassKind,
    parent: &str,
) -> Result<ResolvedRef> {
    let name = QualifiedName::parse(parent)?;
    let resolved = state
        .resolver()
        .resolve_qualified(&name)
        .map_err(|_| Conflict::UnknownParent(parent.to_owned()))?;
    if resolved.kind() != kind {
        return Err(Conflict::ParentKindMismatch {
            class: class.to_owned(),
            kind,
            parent: parent.to_owned(),
            found: resolved.kind(),
        }
        .into());
    }
    Ok(resolved)
}

fn circular_dependency(model: &str, parent: &str, depends_on: &str) -> Conflict {
    Conflict::CircularDependency {
        parent: parent.to_owned(),
        model: model.to_owned(),
        depends_on: depends_on.to_owned(),
    }
}

fn create(state: &mut RegistryState, model: &str, request: NewClass) -> Result<Mutation<ClassDef>> {
    state.record(model)?;
    names::validate_local_name("class name", &request.name)?;
    state.classes.check_free(&request.name)?;

    let mut properties = Vec::with_capacity(request.properties.len());
    let mut seen = BTreeSet::new();
    let mut scope = state.constraint_scope(model, None)?;
    for declared in request.properties {
        if !seen.insert(declared.name.clone()) {
            return Err(Conflict::DuplicateProperty {
                class: request.name,
                property: declared.name,
            }
            .into());
        }
        properties.push(property::build(
            declared,
            &state.config.default_data_type,
            &state.resolver(),
            &mut scope,
        )?);
    }

    let resolved = request
        .parent_name
        .as_deref()
        .map(|parent| resolve_parent(state, &request.name, request.kind, parent))
        .transpose()?;
    let dependency = resolved
        .as_ref()
        .and_then(ResolvedRef::owner)
        .filter(|owner| *owner != model)
        .map(str::to_owned);

    let mut entry = ClassEntry::new(
        request.name.clone(),
        request.kind,
        model,
        resolved.as_ref().map(ResolvedRef::to_parent_ref),
    );
    entry.title = request.title;
    entry.description = request.description;
    entry.properties = properties;

    if let (Some(depends_on), Some(parent)) = (&dependency, &request.parent_name) {
        state
            .graph
            .add_edge(model, depends_on)
            .map_err(|_| circular_dependency(model, parent, depends_on))?;
    }
    if let Err(err) = state.classes.insert(entry) {
        if let Some(depends_on) = &dependency {
            state.graph.remove_edge(model, depends_on);
        }
        return Err(err.into());
    }

    let class = state.class_view_of(model, &request.name)?;
    Ok(Mutation::new(
        class,
        vec![RegistryEvent::ClassCreated {
            model: model.to_owned(),
            class: request.name,
            kind: request.kind,
        }],
    ))
}

/// A validated parent change.
struct Reparent {
    parent: Option<ParentRef>,
    old_dependency: Option<String>,
    new_dependency: Option<String>,
}

fn plan_reparent(
    state: &RegistryState,
    model: &str,
    entry: &ClassEntry,
    requested: Option<&str>,
) -> Result<Option<Reparent>> {
    let resolver = state.resolver();
    let current = entry.parent().map(|p| resolver.parent_name(p));
    if requested == current.as_deref() {
        return Ok(None);
    }
    if state.record(model)?.status.is_active() {
        return Err(Conflict::ActiveModel {
            model: model.to_owned(),
            action: ActiveRestriction::ParentChange,
        }
        .into());
    }

    let old_dependency = state.foreign_dependency(entry);
    let Some(requested) = requested else {
        return Ok(Some(Reparent {
            parent: None,
            old_dependency,
            new_dependency: None,
        }));
    };

    let resolved = resolve_parent(state, &entry.name, entry.kind, requested)?;
    if let ResolvedRef::Custom { name: parent, .. } = &resolved {
        if parent == &entry.name || state.classes.ancestors(parent).contains(&entry.name.as_str()) {
            return Err(Conflict::CircularInheritance {
                class: entry.name.clone(),
                parent: requested.to_owned(),
            }
            .into());
        }
    }
    let new_dependency = resolved
        .owner()
        .filter(|owner| *owner != model)
        .map(str::to_owned);
    if let Some(depends_on) = &new_dependency {
        if old_dependency.as_ref() != Some(depends_on)
            && state.graph.would_create_cycle(model, depends_on)
        {
            return Err(circular_dependency(model, requested, depends_on).into());
        }
    }
    Ok(Some(Reparent {
        parent: Some(resolved.to_parent_ref()),
        old_dependency,
        new_dependency,
    }))
}

fn update(
    state: &mut RegistryState,
    model: &str,
    name: &str,
    patch: ClassPatch,
) -> Result<Mutation<ClassDef>> {
    state.record(model)?;
    let entry = state.class_in(model, name)?;
    if let Some(requested) = &patch.name {
        if requested != name {
            return Err(ValidationError::ImmutableName {
                field: "class name",
                current: name.to_owned(),
                requested: requested.clone(),
            }
            .into());
        }
    }
    let reparent = match patch.requested_parent() {
        Some(requested) => plan_reparent(state, model, entry, requested)?,
        None => None,
    };

    // Everything is validated; commit.
    if let Some(reparent) = reparent {
        if let Some(depends_on) = &reparent.new_dependency {
            state.graph.insert_edge_unchecked(model, depends_on);
        }
        if let Some(depends_on) = &reparent.old_dependency {
            state.graph.remove_edge(model, depends_on);
        }
        state.classes.set_parent(name, reparent.parent)?;
    }
    if let Some(entry) = state.classes.get_mut(name) {
        if let Some(title) = patch.title {
            entry.title = Some(title);
        }
        if let Some(description) = patch.description {
            entry.description = Some(description);
        }
    }

    let class = state.class_view_of(model, name)?;
    Ok(Mutation::new(
        class,
        vec![RegistryEvent::ClassUpdated {
            model: model.to_owned(),
            class: name.to_owned(),
        }],
    ))
}

fn delete(state: &mut RegistryState, model: &str, name: &str) -> Result<Mutation<()>> {
    let active = state.record(model)?.status.is_active();
    let entry = state.class_in(model, name)?;
    if active {
        return Err(Conflict::ActiveModel {
            model: model.to_owned(),
            action: ActiveRestriction::DeleteClass,
        }
        .into());
    }
    let dependency = state.foreign_dependency(entry);

    state.classes.remove(name)?;
    if let Some(depends_on) = &dependency {
        state.graph.remove_edge(model, depends_on);
    }

    Ok(Mutation::new(
        (),
        vec![RegistryEvent::ClassDeleted {
            model: model.to_owned(),
            class: name.to_owned(),
        }],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{NotFound, RegistryError};
    use crate::types::{NewModel, NewProperty};

    fn registry() -> ModelRegistry {
        let r = ModelRegistry::standard();
        r.create_model(NewModel::new("m1", "u1", "p1")).unwrap();
        r.create_model(NewModel::new("m2", "u2", "p2")).unwrap();
        r
    }

    #[test]
    fn builtin_parent_creates_no_edge() {
        let r = registry();
        let class = r
            .create_class("m1", NewClass::type_("t1").parent("cm:content"))
            .unwrap();
        assert_eq!(class.parent_name.as_deref(), Some("cm:content"));
        assert!(r.dependencies("m1").unwrap().is_empty());
    }

    #[test]
    fn unknown_and_malformed_parents() {
        let r = registry();
        let err = r
            .create_class("m1", NewClass::type_("t1").parent("p2:missing"))
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::Conflict(Conflict::UnknownParent("p2:missing".into()))
        );
        let err = r
            .create_class("m1", NewClass::type_("t1").parent("zz:base"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Conflict(Conflict::UnknownParent(_))));
        let err = r
            .create_class("m1", NewClass::type_("t1").parent("base"))
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::Validation(ValidationError::MalformedQualifiedName("base".into()))
        );
    }

    #[test]
    fn builtin_kind_mismatch() {
        let r = registry();
        let err = r
            .create_class("m1", NewClass::aspect("a1").parent("cm:folder"))
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Conflict(Conflict::ParentKindMismatch {
                kind: ClassKind::Aspect,
                found: ClassKind::Type,
                ..
            })
        ));
    }

    #[test]
    fn class_names_unique_across_models() {
        let r = registry();
        r.create_class("m1", NewClass::aspect("shared")).unwrap();
        let err = r.create_class("m2", NewClass::type_("shared")).unwrap_err();
        assert_eq!(
            err,
            RegistryError::Conflict(Conflict::DuplicateClassName {
                name: "shared".into(),
                owner: "m1".into(),
            })
        );
    }

    #[test]
    fn duplicate_declared_properties() {
        let r = registry();
        let err = r
            .create_class(
                "m1",
                NewClass::type_("t1")
                    .property(NewProperty::new("a"))
                    .property(NewProperty::new("a")),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Conflict(Conflict::DuplicateProperty { .. })
        ));
        assert!(r.get_class("m1", "t1").is_err());
    }

    #[test]
    fn class_addressed_through_wrong_model() {
        let r = registry();
        r.create_class("m1", NewClass::type_("t1")).unwrap();
        assert_eq!(
            r.delete_class("m2", "t1").unwrap_err(),
            RegistryError::NotFound(NotFound::Class {
                model: "m2".into(),
                name: "t1".into(),
            })
        );
    }

    #[test]
    fn reparent_moves_the_dependency_edge() {
        let r = registry();
        r.create_model(NewModel::new("m3", "u3", "p3")).unwrap();
        r.create_class("m2", NewClass::type_("b2")).unwrap();
        r.create_class("m3", NewClass::type_("b3")).unwrap();
        r.create_class("m1", NewClass::type_("t1").parent("p2:b2"))
            .unwrap();
        assert_eq!(r.dependencies("m1").unwrap(), vec!["m2"]);

        let class = r
            .update_class("m1", "t1", ClassPatch::default().parent("p3:b3"))
            .unwrap();
        assert_eq!(class.parent_name.as_deref(), Some("p3:b3"));
        assert_eq!(r.dependencies("m1").unwrap(), vec!["m3"]);
        assert!(r.dependents("m2").unwrap().is_empty());

        r.update_class("m1", "t1", ClassPatch::default().clear_parent())
            .unwrap();
        assert!(r.dependencies("m1").unwrap().is_empty());
    }

    #[test]
    fn shared_edge_survives_one_reparent() {
        let r = registry();
        r.create_class("m2", NewClass::type_("b2")).unwrap();
        r.create_class("m1", NewClass::type_("t1").parent("p2:b2"))
            .unwrap();
        r.create_class("m1", NewClass::type_("t2").parent("p2:b2"))
            .unwrap();
        r.update_class("m1", "t1", ClassPatch::default().parent("cm:content"))
            .unwrap();
        assert_eq!(r.dependents("m2").unwrap(), vec!["m1"]);
        r.delete_class("m1", "t2").unwrap();
        assert!(r.dependents("m2").unwrap().is_empty());
    }

    #[test]
    fn inheritance_cycle_within_a_model() {
        let r = registry();
        r.create_class("m1", NewClass::type_("a")).unwrap();
        r.create_class("m1", NewClass::type_("b").parent("p1:a"))
            .unwrap();
        r.create_class("m1", NewClass::type_("c").parent("p1:b"))
            .unwrap();

        for parent in ["p1:c", "p1:a"] {
            let err = r
                .update_class("m1", "a", ClassPatch::default().parent(parent))
                .unwrap_err();
            assert!(
                matches!(
                    err,
                    RegistryError::Conflict(Conflict::CircularInheritance { .. })
                ),
                "{parent}: {err}"
            );
        }
    }

    #[test]
    fn parent_frozen_while_active_but_metadata_is_not() {
        let r = registry();
        r.create_class("m1", NewClass::type_("t1")).unwrap();
        r.activate_model("m1").unwrap();

        let err = r
            .update_class("m1", "t1", ClassPatch::default().parent("cm:content"))
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Conflict(Conflict::ActiveModel {
                action: ActiveRestriction::ParentChange,
                ..
            })
        ));

        let class = r
            .update_class("m1", "t1", ClassPatch::default().title("Title"))
            .unwrap();
        assert_eq!(class.title.as_deref(), Some("Title"));

        // Restating the unchanged (absent) parent is not a change.
        r.update_class("m1", "t1", ClassPatch::default().clear_parent())
            .unwrap();
    }

    #[test]
    fn rename_rejected() {
        let r = registry();
        r.create_class("m1", NewClass::type_("t1")).unwrap();
        let err = r
            .update_class(
                "m1",
                "t1",
                ClassPatch {
                    name: Some("t2".into()),
                    ..ClassPatch::default()
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Validation(ValidationError::ImmutableName { .. })
        ));
    }

    #[test]
    fn delete_refused_in_active_model() {
        let r = registry();
        r.create_class("m1", NewClass::type_("t1")).unwrap();
        r.activate_model("m1").unwrap();
        let err = r.delete_class("m1", "t1").unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Conflict(Conflict::ActiveModel {
                action: ActiveRestriction::DeleteClass,
                ..
            })
        ));
    }

    #[test]
    fn delete_refused_while_extended_in_same_model() {
        let r = registry();
        r.create_class("m1", NewClass::aspect("a1")).unwrap();
        r.create_class("m1", NewClass::aspect("a2").parent("p1:a1"))
            .unwrap();
        let err = r.delete_class("m1", "a1").unwrap_err();
        assert_eq!(
            err,
            RegistryError::Conflict(Conflict::HasDependents {
                class: "a1".into(),
                dependent: "a2".into(),
            })
        );
    }
}
