//! Property mutations on an existing class.

use super::{ModelRegistry, Mutation, RegistryState};
use crate::error::{Conflict, NotFound, Result};
use crate::events::RegistryEvent;
use crate::property;
use crate::types::{ClassDef, NewProperty, PropertyPatch};

impl ModelRegistry {
    /// Adds a property to a class.
    ///
    /// # Errors
    ///
    /// - [`NotFound`] for the model or class.
    /// - [`ValidationError`](crate::ValidationError) for a bad name, an
    ///   unqualified or unknown data type, or an invalid default value.
    /// - [`Conflict::DuplicateProperty`] if the class already declares it.
    pub fn add_property(&self, model: &str, class: &str, request: NewProperty) -> Result<ClassDef> {
        self.mutate("add_property", model, |state| {
            add(state, model, class, request)
        })
    }

    /// Updates a property. Structural attributes are frozen while the
    /// model is active.
    ///
    /// # Errors
    ///
    /// - [`NotFound`] for the model, class or property.
    /// - [`ValidationError`](crate::ValidationError) for a rename or a bad
    ///   data type or default value.
    /// - [`Conflict::ActivePropertyChange`].
    pub fn update_property(
        &self,
        model: &str,
        class: &str,
        name: &str,
        patch: PropertyPatch,
    ) -> Result<ClassDef> {
        self.mutate("update_property", model, |state| {
            update(state, model, class, name, patch)
        })
    }

    /// Removes a property from a class.
    ///
    /// # Errors
    ///
    /// [`NotFound`] for the model, class or property.
    pub fn delete_property(&self, model: &str, class: &str, name: &str) -> Result<ClassDef> {
        self.mutate("delete_property", model, |state| {
            delete(state, model, class, name)
        })
    }
}

fn add(
    state: &mut RegistryState,
    model: &str,
    class: &str,
    request: NewProperty,
) -> Result<Mutation<ClassDef>> {
    state.record(model)?;
    let entry = state.class_in(model, class)?;
    if entry.property(&request.name).is_some() {
        return Err(Conflict::DuplicateProperty {
            class: class.to_owned(),
            property: request.name,
        }
        .into());
    }
    let mut scope = state.constraint_scope(model, None)?;
    let built = property::build(
        request,
        &state.config.default_data_type,
        &state.resolver(),
        &mut scope,
    )?;
    let name = built.name.clone();

    if let Some(entry) = state.classes.get_mut(class) {
        entry.properties.push(built);
    }
    Ok(Mutation::new(
        state.class_view_of(model, class)?,
        vec![RegistryEvent::PropertyAdded {
            model: model.to_owned(),
            class: class.to_owned(),
            property: name,
        }],
    ))
}

fn update(
    state: &mut RegistryState,
    model: &str,
    class: &str,
    name: &str,
    patch: PropertyPatch,
) -> Result<Mutation<ClassDef>> {
    let active = state.record(model)?.status.is_active();
    let current = state
        .class_in(model, class)?
        .property(name)
        .ok_or_else(|| NotFound::Property {
            class: class.to_owned(),
            property: name.to_owned(),
        })?;
    let mut scope = state.constraint_scope(model, Some((class, name)))?;
    let next = property::patch(current, patch, active, &state.resolver(), &mut scope)?;

    if let Some(slot) = state
        .classes
        .get_mut(class)
        .and_then(|entry| entry.properties.iter_mut().find(|p| p.name == name))
    {
        *slot = next;
    }
    Ok(Mutation::new(
        state.class_view_of(model, class)?,
        vec![RegistryEvent::PropertyUpdated {
            model: model.to_owned(),
            class: class.to_owned(),
            property: name.to_owned(),
        }],
    ))
}

fn delete(
    state: &mut RegistryState,
    model: &str,
    class: &str,
    name: &str,
) -> Result<Mutation<ClassDef>> {
    state.record(model)?;
    if state.class_in(model, class)?.property(name).is_none() {
        return Err(NotFound::Property {
            class: class.to_owned(),
            property: name.to_owned(),
        }
        .into());
    }

    if let Some(entry) = state.classes.get_mut(class) {
        entry.properties.retain(|p| p.name != name);
    }
    Ok(Mutation::new(
        state.class_view_of(model, class)?,
        vec![RegistryEvent::PropertyDeleted {
            model: model.to_owned(),
            class: class.to_owned(),
            property: name.to_owned(),
        }],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RegistryError, ValidationError};
    use crate::types::{Facetable, NewClass, NewModel};

    fn registry() -> ModelRegistry {
        let r = ModelRegistry::standard();
        r.create_model(NewModel::new("m1", "u1", "p1")).unwrap();
        r.create_class("m1", NewClass::type_("invoice")).unwrap();
        r
    }

    #[test]
    fn add_uses_default_data_type_and_keeps_order() {
        let r = registry();
        r.add_property("m1", "invoice", NewProperty::new("number"))
            .unwrap();
        let class = r
            .add_property(
                "m1",
                "invoice",
                NewProperty::new("amount").data_type("d:double"),
            )
            .unwrap();
        let names: Vec<&str> = class.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["number", "amount"]);
        assert_eq!(class.properties[0].data_type, "d:text");
    }

    #[test]
    fn add_rejects_unqualified_type_and_duplicates() {
        let r = registry();
        let err = r
            .add_property("m1", "invoice", NewProperty::new("n").data_type("text"))
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::Validation(ValidationError::UnqualifiedDataType("text".into()))
        );

        r.add_property("m1", "invoice", NewProperty::new("n")).unwrap();
        let err = r
            .add_property("m1", "invoice", NewProperty::new("n"))
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Conflict(Conflict::DuplicateProperty { .. })
        ));
    }

    #[test]
    fn add_allowed_on_active_model() {
        let r = registry();
        r.activate_model("m1").unwrap();
        assert!(r
            .add_property("m1", "invoice", NewProperty::new("n"))
            .is_ok());
    }

    #[test]
    fn update_and_delete() {
        let r = registry();
        r.add_property(
            "m1",
            "invoice",
            NewProperty::new("paid").data_type("d:text"),
        )
        .unwrap();
        let class = r
            .update_property(
                "m1",
                "invoice",
                "paid",
                PropertyPatch {
                    data_type: Some("d:boolean".into()),
                    facetable: Some(Facetable::True),
                    default_value: Some("false".into()),
                    ..PropertyPatch::default()
                },
            )
            .unwrap();
        let paid = &class.properties[0];
        assert_eq!(paid.data_type, "d:boolean");
        assert_eq!(paid.facetable, Facetable::Unset);

        let class = r.delete_property("m1", "invoice", "paid").unwrap();
        assert!(class.properties.is_empty());
        assert_eq!(
            r.delete_property("m1", "invoice", "paid").unwrap_err(),
            RegistryError::NotFound(NotFound::Property {
                class: "invoice".into(),
                property: "paid".into(),
            })
        );
    }

    #[test]
    fn rejected_update_leaves_property_untouched() {
        let r = registry();
        r.add_property("m1", "invoice", NewProperty::new("n")).unwrap();
        r.activate_model("m1").unwrap();
        let err = r
            .update_property(
                "m1",
                "invoice",
                "n",
                PropertyPatch {
                    multi_valued: Some(true),
                    title: Some("ignored".into()),
                    ..PropertyPatch::default()
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Conflict(Conflict::ActivePropertyChange { .. })
        ));
        let class = r.get_class("m1", "invoice").unwrap();
        assert!(class.properties[0].title.is_none());
        assert!(!class.properties[0].multi_valued);
    }
}
