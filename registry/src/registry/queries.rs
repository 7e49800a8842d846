//! Read-only queries. All of them take the shared lock.

use cmm_catalog::ClassKind;

use super::ModelRegistry;
use crate::error::{NotFound, RegistryError, Result};
use crate::names::QualifiedName;
use crate::paging::{Page, Paging};
use crate::resolver::{LookupError, ResolvedRef};
use crate::types::{ClassDef, ClassLookup, Model, RegistryInfo};

impl ModelRegistry {
    /// Returns one model.
    ///
    /// # Errors
    ///
    /// [`NotFound::Model`].
    pub fn get_model(&self, name: &str) -> Result<Model> {
        self.read(|state| -> Result<Model> {
            state
                .model_view(name)
                .ok_or_else(|| NotFound::Model(name.to_owned()).into())
        })
    }

    /// Lists models ordered by name.
    #[must_use]
    pub fn list_models(&self, paging: Paging) -> Page<Model> {
        self.read(|state| {
            let total = state.models.len();
            let models = state.models.keys().filter_map(|name| state.model_view(name));
            Page::window(models, total, paging)
        })
    }

    /// Returns one class of `model`.
    ///
    /// # Errors
    ///
    /// [`NotFound::Model`] or [`NotFound::Class`].
    pub fn get_class(&self, model: &str, name: &str) -> Result<ClassDef> {
        self.read(|state| -> Result<ClassDef> {
            state.record(model)?;
            state.class_view_of(model, name)
        })
    }

    /// Lists the classes of `model`, optionally of one kind, ordered by name.
    ///
    /// # Errors
    ///
    /// [`NotFound::Model`].
    pub fn list_classes(&self, model: &str, kind: Option<ClassKind>) -> Result<Vec<ClassDef>> {
        self.read(|state| -> Result<Vec<ClassDef>> {
            state.record(model)?;
            Ok(state
                .classes
                .classes_of(model)
                .filter(|entry| kind.map_or(true, |k| entry.kind == k))
                .map(|entry| state.class_view(entry))
                .collect())
        })
    }

    /// Finds a class by bare local name (custom classes) or by prefixed
    /// name (custom or built-in).
    ///
    /// # Errors
    ///
    /// [`ValidationError::MalformedQualifiedName`](crate::ValidationError::MalformedQualifiedName)
    /// or [`NotFound::ClassName`].
    pub fn lookup_class(&self, reference: &str) -> Result<ClassLookup> {
        self.read(|state| -> Result<ClassLookup> {
            let resolved = state
                .resolver()
                .resolve(reference)
                .map_err(|err| lookup_error(reference, err))?;
            Ok(match resolved {
                ResolvedRef::Custom { name, .. } => {
                    let entry = state
                        .classes
                        .get(&name)
                        .ok_or_else(|| NotFound::ClassName(reference.to_owned()))?;
                    ClassLookup::Custom(state.class_view(entry))
                }
                ResolvedRef::BuiltIn { name, kind } => ClassLookup::BuiltIn {
                    prefixed_name: name.to_string(),
                    kind,
                },
            })
        })
    }

    /// Kind of the class a prefixed name refers to.
    ///
    /// # Errors
    ///
    /// [`ValidationError::MalformedQualifiedName`](crate::ValidationError::MalformedQualifiedName)
    /// or [`NotFound::ClassName`].
    pub fn resolve_parent_kind(&self, qualified: &str) -> Result<ClassKind> {
        let name = QualifiedName::parse(qualified)?;
        self.read(|state| {
            state
                .resolver()
                .resolve_qualified(&name)
                .map(|resolved| resolved.kind())
                .map_err(|err| lookup_error(qualified, err))
        })
    }

    /// Models `model` depends on.
    ///
    /// # Errors
    ///
    /// [`NotFound::Model`].
    pub fn dependencies(&self, model: &str) -> Result<Vec<String>> {
        self.read(|state| -> Result<Vec<String>> {
            state.record(model)?;
            Ok(state.graph.dependencies(model))
        })
    }

    /// Models that depend on `model`.
    ///
    /// # Errors
    ///
    /// [`NotFound::Model`].
    pub fn dependents(&self, model: &str) -> Result<Vec<String>> {
        self.read(|state| -> Result<Vec<String>> {
            state.record(model)?;
            Ok(state.graph.dependents(model))
        })
    }

    /// Counts of active models and of the types and aspects they own.
    #[must_use]
    pub fn info(&self) -> RegistryInfo {
        self.read(|state| {
            let mut info = RegistryInfo::default();
            for (name, record) in &state.models {
                if !record.status.is_active() {
                    continue;
                }
                info.active_models += 1;
                for entry in state.classes.classes_of(name) {
                    match entry.kind {
                        ClassKind::Type => info.active_types += 1,
                        ClassKind::Aspect => info.active_aspects += 1,
                    }
                }
            }
            info
        })
    }
}

fn lookup_error(reference: &str, err: LookupError) -> RegistryError {
    match err {
        LookupError::Malformed(err) => err.into(),
        LookupError::UnknownPrefix(_) | LookupError::NotFound(_) => {
            NotFound::ClassName(reference.to_owned()).into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::{NewClass, NewModel};

    fn registry() -> ModelRegistry {
        let r = ModelRegistry::standard();
        for i in 1..=5 {
            r.create_model(NewModel::new(format!("m{i}"), format!("u{i}"), format!("p{i}")))
                .unwrap();
        }
        r.create_class("m1", NewClass::type_("t1")).unwrap();
        r.create_class("m1", NewClass::aspect("a1")).unwrap();
        r.create_class("m1", NewClass::aspect("a2")).unwrap();
        r
    }

    #[test]
    fn list_models_pages_by_name() {
        let r = registry();
        let page = r.list_models(Paging::new(1, 2));
        let names: Vec<&str> = page.items.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["m2", "m3"]);
        assert!(page.has_more_items);
        assert_eq!(page.total_items, 5);
    }

    #[test]
    fn list_classes_by_kind() {
        let r = registry();
        assert_eq!(r.list_classes("m1", None).unwrap().len(), 3);
        assert_eq!(
            r.list_classes("m1", Some(ClassKind::Aspect)).unwrap().len(),
            2
        );
        assert!(r.list_classes("m2", None).unwrap().is_empty());
        assert_eq!(
            r.list_classes("nope", None).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn lookup_by_bare_prefixed_and_builtin_names() {
        let r = registry();
        assert!(matches!(r.lookup_class("t1"), Ok(ClassLookup::Custom(_))));
        assert!(matches!(r.lookup_class("p1:a1"), Ok(ClassLookup::Custom(_))));
        assert_eq!(
            r.lookup_class("cm:folder").unwrap(),
            ClassLookup::BuiltIn {
                prefixed_name: "cm:folder".into(),
                kind: ClassKind::Type,
            }
        );
        assert_eq!(r.lookup_class("p2:t1").unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(r.lookup_class("p1:").unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test]
    fn parent_kind_resolution() {
        let r = registry();
        assert_eq!(r.resolve_parent_kind("p1:a1").unwrap(), ClassKind::Aspect);
        assert_eq!(r.resolve_parent_kind("cm:titled").unwrap(), ClassKind::Aspect);
        assert_eq!(
            r.resolve_parent_kind("a1").unwrap_err().kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            r.resolve_parent_kind("cm:nothing").unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn info_counts_active_models_only() {
        let r = registry();
        r.create_class("m2", NewClass::type_("t2")).unwrap();
        r.activate_model("m1").unwrap();
        assert_eq!(
            r.info(),
            RegistryInfo {
                active_models: 1,
                active_types: 1,
                active_aspects: 2,
            }
        );
    }
}
