//! Bidirectional URI ↔ prefix table with registry-wide uniqueness.
//!
//! Built-in namespaces are reserved up front so that a custom model can
//! never shadow them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ActiveRestriction, Conflict, NotFound, RegistryError, ValidationError};
use crate::lifecycle::ModelStatus;
use crate::names;

/// Who owns a registered URI or prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceOwner {
    /// A namespace of the built-in catalog.
    BuiltIn,
    /// A custom model, by name.
    Model(String),
}

impl NamespaceOwner {
    fn is_model(&self, name: &str) -> bool {
        matches!(self, Self::Model(m) if m == name)
    }
}

/// A namespace binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Namespace {
    /// Namespace URI.
    pub uri: String,
    /// Namespace prefix.
    pub prefix: String,
}

impl Namespace {
    /// Builds a namespace binding.
    #[must_use]
    pub fn new(uri: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            prefix: prefix.into(),
        }
    }
}

/// A validated namespace change waiting to be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceChange {
    /// Model being renamed.
    pub model: String,
    /// The binding before the change.
    pub old: Namespace,
    /// The binding after the change.
    pub new: Namespace,
}

/// URI and prefix registry.
#[derive(Debug, Clone, Default)]
pub struct NamespaceTable {
    by_model: BTreeMap<String, Namespace>,
    uris: BTreeMap<String, NamespaceOwner>,
    prefixes: BTreeMap<String, NamespaceOwner>,
}

impl NamespaceTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a built-in namespace.
    pub fn reserve_builtin(&mut self, uri: &str, prefix: &str) {
        self.uris.insert(uri.to_owned(), NamespaceOwner::BuiltIn);
        self.prefixes
            .insert(prefix.to_owned(), NamespaceOwner::BuiltIn);
    }

    /// Checks that `ns` is free for `model`. Values already held by
    /// `model` itself do not collide.
    ///
    /// # Errors
    ///
    /// Returns [`Conflict::DuplicateUri`] or [`Conflict::DuplicatePrefix`].
    pub fn check_available(&self, model: &str, ns: &Namespace) -> Result<(), Conflict> {
        if let Some(owner) = self.uris.get(&ns.uri) {
            if !owner.is_model(model) {
                return Err(Conflict::DuplicateUri(ns.uri.clone()));
            }
        }
        if let Some(owner) = self.prefixes.get(&ns.prefix) {
            if !owner.is_model(model) {
                return Err(Conflict::DuplicatePrefix(ns.prefix.clone()));
            }
        }
        Ok(())
    }

    /// Registers the namespace of a newly created model.
    ///
    /// # Errors
    ///
    /// Returns [`Conflict::DuplicateUri`] or [`Conflict::DuplicatePrefix`]
    /// without modifying the table.
    pub fn register(&mut self, model: &str, ns: Namespace) -> Result<(), Conflict> {
        self.check_available(model, &ns)?;
        self.insert(model, ns);
        Ok(())
    }

    fn insert(&mut self, model: &str, ns: Namespace) {
        let owner = NamespaceOwner::Model(model.to_owned());
        self.uris.insert(ns.uri.clone(), owner.clone());
        self.prefixes.insert(ns.prefix.clone(), owner);
        self.by_model.insert(model.to_owned(), ns);
    }

    /// Validates a rename request without applying it.
    ///
    /// Returns `Ok(None)` when neither field is supplied or both match the
    /// current binding.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::IncompleteNamespaceUpdate`] if exactly one of
    ///   `uri` / `prefix` is supplied.
    /// - [`Conflict::ActiveModel`] if the binding would change while
    ///   `status` is active.
    /// - [`Conflict::DuplicateUri`] / [`Conflict::DuplicatePrefix`] on a
    ///   collision with another model or a built-in namespace.
    pub fn plan_rename(
        &self,
        model: &str,
        status: ModelStatus,
        uri: Option<&str>,
        prefix: Option<&str>,
    ) -> Result<Option<NamespaceChange>, RegistryError> {
        let (uri, prefix) = match (uri, prefix) {
            (None, None) => return Ok(None),
            (Some(uri), Some(prefix)) => (uri, prefix),
            _ => return Err(ValidationError::IncompleteNamespaceUpdate.into()),
        };
        names::validate_uri(uri)?;
        names::validate_prefix(prefix)?;

        let Some(old) = self.by_model.get(model) else {
            return Err(NotFound::Model(model.to_owned()).into());
        };
        if old.uri == uri && old.prefix == prefix {
            return Ok(None);
        }
        if status == ModelStatus::Active {
            return Err(Conflict::ActiveModel {
                model: model.to_owned(),
                action: ActiveRestriction::NamespaceChange,
            }
            .into());
        }
        let new = Namespace::new(uri, prefix);
        self.check_available(model, &new)?;
        Ok(Some(NamespaceChange {
            model: model.to_owned(),
            old: old.clone(),
            new,
        }))
    }

    /// Applies a change produced by [`plan_rename`](Self::plan_rename).
    pub fn apply(&mut self, change: &NamespaceChange) {
        self.uris.remove(&change.old.uri);
        self.prefixes.remove(&change.old.prefix);
        self.insert(&change.model, change.new.clone());
    }

    /// Validates and applies a rename in one step.
    ///
    /// # Errors
    ///
    /// See [`plan_rename`](Self::plan_rename).
    pub fn rename(
        &mut self,
        model: &str,
        status: ModelStatus,
        uri: Option<&str>,
        prefix: Option<&str>,
    ) -> Result<Option<NamespaceChange>, RegistryError> {
        let change = self.plan_rename(model, status, uri, prefix)?;
        if let Some(change) = &change {
            self.apply(change);
        }
        Ok(change)
    }

    /// Releases a deleted model's URI and prefix.
    pub fn unregister(&mut self, model: &str) -> Option<Namespace> {
        let ns = self.by_model.remove(model)?;
        self.uris.remove(&ns.uri);
        self.prefixes.remove(&ns.prefix);
        Some(ns)
    }

    /// Returns the namespace bound to `model`.
    #[must_use]
    pub fn get(&self, model: &str) -> Option<&Namespace> {
        self.by_model.get(model)
    }

    /// Returns who owns `prefix`.
    #[must_use]
    pub fn owner_of_prefix(&self, prefix: &str) -> Option<&NamespaceOwner> {
        self.prefixes.get(prefix)
    }

    /// Returns who owns `uri`.
    #[must_use]
    pub fn owner_of_uri(&self, uri: &str) -> Option<&NamespaceOwner> {
        self.uris.get(uri)
    }
}
