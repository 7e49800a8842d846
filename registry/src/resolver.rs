//! Single entry point for resolving class and data type references.
//!
//! Custom classes are consulted first, then the built-in catalog. Every
//! caller gets a typed [`ResolvedRef`] or [`LookupError`] and maps it onto
//! its own error.

use cmm_catalog::{BuiltinCatalog, ClassKind, ValueCheck};
use thiserror::Error;

use crate::class_index::{ClassIndex, ParentRef};
use crate::error::ValidationError;
use crate::names::QualifiedName;
use crate::namespace::{NamespaceOwner, NamespaceTable};

/// A successfully resolved class reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedRef {
    /// A custom class.
    Custom {
        /// Local name.
        name: String,
        /// Owning model.
        owner: String,
        /// Type or aspect.
        kind: ClassKind,
    },
    /// A built-in class.
    BuiltIn {
        /// Prefixed name.
        name: QualifiedName,
        /// Type or aspect.
        kind: ClassKind,
    },
}

impl ResolvedRef {
    /// Kind of the resolved class.
    #[must_use]
    pub fn kind(&self) -> ClassKind {
        match self {
            Self::Custom { kind, .. } | Self::BuiltIn { kind, .. } => *kind,
        }
    }

    /// Owning model, for custom classes.
    #[must_use]
    pub fn owner(&self) -> Option<&str> {
        match self {
            Self::Custom { owner, .. } => Some(owner),
            Self::BuiltIn { .. } => None,
        }
    }

    /// The form stored as a class parent.
    #[must_use]
    pub fn to_parent_ref(&self) -> ParentRef {
        match self {
            Self::Custom { name, .. } => ParentRef::Custom(name.clone()),
            Self::BuiltIn { name, .. } => ParentRef::BuiltIn(name.clone()),
        }
    }
}

/// Why a reference did not resolve.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// Not a well-formed `prefix:local` reference.
    #[error(transparent)]
    Malformed(#[from] ValidationError),
    /// No model or built-in namespace uses the prefix.
    #[error("no namespace is bound to prefix '{0}'")]
    UnknownPrefix(String),
    /// The namespace exists but defines no such class.
    #[error("no class named '{0}'")]
    NotFound(String),
}

/// Borrowed view over the tables a lookup needs.
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    namespaces: &'a NamespaceTable,
    classes: &'a ClassIndex,
    catalog: &'a dyn BuiltinCatalog,
}

impl<'a> Resolver<'a> {
    /// Builds a resolver.
    #[must_use]
    pub fn new(
        namespaces: &'a NamespaceTable,
        classes: &'a ClassIndex,
        catalog: &'a dyn BuiltinCatalog,
    ) -> Self {
        Self {
            namespaces,
            classes,
            catalog,
        }
    }

    /// Resolves a bare local name (custom classes only) or a prefixed name
    /// (custom or built-in).
    ///
    /// # Errors
    ///
    /// See [`LookupError`].
    pub fn resolve(&self, reference: &str) -> Result<ResolvedRef, LookupError> {
        if QualifiedName::is_qualified(reference) {
            return self.resolve_qualified(&QualifiedName::parse(reference)?);
        }
        let entry = self
            .classes
            .get(reference)
            .ok_or_else(|| LookupError::NotFound(reference.to_owned()))?;
        Ok(ResolvedRef::Custom {
            name: entry.name.clone(),
            owner: entry.owner.clone(),
            kind: entry.kind,
        })
    }

    /// Resolves `prefix:local`.
    ///
    /// # Errors
    ///
    /// [`LookupError::UnknownPrefix`] or [`LookupError::NotFound`].
    pub fn resolve_qualified(&self, name: &QualifiedName) -> Result<ResolvedRef, LookupError> {
        match self.namespaces.owner_of_prefix(&name.prefix) {
            Some(NamespaceOwner::Model(model)) => self
                .classes
                .get(&name.local)
                .filter(|entry| &entry.owner == model)
                .map(|entry| ResolvedRef::Custom {
                    name: entry.name.clone(),
                    owner: entry.owner.clone(),
                    kind: entry.kind,
                })
                .ok_or_else(|| LookupError::NotFound(name.to_string())),
            Some(NamespaceOwner::BuiltIn) => self
                .catalog
                .resolve_class(&name.prefix, &name.local)
                .map(|kind| ResolvedRef::BuiltIn {
                    name: name.clone(),
                    kind,
                })
                .ok_or_else(|| LookupError::NotFound(name.to_string())),
            None => Err(LookupError::UnknownPrefix(name.prefix.clone())),
        }
    }

    /// Resolves a property data type. Data types only come from the
    /// built-in catalog.
    ///
    /// # Errors
    ///
    /// [`ValidationError::UnqualifiedDataType`] for a bare name,
    /// [`ValidationError::UnknownDataType`] for a name the catalog lacks.
    pub fn resolve_data_type(&self, data_type: &str) -> Result<ValueCheck, ValidationError> {
        if !QualifiedName::is_qualified(data_type) {
            return Err(ValidationError::UnqualifiedDataType(data_type.to_owned()));
        }
        let name = QualifiedName::parse(data_type)?;
        self.catalog
            .resolve_data_type(&name.prefix, &name.local)
            .ok_or_else(|| ValidationError::UnknownDataType(data_type.to_owned()))
    }

    /// Current prefixed form of a stored parent reference.
    #[must_use]
    pub fn parent_name(&self, parent: &ParentRef) -> String {
        match parent {
            ParentRef::BuiltIn(name) => name.to_string(),
            ParentRef::Custom(local) => self.prefixed_name(local),
        }
    }

    /// Current prefixed form of a custom class, derived from its owner's
    /// prefix. Falls back to the bare name for an unindexed class.
    #[must_use]
    pub fn prefixed_name(&self, local: &str) -> String {
        self.classes
            .get(local)
            .and_then(|entry| self.namespaces.get(&entry.owner))
            .map_or_else(|| local.to_owned(), |ns| format!("{}:{local}", ns.prefix))
    }
}
