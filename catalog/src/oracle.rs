//! The catalog oracle consumed by the custom model registry.
//!
//! The registry never inspects the built-in data directly; it asks an
//! oracle whether a prefixed name exists and what kind it is. Hosts with a
//! richer dictionary can supply their own implementation.

use crate::model::{Catalog, ClassKind, NamespaceBinding, ValueCheck};

/// Read-only view of the built-in, non-editable definitions.
pub trait BuiltinCatalog: Send + Sync {
    /// Returns every built-in namespace. These URIs and prefixes are
    /// reserved and can never be registered by a custom model.
    fn namespaces(&self) -> Vec<NamespaceBinding>;

    /// Resolves `prefix:local` to the kind of a built-in class.
    fn resolve_class(&self, prefix: &str, local: &str) -> Option<ClassKind>;

    /// Resolves `prefix:local` to a property data type.
    fn resolve_data_type(&self, prefix: &str, local: &str) -> Option<ValueCheck>;

    /// Returns the URI bound to a built-in prefix.
    fn namespace_uri(&self, prefix: &str) -> Option<String> {
        self.namespaces()
            .into_iter()
            .find(|ns| ns.prefix == prefix)
            .map(|ns| ns.uri)
    }
}

impl<T: BuiltinCatalog + ?Sized> BuiltinCatalog for &T {
    fn namespaces(&self) -> Vec<NamespaceBinding> {
        (**self).namespaces()
    }

    fn resolve_class(&self, prefix: &str, local: &str) -> Option<ClassKind> {
        (**self).resolve_class(prefix, local)
    }

    fn resolve_data_type(&self, prefix: &str, local: &str) -> Option<ValueCheck> {
        (**self).resolve_data_type(prefix, local)
    }

    fn namespace_uri(&self, prefix: &str) -> Option<String> {
        (**self).namespace_uri(prefix)
    }
}

impl BuiltinCatalog for Catalog {
    fn namespaces(&self) -> Vec<NamespaceBinding> {
        self.modules
            .iter()
            .map(|m| NamespaceBinding {
                uri: m.namespace.uri.to_owned(),
                prefix: m.namespace.prefix.to_owned(),
            })
            .collect()
    }

    fn resolve_class(&self, prefix: &str, local: &str) -> Option<ClassKind> {
        self.find_class(prefix, local).map(|c| c.kind)
    }

    fn resolve_data_type(&self, prefix: &str, local: &str) -> Option<ValueCheck> {
        self.find_data_type(prefix, local).map(|d| d.check)
    }

    fn namespace_uri(&self, prefix: &str) -> Option<String> {
        self.module_by_prefix(prefix)
            .map(|m| m.namespace.uri.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_builtin_kinds() {
        let catalog = Catalog::standard();
        assert_eq!(catalog.resolve_class("cm", "content"), Some(ClassKind::Type));
        assert_eq!(catalog.resolve_class("cm", "titled"), Some(ClassKind::Aspect));
        assert_eq!(catalog.resolve_class("cm", "nope"), None);
        assert_eq!(catalog.resolve_class("zz", "content"), None);
    }

    #[test]
    fn resolves_data_types() {
        let catalog = Catalog::standard();
        assert_eq!(catalog.resolve_data_type("d", "int"), Some(ValueCheck::Integer));
        assert_eq!(catalog.resolve_data_type("d", "text"), Some(ValueCheck::Any));
        assert_eq!(catalog.resolve_data_type("cm", "text"), None);
    }

    #[test]
    fn namespace_uri_lookup() {
        let catalog = Catalog::standard();
        assert_eq!(
            catalog.namespace_uri("cm").as_deref(),
            Some(crate::model::uris::NS_CM)
        );
        assert!(catalog.namespace_uri("custom").is_none());
    }
}
