//! `sys` namespace: the root of every content type.
//!
//! Custom types ultimately descend from `sys:base`. The system aspects are
//! listed so that they resolve as parents, but nothing here carries
//! properties of its own.

use crate::model::uris::*;
use crate::model::{BuiltinClass, ClassKind, Namespace, NamespaceModule};

/// Returns the `sys` namespace module.
#[must_use]
pub fn module() -> NamespaceModule {
    NamespaceModule {
        namespace: Namespace {
            prefix: "sys",
            uri: NS_SYS,
            label: "System",
            comment: "System definitions shared by every content model.",
        },
        classes: classes(),
        data_types: Vec::new(),
    }
}

fn classes() -> Vec<BuiltinClass> {
    vec![
        BuiltinClass {
            name: "base",
            kind: ClassKind::Type,
            parent: None,
            label: "Base",
            comment: "The root type of every node in the repository.",
        },
        BuiltinClass {
            name: "referenceable",
            kind: ClassKind::Aspect,
            parent: None,
            label: "Referenceable",
            comment: "Carries the store and node identifiers of a node.",
        },
        BuiltinClass {
            name: "localized",
            kind: ClassKind::Aspect,
            parent: None,
            label: "Localized",
            comment: "Records the locale a node was created in.",
        },
    ]
}
