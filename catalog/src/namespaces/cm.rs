//! `cm` namespace: the content model.
//!
//! Defines the foundational content and folder types plus the common
//! aspects (`cm:titled`, `cm:author`, ...) that custom models extend.
//!
//! **Key invariant:** `cm:dublincore` extends `cm:titled`; every other aspect
//! here is a root aspect. Both types descend from `cm:cmobject`, which
//! descends from `sys:base`.

use crate::model::uris::*;
use crate::model::{BuiltinClass, ClassKind, Namespace, NamespaceModule};

/// Returns the `cm` namespace module.
#[must_use]
pub fn module() -> NamespaceModule {
    NamespaceModule {
        namespace: Namespace {
            prefix: "cm",
            uri: NS_CM,
            label: "Content",
            comment: "Foundational content, folder and descriptive definitions.",
        },
        classes: classes(),
        data_types: Vec::new(),
    }
}

fn classes() -> Vec<BuiltinClass> {
    vec![
        BuiltinClass {
            name: "cmobject",
            kind: ClassKind::Type,
            parent: Some("sys:base"),
            label: "Object",
            comment: "Common ancestor of content and folders.",
        },
        BuiltinClass {
            name: "content",
            kind: ClassKind::Type,
            parent: Some("cm:cmobject"),
            label: "Content",
            comment: "A document with a binary content stream.",
        },
        BuiltinClass {
            name: "folder",
            kind: ClassKind::Type,
            parent: Some("cm:cmobject"),
            label: "Folder",
            comment: "A container of other content and folders.",
        },
        BuiltinClass {
            name: "titled",
            kind: ClassKind::Aspect,
            parent: None,
            label: "Titled",
            comment: "Adds a title and a description.",
        },
        BuiltinClass {
            name: "author",
            kind: ClassKind::Aspect,
            parent: None,
            label: "Author",
            comment: "Records the author of a document.",
        },
        BuiltinClass {
            name: "dublincore",
            kind: ClassKind::Aspect,
            parent: Some("cm:titled"),
            label: "Dublin Core",
            comment: "The Dublin Core descriptive metadata set.",
        },
        BuiltinClass {
            name: "auditable",
            kind: ClassKind::Aspect,
            parent: None,
            label: "Auditable",
            comment: "Creation and modification stamps.",
        },
        BuiltinClass {
            name: "versionable",
            kind: ClassKind::Aspect,
            parent: None,
            label: "Versionable",
            comment: "Marks a document as version controlled.",
        },
        BuiltinClass {
            name: "taggable",
            kind: ClassKind::Aspect,
            parent: None,
            label: "Taggable",
            comment: "Allows free-form tags.",
        },
        BuiltinClass {
            name: "generalclassifiable",
            kind: ClassKind::Aspect,
            parent: None,
            label: "Classifiable",
            comment: "Allows category classification.",
        },
    ]
}
