//! Built-in content model catalog encoded as typed Rust data.
//!
//! The `cmm-catalog` crate provides the non-editable definitions a custom
//! model registry builds on: the `sys`, `d` and `cm` namespaces, their
//! built-in types and aspects, and the property data types.
//!
//! # Entry Point
//!
//! ```
//! use cmm_catalog::{BuiltinCatalog, Catalog, ClassKind};
//!
//! let catalog = Catalog::standard();
//! assert_eq!(catalog.modules.len(), 3);
//! assert_eq!(catalog.resolve_class("cm", "folder"), Some(ClassKind::Type));
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod model;
pub mod namespaces;
pub mod oracle;

pub use model::{
    BuiltinClass, Catalog, ClassKind, DataType, Namespace, NamespaceBinding, NamespaceModule,
    ValueCheck,
};
pub use oracle::BuiltinCatalog;

impl Catalog {
    /// Returns the standard built-in catalog with all 3 namespaces.
    ///
    /// Assembly order follows the parent references between modules:
    /// `sys → d → cm`
    #[must_use]
    pub fn standard() -> &'static Catalog {
        static CATALOG: std::sync::OnceLock<Catalog> = std::sync::OnceLock::new();
        CATALOG.get_or_init(|| Catalog {
            version: "1.0",
            modules: vec![
                namespaces::sys::module(),
                namespaces::d::module(),
                namespaces::cm::module(),
            ],
        })
    }
}
