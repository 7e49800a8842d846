//! Custom model registry layered on the built-in catalog.
//!
//! The `cmm-registry` crate keeps user-defined content models, each with its
//! own namespace and a set of types and aspects, and enforces the rules that
//! tie them together: unique names and namespaces, kind-compatible
//! inheritance, value constraints, an acyclic model dependency graph and
//! the draft/active lifecycle. Every mutation validates completely before it commits.
//!
//! # Entry Point
//!
//! ```
//! use cmm_registry::{ModelRegistry, NewClass, NewModel, NewProperty};
//!
//! let registry = ModelRegistry::standard();
//! registry
//!     .create_model(NewModel::new("hr", "http://acme.com/model/hr/1.0", "hr"))
//!     .unwrap();
//! registry
//!     .create_class(
//!         "hr",
//!         NewClass::type_("employee")
//!             .parent("cm:content")
//!             .property(NewProperty::new("badge").data_type("d:int")),
//!     )
//!     .unwrap();
//! assert_eq!(registry.list_classes("hr", None).unwrap().len(), 1);
//! ```
//!
//! # Export
//!
//! ```
//! use cmm_registry::{ExportFormat, ModelRegistry, NewModel};
//!
//! let registry = ModelRegistry::standard();
//! registry.create_model(NewModel::new("hr", "http://acme.com/hr", "hr")).unwrap();
//! let turtle = registry.export("hr", ExportFormat::Turtle).unwrap();
//! assert!(turtle.contains("owl:Ontology"));
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod class_index;
pub mod config;
pub mod constraint;
pub mod error;
pub mod events;
pub mod graph;
pub mod lifecycle;
pub mod names;
pub mod namespace;
pub mod ops;
pub mod paging;
pub mod property;
pub mod registry;
pub mod resolver;
pub mod serializer;
pub mod snapshot;
pub mod types;

pub use cmm_catalog::{BuiltinCatalog, Catalog, ClassKind};
pub use config::{ConfigError, RegistryConfig};
pub use constraint::{Constraint, ConstraintParameter, ConstraintType, NewConstraint};
pub use error::{
    ActiveRestriction, Conflict, ErrorKind, NotFound, RegistryError, Result, ValidationError,
};
pub use events::{EventSink, RecordingSink, RegistryEvent, TracingSink};
pub use graph::DependencyGraph;
pub use lifecycle::ModelStatus;
pub use names::QualifiedName;
pub use namespace::Namespace;
pub use ops::{Operation, OperationOutcome, ScriptError};
pub use paging::{Page, Paging, DEFAULT_MAX_ITEMS};
pub use registry::ModelRegistry;
pub use serializer::{ExportFormat, ModelDocument};
pub use snapshot::{ModelSnapshot, RegistrySnapshot, SnapshotError};
pub use types::{
    ClassDef, ClassLookup, ClassPatch, Facetable, Model, ModelPatch, NewClass, NewModel,
    NewProperty, Property, PropertyPatch, RegistryInfo, Tokenisation,
};
