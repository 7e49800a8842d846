//! The `ModelRegistry` facade.
//!
//! All state lives in one [`RegistryState`] behind a `parking_lot::RwLock`.
//! A mutation holds the write lock for its whole validate-then-commit run
//! and validates everything before it changes anything, so readers never
//! see half an operation. Events are published after the lock is dropped;
//! a delivery ticket drawn under the lock keeps publication in commit order.

mod classes;
mod constraints;
mod models;
mod properties;
mod queries;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use cmm_catalog::{BuiltinCatalog, Catalog};
use parking_lot::{Condvar, Mutex, RwLock};

use crate::class_index::{ClassEntry, ClassIndex};
use crate::config::{ConfigError, RegistryConfig};
use crate::constraint::Constraint;
use crate::error::{NotFound, Result};
use crate::events::{EventSink, RegistryEvent};
use crate::graph::DependencyGraph;
use crate::lifecycle::ModelStatus;
use crate::namespace::NamespaceTable;
use crate::property::{self, ConstraintScope};
use crate::resolver::Resolver;
use crate::types::{ClassDef, Model, Property};

/// Per-model state not held by the namespace table.
#[derive(Debug, Clone)]
pub(crate) struct ModelRecord {
    pub(crate) status: ModelStatus,
    pub(crate) description: Option<String>,
    pub(crate) author: Option<String>,
    /// Model-level constraints by name, stored with the prefix they were
    /// created under.
    pub(crate) constraints: BTreeMap<String, Constraint>,
}

/// The combined tables guarded by the registry lock.
pub(crate) struct RegistryState {
    pub(crate) models: BTreeMap<String, ModelRecord>,
    pub(crate) namespaces: NamespaceTable,
    pub(crate) classes: ClassIndex,
    pub(crate) graph: DependencyGraph,
    pub(crate) catalog: Arc<dyn BuiltinCatalog>,
    pub(crate) config: RegistryConfig,
}

impl RegistryState {
    fn new(catalog: Arc<dyn BuiltinCatalog>, config: RegistryConfig) -> Self {
        let mut namespaces = NamespaceTable::new();
        for builtin in catalog.namespaces() {
            namespaces.reserve_builtin(&builtin.uri, &builtin.prefix);
        }
        Self {
            models: BTreeMap::new(),
            namespaces,
            classes: ClassIndex::new(),
            graph: DependencyGraph::new(),
            catalog,
            config,
        }
    }

    pub(crate) fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.namespaces, &self.classes, self.catalog.as_ref())
    }

    pub(crate) fn record(&self, model: &str) -> Result<&ModelRecord> {
        self.models
            .get(model)
            .ok_or_else(|| NotFound::Model(model.to_owned()).into())
    }

    /// The class `name`, which must belong to `model`.
    pub(crate) fn class_in(&self, model: &str, name: &str) -> Result<&ClassEntry> {
        self.classes
            .get(name)
            .filter(|entry| entry.owner == model)
            .ok_or_else(|| {
                NotFound::Class {
                    model: model.to_owned(),
                    name: name.to_owned(),
                }
                .into()
            })
    }

    /// Constraints visible to a property of `model`. The inline constraints
    /// of `skip` (class, property) are left out of the taken names.
    pub(crate) fn constraint_scope<'a>(
        &'a self,
        model: &'a str,
        skip: Option<(&str, &str)>,
    ) -> Result<ConstraintScope<'a>> {
        let record = self.record(model)?;
        let prefix = self
            .namespaces
            .get(model)
            .map(|ns| ns.prefix.as_str())
            .ok_or_else(|| NotFound::Model(model.to_owned()))?;
        Ok(ConstraintScope {
            model,
            prefix,
            declared: &record.constraints,
            taken: self.inline_constraint_names(model, skip),
        })
    }

    /// Names of the inline constraints of every property in `model`.
    pub(crate) fn inline_constraint_names(
        &self,
        model: &str,
        skip: Option<(&str, &str)>,
    ) -> BTreeSet<String> {
        self.classes
            .classes_of(model)
            .flat_map(|entry| {
                entry
                    .properties
                    .iter()
                    .filter(move |p| skip != Some((entry.name.as_str(), p.name.as_str())))
                    .flat_map(|p| p.constraints.iter().map(|c| c.name.clone()))
            })
            .collect()
    }

    /// Owner of a class's custom parent when it lives in another model.
    pub(crate) fn foreign_dependency(&self, entry: &ClassEntry) -> Option<String> {
        entry
            .custom_parent()
            .and_then(|parent| self.classes.get(parent))
            .map(|parent| parent.owner.clone())
            .filter(|owner| owner != &entry.owner)
    }

    pub(crate) fn model_view(&self, name: &str) -> Option<Model> {
        let record = self.models.get(name)?;
        let ns = self.namespaces.get(name)?;
        Some(Model {
            name: name.to_owned(),
            namespace_uri: ns.uri.clone(),
            namespace_prefix: ns.prefix.clone(),
            status: record.status,
            description: record.description.clone(),
            author: record.author.clone(),
        })
    }

    pub(crate) fn class_view(&self, entry: &ClassEntry) -> ClassDef {
        let resolver = self.resolver();
        ClassDef {
            name: entry.name.clone(),
            prefixed_name: resolver.prefixed_name(&entry.name),
            kind: entry.kind,
            model: entry.owner.clone(),
            parent_name: entry.parent().map(|p| resolver.parent_name(p)),
            title: entry.title.clone(),
            description: entry.description.clone(),
            properties: entry
                .properties
                .iter()
                .map(|p| self.property_view(&entry.owner, p))
                .collect(),
        }
    }

    /// A stored property with constraint names under the owner's current
    /// prefix.
    pub(crate) fn property_view(&self, owner: &str, stored: &Property) -> Property {
        let Some(ns) = self.namespaces.get(owner) else {
            return stored.clone();
        };
        let prefix = ns.prefix.as_str();
        Property {
            constraint_refs: stored
                .constraint_refs
                .iter()
                .map(|local| format!("{prefix}:{local}"))
                .collect(),
            constraints: property::rebased(&stored.constraints, prefix),
            ..stored.clone()
        }
    }

    /// A model-level constraint under the model's current prefix.
    pub(crate) fn constraint_view(&self, model: &str, stored: &Constraint) -> Constraint {
        let mut view = stored.clone();
        if let Some(ns) = self.namespaces.get(model) {
            view.prefixed_name = format!("{}:{}", ns.prefix, stored.name);
        }
        view
    }

    /// Re-reads a class after a commit.
    pub(crate) fn class_view_of(&self, model: &str, name: &str) -> Result<ClassDef> {
        self.class_in(model, name).map(|entry| self.class_view(entry))
    }
}

/// A committed result plus the events it produced.
pub(crate) struct Mutation<T> {
    pub(crate) value: T,
    pub(crate) events: Vec<RegistryEvent>,
}

impl<T> Mutation<T> {
    pub(crate) fn new(value: T, events: Vec<RegistryEvent>) -> Self {
        Self { value, events }
    }
}

/// Thread-safe registry of custom models.
///
/// ```
/// use cmm_registry::{ModelRegistry, ModelStatus, NewClass, NewModel};
///
/// let registry = ModelRegistry::standard();
/// registry.create_model(NewModel::new("hr", "http://acme.com/model/hr/1.0", "hr")).unwrap();
/// let class = registry
///     .create_class("hr", NewClass::type_("employee").parent("cm:content"))
///     .unwrap();
/// assert_eq!(class.prefixed_name, "hr:employee");
///
/// let model = registry.activate_model("hr").unwrap();
/// assert_eq!(model.status, ModelStatus::Active);
/// ```
pub struct ModelRegistry {
    state: RwLock<RegistryState>,
    sinks: RwLock<Vec<Arc<dyn EventSink>>>,
    delivery: Delivery,
}

/// Serializes event delivery by commit ticket.
#[derive(Default)]
struct Delivery {
    /// Next ticket to hand out. Only advanced under the state write lock.
    issued: Mutex<u64>,
    /// Ticket whose events may be delivered now.
    serving: Mutex<u64>,
    turn: Condvar,
}

impl Delivery {
    fn issue(&self) -> u64 {
        let mut issued = self.issued.lock();
        let ticket = *issued;
        *issued += 1;
        ticket
    }

    /// Blocks until `ticket` is being served.
    fn wait_for(&self, ticket: u64) -> Turn<'_> {
        let mut serving = self.serving.lock();
        while *serving != ticket {
            self.turn.wait(&mut serving);
        }
        Turn(self)
    }
}

/// Holds the delivery turn; passes it on when dropped, even if a sink
/// panicked.
struct Turn<'a>(&'a Delivery);

impl Drop for Turn<'_> {
    fn drop(&mut self) {
        *self.0.serving.lock() += 1;
        self.0.turn.notify_all();
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("ModelRegistry")
            .field("models", &state.models.len())
            .field("classes", &state.classes.len())
            .field("edges", &state.graph.edge_count())
            .finish_non_exhaustive()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl ModelRegistry {
    /// An empty registry over `catalog` with the default configuration.
    #[must_use]
    pub fn new(catalog: Arc<dyn BuiltinCatalog>) -> Self {
        Self {
            state: RwLock::new(RegistryState::new(catalog, RegistryConfig::default())),
            sinks: RwLock::new(Vec::new()),
            delivery: Delivery::default(),
        }
    }

    /// An empty registry over the standard built-in catalog.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(Arc::new(Catalog::standard()))
    }

    /// An empty registry with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDefaultDataType`] if the configured
    /// default data type is not in `catalog`.
    pub fn with_config(
        catalog: Arc<dyn BuiltinCatalog>,
        config: RegistryConfig,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate(catalog.as_ref())?;
        Ok(Self {
            state: RwLock::new(RegistryState::new(catalog, config)),
            sinks: RwLock::new(Vec::new()),
            delivery: Delivery::default(),
        })
    }

    /// The catalog this registry resolves built-in names against.
    #[must_use]
    pub fn catalog(&self) -> Arc<dyn BuiltinCatalog> {
        Arc::clone(&self.state.read().catalog)
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> RegistryConfig {
        self.state.read().config.clone()
    }

    /// Registers a sink for events of every later mutation.
    pub fn subscribe(&self, sink: Arc<dyn EventSink>) {
        self.sinks.write().push(sink);
    }

    /// Runs `f` under the write lock and publishes its events once the
    /// lock is released, after the events of every earlier commit.
    pub(crate) fn mutate<T>(
        &self,
        operation: &'static str,
        model: &str,
        f: impl FnOnce(&mut RegistryState) -> Result<Mutation<T>>,
    ) -> Result<T> {
        tracing::debug!(operation, model, "registry mutation");
        let outcome = {
            let mut state = self.state.write();
            f(&mut state).map(|mutation| {
                let ticket = (!mutation.events.is_empty()).then(|| self.delivery.issue());
                (mutation, ticket)
            })
        };
        match outcome {
            Ok((Mutation { value, events }, ticket)) => {
                tracing::info!(operation, model, events = events.len(), "mutation committed");
                if let Some(ticket) = ticket {
                    self.publish(ticket, &events);
                }
                Ok(value)
            }
            Err(err) => {
                tracing::debug!(operation, model, error = %err, "mutation rejected");
                Err(err)
            }
        }
    }

    fn publish(&self, ticket: u64, events: &[RegistryEvent]) {
        let _turn = self.delivery.wait_for(ticket);
        let sinks = self.sinks.read().clone();
        for event in events {
            for sink in &sinks {
                sink.publish(event);
            }
        }
    }

    /// Runs `f` under the read lock.
    pub(crate) fn read<T>(&self, f: impl FnOnce(&RegistryState) -> T) -> T {
        f(&self.state.read())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ModelRegistry>();
    }

    #[test]
    fn builtin_namespaces_are_reserved() {
        let registry = ModelRegistry::standard();
        registry.read(|state| {
            assert!(state.namespaces.owner_of_prefix("cm").is_some());
            assert!(state.namespaces.owner_of_prefix("sys").is_some());
            assert!(state.namespaces.owner_of_prefix("d").is_some());
        });
    }

    #[test]
    fn with_config_rejects_unknown_default_type() {
        let config = RegistryConfig {
            default_data_type: "d:money".into(),
        };
        let err = ModelRegistry::with_config(Arc::new(Catalog::standard()), config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDefaultDataType(_)));
    }
}
