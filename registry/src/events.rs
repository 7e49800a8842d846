//! Lifecycle notifications emitted after each committed mutation.
//!
//! Sinks receive events in commit order, after the registry lock has been
//! released. A sink must not call back into the registry expecting to see
//! a state older than the event it is handling, and must not mutate the
//! registry: delivery of later commits waits for it to return.

use std::sync::Arc;

use cmm_catalog::ClassKind;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// A committed change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RegistryEvent {
    /// A model was created (always as draft).
    ModelCreated {
        /// Model name.
        model: String,
    },
    /// Description or author changed.
    ModelUpdated {
        /// Model name.
        model: String,
    },
    /// The namespace URI and/or prefix changed. Prefixed names of every
    /// owned class changed with it.
    NamespaceChanged {
        /// Model name.
        model: String,
        /// Previous prefix.
        old_prefix: String,
        /// New prefix.
        new_prefix: String,
        /// Previous URI.
        old_uri: String,
        /// New URI.
        new_uri: String,
    },
    /// Draft → Active.
    ModelActivated {
        /// Model name.
        model: String,
    },
    /// Active → Draft.
    ModelDeactivated {
        /// Model name.
        model: String,
    },
    /// A model and all of its classes were removed.
    ModelDeleted {
        /// Model name.
        model: String,
    },
    /// A type or aspect was created.
    ClassCreated {
        /// Owning model.
        model: String,
        /// Class name.
        class: String,
        /// Type or aspect.
        kind: ClassKind,
    },
    /// Title, description or parent changed.
    ClassUpdated {
        /// Owning model.
        model: String,
        /// Class name.
        class: String,
    },
    /// A type or aspect was deleted.
    ClassDeleted {
        /// Owning model.
        model: String,
        /// Class name.
        class: String,
    },
    /// A model-level constraint was declared.
    ConstraintCreated {
        /// Owning model.
        model: String,
        /// Constraint name.
        constraint: String,
    },
    /// A property was added to a class.
    PropertyAdded {
        /// Owning model.
        model: String,
        /// Owning class.
        class: String,
        /// Property name.
        property: String,
    },
    /// A property was changed.
    PropertyUpdated {
        /// Owning model.
        model: String,
        /// Owning class.
        class: String,
        /// Property name.
        property: String,
    },
    /// A property was removed.
    PropertyDeleted {
        /// Owning model.
        model: String,
        /// Owning class.
        class: String,
        /// Property name.
        property: String,
    },
}

impl RegistryEvent {
    /// The model the event concerns.
    #[must_use]
    pub fn model(&self) -> &str {
        match self {
            Self::ModelCreated { model }
            | Self::ModelUpdated { model }
            | Self::NamespaceChanged { model, .. }
            | Self::ModelActivated { model }
            | Self::ModelDeactivated { model }
            | Self::ModelDeleted { model }
            | Self::ClassCreated { model, .. }
            | Self::ClassUpdated { model, .. }
            | Self::ClassDeleted { model, .. }
            | Self::ConstraintCreated { model, .. }
            | Self::PropertyAdded { model, .. }
            | Self::PropertyUpdated { model, .. }
            | Self::PropertyDeleted { model, .. } => model,
        }
    }
}

/// Receiver of committed events.
pub trait EventSink: Send + Sync {
    /// Handles one event.
    fn publish(&self, event: &RegistryEvent);
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn publish(&self, event: &RegistryEvent) {
        (**self).publish(event);
    }
}

/// Logs every event at `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn publish(&self, event: &RegistryEvent) {
        tracing::info!(target: "cmm_registry::events", model = event.model(), ?event, "registry event");
    }
}

/// Keeps every event in memory. Useful in tests and for batching
/// persistence.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<RegistryEvent>>,
}

impl RecordingSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies the events recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<RegistryEvent> {
        self.events.lock().clone()
    }

    /// Drains the events recorded so far.
    pub fn take(&self) -> Vec<RegistryEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl EventSink for RecordingSink {
    fn publish(&self, event: &RegistryEvent) {
        self.events.lock().push(event.clone());
    }
}
