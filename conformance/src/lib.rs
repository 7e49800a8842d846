//! Custom model registry conformance audit.
//!
//! This crate checks a persisted [`RegistrySnapshot`] against every rule the
//! live registry enforces, without trusting that the snapshot was produced
//! by a registry at all. Each validator contributes pass, warning and
//! failure records to one [`ConformanceReport`].
//!
//! # Conformance Scope
//!
//! | Validator | Checks |
//! |-----------|--------|
//! | `registry/namespaces` | Model names and namespaces well-formed, unique, not built-in |
//! | `registry/classes` | Class names unique, properties valid, parents resolvable with matching kind |
//! | `registry/constraints` | Constraint names unique per model, parameters valid, references resolvable, usage suits the data type |
//! | `registry/graph` | Model dependency graph and class inheritance acyclic |
//! | `registry/export` | Snapshot replays; every model exports as Turtle and JSON-LD |
//!
//! # Entry Point
//!
//! ```no_run
//! use cmm_conformance::run_file;
//! use cmm_registry::{Catalog, RegistryConfig};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let report = run_file(
//!     Path::new("registry.json"),
//!     Arc::new(Catalog::standard()),
//!     RegistryConfig::default(),
//! )
//! .expect("Failed to read snapshot");
//! assert!(report.all_passed());
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod report;
pub mod validators;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use cmm_catalog::BuiltinCatalog;
use cmm_registry::{RegistryConfig, RegistrySnapshot};

pub use report::{ConformanceReport, Severity, TestResult};

/// Runs all conformance validators and returns the aggregated report.
///
/// Validators are run in this order:
/// 1. Namespaces
/// 2. Classes and properties
/// 3. Constraints
/// 4. Dependency graph and inheritance
/// 5. Replay and export
pub fn run_all(
    snapshot: &RegistrySnapshot,
    catalog: Arc<dyn BuiltinCatalog>,
    config: RegistryConfig,
) -> ConformanceReport {
    let mut report = ConformanceReport::new();

    report.extend(validators::namespaces::validate(snapshot, catalog.as_ref()));
    report.extend(validators::classes::validate(snapshot, catalog.as_ref()));
    report.extend(validators::constraints::validate(snapshot, catalog.as_ref()));
    report.extend(validators::graph::validate(snapshot));
    report.extend(validators::export::validate(snapshot, catalog, config));

    tracing::debug!(
        results = report.results.len(),
        failures = report.failure_count(),
        "conformance audit finished"
    );
    report
}

/// Reads a snapshot file and audits it.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a snapshot.
pub fn run_file(
    path: &Path,
    catalog: Arc<dyn BuiltinCatalog>,
    config: RegistryConfig,
) -> anyhow::Result<ConformanceReport> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let snapshot = RegistrySnapshot::from_json(&text)
        .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;
    Ok(run_all(&snapshot, catalog, config))
}
