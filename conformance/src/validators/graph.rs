//! Dependency graph validator.
//!
//! Rebuilds the model dependency graph from the parents the classes
//! declare and checks:
//! - The model graph is acyclic (every cycle is reported)
//! - Every class inheritance chain terminates

use std::collections::{BTreeMap, BTreeSet};

use cmm_registry::{DependencyGraph, RegistrySnapshot};

use crate::report::{ConformanceReport, TestResult};

const VALIDATOR: &str = "registry/graph";

/// Model-level edges `(dependent, dependency)` implied by parent references.
pub fn derive_graph(snapshot: &RegistrySnapshot) -> DependencyGraph {
    let owner_by_prefix: BTreeMap<&str, &str> = snapshot
        .models
        .iter()
        .map(|e| (e.model.namespace_prefix.as_str(), e.model.name.as_str()))
        .collect();
    let mut graph = DependencyGraph::new();
    for entry in &snapshot.models {
        for class in &entry.classes {
            let Some((prefix, _)) = class.parent_name.as_deref().and_then(|p| p.split_once(':'))
            else {
                continue;
            };
            if let Some(owner) = owner_by_prefix.get(prefix) {
                if *owner != entry.model.name {
                    graph.insert_edge_unchecked(&entry.model.name, owner);
                }
            }
        }
    }
    graph
}

/// Validates model and class acyclicity.
pub fn validate(snapshot: &RegistrySnapshot) -> ConformanceReport {
    let mut report = ConformanceReport::new();

    let graph = derive_graph(snapshot);
    let cycles: Vec<String> = graph
        .find_cycles()
        .into_iter()
        .map(|cycle| cycle.join(" -> "))
        .collect();
    report.push(TestResult::from_violations(
        VALIDATOR,
        format!(
            "Model dependency graph is acyclic ({} edges)",
            graph.edge_count()
        ),
        format!("Model dependency graph has {} cycle(s)", cycles.len()),
        cycles,
    ));

    // Local name → local parent name, for parents that are custom classes.
    let prefixes: BTreeSet<&str> = snapshot
        .models
        .iter()
        .map(|e| e.model.namespace_prefix.as_str())
        .collect();
    let parents: BTreeMap<&str, &str> = snapshot
        .models
        .iter()
        .flat_map(|e| e.classes.iter())
        .filter_map(|class| {
            let (prefix, local) = class.parent_name.as_deref()?.split_once(':')?;
            prefixes
                .contains(prefix)
                .then_some((class.name.as_str(), local))
        })
        .collect();

    let mut loops = Vec::new();
    for start in parents.keys() {
        let mut seen = BTreeSet::from([*start]);
        let mut current = *start;
        while let Some(next) = parents.get(current) {
            if !seen.insert(*next) {
                if *next == *start {
                    loops.push(format!("Class '{start}' inherits from itself"));
                }
                break;
            }
            current = *next;
        }
    }
    report.push(TestResult::from_violations(
        VALIDATOR,
        format!("All {} custom inheritance chains terminate", parents.len()),
        "Circular class inheritance",
        loops,
    ));

    report
}
