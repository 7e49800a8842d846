//! Registry snapshot validators (namespaces, classes, constraints, dependency graph, replay and export).

pub mod classes;
pub mod constraints;
pub mod export;
pub mod graph;
pub mod namespaces;
