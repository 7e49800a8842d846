//! Model dependency graph.
//!
//! Nodes are model names. An edge `from → to` exists while at least one
//! class of `from` has a parent owned by `to`. Edges are reference counted
//! per parent link so that removing one of several links keeps the edge.
//! Built-in namespaces are never nodes.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::Conflict;

/// Reference-counted adjacency in both directions.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    out_edges: BTreeMap<String, BTreeMap<String, usize>>,
    in_edges: BTreeMap<String, BTreeMap<String, usize>>,
}

impl DependencyGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True if adding `from → to` would close a loop: `to == from`, or
    /// `from` is already reachable from `to`.
    #[must_use]
    pub fn would_create_cycle(&self, from: &str, to: &str) -> bool {
        let mut visited = BTreeSet::new();
        let mut stack = vec![to];
        while let Some(current) = stack.pop() {
            if current == from {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(targets) = self.out_edges.get(current) {
                stack.extend(
                    targets
                        .keys()
                        .map(String::as_str)
                        .filter(|t| !visited.contains(t)),
                );
            }
        }
        false
    }

    /// Adds one parent link from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`Conflict::CircularDependency`] without touching the graph
    /// if the link would close a loop. The graph knows no class names, so
    /// the error's `parent` is `to`; callers substitute the class reference.
    pub fn add_edge(&mut self, from: &str, to: &str) -> Result<(), Conflict> {
        if self.has_edge(from, to) {
            self.insert_edge_unchecked(from, to);
            return Ok(());
        }
        if self.would_create_cycle(from, to) {
            return Err(Conflict::CircularDependency {
                parent: to.to_owned(),
                model: from.to_owned(),
                depends_on: to.to_owned(),
            });
        }
        self.insert_edge_unchecked(from, to);
        Ok(())
    }

    /// Adds one parent link without the cycle check. Used when auditing
    /// data that may already be cyclic.
    pub fn insert_edge_unchecked(&mut self, from: &str, to: &str) {
        *self
            .out_edges
            .entry(from.to_owned())
            .or_default()
            .entry(to.to_owned())
            .or_default() += 1;
        *self
            .in_edges
            .entry(to.to_owned())
            .or_default()
            .entry(from.to_owned())
            .or_default() += 1;
    }

    /// Drops one parent link. The edge disappears with its last link.
    pub fn remove_edge(&mut self, from: &str, to: &str) {
        Self::decrement(&mut self.out_edges, from, to);
        Self::decrement(&mut self.in_edges, to, from);
    }

    fn decrement(map: &mut BTreeMap<String, BTreeMap<String, usize>>, a: &str, b: &str) {
        let Some(targets) = map.get_mut(a) else {
            return;
        };
        if let Some(count) = targets.get_mut(b) {
            *count -= 1;
            if *count == 0 {
                targets.remove(b);
            }
        }
        if targets.is_empty() {
            map.remove(a);
        }
    }

    /// True if at least one link `from → to` exists.
    #[must_use]
    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.out_edges
            .get(from)
            .is_some_and(|targets| targets.contains_key(to))
    }

    /// Number of parent links backing `from → to`.
    #[must_use]
    pub fn link_count(&self, from: &str, to: &str) -> usize {
        self.out_edges
            .get(from)
            .and_then(|targets| targets.get(to))
            .copied()
            .unwrap_or(0)
    }

    /// True if any other model depends on `model`, whatever its status.
    #[must_use]
    pub fn has_incoming_edges(&self, model: &str) -> bool {
        self.in_edges.contains_key(model)
    }

    /// Models that depend on `model`, ordered by name.
    #[must_use]
    pub fn dependents(&self, model: &str) -> Vec<String> {
        self.in_edges
            .get(model)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Models that `model` depends on, ordered by name.
    #[must_use]
    pub fn dependencies(&self, model: &str) -> Vec<String> {
        self.out_edges
            .get(model)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Drops every outgoing link of `model`. Incoming links must have been
    /// ruled out by the caller.
    pub fn remove_node(&mut self, model: &str) {
        if let Some(targets) = self.out_edges.remove(model) {
            for to in targets.keys() {
                if let Some(sources) = self.in_edges.get_mut(to) {
                    sources.remove(model);
                    if sources.is_empty() {
                        self.in_edges.remove(to);
                    }
                }
            }
        }
        self.in_edges.remove(model);
    }

    /// Number of distinct edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.out_edges.values().map(BTreeMap::len).sum()
    }

    /// Finds every elementary cycle reachable by depth-first search.
    ///
    /// Each cycle is reported once, rotated so that its smallest node
    /// comes first, and closed (first node repeated at the end).
    #[must_use]
    pub fn find_cycles(&self) -> Vec<Vec<String>> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Visit {
            Active,
            Done,
        }

        fn normalize(path: &[String]) -> Vec<String> {
            let start = path
                .iter()
                .enumerate()
                .min_by(|a, b| a.1.cmp(b.1))
                .map_or(0, |(i, _)| i);
            let mut cycle: Vec<String> = path[start..]
                .iter()
                .chain(&path[..start])
                .cloned()
                .collect();
            if let Some(first) = cycle.first().cloned() {
                cycle.push(first);
            }
            cycle
        }

        fn visit<'a>(
            graph: &'a DependencyGraph,
            node: &'a str,
            state: &mut BTreeMap<&'a str, Visit>,
            stack: &mut Vec<&'a str>,
            seen: &mut BTreeSet<Vec<String>>,
        ) {
            state.insert(node, Visit::Active);
            stack.push(node);
            if let Some(targets) = graph.out_edges.get(node) {
                for next in targets.keys().map(String::as_str) {
                    match state.get(next) {
                        Some(Visit::Active) => {
                            if let Some(pos) = stack.iter().position(|n| *n == next) {
                                let path: Vec<String> =
                                    stack[pos..].iter().map(|s| (*s).to_owned()).collect();
                                seen.insert(normalize(&path));
                            }
                        }
                        Some(Visit::Done) => {}
                        None => visit(graph, next, state, stack, seen),
                    }
                }
            }
            stack.pop();
            state.insert(node, Visit::Done);
        }

        let mut state = BTreeMap::new();
        let mut stack = Vec::new();
        let mut seen = BTreeSet::new();
        for node in self.out_edges.keys() {
            if !state.contains_key(node.as_str()) {
                visit(self, node, &mut state, &mut stack, &mut seen);
            }
        }
        seen.into_iter().collect()
    }
}
