//! Directed adjacency over string node ids

use std::collections::{HashMap, HashSet};

/// A simple directed graph: no parallel edges, no self loops, no dangling
/// endpoints. Nodes and edges iterate in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    nodes: Vec<String>,
    node_set: HashSet<String>,
    edges: Vec<(String, String)>,
    outgoing: HashMap<String, Vec<String>>,
    incoming: HashMap<String, Vec<String>>,
}

impl Adjacency {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node. Returns false if it was already present.
    pub fn add_node(&mut self, id: &str) -> bool {
        if !self.node_set.insert(id.to_string()) {
            return false;
        }
        self.nodes.push(id.to_string());
        true
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_set.contains(id)
    }

    /// Add `source -> target`. Returns false when an endpoint is unknown,
    /// the edge is a self loop, or the edge already exists.
    pub fn add_edge(&mut self, source: &str, target: &str) -> bool {
        if source == target || !self.contains_node(source) || !self.contains_node(target) {
            return false;
        }
        if self.has_edge(source, target) {
            return false;
        }
        self.edges.push((source.to_string(), target.to_string()));
        self.outgoing
            .entry(source.to_string())
            .or_default()
            .push(target.to_string());
        self.incoming
            .entry(target.to_string())
            .or_default()
            .push(source.to_string());
        true
    }

    pub fn has_edge(&self, source: &str, target: &str) -> bool {
        self.outgoing
            .get(source)
            .is_some_and(|targets| targets.iter().any(|t| t == target))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.edges.iter().map(|(s, t)| (s.as_str(), t.as_str()))
    }

    /// Targets of edges leaving `id`.
    pub fn successors(&self, id: &str) -> impl Iterator<Item = &str> {
        self.outgoing
            .get(id)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Sources of edges entering `id`.
    pub fn predecessors(&self, id: &str) -> impl Iterator<Item = &str> {
        self.incoming
            .get(id)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
