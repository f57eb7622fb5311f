//! The graph store: file nodes, component nodes, and their two graphs

use crate::adjacency::Adjacency;
use crate::error::StoreError;
use crate::merge::{clean_references, merge_component};
use crate::model::*;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use tracing::debug;

/// Accumulated state of one run. Files are scheduled through a FIFO
/// worklist; components and their dependency edges are added as each file's
/// analysis comes back.
pub struct GraphStore {
    file_nodes: HashMap<String, FileNode>,
    file_graph: Adjacency,
    component_nodes: HashMap<ComponentKey, ComponentNode>,
    component_graph: Adjacency,
    worklist: VecDeque<String>,
    processed_files: HashSet<String>,
}

impl std::fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphStore")
            .field("file_count", &self.file_nodes.len())
            .field("component_count", &self.component_nodes.len())
            .field("edge_count", &self.component_graph.edge_count())
            .field("queued", &self.worklist.len())
            .finish()
    }
}

impl GraphStore {
    pub fn new() -> Self {
        GraphStore {
            file_nodes: HashMap::new(),
            file_graph: Adjacency::new(),
            component_nodes: HashMap::new(),
            component_graph: Adjacency::new(),
            worklist: VecDeque::new(),
            processed_files: HashSet::new(),
        }
    }

    // ── Files ───────────────────────────────────────────────

    /// Register a changed file and queue it. Known paths are left untouched.
    /// Returns true if the file was new.
    pub fn add_file(&mut self, path: impl Into<String>, change_kind: ChangeKind) -> bool {
        let path = path.into();
        if self.file_nodes.contains_key(&path) {
            return false;
        }
        self.file_graph.add_node(&path);
        self.worklist.push_back(path.clone());
        self.file_nodes
            .insert(path.clone(), FileNode::new(path, change_kind));
        true
    }

    pub fn file(&self, path: &str) -> Option<&FileNode> {
        self.file_nodes.get(path)
    }

    /// Files in the order they were added.
    pub fn files(&self) -> impl Iterator<Item = &FileNode> {
        self.file_graph
            .nodes()
            .filter_map(move |path| self.file_nodes.get(path))
    }

    pub fn file_count(&self) -> usize {
        self.file_nodes.len()
    }

    /// Files that `path` depends on through at least one component edge.
    pub fn file_dependencies(&self, path: &str) -> Vec<&str> {
        self.file_graph.successors(path).collect()
    }

    // ── Scheduling ──────────────────────────────────────────

    /// Pop the next file to analyse, skipping files that already reached a
    /// terminal state. `None` means the run is complete.
    pub fn get_next_file(&mut self) -> Option<String> {
        while let Some(path) = self.worklist.pop_front() {
            if !self.processed_files.contains(&path) {
                return Some(path);
            }
        }
        None
    }

    /// Number of entries still waiting in the worklist.
    pub fn queued(&self) -> usize {
        self.worklist.len()
    }

    pub fn is_processed(&self, path: &str) -> bool {
        self.processed_files.contains(path)
    }

    pub fn mark_processing(&mut self, path: &str) -> Result<(), StoreError> {
        self.advance(path, FileStatus::Processing)?;
        Ok(())
    }

    pub fn mark_processed(
        &mut self,
        path: &str,
        summary: impl Into<String>,
        components: Vec<ComponentRecord>,
    ) -> Result<(), StoreError> {
        let node = self.advance(path, FileStatus::Processed)?;
        node.summary = Some(summary.into());
        node.components = components;
        self.processed_files.insert(path.to_string());
        Ok(())
    }

    pub fn mark_error(&mut self, path: &str, error: impl Into<String>) -> Result<(), StoreError> {
        let node = self.advance(path, FileStatus::Error)?;
        node.error = Some(error.into());
        self.processed_files.insert(path.to_string());
        Ok(())
    }

    fn advance(&mut self, path: &str, next: FileStatus) -> Result<&mut FileNode, StoreError> {
        let node = self
            .file_nodes
            .get_mut(path)
            .ok_or_else(|| StoreError::UnknownFile(path.to_string()))?;
        if !node.status.can_advance_to(next) {
            debug!("Rejected transition for {}: {} -> {}", path, node.status, next);
            return Err(StoreError::InvalidTransition {
                path: path.to_string(),
                from: node.status,
                to: next,
            });
        }
        node.status = next;
        Ok(node)
    }

    // ── Components ──────────────────────────────────────────

    /// Add a component, or merge a repeated report into the existing node.
    pub fn add_component(&mut self, input: NewComponent) -> ComponentKey {
        let key = ComponentKey::new(&input.file_path, &input.name);

        if let Some(existing) = self.component_nodes.get_mut(&key) {
            merge_component(existing, input);
            // Edges already in the graph stay mirrored in the sets.
            for target in self.component_graph.successors(key.as_str()) {
                existing.dependencies.insert(target.to_string());
            }
            for source in self.component_graph.predecessors(key.as_str()) {
                existing.dependents.insert(source.to_string());
            }
            return key;
        }

        let node = ComponentNode {
            key: key.clone(),
            name: input.name,
            file_path: input.file_path,
            component_type: input.component_type,
            change_kind: input.change_kind,
            parent: input.parent.filter(|p| !p.trim().is_empty()),
            summary: input.summary,
            dependencies: clean_references(input.dependencies),
            dependents: clean_references(input.dependents),
        };
        self.component_graph.add_node(key.as_str());
        self.component_nodes.insert(key.clone(), node);
        key
    }

    pub fn component(&self, key: &str) -> Option<&ComponentNode> {
        self.component_nodes.get(key)
    }

    /// Components in the order they were first reported.
    pub fn components(&self) -> impl Iterator<Item = &ComponentNode> {
        self.component_graph
            .nodes()
            .filter_map(move |key| self.component_nodes.get(key))
    }

    pub fn components_in_file<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a ComponentNode> {
        self.components().filter(move |c| c.file_path == path)
    }

    pub fn component_count(&self) -> usize {
        self.component_nodes.len()
    }

    /// Record that `source` depends on `target`. Empty keys, self edges,
    /// unknown endpoints and repeats are ignored. Returns true if a new edge
    /// was added.
    pub fn add_component_dependency(&mut self, source: &str, target: &str) -> bool {
        if source.is_empty() || target.is_empty() || source == target {
            debug!("Ignoring dependency {:?} -> {:?}", source, target);
            return false;
        }
        let (Some(source_file), Some(target_file)) = (
            self.component_nodes.get(source).map(|n| n.file_path.clone()),
            self.component_nodes.get(target).map(|n| n.file_path.clone()),
        ) else {
            debug!("Ignoring dangling dependency {} -> {}", source, target);
            return false;
        };
        if !self.component_graph.add_edge(source, target) {
            return false;
        }

        if let Some(node) = self.component_nodes.get_mut(source) {
            node.dependencies.insert(target.to_string());
        }
        if let Some(node) = self.component_nodes.get_mut(target) {
            node.dependents.insert(source.to_string());
        }
        if source_file != target_file {
            self.file_graph.add_edge(&source_file, &target_file);
        }
        true
    }

    /// Component edges in insertion order.
    pub fn component_edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.component_graph.edges()
    }

    pub fn has_component_edge(&self, source: &str, target: &str) -> bool {
        self.component_graph.has_edge(source, target)
    }

    /// Components reachable from `start` within `max_depth` hops, following
    /// dependencies and dependents alike. Includes `start` itself.
    pub fn get_connected_components(&self, start: &str, max_depth: usize) -> BTreeSet<ComponentKey> {
        let mut connected = BTreeSet::new();
        if !self.component_nodes.contains_key(start) {
            return connected;
        }

        let mut queue = VecDeque::from([(start.to_string(), 0usize)]);
        while let Some((current, depth)) = queue.pop_front() {
            if depth > max_depth || connected.contains(current.as_str()) {
                continue;
            }
            let Some(node) = self.component_nodes.get(current.as_str()) else {
                continue;
            };
            connected.insert(node.key.clone());

            for next in node.dependencies.iter().chain(node.dependents.iter()) {
                if !connected.contains(next.as_str()) && self.component_nodes.contains_key(next.as_str()) {
                    queue.push_back((next.clone(), depth + 1));
                }
            }
        }

        connected
    }

    pub fn stats(&self) -> StoreStats {
        let mut stats = StoreStats {
            files: self.file_nodes.len(),
            components: self.component_nodes.len(),
            component_edges: self.component_graph.edge_count(),
            file_edges: self.file_graph.edge_count(),
            ..StoreStats::default()
        };
        for node in self.file_nodes.values() {
            match node.status {
                FileStatus::Pending => stats.pending += 1,
                FileStatus::Processing => stats.processing += 1,
                FileStatus::Processed => stats.processed += 1,
                FileStatus::Error => stats.errored += 1,
            }
        }
        stats
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}
