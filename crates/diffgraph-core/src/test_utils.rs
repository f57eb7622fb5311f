//! Test utilities for diffgraph-core

use crate::graph::GraphStore;
use crate::model::{ChangeKind, ComponentKey, ComponentType, NewComponent};

/// Store with the three files of the reference scenario, nothing processed.
pub fn three_file_store() -> GraphStore {
    let mut store = GraphStore::new();
    store.add_file("a.py", ChangeKind::Modified);
    store.add_file("b.py", ChangeKind::Added);
    store.add_file("c.py", ChangeKind::Deleted);
    store
}

pub fn function(name: &str, file: &str) -> NewComponent {
    NewComponent::new(name, file, ChangeKind::Modified, ComponentType::Function)
}

pub fn container(name: &str, file: &str) -> NewComponent {
    NewComponent::new(name, file, ChangeKind::Modified, ComponentType::Container)
}

pub fn key(file: &str, name: &str) -> ComponentKey {
    ComponentKey::new(file, name)
}

/// Drain the scheduler, returning paths in the order handed out.
pub fn drain(store: &mut GraphStore) -> Vec<String> {
    std::iter::from_fn(|| store.get_next_file()).collect()
}
