//! DiffGraph core: change graph store, scheduler and Mermaid renderer

pub mod adjacency;
pub mod error;
pub mod graph;
pub mod matching;
pub mod merge;
pub mod model;
pub mod render;
pub mod sanitize;
pub mod summary;


#[cfg(test)]
pub mod test_utils;

pub use error::StoreError;
pub use graph::GraphStore;
pub use matching::{DependencyMatcher, ExactMatcher, FuzzyNameMatcher, MatchStrategy, SubstringMatcher, resolve_reference};
pub use merge::{ComponentField, MergePolicy};
pub use model::{ChangeKind, ComponentKey, ComponentNode, ComponentRecord, ComponentType, FileNode, FileStatus, NewComponent, ParseLiteralError, StoreStats};
pub use render::{Direction, MermaidRenderer, class_definitions, render_mermaid};
pub use sanitize::{escape_label, sanitize_id, sanitize_tooltip};
pub use summary::run_summary;
