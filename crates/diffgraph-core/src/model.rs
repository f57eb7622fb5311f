//! Core data structures for the change graph

use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Composite identifier of a component: `file_path::name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentKey(String);

impl ComponentKey {
    pub const SEPARATOR: &'static str = "::";

    pub fn new(file_path: &str, name: &str) -> Self {
        ComponentKey(format!("{}{}{}", file_path, Self::SEPARATOR, name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The file part of the key (everything before the first separator).
    pub fn file_path(&self) -> &str {
        self.0
            .split_once(Self::SEPARATOR)
            .map_or(self.0.as_str(), |(path, _)| path)
    }

    /// The component name (everything after the first separator).
    pub fn name(&self) -> &str {
        self.0
            .split_once(Self::SEPARATOR)
            .map_or("", |(_, name)| name)
    }
}

impl Borrow<str> for ComponentKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentKey {
    fn from(raw: &str) -> Self {
        ComponentKey(raw.to_string())
    }
}

impl From<String> for ComponentKey {
    fn from(raw: String) -> Self {
        ComponentKey(raw)
    }
}

/// How a file or component changed relative to the last commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ChangeKind {
    Added,
    Deleted,
    Modified,
    /// Context only; shown for orientation.
    Unchanged,
}

impl ChangeKind {
    pub const ALL: [ChangeKind; 4] = [
        ChangeKind::Added,
        ChangeKind::Deleted,
        ChangeKind::Modified,
        ChangeKind::Unchanged,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Added => "added",
            ChangeKind::Deleted => "deleted",
            ChangeKind::Modified => "modified",
            ChangeKind::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for literals that name no known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {what}: {literal:?}")]
pub struct ParseLiteralError {
    pub what: &'static str,
    pub literal: String,
}

impl FromStr for ChangeKind {
    type Err = ParseLiteralError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "added" => Ok(ChangeKind::Added),
            "deleted" => Ok(ChangeKind::Deleted),
            "modified" => Ok(ChangeKind::Modified),
            "unchanged" => Ok(ChangeKind::Unchanged),
            _ => Err(ParseLiteralError {
                what: "change kind",
                literal: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for ChangeKind {
    type Error = ParseLiteralError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

/// Processing state of a file. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Pending,
    Processing,
    Processed,
    Error,
}

impl FileStatus {
    fn rank(self) -> u8 {
        match self {
            FileStatus::Pending => 0,
            FileStatus::Processing => 1,
            FileStatus::Processed | FileStatus::Error => 2,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, FileStatus::Processed | FileStatus::Error)
    }

    /// Whether moving to `next` keeps the state machine monotonic.
    pub fn can_advance_to(self, next: FileStatus) -> bool {
        next.rank() > self.rank()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Pending => "pending",
            FileStatus::Processing => "processing",
            FileStatus::Processed => "processed",
            FileStatus::Error => "error",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of code unit a component is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ComponentType {
    /// Class, struct, interface, module: anything that can hold other components.
    Container,
    Function,
    Method,
}

impl ComponentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::Container => "container",
            ComponentType::Function => "function",
            ComponentType::Method => "method",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentType {
    type Err = ParseLiteralError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "container" | "class" | "struct" | "interface" | "trait" | "module" | "enum" => {
                Ok(ComponentType::Container)
            }
            "function" => Ok(ComponentType::Function),
            "method" => Ok(ComponentType::Method),
            _ => Err(ParseLiteralError {
                what: "component type",
                literal: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for ComponentType {
    type Error = ParseLiteralError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

/// A component exactly as reported by the analysis of one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub name: String,
    pub component_type: ComponentType,
    #[serde(alias = "change_type")]
    pub change_kind: ChangeKind,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub dependencies: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub dependents: Vec<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A changed file tracked by the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileNode {
    pub path: String,
    pub status: FileStatus,
    pub change_kind: ChangeKind,
    pub summary: Option<String>,
    pub error: Option<String>,
    pub components: Vec<ComponentRecord>,
}

impl FileNode {
    pub fn new(path: String, change_kind: ChangeKind) -> Self {
        FileNode {
            path,
            status: FileStatus::Pending,
            change_kind,
            summary: None,
            error: None,
            components: Vec::new(),
        }
    }
}

/// A code component inside a changed file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentNode {
    pub key: ComponentKey,
    pub name: String,
    pub file_path: String,
    pub component_type: ComponentType,
    pub change_kind: ChangeKind,
    /// Name of the enclosing container in the same file.
    pub parent: Option<String>,
    pub summary: Option<String>,
    pub dependencies: BTreeSet<String>,
    pub dependents: BTreeSet<String>,
}

/// Input for [`crate::GraphStore::add_component`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewComponent {
    pub name: String,
    pub file_path: String,
    pub change_kind: ChangeKind,
    pub component_type: ComponentType,
    pub parent: Option<String>,
    pub summary: Option<String>,
    pub dependencies: Vec<String>,
    pub dependents: Vec<String>,
}

impl NewComponent {
    pub fn new(
        name: impl Into<String>,
        file_path: impl Into<String>,
        change_kind: ChangeKind,
        component_type: ComponentType,
    ) -> Self {
        NewComponent {
            name: name.into(),
            file_path: file_path.into(),
            change_kind,
            component_type,
            parent: None,
            summary: None,
            dependencies: Vec::new(),
            dependents: Vec::new(),
        }
    }

    pub fn from_record(file_path: &str, record: &ComponentRecord) -> Self {
        NewComponent {
            name: record.name.clone(),
            file_path: file_path.to_string(),
            change_kind: record.change_kind,
            component_type: record.component_type,
            parent: record.parent.clone(),
            summary: record.summary.clone(),
            dependencies: record.dependencies.clone(),
            dependents: record.dependents.clone(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_dependents<I, S>(mut self, dependents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependents = dependents.into_iter().map(Into::into).collect();
        self
    }
}

/// Counts over the store, for logging and the run outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub files: usize,
    pub pending: usize,
    pub processing: usize,
    pub processed: usize,
    pub errored: usize,
    pub components: usize,
    pub component_edges: usize,
    pub file_edges: usize,
}
