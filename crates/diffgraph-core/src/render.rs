//! Mermaid flowchart rendering of a [`GraphStore`]
//!
//! Output layout:
//!
//! ```text
//! graph TD
//!     subgraph file_src_a_py["src/a.py"]
//!         subgraph src_a_py__Foo["Foo"]
//!             src_a_py__run("run"):::component_modified
//!         end
//!         src_a_py__helper["helper"]:::component_added
//!     end
//!     src_a_py__helper --> src_a_py__Foo
//!     class file_src_a_py file_modified
//!     class src_a_py__Foo component_modified
//!     classDef ...
//! ```
//!
//! Rendering is a pure function of the store: the same store always yields
//! the same text.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::graph::GraphStore;
use crate::model::{ChangeKind, ComponentNode, ComponentType, FileStatus};
use crate::sanitize::{component_node_id, escape_label, file_node_id, sanitize_tooltip};

const INDENT: &str = "    ";
/// Characters of an error message shown in a file label.
const ERROR_LABEL_CHARS: usize = 60;

/// Flow direction of the diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    #[serde(rename = "TD", alias = "td")]
    TopDown,
    #[serde(rename = "LR", alias = "lr")]
    LeftRight,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::TopDown => "TD",
            Direction::LeftRight => "LR",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = crate::model::ParseLiteralError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TD" | "TB" => Ok(Direction::TopDown),
            "LR" => Ok(Direction::LeftRight),
            _ => Err(crate::model::ParseLiteralError {
                what: "diagram direction",
                literal: s.to_string(),
            }),
        }
    }
}

/// Fill and stroke colours per change kind: (file fill, file stroke,
/// component fill, component stroke).
const PALETTE: [(ChangeKind, &str, &str, &str, &str); 4] = [
    (ChangeKind::Added, "#e6ffed", "#2da44e", "#2da44e", "#1a7f37"),
    (ChangeKind::Deleted, "#ffebe9", "#cf222e", "#cf222e", "#a40e26"),
    (ChangeKind::Modified, "#fff8c5", "#bf8700", "#d4a72c", "#9a6700"),
    (ChangeKind::Unchanged, "#f6f8fa", "#8c959f", "#8c959f", "#6e7781"),
];

/// The fixed `classDef` block appended to every diagram.
pub fn class_definitions() -> String {
    let mut lines = Vec::with_capacity(PALETTE.len() * 2);
    for (kind, fill, stroke, _, _) in PALETTE {
        lines.push(format!(
            "classDef file_{kind} fill:{fill},stroke:{stroke},stroke-width:2px,color:#1f2328"
        ));
    }
    for (kind, _, _, fill, stroke) in PALETTE {
        lines.push(format!(
            "classDef component_{kind} fill:{fill},stroke:{stroke},stroke-width:1px,color:#ffffff"
        ));
    }
    lines.join("\n")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MermaidRenderer {
    direction: Direction,
}

impl MermaidRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn render(&self, store: &GraphStore) -> String {
        let mut out = Output::default();
        out.line(0, format!("graph {}", self.direction));

        let groups = group_by_file(store);
        let mut class_lines = Vec::new();

        for group in &groups {
            let file_id = file_node_id(group.path);
            out.line(1, format!("subgraph {}[\"{}\"]", file_id, file_label(store, group.path)));
            if let Some(file) = store.file(group.path) {
                class_lines.push(format!("class {} file_{}", file_id, file.change_kind));
            }
            self.render_file_body(&mut out, &mut class_lines, group);
            out.line(1, "end");
        }

        for (source, target) in store.component_edges() {
            out.line(
                1,
                format!("{} --> {}", component_node_id(source), component_node_id(target)),
            );
        }

        for line in class_lines {
            out.line(1, line);
        }
        for line in class_definitions().lines() {
            out.line(1, line);
        }

        out.finish()
    }

    fn render_file_body(&self, out: &mut Output, class_lines: &mut Vec<String>, group: &FileGroup<'_>) {
        let containers: HashSet<&str> = group
            .components
            .iter()
            .filter(|c| c.component_type == ComponentType::Container)
            .map(|c| c.name.as_str())
            .collect();

        let mut children: HashMap<&str, Vec<&ComponentNode>> = HashMap::new();
        let mut standalone = Vec::new();
        for component in group.components.iter().copied() {
            if component.component_type == ComponentType::Container {
                continue;
            }
            match component.parent.as_deref() {
                Some(parent) if containers.contains(parent) => {
                    children.entry(parent).or_default().push(component)
                }
                _ => standalone.push(component),
            }
        }

        for container in group
            .components
            .iter()
            .filter(|c| c.component_type == ComponentType::Container)
        {
            let id = component_node_id(container.key.as_str());
            out.line(2, format!("subgraph {}[\"{}\"]", id, escape_label(&container.name)));
            // Clicks bind to vertices, not subgraphs.
            if let Some(tooltip) = tooltip(container) {
                let anchor = format!("{}__info", id);
                out.line(3, format!("{}((\"i\")):::component_{}", anchor, container.change_kind));
                out.line(3, format!("click {} callback \"{}\"", anchor, tooltip));
            }
            for child in children.get(container.name.as_str()).into_iter().flatten() {
                render_component(out, 3, child);
            }
            out.line(2, "end");
            class_lines.push(format!("class {} component_{}", id, container.change_kind));
        }

        for component in standalone {
            render_component(out, 2, component);
        }
    }
}

/// Render with default options.
pub fn render_mermaid(store: &GraphStore) -> String {
    MermaidRenderer::new().render(store)
}

struct FileGroup<'a> {
    path: &'a str,
    components: Vec<&'a ComponentNode>,
}

/// Components grouped by file: known files in input order, then files that
/// only appear in component keys, in first-seen order.
fn group_by_file(store: &GraphStore) -> Vec<FileGroup<'_>> {
    let mut groups: Vec<FileGroup<'_>> = store
        .files()
        .map(|f| FileGroup {
            path: f.path.as_str(),
            components: Vec::new(),
        })
        .collect();
    let mut index: HashMap<&str, usize> = groups
        .iter()
        .enumerate()
        .map(|(i, g)| (g.path, i))
        .collect();

    for component in store.components() {
        let path = component.file_path.as_str();
        let slot = *index.entry(path).or_insert_with(|| {
            groups.push(FileGroup {
                path,
                components: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].components.push(component);
    }
    groups
}

fn file_label(store: &GraphStore, path: &str) -> String {
    let mut label = escape_label(path);
    if let Some(file) = store.file(path) {
        if file.status == FileStatus::Error {
            let message: String = file
                .error
                .as_deref()
                .unwrap_or("analysis failed")
                .chars()
                .take(ERROR_LABEL_CHARS)
                .collect();
            label.push_str(&format!("<br/>(error: {})", sanitize_tooltip(&message)));
        }
    }
    label
}

fn render_component(out: &mut Output, depth: usize, component: &ComponentNode) {
    let id = component_node_id(component.key.as_str());
    let name = escape_label(&component.name);
    let shape = match component.component_type {
        ComponentType::Method => format!("{}(\"{}\")", id, name),
        _ => format!("{}[\"{}\"]", id, name),
    };
    out.line(depth, format!("{}:::component_{}", shape, component.change_kind));
    render_tooltip(out, depth, component);
}

fn render_tooltip(out: &mut Output, depth: usize, component: &ComponentNode) {
    if let Some(tooltip) = tooltip(component) {
        out.line(
            depth,
            format!(
                "click {} callback \"{}\"",
                component_node_id(component.key.as_str()),
                tooltip
            ),
        );
    }
}

fn tooltip(component: &ComponentNode) -> Option<String> {
    let tooltip = sanitize_tooltip(component.summary.as_deref()?);
    (!tooltip.is_empty()).then_some(tooltip)
}

#[derive(Default)]
struct Output {
    lines: Vec<String>,
}

impl Output {
    fn line(&mut self, depth: usize, text: impl AsRef<str>) {
        self.lines
            .push(format!("{}{}", INDENT.repeat(depth), text.as_ref()));
    }

    fn finish(self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}
