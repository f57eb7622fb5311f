//! Local provider for offline analysis
//!
//! Scans the file text with a handful of regular expressions instead of
//! asking a model. It understands Python-style indentation and brace
//! languages well enough to name classes, functions and methods, and it
//! reports base classes and capitalised call targets as dependencies.

use std::collections::HashSet;

use super::super::bridge::{AnalysisProvider, FileAnalysis, FileAnalysisRequest};
use super::super::error::AnalysisError;
use anyhow::{Context, Result};
use diffgraph_core::{ChangeKind, ComponentRecord, ComponentType};
use regex::Regex;

const CONTAINER_PATTERN: &str = r"^(?:(?:pub(?:\([^)]*\))?|export|default|abstract|public|private|protected|final|static|sealed)\s+)*(class|struct|trait|interface|enum|module)\s+([A-Za-z_][A-Za-z0-9_]*)(.*)$";
const FUNCTION_PATTERN: &str = r"^(?:(?:pub(?:\([^)]*\))?|export|default|async|static|public|private|protected|unsafe|const|override)\s+)*(?:def|fn|function|func)\s+([A-Za-z_][A-Za-z0-9_]*)";
const IMPL_PATTERN: &str = r"^impl(?:<[^>]*>)?\s+(?:[A-Za-z_][\w:]*(?:<[^>]*>)?\s+for\s+)?([A-Za-z_][A-Za-z0-9_]*)";
const INHERITS_PATTERN: &str = r"\b(?:extends|implements)\s+([A-Za-z_][\w.]*(?:\s*,\s*[A-Za-z_][\w.]*)*)";
const REFERENCE_PATTERN: &str = r"\b([A-Z][A-Za-z0-9_]*)\s*(?:\(|\.|::|\{)";

/// Capitalised names that are language builtins rather than components
const IGNORED_REFERENCES: &[&str] = &[
    "Self", "Some", "None", "Ok", "Err", "Vec", "String", "Box", "Option", "Result", "HashMap",
    "HashSet", "True", "False", "Object", "Array", "Math", "JSON", "Promise", "Error",
];

pub struct LocalProvider {
    container: Regex,
    function: Regex,
    impl_block: Regex,
    inherits: Regex,
    reference: Regex,
}

impl LocalProvider {
    pub fn new() -> Result<Self> {
        Ok(Self {
            container: Regex::new(CONTAINER_PATTERN).context("Invalid container pattern")?,
            function: Regex::new(FUNCTION_PATTERN).context("Invalid function pattern")?,
            impl_block: Regex::new(IMPL_PATTERN).context("Invalid impl pattern")?,
            inherits: Regex::new(INHERITS_PATTERN).context("Invalid inheritance pattern")?,
            reference: Regex::new(REFERENCE_PATTERN).context("Invalid reference pattern")?,
        })
    }

    /// Scan `content` and return the components it defines.
    pub fn scan(&self, content: &str, change_kind: ChangeKind) -> Vec<ComponentRecord> {
        let mut components: Vec<ComponentRecord> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        // Enclosing container: (name, indent)
        let mut scope: Option<(String, usize)> = None;
        // Definition whose body we are in: (index into components, indent)
        let mut current: Option<(usize, usize)> = None;

        for line in source_lines(content) {
            let trimmed = line.trim_start();
            if trimmed.is_empty() || trimmed.starts_with("//") || trimmed.starts_with('#') {
                continue;
            }
            let indent = line.len() - trimmed.len();
            if scope.as_ref().is_some_and(|(_, scope_indent)| indent <= *scope_indent) {
                scope = None;
            }
            if current.is_some_and(|(_, def_indent)| indent <= def_indent) {
                current = None;
            }

            if let Some(caps) = self.impl_block.captures(trimmed) {
                scope = Some((caps[1].to_string(), indent));
                continue;
            }

            if let Some(caps) = self.container.captures(trimmed) {
                let name = caps[2].to_string();
                if seen.insert(name.clone()) {
                    components.push(ComponentRecord {
                        summary: Some(format!("{} {}", &caps[1], name)),
                        dependencies: self.base_names(&caps[3]),
                        ..record(&name, ComponentType::Container, change_kind, scope_parent(&scope, indent))
                    });
                    current = Some((components.len() - 1, indent));
                }
                scope = Some((name, indent));
                continue;
            }

            if let Some(caps) = self.function.captures(trimmed) {
                let name = caps[1].to_string();
                if seen.insert(name.clone()) {
                    let parent = scope_parent(&scope, indent);
                    let (component_type, summary) = match &parent {
                        Some(owner) => (ComponentType::Method, format!("method {} of {}", name, owner)),
                        None => (ComponentType::Function, format!("function {}", name)),
                    };
                    components.push(ComponentRecord {
                        summary: Some(summary),
                        ..record(&name, component_type, change_kind, parent)
                    });
                    current = Some((components.len() - 1, indent));
                }
                continue;
            }

            if let Some((index, _)) = current {
                let component = &mut components[index];
                for caps in self.reference.captures_iter(trimmed) {
                    let target = &caps[1];
                    if target != component.name
                        && !IGNORED_REFERENCES.contains(&target)
                        && !component.dependencies.iter().any(|d| d == target)
                    {
                        component.dependencies.push(target.to_string());
                    }
                }
            }
        }

        components
    }

    /// Base classes named after a container declaration: a parenthesised
    /// list or `extends`/`implements` clauses.
    fn base_names(&self, rest: &str) -> Vec<String> {
        let mut raw: Vec<&str> = Vec::new();
        let rest = rest.trim();
        if let Some(inner) = rest.strip_prefix('(').and_then(|r| r.split(')').next()) {
            raw.extend(inner.split(','));
        }
        for caps in self.inherits.captures_iter(rest) {
            if let Some(list) = caps.get(1) {
                raw.extend(list.as_str().split(','));
            }
        }

        let mut bases: Vec<String> = Vec::new();
        for base in raw {
            let base = base.trim();
            if base.is_empty() || base.contains('=') || base == "object" {
                continue;
            }
            let short = base.rsplit('.').next().unwrap_or(base).to_string();
            if !bases.contains(&short) {
                bases.push(short);
            }
        }
        bases
    }
}

#[async_trait::async_trait]
impl AnalysisProvider for LocalProvider {
    async fn analyze_file(&self, request: &FileAnalysisRequest) -> Result<FileAnalysis, AnalysisError> {
        let components = self.scan(&request.content, request.change_kind);

        let summary = if components.is_empty() {
            format!("{} {}: no components detected.", capitalize(request.change_kind.as_str()), request.file_path)
        } else {
            let names = components.iter().map(|c| c.name.as_str()).collect::<Vec<_>>().join(", ");
            format!("{} {}: touches {}.", capitalize(request.change_kind.as_str()), request.file_path, names)
        };

        Ok(FileAnalysis {
            summary,
            components,
            tokens_used: 0,
        })
    }

    fn name(&self) -> &str {
        "Local (Heuristic)"
    }
}

fn record(name: &str, component_type: ComponentType, change_kind: ChangeKind, parent: Option<String>) -> ComponentRecord {
    ComponentRecord {
        name: name.to_string(),
        component_type,
        change_kind,
        parent,
        summary: None,
        dependencies: Vec::new(),
        dependents: Vec::new(),
    }
}

fn scope_parent(scope: &Option<(String, usize)>, indent: usize) -> Option<String> {
    scope
        .as_ref()
        .filter(|(_, scope_indent)| indent > *scope_indent)
        .map(|(name, _)| name.clone())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lines of source text. Unified diffs have their headers dropped and the
/// one-character line markers stripped.
fn source_lines(content: &str) -> Vec<&str> {
    let is_diff = content.starts_with("diff --git") || content.lines().any(|l| l.starts_with("@@"));
    if !is_diff {
        return content.lines().collect();
    }
    content
        .lines()
        .filter(|l| {
            !(l.starts_with("diff ")
                || l.starts_with("index ")
                || l.starts_with("+++")
                || l.starts_with("---")
                || l.starts_with("@@")
                || l.starts_with('\\'))
        })
        .map(|l| l.get(1..).unwrap_or(""))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(records: &[ComponentRecord]) -> Vec<(&str, ComponentType, Option<&str>)> {
        records
            .iter()
            .map(|r| (r.name.as_str(), r.component_type, r.parent.as_deref()))
            .collect()
    }

    #[test]
    fn test_python_classes_and_methods() {
        let provider = LocalProvider::new().unwrap();
        let source = "\
import os

class Repo(base.Model, metaclass=Meta):
    def load(self):
        return Cache.get(self)

def main():
    repo = Repo()
";
        let records = provider.scan(source, ChangeKind::Added);
        assert_eq!(
            names(&records),
            vec![
                ("Repo", ComponentType::Container, None),
                ("load", ComponentType::Method, Some("Repo")),
                ("main", ComponentType::Function, None),
            ]
        );
        assert_eq!(records[0].dependencies, vec!["Model"]);
        assert_eq!(records[1].dependencies, vec!["Cache"]);
        assert_eq!(records[2].dependencies, vec!["Repo"]);
        assert!(records.iter().all(|r| r.change_kind == ChangeKind::Added));
    }

    #[test]
    fn test_rust_impl_blocks() {
        let provider = LocalProvider::new().unwrap();
        let source = "\
pub struct Store {
    items: Vec<String>,
}

impl Default for Store {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

pub(crate) async fn run() {}
";
        let records = provider.scan(source, ChangeKind::Modified);
        assert_eq!(
            names(&records),
            vec![
                ("Store", ComponentType::Container, None),
                ("default", ComponentType::Method, Some("Store")),
                ("run", ComponentType::Function, None),
            ]
        );
        assert!(records[1].dependencies.is_empty());
    }

    #[test]
    fn test_typescript_extends() {
        let provider = LocalProvider::new().unwrap();
        let records = provider.scan(
            "export class Admin extends User implements Auditable, Named {\n}\n",
            ChangeKind::Added,
        );
        assert_eq!(records[0].dependencies, vec!["User", "Auditable", "Named"]);
    }

    #[test]
    fn test_unified_diff_input() {
        let provider = LocalProvider::new().unwrap();
        let diff = "\
diff --git a/app.py b/app.py
index 1111111..2222222 100644
--- a/app.py
+++ b/app.py
@@ -1,3 +1,6 @@
 class App:
-    def start(self):
+    def boot(self):
+        pass
";
        let records = provider.scan(diff, ChangeKind::Modified);
        assert_eq!(
            names(&records),
            vec![
                ("App", ComponentType::Container, None),
                ("start", ComponentType::Method, Some("App")),
                ("boot", ComponentType::Method, Some("App")),
            ]
        );
    }
}
