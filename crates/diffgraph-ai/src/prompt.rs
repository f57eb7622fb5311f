//! Prompt templates for file analysis

use super::bridge::FileAnalysisRequest;

/// System prompt sent with every file analysis request
pub const SYSTEM_PROMPT: &str = r#"You are an expert code reviewer. You analyse one changed file at a time and describe the code components the change touches.

A component is a container (class, struct, interface, trait, module, enum), a function, or a method. For each changed component report:
- name: the identifier as written in the code
- component_type: "container", "function" or "method"
- change_type: "added", "deleted", "modified" or "unchanged"
- parent: the name of the enclosing container in the same file, or null
- summary: one sentence on what the component does and how it changed
- dependencies: names of components this component uses
- dependents: names of components known to use this component

Respond with a single JSON object and nothing else:
{
  "summary": "What changed in this file and why it matters",
  "components": [
    {
      "name": "UserService",
      "component_type": "container",
      "change_type": "modified",
      "parent": null,
      "summary": "Loads and caches users",
      "dependencies": ["Database"],
      "dependents": []
    }
  ]
}"#;

/// Build the user prompt for one file
pub fn file_analysis_prompt(request: &FileAnalysisRequest) -> String {
    let known = if request.known_components.is_empty() {
        "(none)".to_string()
    } else {
        request
            .known_components
            .iter()
            .map(|c| match c.summary.as_deref() {
                Some(summary) if !summary.trim().is_empty() => format!("- {}: {}", c.name, summary.trim()),
                _ => format!("- {}", c.name),
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let content_label = match request.change_kind {
        diffgraph_core::ChangeKind::Modified => "Diff against the last commit",
        diffgraph_core::ChangeKind::Deleted => "Content before deletion",
        _ => "Content",
    };

    format!(
        r#"File: {}
Status: {}

Components already known in this file:
{}

{}:
```
{}
```

List every component this change adds, deletes or modifies, with its dependencies and dependents."#,
        request.file_path,
        request.change_kind,
        known,
        content_label,
        request.content.trim_end()
    )
}
