//! Markdown summary of a run

use crate::graph::GraphStore;
use crate::model::FileStatus;

/// One section per file in input order: its summary, its error text, or a
/// note that it was never analysed.
pub fn run_summary(store: &GraphStore) -> String {
    let mut sections = Vec::with_capacity(store.file_count());
    for file in store.files() {
        let body = match file.status {
            FileStatus::Processed => file
                .summary
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or("No summary provided.")
                .trim()
                .to_string(),
            FileStatus::Error => format!(
                "Error: {}",
                file.error.as_deref().unwrap_or("analysis failed")
            ),
            FileStatus::Pending | FileStatus::Processing => "_Not analysed._".to_string(),
        };
        sections.push(format!("## {} ({})\n\n{}", file.path, file.change_kind, body));
    }
    sections.join("\n\n")
}
