//! Integration tests for DiffGraph
//!
//! These drive change discovery, the offline provider, the pipeline and the
//! report together.

use diffgraph_ai::{ProviderOptions, RetryPolicy, create_provider};
use diffgraph_core::{ChangeKind, Direction, FileStatus};
use diffgraph_git::{FileChange, discover_changes};
use diffgraph_pipeline::{AnalysisPipeline, PipelineOptions};
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn local_pipeline(options: PipelineOptions) -> AnalysisPipeline {
    let provider = create_provider("local", &ProviderOptions::default()).unwrap();
    AnalysisPipeline::new(provider, options)
}

fn options() -> PipelineOptions {
    PipelineOptions {
        retry: RetryPolicy::immediate(5),
        ..PipelineOptions::default()
    }
}

fn added(path: &str, content: &str) -> FileChange {
    FileChange {
        path: path.to_string(),
        change_kind: ChangeKind::Added,
        content: Some(content.to_string()),
    }
}

const REPO_PY: &str = "class Repo:\n    def load(self):\n        return 1\n";
const MAIN_PY: &str = "def main():\n    repo = Repo()\n    return repo.load()\n";

/// Cross-file references found by the offline provider become edges
#[tokio::test]
async fn test_local_provider_end_to_end() {
    let mut pipeline = local_pipeline(options());
    pipeline.enqueue(vec![added("repo.py", REPO_PY), added("main.py", MAIN_PY)]);

    let outcome = pipeline.run().await;

    assert_eq!(outcome.stats.processed, 2);
    assert_eq!(outcome.stats.errored, 0);
    assert_eq!(outcome.tokens_used, 0);

    let store = pipeline.store();
    assert!(store.component("repo.py::Repo").is_some());
    assert_eq!(
        store.component("repo.py::load").and_then(|c| c.parent.clone()).as_deref(),
        Some("Repo")
    );
    assert!(store.has_component_edge("main.py::main", "repo.py::Repo"));
    assert_eq!(store.file_dependencies("main.py"), vec!["repo.py"]);

    assert!(outcome.diagram.starts_with("graph TD\n"));
    assert!(outcome.diagram.contains("subgraph file_repo_py[\"repo.py\"]"));
    assert!(outcome.diagram.contains("main_py__main --> repo_py__Repo"));
    assert!(outcome.summary.contains("## repo.py (added)"));
    assert!(outcome.summary.contains("## main.py (added)"));
}

/// Order of arrival does not matter once the link pass runs
#[tokio::test]
async fn test_reference_before_definition() {
    let mut pipeline = local_pipeline(PipelineOptions {
        direction: Direction::LeftRight,
        ..options()
    });
    pipeline.enqueue(vec![added("main.py", MAIN_PY), added("repo.py", REPO_PY)]);

    let outcome = pipeline.run().await;

    assert!(outcome.diagram.starts_with("graph LR\n"));
    assert!(pipeline.store().has_component_edge("main.py::main", "repo.py::Repo"));
}

/// A file without content fails alone
#[tokio::test]
async fn test_unreadable_file_does_not_stop_the_run() {
    let mut pipeline = local_pipeline(options());
    pipeline.enqueue(vec![
        FileChange {
            content: None,
            ..added("gone.py", "")
        },
        added("repo.py", REPO_PY),
    ]);

    let outcome = pipeline.run().await;

    let store = pipeline.store();
    assert_eq!(store.file("gone.py").unwrap().status, FileStatus::Error);
    assert_eq!(store.file("repo.py").unwrap().status, FileStatus::Processed);
    assert!(outcome.summary.contains("Error: content not found for gone.py"));
    assert!(outcome.diagram.contains("(error: content not found for gone.py)"));
}

fn git_available() -> bool {
    Command::new("git").arg("--version").output().is_ok_and(|o| o.status.success())
}

fn git(root: &Path, args: &[&str]) {
    let output = Command::new("git")
        .arg("-C")
        .arg(root)
        .args(["-c", "user.name=DiffGraph Test", "-c", "user.email=test@example.com"])
        .args(args)
        .output()
        .unwrap();
    assert!(output.status.success(), "git {:?} failed: {:?}", args, output);
}

/// Working-tree changes to report file
#[tokio::test]
async fn test_repository_to_report() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    git(root, &["init", "-q"]);
    fs::write(root.join("repo.py"), "class Repo:\n    pass\n").unwrap();
    fs::write(root.join("legacy.py"), "def old_helper():\n    pass\n").unwrap();
    git(root, &["add", "."]);
    git(root, &["commit", "-q", "-m", "init"]);

    fs::write(root.join("repo.py"), REPO_PY).unwrap();
    fs::remove_file(root.join("legacy.py")).unwrap();
    fs::write(root.join("main.py"), MAIN_PY).unwrap();

    let changes = discover_changes(root).await.unwrap();
    assert_eq!(changes.len(), 3);

    let mut pipeline = local_pipeline(options());
    pipeline.enqueue(changes);
    let outcome = pipeline.run().await;

    let store = pipeline.store();
    assert_eq!(store.file("repo.py").unwrap().change_kind, ChangeKind::Modified);
    assert_eq!(store.file("legacy.py").unwrap().change_kind, ChangeKind::Deleted);
    assert_eq!(store.file("main.py").unwrap().change_kind, ChangeKind::Added);
    assert_eq!(outcome.stats.processed, 3);
    assert!(store.component("legacy.py::old_helper").is_some());
    assert!(store.has_component_edge("main.py::main", "repo.py::Repo"));

    let report = diffgraph_report::write_report(&root.join("diffgraph.html"), &outcome.diagram, &outcome.summary).unwrap();
    let html = fs::read_to_string(report).unwrap();
    assert!(html.contains(&outcome.diagram));
    assert!(html.contains("## legacy.py (deleted)"));
}
