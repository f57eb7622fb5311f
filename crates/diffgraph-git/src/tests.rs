//! Unit tests for diffgraph-git

use crate::*;
use std::fs;
use std::process::Command as StdCommand;
use tempfile::TempDir;

fn entry(path: &str, change_kind: ChangeKind) -> StatusEntry {
    StatusEntry {
        path: path.to_string(),
        change_kind,
    }
}

#[test]
fn test_parse_status_codes() {
    let output = "?? new.py\0A  staged.py\0AM staged_then_edited.py\0 M edited.py\0M  indexed.py\0 T link.py\0 D gone.py\0D  removed.py\0UU conflict.py\0!! ignored.log\0AD ephemeral.py\0";
    assert_eq!(
        parse_status(output),
        vec![
            entry("new.py", ChangeKind::Added),
            entry("staged.py", ChangeKind::Added),
            entry("staged_then_edited.py", ChangeKind::Added),
            entry("edited.py", ChangeKind::Modified),
            entry("indexed.py", ChangeKind::Modified),
            entry("link.py", ChangeKind::Modified),
            entry("gone.py", ChangeKind::Deleted),
            entry("removed.py", ChangeKind::Deleted),
            entry("conflict.py", ChangeKind::Modified),
        ]
    );
}

#[test]
fn test_parse_status_rename_uses_new_path() {
    let output = "R  src/new_name.py\0src/old_name.py\0 M other.py\0";
    assert_eq!(
        parse_status(output),
        vec![
            entry("src/new_name.py", ChangeKind::Modified),
            entry("other.py", ChangeKind::Modified),
        ]
    );
}

#[test]
fn test_parse_status_keeps_spaces_in_paths() {
    assert_eq!(
        parse_status("?? docs/read me.md\0"),
        vec![entry("docs/read me.md", ChangeKind::Added)]
    );
    assert!(parse_status("").is_empty());
    assert!(parse_status("?\0").is_empty());
}

fn git_available() -> bool {
    StdCommand::new("git").arg("--version").output().is_ok_and(|o| o.status.success())
}

fn run_git(root: &std::path::Path, args: &[&str]) {
    let status = StdCommand::new("git")
        .arg("-C")
        .arg(root)
        .args(["-c", "user.name=DiffGraph Test", "-c", "user.email=test@example.com"])
        .args(args)
        .output()
        .unwrap();
    assert!(status.status.success(), "git {:?} failed: {:?}", args, status);
}

#[tokio::test]
async fn test_discover_changes_in_repository() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    run_git(root, &["init", "-q"]);
    fs::write(root.join("keep.py"), "def keep():\n    return 1\n").unwrap();
    fs::write(root.join("drop.py"), "class Drop:\n    pass\n").unwrap();
    run_git(root, &["add", "."]);
    run_git(root, &["commit", "-q", "-m", "init"]);

    fs::write(root.join("keep.py"), "def keep():\n    return 2\n").unwrap();
    fs::remove_file(root.join("drop.py")).unwrap();
    fs::write(root.join("fresh.py"), "def fresh():\n    pass\n").unwrap();

    assert!(is_git_repo(root).await);
    let changes = discover_changes(root).await.unwrap();
    let mut summary: Vec<(&str, ChangeKind)> = changes.iter().map(|c| (c.path.as_str(), c.change_kind)).collect();
    summary.sort_by_key(|(path, _)| *path);
    assert_eq!(
        summary,
        vec![
            ("drop.py", ChangeKind::Deleted),
            ("fresh.py", ChangeKind::Added),
            ("keep.py", ChangeKind::Modified),
        ]
    );

    let content = |path: &str| {
        changes
            .iter()
            .find(|c| c.path == path)
            .and_then(|c| c.content.clone())
            .unwrap()
    };
    assert_eq!(content("fresh.py"), "def fresh():\n    pass\n");
    assert_eq!(content("drop.py"), "class Drop:\n    pass\n");
    let diff = content("keep.py");
    assert!(diff.contains("-    return 1"));
    assert!(diff.contains("+    return 2"));
}

#[tokio::test]
async fn test_discover_changes_from_subdirectory() {
    if !git_available() {
        return;
    }
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    run_git(root, &["init", "-q"]);
    fs::create_dir(root.join("pkg")).unwrap();
    fs::write(root.join("pkg/a.py"), "def a():\n    return 1\n").unwrap();
    run_git(root, &["add", "."]);
    run_git(root, &["commit", "-q", "-m", "init"]);

    fs::write(root.join("pkg/a.py"), "def a():\n    return 2\n").unwrap();
    fs::write(root.join("pkg/new.py"), "def new():\n    pass\n").unwrap();

    let subdir = root.join("pkg");
    let toplevel = repository_root(&subdir).await.unwrap();
    assert_eq!(fs::canonicalize(toplevel).unwrap(), fs::canonicalize(root).unwrap());

    let mut changes = discover_changes(&subdir).await.unwrap();
    changes.sort_by(|a, b| a.path.cmp(&b.path));
    assert_eq!(changes.len(), 2);

    assert_eq!(changes[0].path, "pkg/a.py");
    assert_eq!(changes[0].change_kind, ChangeKind::Modified);
    assert!(changes[0].content.as_deref().unwrap().contains("+    return 2"));

    assert_eq!(changes[1].path, "pkg/new.py");
    assert_eq!(changes[1].change_kind, ChangeKind::Added);
    assert_eq!(changes[1].content.as_deref(), Some("def new():\n    pass\n"));
}

#[tokio::test]
async fn test_discover_changes_outside_repository() {
    if !git_available() {
        return;
    }
    let dir = TempDir::new().unwrap();
    assert!(!is_git_repo(dir.path()).await);
    assert!(matches!(
        repository_root(dir.path()).await,
        Err(GitError::NotARepository(_))
    ));
    assert!(matches!(
        discover_changes(dir.path()).await,
        Err(GitError::NotARepository(_))
    ));
}
