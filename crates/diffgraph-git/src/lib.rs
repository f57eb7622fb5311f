//! Change discovery for DiffGraph
//!
//! Compares the working tree against `HEAD` with `git status` and gathers
//! the text each changed file should be analysed with.

pub mod error;

#[cfg(test)]
pub mod tests;

pub use error::GitError;

use std::path::{Path, PathBuf};

use diffgraph_core::ChangeKind;
use tokio::process::Command;
use tracing::{debug, warn};

/// One entry of `git status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// Path relative to the repository root (the new path for renames)
    pub path: String,
    pub change_kind: ChangeKind,
}

/// A changed file and the text to analyse it with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: String,
    pub change_kind: ChangeKind,
    /// Working-tree text for added files, `git diff HEAD` for modified ones,
    /// the committed text for deleted ones. `None` when it could not be read.
    pub content: Option<String>,
}

/// Parse the output of `git status --porcelain -z`.
///
/// Untracked and index-added files are added, deletions on either side are
/// deleted, and modifications, type changes, renames, copies and conflicts
/// are modified. Ignored entries and files added then removed again are
/// dropped.
pub fn parse_status(output: &str) -> Vec<StatusEntry> {
    let mut entries = Vec::new();
    let mut fields = output.split('\0').filter(|f| !f.is_empty());

    while let Some(field) = fields.next() {
        let (Some(code), Some(path)) = (field.get(..2), field.get(3..)) else {
            warn!("Skipping unreadable status entry {:?}", field);
            continue;
        };
        let mut codes = code.chars();
        let (index, worktree) = (codes.next().unwrap_or(' '), codes.next().unwrap_or(' '));

        // Renames and copies carry the original path as the next field.
        if matches!(index, 'R' | 'C') {
            fields.next();
        }

        let change_kind = match (index, worktree) {
            ('?', '?') => Some(ChangeKind::Added),
            ('!', '!') => None,
            ('A', 'D') => None,
            ('D', _) | (_, 'D') => Some(ChangeKind::Deleted),
            ('A', _) => Some(ChangeKind::Added),
            (x, y) if is_modification(x) || is_modification(y) => Some(ChangeKind::Modified),
            _ => None,
        };

        match change_kind {
            Some(change_kind) => entries.push(StatusEntry {
                path: path.to_string(),
                change_kind,
            }),
            None => debug!("Ignoring status {:?} for {}", code, path),
        }
    }

    entries
}

fn is_modification(code: char) -> bool {
    matches!(code, 'M' | 'T' | 'R' | 'C' | 'U')
}

/// Whether `root` is inside a git work tree.
pub async fn is_git_repo(root: &Path) -> bool {
    Command::new("git")
        .arg("-C")
        .arg(root)
        .args(["rev-parse", "--is-inside-work-tree"])
        .output()
        .await
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Top-level directory of the work tree containing `root`.
pub async fn repository_root(root: &Path) -> Result<PathBuf, GitError> {
    if !is_git_repo(root).await {
        return Err(GitError::NotARepository(root.to_path_buf()));
    }
    let toplevel = git(root, &["rev-parse", "--show-toplevel"]).await?;
    Ok(PathBuf::from(toplevel.trim_end_matches(['\n', '\r'])))
}

/// List the working-tree changes of the repository containing `root`.
///
/// Paths are relative to the repository's top level, even when `root` is a
/// subdirectory.
pub async fn discover_changes(root: &Path) -> Result<Vec<FileChange>, GitError> {
    let toplevel = repository_root(root).await?;
    debug!("Repository top level: {}", toplevel.display());

    let status = git(&toplevel, &["status", "--porcelain", "-z", "--untracked-files=all"]).await?;
    let entries = parse_status(&status);
    debug!("git status reported {} change(s)", entries.len());

    let mut changes = Vec::with_capacity(entries.len());
    for entry in entries {
        let content = read_content(&toplevel, &entry).await;
        if content.is_none() {
            warn!("Could not read content for {}", entry.path);
        }
        changes.push(FileChange {
            path: entry.path,
            change_kind: entry.change_kind,
            content,
        });
    }
    Ok(changes)
}

/// Text to analyse for one status entry. Paths resolve against `toplevel`,
/// the repository top level.
pub async fn read_content(toplevel: &Path, entry: &StatusEntry) -> Option<String> {
    let text = match entry.change_kind {
        ChangeKind::Added | ChangeKind::Unchanged => tokio::fs::read_to_string(toplevel.join(&entry.path)).await.ok()?,
        ChangeKind::Modified => git(toplevel, &["diff", "HEAD", "--", &entry.path]).await.ok()?,
        ChangeKind::Deleted => git(toplevel, &["show", &format!("HEAD:{}", entry.path)]).await.ok()?,
    };
    if text.trim().is_empty() && entry.change_kind != ChangeKind::Added {
        return None;
    }
    Some(text)
}

async fn git(root: &Path, args: &[&str]) -> Result<String, GitError> {
    let output = Command::new("git").arg("-C").arg(root).args(args).output().await?;
    if !output.status.success() {
        return Err(GitError::CommandFailed {
            command: args.join(" "),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
