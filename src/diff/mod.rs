//! Change extraction: working-tree diffs for a single file.
//!
//! [`compute_diff`] never fails. Tool errors degrade to a synthetic
//! whole-file diff, and a tracked file with no changes yields an empty
//! string, which callers treat as "no diff".

pub mod git;
pub mod synthetic;

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::Document;

/// Errors from the diff engine.
#[derive(Error, Debug)]
pub enum DiffError {
    #[error("git command failed: {0}")]
    GitError(String),

    #[error("failed to read file: {0}")]
    FileReadError(#[from] std::io::Error),
}

/// Source of per-file change sets and changed-file listings.
///
/// The orchestrator depends on this trait rather than on git directly so
/// the pipeline can run against scripted change sets.
#[async_trait]
pub trait ChangeSource: Send + Sync {
    /// Unified diff of the document's uncommitted changes. Empty means "no changes".
    async fn working_diff(&self, document: &Document, repo_root: &Path) -> Result<String, DiffError>;

    /// Files with uncommitted changes under `repo_root`.
    async fn changed_files(&self, repo_root: &Path) -> Result<Vec<PathBuf>, DiffError>;
}

/// [`ChangeSource`] backed by the `git` executable.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitChangeSource;

#[async_trait]
impl ChangeSource for GitChangeSource {
    async fn working_diff(&self, document: &Document, repo_root: &Path) -> Result<String, DiffError> {
        if !document.is_file {
            return Ok(String::new());
        }
        Ok(compute_diff(&document.path, &document.text, repo_root).await)
    }

    async fn changed_files(&self, repo_root: &Path) -> Result<Vec<PathBuf>, DiffError> {
        git::changed_files(repo_root).await
    }
}

/// Path of `file` relative to `root`, with `/` separators.
///
/// Returns `None` when the file is not under the root (including any path
/// that would need a `..` component to reach it) or is the root itself.
pub fn relative_to_root(file: &Path, root: &Path) -> Option<String> {
    let rel = file.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Produce the unified diff of `file_path`'s uncommitted changes.
///
/// Order of attempts:
/// 1. not under `repo_root` → empty
/// 2. not a git work tree → synthetic whole-file diff
/// 3. diff against HEAD, when HEAD exists and the diff is non-empty
/// 4. unstaged + staged diffs, joined by a blank line
/// 5. no commits yet and nothing staged or modified → empty
/// 6. tracked with nothing to show → empty; untracked → synthetic
///
/// Any git failure along the way returns the synthetic diff.
pub async fn compute_diff(file_path: &Path, contents: &str, repo_root: &Path) -> String {
    let Some(relative_path) = relative_to_root(file_path, repo_root) else {
        return String::new();
    };

    let fallback = synthetic::full_file_diff(&relative_path, contents);

    if !git::is_inside_work_tree(repo_root).await {
        info!(file = %relative_path, "no git repository detected; analyzing full file");
        return fallback;
    }

    let has_head = git::has_head(repo_root).await;
    if has_head {
        match git::diff_against_head(repo_root, &relative_path).await {
            Ok(diff) if !diff.trim().is_empty() => return diff.trim().to_string(),
            Ok(_) => {}
            Err(e) => {
                warn!(file = %relative_path, error = %e, "git diff against HEAD failed; analyzing full file");
                return fallback;
            }
        }
    }

    let parts = tokio::try_join!(
        git::diff_unstaged(repo_root, &relative_path),
        git::diff_staged(repo_root, &relative_path),
    );
    match parts {
        Ok((unstaged, staged)) => {
            let merged = [unstaged.trim(), staged.trim()]
                .into_iter()
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join("\n\n");
            if !merged.is_empty() {
                return merged;
            }
        }
        Err(e) => {
            warn!(file = %relative_path, error = %e, "git diff failed; analyzing full file");
            return fallback;
        }
    }

    if !has_head {
        debug!(file = %relative_path, "no commits and no staged or unstaged changes");
        return String::new();
    }

    if git::is_tracked(repo_root, &relative_path).await {
        String::new()
    } else {
        fallback
    }
}
