//! Git CLI wrapper for working-tree diffs and status.
//!
//! Shells out to `git` via `tokio::process::Command`. A non-zero exit is a
//! recoverable [`DiffError::GitError`], never a panic.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::DiffError;

/// Run `git <args>` inside `repo_root` and return stdout.
pub async fn run_git(repo_root: &Path, args: &[&str]) -> Result<String, DiffError> {
    debug!(cwd = %repo_root.display(), args = ?args, "git");
    let output = tokio::process::Command::new("git")
        .args(args)
        .current_dir(repo_root)
        .output()
        .await
        .map_err(|e| DiffError::GitError(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DiffError::GitError(format!(
            "git {} failed ({}): {}",
            args.first().copied().unwrap_or_default(),
            output.status,
            stderr.trim()
        )));
    }

    String::from_utf8(output.stdout)
        .map_err(|e| DiffError::GitError(format!("git output is not valid UTF-8: {e}")))
}

/// Whether `dir` is inside a git working tree.
pub async fn is_inside_work_tree(dir: &Path) -> bool {
    run_git(dir, &["rev-parse", "--is-inside-work-tree"])
        .await
        .is_ok_and(|out| out.trim() == "true")
}

/// Whether the repository has a HEAD commit yet.
pub async fn has_head(repo_root: &Path) -> bool {
    run_git(repo_root, &["rev-parse", "--verify", "--quiet", "HEAD"])
        .await
        .is_ok()
}

/// Zero-context diff of one file against HEAD.
pub async fn diff_against_head(repo_root: &Path, relative_path: &str) -> Result<String, DiffError> {
    run_git(
        repo_root,
        &["diff", "--no-color", "-U0", "HEAD", "--", relative_path],
    )
    .await
}

/// Zero-context diff of one file's unstaged changes.
pub async fn diff_unstaged(repo_root: &Path, relative_path: &str) -> Result<String, DiffError> {
    run_git(repo_root, &["diff", "--no-color", "-U0", "--", relative_path]).await
}

/// Zero-context diff of one file's staged changes.
pub async fn diff_staged(repo_root: &Path, relative_path: &str) -> Result<String, DiffError> {
    run_git(
        repo_root,
        &["diff", "--no-color", "-U0", "--cached", "--", relative_path],
    )
    .await
}

/// Whether git tracks the file.
pub async fn is_tracked(repo_root: &Path, relative_path: &str) -> bool {
    run_git(
        repo_root,
        &["ls-files", "--error-unmatch", "--", relative_path],
    )
    .await
    .is_ok()
}

/// List files with working-tree or index changes, as absolute paths.
///
/// Renames resolve to their destination path. Entries are deduplicated and
/// returned in sorted order.
pub async fn changed_files(repo_root: &Path) -> Result<Vec<PathBuf>, DiffError> {
    // Porcelain paths are relative to the top level, not to the cwd.
    let toplevel = find_repo_root(repo_root).await?;
    let stdout = run_git(&toplevel, &["status", "--porcelain", "-z", "--untracked-files=all"]).await?;
    Ok(parse_porcelain(&stdout)
        .into_iter()
        .map(|rel| toplevel.join(rel))
        .collect())
}

/// Parse `git status --porcelain -z` (v1) output into relative paths.
///
/// Entries are NUL-terminated and paths are never quoted. A rename or copy
/// entry carries its destination and is followed by the source path as a
/// separate field.
fn parse_porcelain(stdout: &str) -> Vec<String> {
    let mut files = BTreeSet::new();
    let mut fields = stdout.split('\0');
    while let Some(entry) = fields.next() {
        if entry.len() < 4 {
            continue;
        }
        let (status, path) = entry.split_at(3);
        if status.contains(['R', 'C']) {
            fields.next();
        }
        if !path.is_empty() {
            files.insert(path.to_string());
        }
    }
    files.into_iter().collect()
}

/// Find the root of the git repository containing `start_dir`.
pub async fn find_repo_root(start_dir: &Path) -> Result<PathBuf, DiffError> {
    let stdout = run_git(start_dir, &["rev-parse", "--show-toplevel"])
        .await
        .map_err(|e| DiffError::GitError(format!("not a git repository: {e}")))?;
    Ok(PathBuf::from(stdout.trim()))
}
