//! Workspace root resolution.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::diff::{git, relative_to_root};

/// The project the user is working in.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// `root` should already be absolute; it is canonicalized when possible.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = std::fs::canonicalize(&root).unwrap_or(root);
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute form of a path given by the user or host.
    ///
    /// Relative paths are taken relative to the workspace root. Existing
    /// paths are canonicalized so they compare equal to git's output.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        std::fs::canonicalize(&joined).unwrap_or(joined)
    }

    /// The repository root to diff `file` against.
    ///
    /// Files under the workspace use the workspace root. Anything else asks
    /// git for the top level of the file's directory; `None` means the file
    /// is not in any known repository.
    pub async fn root_for(&self, file: &Path) -> Option<PathBuf> {
        if relative_to_root(file, &self.root).is_some() {
            return Some(self.root.clone());
        }
        let dir = file.parent()?;
        match git::find_repo_root(dir).await {
            Ok(root) => Some(root),
            Err(e) => {
                debug!(file = %file.display(), "no repository root: {e}");
                None
            }
        }
    }
}
