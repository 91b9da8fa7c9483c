//! The document handle the pipeline analyzes.

use std::path::{Path, PathBuf};

/// A text document as seen by the host: path, language, content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: PathBuf,
    pub language_id: String,
    pub text: String,
    /// `false` for untitled or otherwise non-file-backed buffers.
    pub is_file: bool,
}

impl Document {
    /// Build a file-backed document, inferring the language from the extension
    /// when `language_id` is `None`.
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>, language_id: Option<&str>) -> Self {
        let path = path.into();
        let language_id = language_id
            .map(str::to_string)
            .unwrap_or_else(|| language_for_path(&path).to_string());
        Self {
            path,
            language_id,
            text: text.into(),
            is_file: true,
        }
    }

    /// Read a document from disk.
    pub async fn open(path: &Path, language_id: Option<&str>) -> std::io::Result<Self> {
        let text = tokio::fs::read_to_string(path).await?;
        Ok(Self::new(path, text, language_id))
    }

    /// The path as displayed in messages and logs.
    pub fn file_name(&self) -> String {
        self.path.display().to_string()
    }

    /// Final path component, used for the busy indicator.
    pub fn base_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file_name())
    }

    /// Content size in bytes (UTF-8).
    pub fn byte_len(&self) -> usize {
        self.text.len()
    }
}

/// Map a file extension to an editor-style language identifier.
pub fn language_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "js" | "mjs" | "cjs" => "javascript",
        "jsx" => "javascriptreact",
        "ts" | "mts" | "cts" => "typescript",
        "tsx" => "typescriptreact",
        "rs" => "rust",
        "py" => "python",
        "go" => "go",
        "java" => "java",
        "kt" | "kts" => "kotlin",
        "rb" => "ruby",
        "php" => "php",
        "c" | "h" => "c",
        "cc" | "cpp" | "cxx" | "hpp" => "cpp",
        "cs" => "csharp",
        "swift" => "swift",
        "sh" | "bash" => "shellscript",
        "json" => "json",
        "toml" => "toml",
        "yml" | "yaml" => "yaml",
        "md" => "markdown",
        "html" => "html",
        "css" => "css",
        "sql" => "sql",
        _ => "plaintext",
    }
}
