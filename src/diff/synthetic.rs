//! Synthetic "whole file is new" diffs.
//!
//! Used when there is no repository, no prior revision, or the diff tool
//! failed: the reviewer still gets a unified diff, just one where every
//! line is an addition.

/// Render `content` as a unified diff that adds a new file at `relative_path`.
///
/// The hunk header is `@@ -0,0 +1,N @@` where `N` is the number of lines
/// (a trailing newline does not start an extra line).
pub fn full_file_diff(relative_path: &str, content: &str) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let mut out = String::with_capacity(content.len() + lines.len() + 128);
    out.push_str(&format!("diff --git a/{relative_path} b/{relative_path}\n"));
    out.push_str("new file mode 100644\n");
    out.push_str("--- /dev/null\n");
    out.push_str(&format!("+++ b/{relative_path}\n"));
    out.push_str(&format!("@@ -0,0 +1,{} @@", lines.len()));
    for line in &lines {
        out.push_str("\n+");
        out.push_str(line);
    }
    out
}
