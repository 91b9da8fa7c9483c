//! App-wide constants.
//!
//! Centralises the tool name, config paths, environment variable names,
//! and user-facing labels so a rename only requires changing this file.

/// Crate version, as reported by `sidecoach version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Display name of the tool (lowercase).
pub const APP_NAME: &str = "sidecoach";

/// Sender name used for messages that do not belong to any analysis run.
pub const SYSTEM_SENDER: &str = "Sidecoach";

/// Local config filename (e.g. `.sidecoach.toml` in the workspace root).
pub const CONFIG_FILENAME: &str = ".sidecoach.toml";

/// Directory name under `~/.config/` for the global config.
pub const CONFIG_DIR: &str = "sidecoach";

/// Maximum number of messages retained by the conversation store.
pub const MAX_MESSAGES: usize = 50;

// ── Environment variable names ──────────────────────────────────────

pub const ENV_PROVIDER: &str = "SIDECOACH_PROVIDER";
pub const ENV_MODEL: &str = "SIDECOACH_MODEL";
pub const ENV_API_KEY: &str = "SIDECOACH_API_KEY";
pub const ENV_BASE_URL: &str = "SIDECOACH_BASE_URL";

// ── Result status labels ────────────────────────────────────────────

pub const STATUS_ISSUE_FOUND: &str = "1 issue found";
pub const STATUS_ALL_CLEAR: &str = "All clear";
pub const STATUS_TOO_LARGE: &str = "Skipped: file too large";
pub const STATUS_FAILED: &str = "Analysis failed";
pub const STATUS_NO_DIFF: &str = "No diff detected";
pub const STATUS_TIMED_OUT: &str = "Timed out";
