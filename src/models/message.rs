//! Displayed conversation messages.

use serde::{Deserialize, Serialize};

/// Who authored a displayed message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Assistant,
    User,
}

/// An actionable affordance attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MessageAction {
    /// Offer to review the whole file when no diff was found.
    #[serde(rename_all = "camelCase")]
    AnalyzeWholeFile { label: String, file_name: String },
}

/// One displayed unit of the conversation.
///
/// Messages sharing `(timestamp, file_name)` belong to the same analysis run
/// and are rendered as one visual group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub timestamp: String,
    pub file_name: String,
    #[serde(default)]
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<MessageAction>,
}

impl Message {
    /// An assistant message with no action.
    pub fn assistant(
        timestamp: impl Into<String>,
        file_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            file_name: file_name.into(),
            role: Role::Assistant,
            content: content.into(),
            action: None,
        }
    }

    /// A user message with no action.
    pub fn user(
        timestamp: impl Into<String>,
        file_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            role: Role::User,
            ..Self::assistant(timestamp, file_name, content)
        }
    }

    /// Whether this message belongs to the run identified by `(timestamp, file_name)`.
    pub fn in_run(&self, timestamp: &str, file_name: &str) -> bool {
        self.timestamp == timestamp && self.file_name == file_name
    }
}

/// Current time as an RFC 3339 timestamp with millisecond precision.
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
