//! Structured coaching results and provider-facing chat turns.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The model's overall judgement of the reviewed code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Nothing worth raising.
    AllClear,
    /// Exactly one issue, described by the remaining fields.
    Issue,
}

/// Structured reply to a top-level analysis request.
///
/// Every text field is optional in practice: the model is told to send an
/// empty string when a field does not apply, and missing fields deserialize
/// to empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CoachingResult {
    pub verdict: Verdict,
    /// Conversational lead-in.
    #[serde(default)]
    pub opener: String,
    /// Optional short heading for the issue.
    #[serde(default)]
    pub title: String,
    /// Socratic guidance. Must not disclose the concrete fix.
    #[serde(default)]
    pub hint: String,
    /// Impact statement.
    #[serde(default)]
    pub why_it_matters: String,
    /// Concrete remediation, possibly with a fenced code sample.
    #[serde(default)]
    pub fix: String,
}

impl CoachingResult {
    /// An `all_clear` result with every text field empty.
    pub fn all_clear() -> Self {
        Self {
            verdict: Verdict::AllClear,
            opener: String::new(),
            title: String::new(),
            hint: String::new(),
            why_it_matters: String::new(),
            fix: String::new(),
        }
    }
}

/// Structured reply to a follow-up question. Same fields minus verdict and title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpResult {
    #[serde(default)]
    pub opener: String,
    #[serde(default)]
    pub hint: String,
    #[serde(default)]
    pub why_it_matters: String,
    #[serde(default)]
    pub fix: String,
}

/// Speaker of a provider-facing chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One message in the provider-facing history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}
