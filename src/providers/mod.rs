//! Provider abstraction for structured chat calls.
//!
//! [`CoachProvider`] is the only seam between the coaching client and a
//! model vendor. Each vendor gets its own implementation (see [`rig`]);
//! adding a provider means adding an implementation, not a branch.

pub mod rig;

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::Settings;
use crate::models::{ChatTurn, ProviderName};

/// Maximum length of response text to include in parse error messages.
const PARSE_ERROR_PREVIEW_LEN: usize = 500;

/// Errors from a provider call.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("LLM API error: {0}")]
    ApiError(String),

    #[error("failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

/// Which structured reply the model must produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySchema {
    /// Verdict + opener/title/hint/whyItMatters/fix.
    Coaching,
    /// opener/hint/whyItMatters/fix.
    FollowUp,
}

/// One structured chat request.
#[derive(Debug, Clone, Copy)]
pub struct StructuredRequest<'a> {
    pub model: &'a str,
    /// Full history: an optional leading system turn, then alternating
    /// user/assistant turns ending with the user turn to answer.
    pub messages: &'a [ChatTurn],
    pub schema: ReplySchema,
    pub temperature: f64,
}

/// A model vendor that can answer a chat constrained to a reply schema.
///
/// Implementations return the raw reply text; callers validate it with
/// [`parse_structured`].
#[async_trait]
pub trait CoachProvider: Send + Sync {
    /// Which vendor this is, for logs.
    fn name(&self) -> ProviderName;

    /// Send the conversation and return the schema-constrained reply text.
    async fn send_structured(&self, request: StructuredRequest<'_>) -> Result<String, ProviderError>;
}

/// Build the provider selected by `settings`.
pub fn from_settings(settings: &Settings) -> Result<Arc<dyn CoachProvider>, ProviderError> {
    let provider: Arc<dyn CoachProvider> = match settings.provider {
        ProviderName::OpenAI => Arc::new(rig::OpenAiProvider::new(settings)?),
        ProviderName::Anthropic => Arc::new(rig::AnthropicProvider::new(settings)?),
    };
    Ok(provider)
}

/// Validate a reply against the expected structure.
///
/// Schema-constrained output should already be bare JSON, but some
/// providers wrap it in markdown fences or prose. Anything that still does
/// not deserialize into `T` is rejected.
pub fn parse_structured<T: DeserializeOwned>(response: &str) -> Result<T, ProviderError> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return Err(ProviderError::ParseError("empty response".to_string()));
    }

    let mut last_error = None;
    for candidate in extract_json_candidates(trimmed) {
        match serde_json::from_str::<T>(&candidate) {
            Ok(value) => return Ok(value),
            Err(e) => last_error = Some(e),
        }
    }

    let preview: String = trimmed.chars().take(PARSE_ERROR_PREVIEW_LEN).collect();
    Err(ProviderError::ParseError(format!(
        "response does not match the reply schema ({}). Response: {preview}",
        last_error.map(|e| e.to_string()).unwrap_or_default()
    )))
}

/// Regex for extracting content inside markdown code fences.
///
/// The closing ``` must appear at the start of a line so that fences inside
/// JSON string values (e.g. a `fix` with a code sample) don't end the match.
static FENCE_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"(?s)```(?:json)?\s*\n(.*?)\n```").expect("fence regex is valid")
});

/// Candidate JSON strings from a response: the raw text, the outermost
/// `{...}` slice, then the contents of any fenced blocks.
fn extract_json_candidates(text: &str) -> Vec<String> {
    let mut candidates = vec![text.to_string()];

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            candidates.push(text[start..=end].to_string());
        }
    }

    for cap in FENCE_RE.captures_iter(text) {
        if let Some(inner) = cap.get(1) {
            let inner = inner.as_str().trim();
            if !inner.is_empty() {
                candidates.push(inner.to_string());
            }
        }
    }

    candidates
}
