//! Coaching client: prompt, provider call, structured result, session.
//!
//! The client holds no conversation state. Every call takes what it needs
//! (settings, and for follow-ups the base [`Session`]) and returns the
//! session that should become active; the caller decides whether to commit
//! it through a [`SessionSlot`].

pub mod session;

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::Settings;
use crate::feedback;
use crate::models::{ChatTurn, CoachingResult, FollowUpResult, Verdict};
use crate::prompt::{self, PromptInput};
use crate::providers::{self, CoachProvider, ProviderError, ReplySchema, StructuredRequest};

pub use session::{ActiveSession, Session, SessionSlot, Ticket};

/// Failures surfaced by a coaching request.
#[derive(Error, Debug)]
pub enum CoachError {
    /// Missing or unusable provider configuration. Never reaches the network.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Provider or network failure, or a reply that did not match the schema.
    #[error("{0}")]
    Transport(String),

    /// The request does not make sense in the current state.
    #[error("{0}")]
    State(String),

    /// The provider did not answer within the configured timeout.
    #[error("provider request timed out after {0}s")]
    Timeout(u64),
}

impl From<ProviderError> for CoachError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotConfigured(msg) => CoachError::Configuration(msg),
            other => CoachError::Transport(other.to_string()),
        }
    }
}

/// Feedback text (`None` means all clear) and the session to make active.
pub type CoachReply = (Option<String>, Session);

/// Sends coaching requests to the configured provider.
#[derive(Clone)]
pub struct CoachingClient {
    provider: Option<Arc<dyn CoachProvider>>,
}

impl CoachingClient {
    /// A client backed by `provider`.
    pub fn new(provider: Arc<dyn CoachProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// Build the provider selected by `settings`.
    ///
    /// A missing API key is not an error here: the client is still created
    /// and every request fails fast with [`CoachError::Configuration`].
    pub fn from_settings(settings: &Settings) -> Result<Self, CoachError> {
        match providers::from_settings(settings) {
            Ok(provider) => Ok(Self::new(provider)),
            Err(ProviderError::NotConfigured(msg)) => {
                debug!("no provider configured: {msg}");
                Ok(Self { provider: None })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Fail fast when no request could be sent with `settings`.
    pub fn ensure_ready(&self, settings: &Settings) -> Result<(), CoachError> {
        self.provider(settings).map(|_| ())
    }

    fn provider(&self, settings: &Settings) -> Result<&Arc<dyn CoachProvider>, CoachError> {
        if !settings.has_api_key() {
            return Err(CoachError::Configuration(format!(
                "missing API key for provider '{}'. Set {} or add api_key to the [provider] table.",
                settings.provider,
                crate::constants::ENV_API_KEY
            )));
        }
        self.provider.as_ref().ok_or_else(|| {
            CoachError::Configuration(format!("provider '{}' is not configured", settings.provider))
        })
    }

    /// Request a single coaching suggestion for one file.
    ///
    /// On `all_clear` the returned session holds only the system and user
    /// turns. On `issue` it also holds the formatted feedback as the
    /// assistant turn.
    pub async fn request_coaching(
        &self,
        settings: &Settings,
        file_name: &str,
        input: PromptInput<'_>,
    ) -> Result<CoachReply, CoachError> {
        let provider = self.provider(settings)?;
        let prompt = prompt::build(input);
        let mut messages = vec![ChatTurn::system(prompt.system), ChatTurn::user(prompt.user)];

        info!(
            provider = %provider.name(),
            model = %settings.model,
            file = file_name,
            "requesting coaching"
        );
        let raw = send(
            provider.as_ref(),
            settings,
            StructuredRequest {
                model: &settings.model,
                messages: &messages,
                schema: ReplySchema::Coaching,
                temperature: prompt.temperature,
            },
        )
        .await?;
        let result: CoachingResult = providers::parse_structured(&raw)?;

        if result.verdict == Verdict::AllClear {
            debug!(file = file_name, "all clear");
            return Ok((None, session(file_name, messages)));
        }

        let text = feedback::format_coaching(&result);
        messages.push(ChatTurn::assistant(text.clone()));
        Ok((Some(text), session(file_name, messages)))
    }

    /// Ask a follow-up question about the issue in `base`.
    ///
    /// Without a base session this fails with [`CoachError::State`] before
    /// any provider call. An empty answer returns `None` and the base
    /// session unchanged.
    pub async fn request_follow_up(
        &self,
        settings: &Settings,
        base: Option<&Session>,
        question: &str,
    ) -> Result<CoachReply, CoachError> {
        let provider = self.provider(settings)?;
        let base = base.ok_or_else(|| {
            CoachError::State("No active coaching session. Run an analysis first.".to_string())
        })?;

        let mut messages = base.messages.clone();
        messages.push(ChatTurn::user(prompt::follow_up_instruction(question)));

        info!(
            provider = %provider.name(),
            file = %base.file_name,
            turns = messages.len(),
            "requesting follow-up"
        );
        let raw = send(
            provider.as_ref(),
            settings,
            StructuredRequest {
                model: &settings.model,
                messages: &messages,
                schema: ReplySchema::FollowUp,
                temperature: settings.noise_level.temperature(),
            },
        )
        .await?;
        let result: FollowUpResult = providers::parse_structured(&raw)?;

        let text = feedback::format_follow_up(&result);
        if text.is_empty() {
            return Ok((None, base.clone()));
        }
        messages.push(ChatTurn::assistant(text.clone()));
        Ok((Some(text), session(&base.file_name, messages)))
    }
}

fn session(file_name: &str, messages: Vec<ChatTurn>) -> Session {
    Session {
        file_name: file_name.to_string(),
        messages,
    }
}

/// One provider call bounded by the configured request timeout.
async fn send(
    provider: &dyn CoachProvider,
    settings: &Settings,
    request: StructuredRequest<'_>,
) -> Result<String, CoachError> {
    match tokio::time::timeout(settings.request_timeout, provider.send_structured(request)).await {
        Ok(reply) => Ok(reply?),
        Err(_) => Err(CoachError::Timeout(settings.request_timeout.as_secs())),
    }
}
