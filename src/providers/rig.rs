//! rig-core integration for structured coaching calls.
//!
//! One [`CoachProvider`] implementation per vendor, both built on rig-core's
//! provider clients and Agent abstraction. The agent's `output_schema`
//! constrains the reply to the JSON schema of the expected result type;
//! the system turn becomes the agent preamble, earlier turns become chat
//! history, and the final user turn is the prompt.

use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::{Chat, Message};
use rig::providers;

use crate::config::Settings;
use crate::models::{ChatRole, ChatTurn, CoachingResult, FollowUpResult, ProviderName};

use super::{CoachProvider, ProviderError, ReplySchema, StructuredRequest};

/// Maximum tokens per completion. Replies are a handful of short fields.
const MAX_TOKENS: u64 = 4096;

/// Build an agent for the requested schema and run one chat turn.
macro_rules! chat_structured {
    ($client:expr, $request:expr, $preamble:expr, $prompt:expr, $history:expr, $label:expr) => {{
        let result = match $request.schema {
            ReplySchema::Coaching => {
                $client
                    .agent($request.model)
                    .preamble($preamble)
                    .temperature($request.temperature)
                    .max_tokens(MAX_TOKENS)
                    .output_schema::<CoachingResult>()
                    .build()
                    .chat($prompt, $history)
                    .await
            }
            ReplySchema::FollowUp => {
                $client
                    .agent($request.model)
                    .preamble($preamble)
                    .temperature($request.temperature)
                    .max_tokens(MAX_TOKENS)
                    .output_schema::<FollowUpResult>()
                    .build()
                    .chat($prompt, $history)
                    .await
            }
        };
        result.map_err(|e| ProviderError::ApiError(format!("{} API error: {e}", $label)))
    }};
}

/// Get the API key or return an error.
fn require_api_key(settings: &Settings) -> Result<&str, ProviderError> {
    settings
        .api_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "no API key found for provider '{}'. Set {} or the provider-specific env var.",
                settings.provider,
                crate::constants::ENV_API_KEY
            ))
        })
}

/// A conversation split into rig's preamble / history / prompt shape.
#[derive(Debug)]
struct SplitConversation {
    preamble: String,
    history: Vec<Message>,
    prompt: Message,
}

/// Split a turn list into preamble, history, and the final user prompt.
fn split_conversation(messages: &[ChatTurn]) -> Result<SplitConversation, ProviderError> {
    let (last, earlier) = messages
        .split_last()
        .ok_or_else(|| ProviderError::ApiError("cannot send an empty conversation".to_string()))?;
    if last.role != ChatRole::User {
        return Err(ProviderError::ApiError(
            "conversation must end with a user turn".to_string(),
        ));
    }

    let mut preamble = Vec::new();
    let mut history = Vec::new();
    for turn in earlier {
        match turn.role {
            ChatRole::System => preamble.push(turn.content.as_str()),
            ChatRole::User => history.push(Message::user(turn.content.clone())),
            ChatRole::Assistant => history.push(Message::assistant(turn.content.clone())),
        }
    }

    Ok(SplitConversation {
        preamble: preamble.join("\n\n"),
        history,
        prompt: Message::user(last.content.clone()),
    })
}

/// OpenAI (and any OpenAI-compatible endpoint via `base_url`).
pub struct OpenAiProvider {
    client: providers::openai::CompletionsClient,
}

impl OpenAiProvider {
    /// Create a client for the configured base URL and key.
    pub fn new(settings: &Settings) -> Result<Self, ProviderError> {
        let api_key = require_api_key(settings)?;
        let client = providers::openai::CompletionsClient::builder()
            .api_key(api_key)
            .base_url(&settings.api_base_url)
            .build()
            .map_err(|e| ProviderError::ApiError(format!("failed to create OpenAI client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CoachProvider for OpenAiProvider {
    fn name(&self) -> ProviderName {
        ProviderName::OpenAI
    }

    async fn send_structured(&self, request: StructuredRequest<'_>) -> Result<String, ProviderError> {
        let conversation = split_conversation(request.messages)?;
        chat_structured!(
            self.client,
            request,
            &conversation.preamble,
            conversation.prompt,
            conversation.history,
            "OpenAI"
        )
    }
}

/// Anthropic Messages API.
pub struct AnthropicProvider {
    client: providers::anthropic::Client,
}

impl AnthropicProvider {
    /// Create a client for the configured base URL and key.
    pub fn new(settings: &Settings) -> Result<Self, ProviderError> {
        let api_key = require_api_key(settings)?;
        let client: providers::anthropic::Client = providers::anthropic::Client::builder()
            .api_key(api_key)
            .base_url(&settings.api_base_url)
            .build()
            .map_err(|e| {
                ProviderError::ApiError(format!("failed to create Anthropic client: {e}"))
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CoachProvider for AnthropicProvider {
    fn name(&self) -> ProviderName {
        ProviderName::Anthropic
    }

    async fn send_structured(&self, request: StructuredRequest<'_>) -> Result<String, ProviderError> {
        let conversation = split_conversation(request.messages)?;
        chat_structured!(
            self.client,
            request,
            &conversation.preamble,
            conversation.prompt,
            conversation.history,
            "Anthropic"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigFile, Overrides};
    use crate::env::Env;

    fn settings_with_key(provider: &str) -> Settings {
        let env = Env::mock([("SIDECOACH_API_KEY", "sk-test"), ("SIDECOACH_PROVIDER", provider)]);
        ConfigFile::default().resolve(&env, &Overrides::default())
    }

    #[test]
    fn split_uses_system_turn_as_preamble() {
        let turns = vec![
            ChatTurn::system("persona"),
            ChatTurn::user("review this"),
            ChatTurn::assistant("hint"),
            ChatTurn::user("why?"),
        ];
        let split = split_conversation(&turns).unwrap();
        assert_eq!(split.preamble, "persona");
        assert_eq!(split.history.len(), 2);
    }

    #[test]
    fn split_rejects_empty_conversation() {
        assert!(split_conversation(&[]).is_err());
    }

    #[test]
    fn split_rejects_trailing_assistant_turn() {
        let turns = vec![ChatTurn::user("q"), ChatTurn::assistant("a")];
        let err = split_conversation(&turns).unwrap_err();
        assert!(err.to_string().contains("user turn"));
    }

    #[test]
    fn missing_api_key_is_not_configured() {
        let settings = Settings::default();
        match OpenAiProvider::new(&settings) {
            Err(ProviderError::NotConfigured(msg)) => assert!(msg.contains("SIDECOACH_API_KEY")),
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("expected error for missing API key"),
        }
    }

    #[test]
    fn providers_build_with_api_key() {
        let openai = OpenAiProvider::new(&settings_with_key("openai")).unwrap();
        assert_eq!(openai.name(), ProviderName::OpenAI);
        let anthropic = AnthropicProvider::new(&settings_with_key("anthropic")).unwrap();
        assert_eq!(anthropic.name(), ProviderName::Anthropic);
    }
}
