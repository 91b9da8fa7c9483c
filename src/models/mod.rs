//! Shared types used across all modules.
//!
//! This module defines the settings enums, the structured coaching result,
//! displayed conversation messages, and the document handle. Other modules
//! import from here rather than reaching into each other's internals.

pub mod coaching;
pub mod document;
pub mod message;

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub use coaching::{ChatRole, ChatTurn, CoachingResult, FollowUpResult, Verdict};
pub use document::Document;
pub use message::{Message, MessageAction, Role, now_timestamp};

/// Supported LLM provider backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderName {
    #[default]
    #[serde(rename = "openai")]
    #[value(name = "openai")]
    OpenAI,
    Anthropic,
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderName::OpenAI => write!(f, "openai"),
            ProviderName::Anthropic => write!(f, "anthropic"),
        }
    }
}

impl std::str::FromStr for ProviderName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ProviderName::OpenAI),
            "anthropic" => Ok(ProviderName::Anthropic),
            other => Err(format!(
                "unsupported provider: '{other}'. Supported: openai, anthropic"
            )),
        }
    }
}

impl ProviderName {
    /// Returns the provider-specific environment variable name for the API key.
    pub fn api_key_env_var(self) -> &'static str {
        match self {
            ProviderName::OpenAI => "OPENAI_API_KEY",
            ProviderName::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    /// Model used when none is configured explicitly.
    pub fn default_model(self) -> &'static str {
        match self {
            ProviderName::OpenAI => "gpt-4.1-mini",
            ProviderName::Anthropic => "claude-3-5-haiku-latest",
        }
    }

    /// API base URL used when none is configured explicitly.
    pub fn default_base_url(self) -> &'static str {
        match self {
            ProviderName::OpenAI => "https://api.openai.com/v1",
            ProviderName::Anthropic => "https://api.anthropic.com",
        }
    }
}

/// How talkative the coach is. Drives sampling temperature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NoiseLevel {
    Quiet,
    #[default]
    Balanced,
    Chatty,
}

impl NoiseLevel {
    /// Sampling temperature for the model call.
    pub fn temperature(self) -> f64 {
        match self {
            NoiseLevel::Quiet => 0.2,
            NoiseLevel::Balanced => 0.5,
            NoiseLevel::Chatty => 0.8,
        }
    }
}

impl fmt::Display for NoiseLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoiseLevel::Quiet => write!(f, "quiet"),
            NoiseLevel::Balanced => write!(f, "balanced"),
            NoiseLevel::Chatty => write!(f, "chatty"),
        }
    }
}

impl std::str::FromStr for NoiseLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quiet" => Ok(NoiseLevel::Quiet),
            "balanced" => Ok(NoiseLevel::Balanced),
            "chatty" => Ok(NoiseLevel::Chatty),
            other => Err(format!("unknown noise level: {other}")),
        }
    }
}

/// Tone of the feedback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Subtlety {
    Gentle,
    #[default]
    Direct,
    Strict,
}

impl fmt::Display for Subtlety {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subtlety::Gentle => write!(f, "gentle"),
            Subtlety::Direct => write!(f, "direct"),
            Subtlety::Strict => write!(f, "strict"),
        }
    }
}

impl std::str::FromStr for Subtlety {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gentle" => Ok(Subtlety::Gentle),
            "direct" => Ok(Subtlety::Direct),
            "strict" => Ok(Subtlety::Strict),
            other => Err(format!("unknown subtlety: {other}")),
        }
    }
}
