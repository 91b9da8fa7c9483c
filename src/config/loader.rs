//! Settings file format and resolution logic.
//!
//! Priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables
//! 3. `.sidecoach.toml` in the workspace root
//! 4. `~/.config/sidecoach/config.toml` (global defaults)
//! 5. Built-in defaults
//!
//! Every field in the file layers is optional so that "was this set
//! explicitly" survives merging. Model and base URL fall back to the
//! active provider's defaults only when no layer set them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::constants::{CONFIG_DIR, CONFIG_FILENAME, ENV_API_KEY, ENV_BASE_URL, ENV_MODEL, ENV_PROVIDER};
use crate::env::Env;
use crate::models::{NoiseLevel, ProviderName, Subtlety};

/// Default size limit for analyzed files.
pub const DEFAULT_MAX_FILE_SIZE_KB: u64 = 256;

/// Default bound on a single provider call.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Errors during config loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// One layer of configuration as written in a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub enabled: Option<bool>,
    pub analyze_on_save: Option<bool>,
    pub noise_level: Option<NoiseLevel>,
    pub subtlety: Option<Subtlety>,
    pub max_file_size_kb: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub provider: ProviderFile,
}

/// The `[provider]` table of a config layer.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderFile {
    pub name: Option<ProviderName>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

impl std::fmt::Debug for ProviderFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderFile")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub provider: Option<ProviderName>,
    pub model: Option<String>,
    pub noise_level: Option<NoiseLevel>,
    pub subtlety: Option<Subtlety>,
}

/// Fully resolved settings, immutable for the duration of one call.
#[derive(Clone, PartialEq)]
pub struct Settings {
    pub enabled: bool,
    pub analyze_on_save: bool,
    pub provider: ProviderName,
    pub model: String,
    pub api_base_url: String,
    /// Secret. Never logged or displayed.
    pub api_key: Option<String>,
    pub noise_level: NoiseLevel,
    pub subtlety: Subtlety,
    pub max_file_size_kb: u64,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("enabled", &self.enabled)
            .field("analyze_on_save", &self.analyze_on_save)
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_base_url", &self.api_base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("noise_level", &self.noise_level)
            .field("subtlety", &self.subtlety)
            .field("max_file_size_kb", &self.max_file_size_kb)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Default for Settings {
    fn default() -> Self {
        ConfigFile::default().resolve(&Env::empty(), &Overrides::default())
    }
}

impl Settings {
    /// Load settings with layering: global file, workspace file, env, CLI.
    pub fn load(
        workspace_root: Option<&Path>,
        env: &Env,
        overrides: &Overrides,
    ) -> Result<Self, ConfigError> {
        let mut layered = ConfigFile::default();

        if let Some(global_path) = ConfigFile::global_path() {
            if global_path.exists() {
                layered.merge(ConfigFile::load_file(&global_path)?);
            }
        }

        if let Some(root) = workspace_root {
            let local_path = root.join(CONFIG_FILENAME);
            if local_path.exists() {
                layered.merge(ConfigFile::load_file(&local_path)?);
            }
        }

        let settings = layered.resolve(env, overrides);
        debug!(settings = ?settings, "settings resolved");
        Ok(settings)
    }

    /// Whether a non-empty API key is available.
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Size threshold in bytes.
    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_size_kb.saturating_mul(1024)
    }
}

impl ConfigFile {
    /// Load a config layer from a specific file.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the global config file path.
    fn global_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR).join("config.toml"))
    }

    /// Merge a higher-priority layer into this one. Fields set in `other` win.
    pub fn merge(&mut self, other: ConfigFile) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        take(&mut self.enabled, other.enabled);
        take(&mut self.analyze_on_save, other.analyze_on_save);
        take(&mut self.noise_level, other.noise_level);
        take(&mut self.subtlety, other.subtlety);
        take(&mut self.max_file_size_kb, other.max_file_size_kb);
        take(&mut self.request_timeout_secs, other.request_timeout_secs);
        take(&mut self.provider.name, other.provider.name);
        take(&mut self.provider.model, other.provider.model);
        take(&mut self.provider.base_url, other.provider.base_url);
        take(&mut self.provider.api_key, other.provider.api_key);
    }

    /// Apply environment variable overrides to this layer.
    fn apply_env_vars(&mut self, env: &Env) {
        if let Some(val) = env.var(ENV_PROVIDER) {
            match val.parse::<ProviderName>() {
                Ok(name) => self.provider.name = Some(name),
                Err(_) => warn!(var = ENV_PROVIDER, value = %val, "ignoring invalid provider"),
            }
        }
        if let Some(val) = env.var(ENV_MODEL) {
            self.provider.model = Some(val);
        }
        if let Some(val) = env.var(ENV_BASE_URL) {
            self.provider.base_url = Some(val);
        }
    }

    /// Collapse the layers into final settings.
    pub fn resolve(mut self, env: &Env, overrides: &Overrides) -> Settings {
        self.apply_env_vars(env);

        if overrides.provider.is_some() {
            self.provider.name = overrides.provider;
        }
        if overrides.model.is_some() {
            self.provider.model = overrides.model.clone();
        }

        let provider = self.provider.name.unwrap_or_default();
        let model = self
            .provider
            .model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| provider.default_model().to_string());
        let base_url = self
            .provider
            .base_url
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| provider.default_base_url().to_string());

        // The secret override beats any file-configured key.
        let api_key = env
            .first_of(&[ENV_API_KEY, provider.api_key_env_var()])
            .or(self.provider.api_key)
            .filter(|k| !k.trim().is_empty());

        Settings {
            enabled: self.enabled.unwrap_or(true),
            analyze_on_save: self.analyze_on_save.unwrap_or(true),
            provider,
            model,
            api_base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            noise_level: overrides
                .noise_level
                .or(self.noise_level)
                .unwrap_or_default(),
            subtlety: overrides.subtlety.or(self.subtlety).unwrap_or_default(),
            max_file_size_kb: self.max_file_size_kb.unwrap_or(DEFAULT_MAX_FILE_SIZE_KB),
            request_timeout: Duration::from_secs(
                self.request_timeout_secs
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
                    .max(1),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings() {
        let s = Settings::default();
        assert!(s.enabled);
        assert!(s.analyze_on_save);
        assert_eq!(s.provider, ProviderName::OpenAI);
        assert_eq!(s.model, "gpt-4.1-mini");
        assert_eq!(s.api_base_url, "https://api.openai.com/v1");
        assert_eq!(s.noise_level, NoiseLevel::Balanced);
        assert_eq!(s.subtlety, Subtlety::Direct);
        assert_eq!(s.max_file_size_kb, 256);
        assert_eq!(s.max_file_bytes(), 256 * 1024);
        assert!(!s.has_api_key());
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
enabled = false
noise_level = "chatty"
subtlety = "strict"
max_file_size_kb = 64

[provider]
name = "anthropic"
model = "claude-custom"
"#;
        let file: ConfigFile = toml::from_str(toml_str).unwrap();
        assert_eq!(file.enabled, Some(false));
        assert_eq!(file.noise_level, Some(NoiseLevel::Chatty));
        assert_eq!(file.provider.name, Some(ProviderName::Anthropic));

        let s = file.resolve(&Env::empty(), &Overrides::default());
        assert!(!s.enabled);
        assert_eq!(s.model, "claude-custom");
        assert_eq!(s.api_base_url, "https://api.anthropic.com");
        assert_eq!(s.max_file_size_kb, 64);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = toml::from_str::<ConfigFile>("colour = \"blue\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn provider_switch_uses_that_providers_defaults() {
        let mut file = ConfigFile::default();
        file.provider.name = Some(ProviderName::Anthropic);
        let s = file.resolve(&Env::empty(), &Overrides::default());
        assert_eq!(s.model, "claude-3-5-haiku-latest");
    }

    #[test]
    fn explicit_model_survives_provider_switch() {
        let mut file = ConfigFile::default();
        file.provider.model = Some("my-model".into());
        let overrides = Overrides {
            provider: Some(ProviderName::Anthropic),
            ..Overrides::default()
        };
        let s = file.resolve(&Env::empty(), &overrides);
        assert_eq!(s.provider, ProviderName::Anthropic);
        assert_eq!(s.model, "my-model");
    }

    #[test]
    fn merge_only_overrides_set_fields() {
        let mut base = ConfigFile {
            enabled: Some(false),
            subtlety: Some(Subtlety::Gentle),
            ..ConfigFile::default()
        };
        let other = ConfigFile {
            subtlety: Some(Subtlety::Strict),
            max_file_size_kb: Some(10),
            ..ConfigFile::default()
        };
        base.merge(other);
        assert_eq!(base.enabled, Some(false));
        assert_eq!(base.subtlety, Some(Subtlety::Strict));
        assert_eq!(base.max_file_size_kb, Some(10));
    }

    #[test]
    fn merge_can_re_enable() {
        let mut base = ConfigFile {
            enabled: Some(false),
            ..ConfigFile::default()
        };
        base.merge(ConfigFile {
            enabled: Some(true),
            ..ConfigFile::default()
        });
        assert_eq!(base.enabled, Some(true));
    }

    #[test]
    fn trailing_slash_is_stripped_from_base_url() {
        let mut file = ConfigFile::default();
        file.provider.base_url = Some("http://localhost:8080/v1/".into());
        let s = file.resolve(&Env::empty(), &Overrides::default());
        assert_eq!(s.api_base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn env_api_key_beats_file_key() {
        let mut file = ConfigFile::default();
        file.provider.api_key = Some("from-file".into());
        let env = Env::mock([("SIDECOACH_API_KEY", "from-env")]);
        let s = file.resolve(&env, &Overrides::default());
        assert_eq!(s.api_key.as_deref(), Some("from-env"));
    }

    #[test]
    fn provider_specific_env_key_is_a_fallback() {
        let env = Env::mock([
            ("SIDECOACH_PROVIDER", "anthropic"),
            ("ANTHROPIC_API_KEY", "sk-ant"),
            ("OPENAI_API_KEY", "sk-oai"),
        ]);
        let s = ConfigFile::default().resolve(&env, &Overrides::default());
        assert_eq!(s.provider, ProviderName::Anthropic);
        assert_eq!(s.api_key.as_deref(), Some("sk-ant"));
    }

    #[test]
    fn blank_file_key_counts_as_missing() {
        let mut file = ConfigFile::default();
        file.provider.api_key = Some("  ".into());
        let s = file.resolve(&Env::empty(), &Overrides::default());
        assert!(!s.has_api_key());
    }

    #[test]
    fn invalid_env_provider_is_ignored() {
        let env = Env::mock([("SIDECOACH_PROVIDER", "not-a-provider")]);
        let s = ConfigFile::default().resolve(&env, &Overrides::default());
        assert_eq!(s.provider, ProviderName::OpenAI);
    }

    #[test]
    fn cli_overrides_beat_env() {
        let env = Env::mock([("SIDECOACH_MODEL", "env-model")]);
        let overrides = Overrides {
            model: Some("cli-model".into()),
            noise_level: Some(NoiseLevel::Quiet),
            ..Overrides::default()
        };
        let s = ConfigFile::default().resolve(&env, &overrides);
        assert_eq!(s.model, "cli-model");
        assert_eq!(s.noise_level, NoiseLevel::Quiet);
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let env = Env::mock([("SIDECOACH_API_KEY", "sk-secret-value")]);
        let s = ConfigFile::default().resolve(&env, &Overrides::default());
        let rendered = format!("{s:?}");
        assert!(!rendered.contains("sk-secret-value"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn load_from_workspace_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".sidecoach.toml"),
            "subtlety = \"gentle\"\n[provider]\nname = \"anthropic\"\n",
        )
        .unwrap();

        let s = Settings::load(Some(dir.path()), &Env::empty(), &Overrides::default()).unwrap();
        assert_eq!(s.subtlety, Subtlety::Gentle);
        assert_eq!(s.provider, ProviderName::Anthropic);
    }

    #[test]
    fn load_file_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "not valid {{ toml").unwrap();

        let err = ConfigFile::load_file(&path).unwrap_err();
        assert!(err.to_string().contains("parse"));
    }

    #[test]
    fn load_file_not_found() {
        let err = ConfigFile::load_file(Path::new("/tmp/sidecoach_missing_config.toml")).unwrap_err();
        assert!(err.to_string().contains("read"));
    }

    #[test]
    fn timeout_has_a_floor_of_one_second() {
        let file = ConfigFile {
            request_timeout_secs: Some(0),
            ..ConfigFile::default()
        };
        let s = file.resolve(&Env::empty(), &Overrides::default());
        assert_eq!(s.request_timeout, Duration::from_secs(1));
    }
}
