use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use tokio::fs;

use serde::Deserialize;
use thiserror::Error;

use crate::llm::{AnthropicProvider, ModelSettings, OpenAICompatibleProvider, Provider};

/// Config file looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "chat-patterns.yaml";

// ============================================================================
// Config (root)
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            request_timeout_seconds: default_request_timeout(),
            providers: ProvidersConfig::default(),
        }
    }
}

impl Config {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        let config: Self = serde_saphyr::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_seconds must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Resolve the request parameters for a provider, filling unset fields
    /// with that provider's defaults.
    pub fn model_settings(&self, provider: Provider) -> ModelSettings {
        let section = self.providers.section(provider);
        ModelSettings {
            model: section
                .model
                .clone()
                .unwrap_or_else(|| default_model(provider).to_string()),
            temperature: Some(section.temperature.unwrap_or(DEFAULT_TEMPERATURE)),
            max_tokens: Some(section.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)),
        }
    }

    pub fn base_url(&self, provider: Provider) -> String {
        self.providers
            .section(provider)
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url(provider).to_string())
    }
}

fn default_request_timeout() -> u64 {
    120
}

// ============================================================================
// ProvidersConfig
// ============================================================================

const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 1000;

#[derive(Debug, Default, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openai: ModelConfig,
    #[serde(default)]
    pub anthropic: ModelConfig,
}

impl ProvidersConfig {
    fn section(&self, provider: Provider) -> &ModelConfig {
        match provider {
            Provider::OpenAI => &self.openai,
            Provider::Anthropic => &self.anthropic,
        }
    }
}

/// Overrides for one provider. Anything left unset uses the provider default.
#[derive(Debug, Default, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

fn default_model(provider: Provider) -> &'static str {
    match provider {
        Provider::OpenAI => "gpt-4o",
        Provider::Anthropic => "claude-3-haiku-20240307",
    }
}

fn default_base_url(provider: Provider) -> &'static str {
    match provider {
        Provider::OpenAI => OpenAICompatibleProvider::DEFAULT_BASE_URL,
        Provider::Anthropic => AnthropicProvider::DEFAULT_BASE_URL,
    }
}

// ============================================================================
// ConfigError
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_saphyr::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

// ============================================================================
// Tests
// ============================================================================
